//! Signals: typed, thread-safe multi-receiver emitters.
//!
//! A [`Signal<Args>`] owns an ordered set of connected [`Slot`]s. Emitting
//! pushes the argument to every currently-connected, non-blocked slot; there
//! is no queuing across emissions.
//!
//! # Delivery Modes
//!
//! The framework this kernel serves chooses between synchronous and
//! asynchronous delivery *per call site*, not per signal, so delivery mode
//! is an explicit method choice:
//!
//! - [`Signal::emit`] - invoke every slot inline, on the calling thread
//! - [`Signal::emit_async`] - post onto each slot's worker, return at once
//! - [`Signal::emit_blocking`] - post onto each slot's worker, wait for all
//!
//! # Thread Safety
//!
//! `Signal<Args>` is `Send + Sync` and can be shared freely. Connections
//! may be made and broken from any thread while other threads emit.
//!
//! # Example
//!
//! ```
//! use helix_conduit_core::{Signal, Slot};
//!
//! let text_changed = Signal::<String>::new();
//!
//! let echo = Slot::new(|text: &String| {
//!     println!("Text changed to: {}", text);
//! });
//! let connection = text_changed.connect(&echo).unwrap();
//!
//! text_changed.emit("Hello, World!".to_string());
//!
//! connection.disconnect();
//! ```

use std::any::Any;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::connection::{Connection, EdgeHandle};
use crate::error::WiringError;
use crate::slot::{AnySlot, Slot};
use crate::worker::CompletionWaiter;

new_key_type! {
    /// A unique identifier for a signal-slot connection within one signal.
    pub struct ConnectionId;
}

/// Global signal identity counter.
static NEXT_SIGNAL_ID: AtomicU64 = AtomicU64::new(1);

/// A process-unique identity for a signal.
///
/// All clones of a [`Signal`] share one `SignalId`. The runtime's proxy
/// uses this for its duplicate-membership rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SignalId(u64);

impl SignalId {
    fn next() -> Self {
        Self(NEXT_SIGNAL_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw numeric value, for diagnostics.
    pub fn as_raw(self) -> u64 {
        self.0
    }
}

/// Internal storage for a single connection.
struct Edge<Args> {
    /// The receiving slot.
    slot: Slot<Args>,
    /// Block count shared with outstanding [`crate::Blocker`] guards.
    block: Arc<AtomicUsize>,
}

struct EdgeTable<Args> {
    edges: SlotMap<ConnectionId, Edge<Args>>,
    /// Connection order; emission walks this list.
    order: Vec<ConnectionId>,
}

struct SignalShared<Args> {
    id: SignalId,
    table: Mutex<EdgeTable<Args>>,
}

/// A type-safe signal that can have multiple connected slots.
///
/// # Type Parameter
///
/// - `Args`: The argument type passed to connected slots. Use `()` for
///   signals with no arguments, or a tuple like `(String, i32)` for several.
///
/// Cloning a signal yields a second handle to the same emitter; connections
/// made through one clone are visible through all of them.
pub struct Signal<Args> {
    shared: Arc<SignalShared<Args>>,
}

impl<Args> Clone for Signal<Args> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<Args: Clone + Send + 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: Clone + Send + 'static> Signal<Args> {
    /// Create a new signal with no connections.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(SignalShared {
                id: SignalId::next(),
                table: Mutex::new(EdgeTable {
                    edges: SlotMap::with_key(),
                    order: Vec::new(),
                }),
            }),
        }
    }

    /// The identity shared by all clones of this signal.
    pub fn id(&self) -> SignalId {
        self.shared.id
    }

    /// Connect a slot to this signal.
    ///
    /// Returns a [`Connection`] handle for the new edge. Connecting a slot
    /// that is already wired to this signal fails with
    /// [`WiringError::AlreadyConnected`] — idempotency protection for
    /// callers that retry wiring, not a fault in normal operation.
    pub fn connect(&self, slot: &Slot<Args>) -> Result<Connection, WiringError> {
        let mut table = self.shared.table.lock();

        if table.edges.values().any(|edge| edge.slot.id() == slot.id()) {
            return Err(WiringError::AlreadyConnected);
        }

        let block = Arc::new(AtomicUsize::new(0));
        let id = table.edges.insert(Edge {
            slot: slot.clone(),
            block: block.clone(),
        });
        table.order.push(id);
        tracing::trace!(
            target: "helix_conduit_core::signal",
            signal = self.shared.id.as_raw(),
            slot = slot.id().as_raw(),
            "connected"
        );

        Ok(Connection::from_edge(Arc::new(TypedEdge {
            signal: Arc::downgrade(&self.shared),
            id,
            block,
        })))
    }

    /// Disconnect all slots from this signal.
    pub fn disconnect_all(&self) {
        let mut table = self.shared.table.lock();
        table.edges.clear();
        table.order.clear();
    }

    /// Get the number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.shared.table.lock().edges.len()
    }

    /// Emit the signal, invoking all connected slots synchronously.
    ///
    /// Slots run in connection order, on the calling thread, regardless of
    /// any worker they are bound to. Blocked edges are skipped. A panic in
    /// one slot propagates to the emitter and the remaining slots are not
    /// invoked — there is no isolation between receivers, which callers
    /// must be aware of.
    pub fn emit(&self, args: Args) {
        for (slot, block) in self.snapshot() {
            if block.load(Ordering::Acquire) == 0 {
                slot.run(&args);
            }
        }
    }

    /// Emit the signal asynchronously.
    ///
    /// Each delivery is posted onto the receiving slot's worker queue and
    /// this call returns immediately. Deliveries to the same worker keep
    /// FIFO order; there is no ordering guarantee across different workers.
    /// Slots without a worker run inline.
    pub fn emit_async(&self, args: Args) {
        for (slot, block) in self.snapshot() {
            if block.load(Ordering::Acquire) == 0 {
                slot.post(args.clone());
            }
        }
    }

    /// Emit the signal and block until every posted delivery has completed.
    ///
    /// Worker-bound slots are posted to their queues; the caller then waits
    /// for all of them. Slots without a worker run inline before the wait
    /// begins. This is the pattern used to marshal a call from a background
    /// thread onto a UI-affine worker.
    ///
    /// # Warning
    ///
    /// Emitting from the thread of a receiving worker deadlocks, exactly
    /// like any other blocking post onto one's own queue.
    pub fn emit_blocking(&self, args: Args) {
        let mut waiters: Vec<CompletionWaiter> = Vec::new();

        for (slot, block) in self.snapshot() {
            if block.load(Ordering::Acquire) == 0 {
                if let Some(waiter) = slot.post_with_waiter(args.clone()) {
                    waiters.push(waiter);
                }
            }
        }

        for waiter in waiters {
            waiter.wait();
        }
    }

    /// Snapshot the edge list in connection order.
    ///
    /// Taken under the table lock, invoked outside it, so slots are free to
    /// connect/disconnect (including their own edge) while running.
    fn snapshot(&self) -> Vec<(Slot<Args>, Arc<AtomicUsize>)> {
        let table = self.shared.table.lock();
        table
            .order
            .iter()
            .filter_map(|&id| table.edges.get(id))
            .map(|edge| (edge.slot.clone(), edge.block.clone()))
            .collect()
    }
}

/// Edge control handed to [`Connection`] — see [`EdgeHandle`].
struct TypedEdge<Args> {
    signal: Weak<SignalShared<Args>>,
    id: ConnectionId,
    block: Arc<AtomicUsize>,
}

impl<Args: Send + 'static> EdgeHandle for TypedEdge<Args> {
    fn disconnect(&self) -> bool {
        let Some(signal) = self.signal.upgrade() else {
            return false;
        };
        let mut table = signal.table.lock();
        if table.edges.remove(self.id).is_some() {
            table.order.retain(|&id| id != self.id);
            tracing::trace!(
                target: "helix_conduit_core::signal",
                signal = signal.id.as_raw(),
                "disconnected"
            );
            true
        } else {
            false
        }
    }

    fn is_connected(&self) -> bool {
        self.signal
            .upgrade()
            .is_some_and(|signal| signal.table.lock().edges.contains_key(self.id))
    }

    fn block(&self) {
        self.block.fetch_add(1, Ordering::AcqRel);
    }

    fn unblock(&self) {
        self.block.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Type-erased signal handle for name-keyed wiring.
///
/// [`crate::SignalTable`] stores signals behind this trait so configuration
/// can wire endpoints by key. [`AnySignal::connect_any`] recovers the
/// concrete argument type by downcasting the slot; a mismatch is reported
/// as [`WiringError::TypeMismatch`] rather than a panic, since mismatched
/// keys in configuration are a recoverable wiring error.
pub trait AnySignal: Send + Sync {
    /// The identity shared by all clones of the signal.
    fn id(&self) -> SignalId;

    /// Connect a type-erased slot. Fails with [`WiringError::TypeMismatch`]
    /// when the slot's argument type differs from the signal's.
    fn connect_any(&self, slot: &dyn AnySlot) -> Result<Connection, WiringError>;

    /// Number of connected slots.
    fn connection_count(&self) -> usize;

    /// Get this as Any for downcasting to `Signal<Args>`.
    fn as_any(&self) -> &dyn Any;
}

impl<Args: Clone + Send + 'static> AnySignal for Signal<Args> {
    fn id(&self) -> SignalId {
        Signal::id(self)
    }

    fn connect_any(&self, slot: &dyn AnySlot) -> Result<Connection, WiringError> {
        let slot = slot
            .as_any()
            .downcast_ref::<Slot<Args>>()
            .ok_or(WiringError::TypeMismatch {
                expected: std::any::type_name::<Args>(),
            })?;
        self.connect(slot)
    }

    fn connection_count(&self) -> usize {
        Signal::connection_count(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

static_assertions::assert_impl_all!(Signal<i32>: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::Worker;
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;

    fn recording_slot(sink: &Arc<Mutex<Vec<i32>>>) -> Slot<i32> {
        let sink = sink.clone();
        Slot::new(move |&value: &i32| {
            sink.lock().push(value);
        })
    }

    #[test]
    fn test_signal_connect_emit() {
        let signal = Signal::<i32>::new();
        let received = Arc::new(Mutex::new(Vec::new()));

        let _connection = signal.connect(&recording_slot(&received)).unwrap();

        signal.emit(42);
        signal.emit(100);

        assert_eq!(*received.lock(), vec![42, 100]);
    }

    #[test]
    fn test_signal_disconnect() {
        let signal = Signal::<i32>::new();
        let received = Arc::new(Mutex::new(Vec::new()));

        let connection = signal.connect(&recording_slot(&received)).unwrap();

        signal.emit(1);
        assert!(connection.disconnect());
        signal.emit(2);

        assert_eq!(*received.lock(), vec![1]); // Only received before disconnect
    }

    #[test]
    fn test_disconnect_is_idempotent() {
        let signal = Signal::<i32>::new();
        let slot = Slot::new(|_: &i32| {});

        let connection = signal.connect(&slot).unwrap();
        assert!(connection.disconnect());
        assert!(!connection.disconnect());
        assert!(!connection.is_connected());
    }

    #[test]
    fn test_disconnect_after_signal_dropped() {
        let slot = Slot::new(|_: &i32| {});
        let connection = {
            let signal = Signal::<i32>::new();
            signal.connect(&slot).unwrap()
        };

        // The signal is gone; the handle degrades to a no-op.
        assert!(!connection.is_connected());
        assert!(!connection.disconnect());
    }

    #[test]
    fn test_duplicate_connect_rejected() {
        let signal = Signal::<i32>::new();
        let slot = Slot::new(|_: &i32| {});

        let _connection = signal.connect(&slot).unwrap();
        assert!(matches!(
            signal.connect(&slot),
            Err(WiringError::AlreadyConnected)
        ));
    }

    #[test]
    fn test_duplicate_connect_via_clone_rejected() {
        let signal = Signal::<i32>::new();
        let slot = Slot::new(|_: &i32| {});
        let clone = slot.clone();

        let _connection = signal.connect(&slot).unwrap();
        assert!(matches!(
            signal.connect(&clone),
            Err(WiringError::AlreadyConnected)
        ));
    }

    #[test]
    fn test_reconnect_after_disconnect() {
        let signal = Signal::<i32>::new();
        let received = Arc::new(Mutex::new(Vec::new()));
        let slot = recording_slot(&received);

        let connection = signal.connect(&slot).unwrap();
        connection.disconnect();

        // The edge is gone, so connecting again is legal.
        let _connection = signal.connect(&slot).unwrap();
        signal.emit(9);
        assert_eq!(*received.lock(), vec![9]);
    }

    #[test]
    fn test_emit_in_connection_order() {
        let signal = Signal::<i32>::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let order_clone = order.clone();
            let slot = Slot::new(move |_: &i32| {
                order_clone.lock().push(tag);
            });
            signal.connect(&slot).unwrap();
        }

        signal.emit(0);

        assert_eq!(*order.lock(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_blocker_suppresses_exactly_its_scope() {
        let signal = Signal::<i32>::new();
        let received = Arc::new(Mutex::new(Vec::new()));

        let connection = signal.connect(&recording_slot(&received)).unwrap();

        signal.emit(1);
        {
            let _blocker = connection.blocker();
            signal.emit(2); // suppressed
        }
        signal.emit(3);

        assert_eq!(*received.lock(), vec![1, 3]);
        assert!(connection.is_connected());
    }

    #[test]
    fn test_blocker_blocks_single_edge_only() {
        let signal = Signal::<i32>::new();
        let first = Arc::new(Mutex::new(Vec::new()));
        let second = Arc::new(Mutex::new(Vec::new()));

        let first_connection = signal.connect(&recording_slot(&first)).unwrap();
        let _second_connection = signal.connect(&recording_slot(&second)).unwrap();

        let _blocker = first_connection.blocker();
        signal.emit(4);

        assert!(first.lock().is_empty());
        assert_eq!(*second.lock(), vec![4]);
    }

    #[test]
    fn test_nested_blockers() {
        let signal = Signal::<i32>::new();
        let received = Arc::new(Mutex::new(Vec::new()));

        let connection = signal.connect(&recording_slot(&received)).unwrap();

        let outer = connection.blocker();
        {
            let _inner = connection.blocker();
            signal.emit(1);
        }
        // The outer blocker is still alive.
        signal.emit(2);
        drop(outer);
        signal.emit(3);

        assert_eq!(*received.lock(), vec![3]);
    }

    #[test]
    fn test_blocker_released_on_panic() {
        let signal = Signal::<i32>::new();
        let received = Arc::new(Mutex::new(Vec::new()));

        let connection = signal.connect(&recording_slot(&received)).unwrap();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _blocker = connection.blocker();
            panic!("unwind through the blocker scope");
        }));
        assert!(result.is_err());

        // The unwind released the block.
        signal.emit(6);
        assert_eq!(*received.lock(), vec![6]);
    }

    #[test]
    fn test_multiple_connections() {
        let signal = Signal::<String>::new();
        let count = Arc::new(Mutex::new(0));

        for _ in 0..3 {
            let count_clone = count.clone();
            let slot = Slot::new(move |_: &String| {
                *count_clone.lock() += 1;
            });
            signal.connect(&slot).unwrap();
        }

        assert_eq!(signal.connection_count(), 3);
        signal.emit("test".to_string());
        assert_eq!(*count.lock(), 3);
    }

    #[test]
    fn test_disconnect_all() {
        let signal = Signal::<()>::new();

        for _ in 0..5 {
            signal.connect(&Slot::new(|_| {})).unwrap();
        }

        assert_eq!(signal.connection_count(), 5);
        signal.disconnect_all();
        assert_eq!(signal.connection_count(), 0);
    }

    #[test]
    fn test_emit_async_on_worker_is_fifo() {
        let worker = Arc::new(Worker::new());
        let signal = Signal::<i32>::new();
        let received = Arc::new(Mutex::new(Vec::new()));

        let received_clone = received.clone();
        let slot = Slot::with_worker(
            move |&value: &i32| {
                received_clone.lock().push(value);
            },
            worker.clone(),
        );
        signal.connect(&slot).unwrap();

        for i in 0..10 {
            signal.emit_async(i);
        }

        worker.stop();
        worker.join();

        assert_eq!(*received.lock(), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_emit_blocking_waits_for_worker() {
        let worker = Arc::new(Worker::new());
        let signal = Signal::<i32>::new();
        let done = Arc::new(AtomicBool::new(false));

        let done_clone = done.clone();
        let slot = Slot::with_worker(
            move |_: &i32| {
                std::thread::sleep(Duration::from_millis(20));
                done_clone.store(true, Ordering::SeqCst);
            },
            worker.clone(),
        );
        signal.connect(&slot).unwrap();

        signal.emit_blocking(1);
        assert!(done.load(Ordering::SeqCst));

        worker.stop_and_join();
    }

    #[test]
    fn test_emit_from_multiple_threads() {
        let signal = Arc::new(Signal::<i32>::new());
        let received = Arc::new(Mutex::new(Vec::new()));

        signal.connect(&recording_slot(&received)).unwrap();

        let mut handles = vec![];
        for i in 0..10 {
            let signal_clone = signal.clone();
            handles.push(std::thread::spawn(move || {
                signal_clone.emit(i);
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let values = received.lock();
        assert_eq!(values.len(), 10);
        for i in 0..10 {
            assert!(values.contains(&i), "Missing value {}", i);
        }
    }

    #[test]
    fn test_connect_any_type_mismatch() {
        let signal = Signal::<i32>::new();
        let slot = Slot::<String>::new(|_| {});

        let result = AnySignal::connect_any(&signal, &slot);
        assert!(matches!(result, Err(WiringError::TypeMismatch { .. })));
    }

    #[test]
    fn test_connect_any_matching_types() {
        let signal = Signal::<i32>::new();
        let received = Arc::new(Mutex::new(Vec::new()));
        let slot = recording_slot(&received);

        let _connection = AnySignal::connect_any(&signal, &slot).unwrap();
        signal.emit(12);
        assert_eq!(*received.lock(), vec![12]);
    }

    #[test]
    fn test_slot_can_disconnect_itself_during_emit() {
        let signal = Signal::<i32>::new();
        let received = Arc::new(Mutex::new(Vec::new()));
        let connection_cell: Arc<Mutex<Option<Connection>>> = Arc::new(Mutex::new(None));

        let received_clone = received.clone();
        let cell_clone = connection_cell.clone();
        let slot = Slot::new(move |&value: &i32| {
            received_clone.lock().push(value);
            if let Some(connection) = cell_clone.lock().take() {
                connection.disconnect();
            }
        });

        *connection_cell.lock() = Some(signal.connect(&slot).unwrap());

        signal.emit(1);
        signal.emit(2);

        assert_eq!(*received.lock(), vec![1]);
    }
}
