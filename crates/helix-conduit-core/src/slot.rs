//! Slots: typed, bound receivers for signal deliveries.
//!
//! A [`Slot`] wraps a callable together with an optional [`Worker`] binding.
//! When a slot has no worker, invocations run on the caller's thread. When a
//! slot is bound to a worker, posted deliveries are marshalled onto that
//! worker's FIFO queue instead.
//!
//! Slots are cheap handles: cloning a slot yields a second handle to the
//! same underlying receiver, with the same identity. Identity is what the
//! duplicate-connection check of [`crate::Signal::connect`] and the
//! membership rules of the runtime's proxy operate on.

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::worker::{CompletionWaiter, Worker};

/// Global slot identity counter.
static NEXT_SLOT_ID: AtomicU64 = AtomicU64::new(1);

/// A process-unique identity for a slot.
///
/// All clones of a [`Slot`] share one `SlotId`; two independently created
/// slots never compare equal, even if they wrap the same function.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SlotId(u64);

impl SlotId {
    fn next() -> Self {
        Self(NEXT_SLOT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw numeric value, for diagnostics.
    pub fn as_raw(self) -> u64 {
        self.0
    }
}

struct SlotShared<Args> {
    id: SlotId,
    func: Box<dyn Fn(&Args) + Send + Sync>,
    worker: RwLock<Option<Arc<Worker>>>,
}

/// A typed receiver bound to a callable, optionally affined to a worker.
///
/// # Type Parameter
///
/// - `Args`: The argument type received from signals. Use `()` for slots
///   with no arguments, or a tuple like `(String, i32)` for several.
pub struct Slot<Args> {
    shared: Arc<SlotShared<Args>>,
}

impl<Args> Clone for Slot<Args> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<Args: Clone + Send + 'static> Slot<Args> {
    /// Create a slot from a callable with no worker binding.
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        Self {
            shared: Arc::new(SlotShared {
                id: SlotId::next(),
                func: Box::new(func),
                worker: RwLock::new(None),
            }),
        }
    }

    /// Create a slot bound to a worker.
    ///
    /// Posted deliveries will execute on the worker's thread, in FIFO order
    /// with everything else posted there.
    pub fn with_worker<F>(func: F, worker: Arc<Worker>) -> Self
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let slot = Self::new(func);
        slot.bind_worker(Some(worker));
        slot
    }

    /// The identity shared by all clones of this slot.
    pub fn id(&self) -> SlotId {
        self.shared.id
    }

    /// Bind (or unbind, with `None`) the worker this slot is affined to.
    pub fn bind_worker(&self, worker: Option<Arc<Worker>>) {
        *self.shared.worker.write() = worker;
    }

    /// The worker this slot is bound to, if any.
    pub fn worker(&self) -> Option<Arc<Worker>> {
        self.shared.worker.read().clone()
    }

    /// Invoke the callable inline, on the caller's thread.
    ///
    /// The worker binding is ignored; this is the synchronous invocation
    /// path used by [`crate::Signal::emit`].
    pub fn run(&self, args: &Args) {
        (self.shared.func)(args);
    }

    /// Schedule the callable on the bound worker, or run inline when unbound.
    ///
    /// Returns immediately. If the worker has already been stopped the
    /// delivery falls back to running inline, so emissions are never
    /// silently lost during shutdown.
    pub fn post(&self, args: Args) {
        let worker = self.worker();
        match worker {
            Some(worker) => {
                let shared = self.shared.clone();
                let fallback = args.clone();
                if !worker.post(move || (shared.func)(&args)) {
                    tracing::warn!(
                        target: "helix_conduit_core::worker",
                        slot = self.shared.id.as_raw(),
                        "worker unavailable for posted delivery, executing inline"
                    );
                    self.run(&fallback);
                }
            }
            None => self.run(&args),
        }
    }

    /// Schedule the callable on the bound worker and return a waiter.
    ///
    /// Returns `None` when the delivery ran inline (no worker, or the
    /// worker is no longer accepting tasks) and there is nothing to wait
    /// for.
    pub(crate) fn post_with_waiter(&self, args: Args) -> Option<CompletionWaiter> {
        let Some(worker) = self.worker() else {
            self.run(&args);
            return None;
        };
        let shared = self.shared.clone();
        let fallback = args.clone();
        match worker.post_with_waiter(move || (shared.func)(&args)) {
            Some(waiter) => Some(waiter),
            None => {
                tracing::warn!(
                    target: "helix_conduit_core::worker",
                    slot = self.shared.id.as_raw(),
                    "worker unavailable for blocking delivery, executing inline"
                );
                self.run(&fallback);
                None
            }
        }
    }
}

/// Type-erased slot handle for name-keyed wiring.
///
/// [`crate::SlotTable`] stores slots behind this trait so that signals and
/// slots declared by different services can be matched up by key without
/// either side knowing the other's concrete argument type. The runtime's
/// proxy relies on [`AnySlot::id`] for its duplicate-membership rule.
pub trait AnySlot: Send + Sync {
    /// The identity shared by all clones of the slot.
    fn id(&self) -> SlotId;

    /// Bind (or unbind) the worker this slot is affined to.
    fn bind_worker(&self, worker: Option<Arc<Worker>>);

    /// Get this as Any for downcasting to `Slot<Args>`.
    fn as_any(&self) -> &dyn Any;
}

impl<Args: Clone + Send + 'static> AnySlot for Slot<Args> {
    fn id(&self) -> SlotId {
        Slot::id(self)
    }

    fn bind_worker(&self, worker: Option<Arc<Worker>>) {
        Slot::bind_worker(self, worker);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

static_assertions::assert_impl_all!(Slot<i32>: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::time::Duration;

    #[test]
    fn test_run_inline() {
        let received = Arc::new(Mutex::new(Vec::new()));

        let received_clone = received.clone();
        let slot = Slot::new(move |&value: &i32| {
            received_clone.lock().push(value);
        });

        slot.run(&7);
        slot.run(&8);

        assert_eq!(*received.lock(), vec![7, 8]);
    }

    #[test]
    fn test_clone_shares_identity() {
        let slot = Slot::<()>::new(|_| {});
        let clone = slot.clone();
        assert_eq!(slot.id(), clone.id());

        let other = Slot::<()>::new(|_| {});
        assert_ne!(slot.id(), other.id());
    }

    #[test]
    fn test_post_without_worker_runs_inline() {
        let received = Arc::new(Mutex::new(Vec::new()));

        let received_clone = received.clone();
        let slot = Slot::new(move |&value: &i32| {
            received_clone.lock().push(value);
        });

        slot.post(3);
        assert_eq!(*received.lock(), vec![3]);
    }

    #[test]
    fn test_post_runs_on_worker_thread() {
        let worker = Arc::new(Worker::new());
        let seen_thread = Arc::new(Mutex::new(None));

        let seen_clone = seen_thread.clone();
        let slot = Slot::with_worker(
            move |_: &()| {
                *seen_clone.lock() = Some(std::thread::current().id());
            },
            worker.clone(),
        );

        slot.post(());

        worker.stop();
        worker.join();

        let seen = seen_thread.lock().expect("slot should have run");
        assert_ne!(seen, std::thread::current().id());
    }

    #[test]
    fn test_post_falls_back_after_worker_stop() {
        let worker = Arc::new(Worker::new());
        worker.stop_and_join();

        let received = Arc::new(Mutex::new(Vec::new()));
        let received_clone = received.clone();
        let slot = Slot::with_worker(
            move |&value: &i32| {
                received_clone.lock().push(value);
            },
            worker,
        );

        slot.post(11);
        assert_eq!(*received.lock(), vec![11]);
    }

    #[test]
    fn test_post_with_waiter_completes() {
        let worker = Arc::new(Worker::new());
        let received = Arc::new(Mutex::new(Vec::new()));

        let received_clone = received.clone();
        let slot = Slot::with_worker(
            move |&value: &i32| {
                std::thread::sleep(Duration::from_millis(10));
                received_clone.lock().push(value);
            },
            worker.clone(),
        );

        if let Some(waiter) = slot.post_with_waiter(5) {
            waiter.wait();
        }
        assert_eq!(*received.lock(), vec![5]);

        worker.stop_and_join();
    }
}
