//! Named channel registry for indirect signal/slot wiring.
//!
//! A [`Proxy`] lets N signals reach M slots through a shared string key
//! without either side holding a reference to the other. Every signal in a
//! channel is connected to every slot in that channel; adding a member wires
//! it against all existing members of the opposite set, removing a member
//! tears its edges down.
//!
//! The proxy is an explicitly constructed registry shared via `Arc` — there
//! is deliberately no process-global instance, so tests and embedded
//! launchers can run isolated registries side by side.
//!
//! # Locking
//!
//! A read/write lock protects the channel map itself (concurrent lookups,
//! serialized insert/erase); each channel carries its own mutex over the
//! member sets, so connect/disconnect on different channels never contend.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use helix_conduit_core::{Signal, Slot};
//! use helix_conduit_runtime::Proxy;
//!
//! let proxy = Proxy::new();
//!
//! let signal = Signal::<i32>::new();
//! let slot = Slot::new(|&n: &i32| println!("got {n}"));
//!
//! proxy.connect_signal("channel", Arc::new(signal.clone()));
//! proxy.connect_slot("channel", Arc::new(slot.clone()));
//!
//! signal.emit(42); // reaches the slot through the channel
//!
//! proxy.disconnect_signal("channel", signal.id());
//! proxy.disconnect_slot("channel", slot.id());
//! // Both sets are now empty, so the channel itself is gone.
//! assert!(!proxy.has_channel("channel"));
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use helix_conduit_core::{AnySignal, AnySlot, Connection, SignalId, SlotId};
use parking_lot::{Mutex, RwLock};

/// One fully-wired edge inside a channel.
struct ChannelEdge {
    signal: SignalId,
    slot: SlotId,
    connection: Connection,
}

/// Member sets and edges of one channel, guarded by the channel mutex.
#[derive(Default)]
struct ChannelWires {
    signals: Vec<Arc<dyn AnySignal>>,
    slots: Vec<Arc<dyn AnySlot>>,
    edges: Vec<ChannelEdge>,
}

impl ChannelWires {
    fn is_empty(&self) -> bool {
        self.signals.is_empty() && self.slots.is_empty()
    }
}

struct Channel {
    wires: Mutex<ChannelWires>,
}

impl Channel {
    fn new() -> Self {
        Self {
            wires: Mutex::new(ChannelWires::default()),
        }
    }
}

/// Registry of named channels wiring signals to slots indirectly.
///
/// Dropping a proxy that still holds channels is a leaked-connection bug in
/// the owner and fails loudly — every configuration is expected to tear its
/// channels down before the registry goes away.
#[derive(Default)]
pub struct Proxy {
    channels: RwLock<HashMap<String, Arc<Channel>>>,
}

impl Proxy {
    /// Create an empty proxy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a signal to a channel, creating the channel on demand.
    ///
    /// The signal is wired to every slot currently in the channel. Adding a
    /// signal that is already a member (same [`SignalId`]) is a no-op;
    /// the return value tells whether the signal was actually inserted.
    pub fn connect_signal(&self, channel: &str, signal: Arc<dyn AnySignal>) -> bool {
        let entry = self.channel_or_insert(channel);
        let mut wires = entry.wires.lock();
        let wires = &mut *wires;

        if wires.signals.iter().any(|s| s.id() == signal.id()) {
            tracing::trace!(
                target: "helix_conduit_runtime::proxy",
                channel,
                "signal already connected to channel"
            );
            return false;
        }

        for slot in &wires.slots {
            match signal.connect_any(&**slot) {
                Ok(connection) => wires.edges.push(ChannelEdge {
                    signal: signal.id(),
                    slot: slot.id(),
                    connection,
                }),
                Err(error) => {
                    tracing::warn!(
                        target: "helix_conduit_runtime::proxy",
                        channel,
                        %error,
                        "skipping channel edge"
                    );
                }
            }
        }
        wires.signals.push(signal);
        true
    }

    /// Add a slot to a channel, creating the channel on demand.
    ///
    /// The slot is wired to every signal currently in the channel. Adding a
    /// slot that is already a member (same [`SlotId`]) is a no-op; the
    /// return value tells whether the slot was actually inserted.
    pub fn connect_slot(&self, channel: &str, slot: Arc<dyn AnySlot>) -> bool {
        let entry = self.channel_or_insert(channel);
        let mut wires = entry.wires.lock();
        let wires = &mut *wires;

        if wires.slots.iter().any(|s| s.id() == slot.id()) {
            tracing::trace!(
                target: "helix_conduit_runtime::proxy",
                channel,
                "slot already connected to channel"
            );
            return false;
        }

        for signal in &wires.signals {
            match signal.connect_any(&*slot) {
                Ok(connection) => wires.edges.push(ChannelEdge {
                    signal: signal.id(),
                    slot: slot.id(),
                    connection,
                }),
                Err(error) => {
                    tracing::warn!(
                        target: "helix_conduit_runtime::proxy",
                        channel,
                        %error,
                        "skipping channel edge"
                    );
                }
            }
        }
        wires.slots.push(slot);
        true
    }

    /// Remove a signal from a channel, disconnecting its edges.
    ///
    /// When both member sets become empty the channel is erased from the
    /// registry; reconnecting under the same key later starts from a fresh
    /// channel.
    ///
    /// # Panics
    ///
    /// Panics when the channel does not exist or the signal is not a member
    /// — disconnecting something that was never connected is a programming
    /// error, not a recoverable condition.
    pub fn disconnect_signal(&self, channel: &str, signal: SignalId) {
        let entry = self
            .channel(channel)
            .unwrap_or_else(|| panic!("proxy channel '{channel}' is not registered"));

        let emptied = {
            let mut wires = entry.wires.lock();
            let position = wires
                .signals
                .iter()
                .position(|s| s.id() == signal)
                .unwrap_or_else(|| {
                    panic!("signal is not connected to proxy channel '{channel}'")
                });
            wires.signals.remove(position);
            wires.edges.retain(|edge| {
                if edge.signal == signal {
                    edge.connection.disconnect();
                    false
                } else {
                    true
                }
            });
            wires.is_empty()
        };

        if emptied {
            self.erase_if_empty(channel);
        }
    }

    /// Remove a slot from a channel, disconnecting its edges.
    ///
    /// # Panics
    ///
    /// Panics when the channel does not exist or the slot is not a member.
    pub fn disconnect_slot(&self, channel: &str, slot: SlotId) {
        let entry = self
            .channel(channel)
            .unwrap_or_else(|| panic!("proxy channel '{channel}' is not registered"));

        let emptied = {
            let mut wires = entry.wires.lock();
            let position = wires
                .slots
                .iter()
                .position(|s| s.id() == slot)
                .unwrap_or_else(|| {
                    panic!("slot is not connected to proxy channel '{channel}'")
                });
            wires.slots.remove(position);
            wires.edges.retain(|edge| {
                if edge.slot == slot {
                    edge.connection.disconnect();
                    false
                } else {
                    true
                }
            });
            wires.is_empty()
        };

        if emptied {
            self.erase_if_empty(channel);
        }
    }

    /// Whether a channel currently exists.
    pub fn has_channel(&self, channel: &str) -> bool {
        self.channels.read().contains_key(channel)
    }

    /// Number of live channels.
    pub fn channel_count(&self) -> usize {
        self.channels.read().len()
    }

    fn channel(&self, channel: &str) -> Option<Arc<Channel>> {
        self.channels.read().get(channel).cloned()
    }

    fn channel_or_insert(&self, channel: &str) -> Arc<Channel> {
        if let Some(existing) = self.channel(channel) {
            return existing;
        }
        let mut channels = self.channels.write();
        channels
            .entry(channel.to_string())
            .or_insert_with(|| Arc::new(Channel::new()))
            .clone()
    }

    /// Erase the channel if it is still empty.
    ///
    /// Re-checked under the map write lock: a concurrent connect may have
    /// repopulated the channel between the caller's check and this erase.
    fn erase_if_empty(&self, channel: &str) {
        let mut channels = self.channels.write();
        let still_empty = channels
            .get(channel)
            .is_some_and(|entry| entry.wires.lock().is_empty());
        if still_empty {
            channels.remove(channel);
            tracing::trace!(
                target: "helix_conduit_runtime::proxy",
                channel,
                "erased empty channel"
            );
        }
    }
}

impl Drop for Proxy {
    fn drop(&mut self) {
        let channels = self.channels.get_mut();
        if !channels.is_empty() && !std::thread::panicking() {
            let leaked: Vec<&String> = channels.keys().collect();
            panic!("proxy dropped with live channels (leaked connections): {leaked:?}");
        }
    }
}

static_assertions::assert_impl_all!(Proxy: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use helix_conduit_core::{Signal, Slot};
    use std::sync::Mutex as StdMutex;

    fn recording_slot(sink: &Arc<StdMutex<Vec<i32>>>) -> Slot<i32> {
        let sink = sink.clone();
        Slot::new(move |&value: &i32| {
            sink.lock().unwrap().push(value);
        })
    }

    #[test]
    fn test_emit_reaches_all_listeners() {
        // One signal, two slots, one channel: both slots fire once.
        let proxy = Proxy::new();
        let signal = Signal::<i32>::new();
        let first = Arc::new(StdMutex::new(Vec::new()));
        let second = Arc::new(StdMutex::new(Vec::new()));
        let first_slot = recording_slot(&first);
        let second_slot = recording_slot(&second);

        proxy.connect_signal("x", Arc::new(signal.clone()));
        proxy.connect_slot("x", Arc::new(first_slot.clone()));
        proxy.connect_slot("x", Arc::new(second_slot.clone()));

        signal.emit(42);

        assert_eq!(*first.lock().unwrap(), vec![42]);
        assert_eq!(*second.lock().unwrap(), vec![42]);

        proxy.disconnect_signal("x", signal.id());
        proxy.disconnect_slot("x", first_slot.id());
        proxy.disconnect_slot("x", second_slot.id());
    }

    #[test]
    fn test_connect_order_does_not_matter() {
        // Slots first, then the signal: same delivery.
        let proxy = Proxy::new();
        let signal = Signal::<i32>::new();
        let received = Arc::new(StdMutex::new(Vec::new()));
        let slot = recording_slot(&received);

        proxy.connect_slot("x", Arc::new(slot.clone()));
        proxy.connect_signal("x", Arc::new(signal.clone()));

        signal.emit(7);
        assert_eq!(*received.lock().unwrap(), vec![7]);

        proxy.disconnect_slot("x", slot.id());
        proxy.disconnect_signal("x", signal.id());
    }

    #[test]
    fn test_disconnected_slot_stops_receiving() {
        // After disconnecting one slot, only the other fires.
        let proxy = Proxy::new();
        let signal = Signal::<i32>::new();
        let first = Arc::new(StdMutex::new(Vec::new()));
        let second = Arc::new(StdMutex::new(Vec::new()));
        let first_slot = recording_slot(&first);
        let second_slot = recording_slot(&second);

        proxy.connect_signal("x", Arc::new(signal.clone()));
        proxy.connect_slot("x", Arc::new(first_slot.clone()));
        proxy.connect_slot("x", Arc::new(second_slot.clone()));

        proxy.disconnect_slot("x", first_slot.id());
        signal.emit(7);

        assert!(first.lock().unwrap().is_empty());
        assert_eq!(*second.lock().unwrap(), vec![7]);

        proxy.disconnect_signal("x", signal.id());
        proxy.disconnect_slot("x", second_slot.id());
    }

    #[test]
    fn test_channel_gc() {
        // The channel survives while one side remains, and is erased once
        // both sets are empty.
        let proxy = Proxy::new();
        let signal = Signal::<i32>::new();
        let slot = Slot::new(|_: &i32| {});

        proxy.connect_signal("x", Arc::new(signal.clone()));
        proxy.connect_slot("x", Arc::new(slot.clone()));

        proxy.disconnect_slot("x", slot.id());
        // One signal, zero slots: not yet empty.
        assert!(proxy.has_channel("x"));

        proxy.disconnect_signal("x", signal.id());
        assert!(!proxy.has_channel("x"));
        assert_eq!(proxy.channel_count(), 0);

        // Reconnecting under the same key starts a fresh, empty channel.
        proxy.connect_signal("x", Arc::new(signal.clone()));
        assert!(proxy.has_channel("x"));
        proxy.disconnect_signal("x", signal.id());
    }

    #[test]
    fn test_duplicate_signal_connect_is_noop() {
        // Connecting the same signal twice delivers once per emit.
        let proxy = Proxy::new();
        let signal = Signal::<i32>::new();
        let received = Arc::new(StdMutex::new(Vec::new()));
        let slot = recording_slot(&received);

        proxy.connect_signal("x", Arc::new(signal.clone()));
        proxy.connect_signal("x", Arc::new(signal.clone()));
        proxy.connect_slot("x", Arc::new(slot.clone()));

        signal.emit(1);
        assert_eq!(*received.lock().unwrap(), vec![1]);

        proxy.disconnect_signal("x", signal.id());
        proxy.disconnect_slot("x", slot.id());
    }

    #[test]
    fn test_duplicate_slot_connect_is_noop() {
        let proxy = Proxy::new();
        let signal = Signal::<i32>::new();
        let received = Arc::new(StdMutex::new(Vec::new()));
        let slot = recording_slot(&received);

        proxy.connect_signal("x", Arc::new(signal.clone()));
        proxy.connect_slot("x", Arc::new(slot.clone()));
        proxy.connect_slot("x", Arc::new(slot.clone()));

        signal.emit(2);
        assert_eq!(*received.lock().unwrap(), vec![2]);

        proxy.disconnect_signal("x", signal.id());
        proxy.disconnect_slot("x", slot.id());
    }

    #[test]
    fn test_channels_are_independent() {
        let proxy = Proxy::new();
        let signal = Signal::<i32>::new();
        let received = Arc::new(StdMutex::new(Vec::new()));
        let slot = recording_slot(&received);

        proxy.connect_signal("a", Arc::new(signal.clone()));
        proxy.connect_slot("b", Arc::new(slot.clone()));

        // Different channels: no edge between them.
        signal.emit(3);
        assert!(received.lock().unwrap().is_empty());

        proxy.disconnect_signal("a", signal.id());
        proxy.disconnect_slot("b", slot.id());
    }

    #[test]
    #[should_panic(expected = "is not registered")]
    fn test_disconnect_unknown_channel_panics() {
        let proxy = Proxy::new();
        let signal = Signal::<i32>::new();
        proxy.disconnect_signal("nope", signal.id());
    }

    #[test]
    #[should_panic(expected = "is not connected to proxy channel")]
    fn test_disconnect_unknown_member_panics() {
        let proxy = Proxy::new();
        let member = Signal::<i32>::new();
        let stranger = Signal::<i32>::new();

        proxy.connect_signal("x", Arc::new(member.clone()));
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            proxy.disconnect_signal("x", stranger.id());
        }));
        // Clean up so the proxy drop assertion does not fire as well.
        proxy.disconnect_signal("x", member.id());
        if let Err(payload) = result {
            std::panic::resume_unwind(payload);
        }
    }

    #[test]
    #[should_panic(expected = "leaked connections")]
    fn test_drop_with_live_channels_panics() {
        let proxy = Proxy::new();
        let signal = Signal::<i32>::new();
        proxy.connect_signal("x", Arc::new(signal.clone()));
        drop(proxy);
    }

    #[test]
    fn test_concurrent_distinct_channels() {
        let proxy = Arc::new(Proxy::new());

        let mut handles = vec![];
        for i in 0..8 {
            let proxy_clone = proxy.clone();
            handles.push(std::thread::spawn(move || {
                let channel = format!("channel-{i}");
                let signal = Signal::<i32>::new();
                let slot = Slot::new(|_: &i32| {});
                for _ in 0..50 {
                    proxy_clone.connect_signal(&channel, Arc::new(signal.clone()));
                    proxy_clone.connect_slot(&channel, Arc::new(slot.clone()));
                    proxy_clone.disconnect_signal(&channel, signal.id());
                    proxy_clone.disconnect_slot(&channel, slot.id());
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(proxy.channel_count(), 0);
    }
}
