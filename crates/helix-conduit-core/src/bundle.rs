//! Batch connection ownership for service lifecycles.
//!
//! A service makes its signal/slot connections when it starts and must undo
//! every one of them when it stops. [`ConnectionBundle`] owns that batch:
//! connections are recorded as they are made, torn down as a group in
//! reverse order, and guaranteed to be released when the bundle is dropped,
//! whatever the exit path.

use crate::connection::Connection;
use crate::error::WiringError;
use crate::table::{SignalTable, SlotTable};

/// A batch of [`Connection`]s owned by one service instance.
///
/// Recoverable wiring failures — unknown keys, duplicate edges, argument
/// type mismatches — are logged and skipped so that one bad entry never
/// aborts the sibling connections of the same batch.
///
/// # Example
///
/// ```
/// use helix_conduit_core::{ConnectionBundle, Signal, SignalTable, Slot, SlotTable};
///
/// let modified = Signal::<u64>::new();
/// let mut signals = SignalTable::new();
/// signals.insert("modified", &modified);
///
/// let refresh = Slot::new(|_: &u64| { /* recompute */ });
/// let mut slots = SlotTable::new();
/// slots.insert("update", &refresh);
///
/// let mut bundle = ConnectionBundle::new();
/// bundle.connect(&signals, "modified", &slots, "update");
/// assert_eq!(bundle.len(), 1);
///
/// // Tears everything down in reverse connection order.
/// bundle.disconnect();
/// ```
#[derive(Default)]
pub struct ConnectionBundle {
    connections: Vec<Connection>,
}

impl ConnectionBundle {
    /// Create an empty bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an already-established connection.
    pub fn add(&mut self, connection: Connection) {
        self.connections.push(connection);
    }

    /// Wire the named signal to the named slot and record the connection.
    ///
    /// Unknown keys, a duplicate edge, or an argument-type mismatch are
    /// logged at `warn` level and skipped; the bundle and any subsequent
    /// connect calls are unaffected.
    pub fn connect(
        &mut self,
        signals: &SignalTable,
        signal_key: &str,
        slots: &SlotTable,
        slot_key: &str,
    ) {
        match Self::wire(signals, signal_key, slots, slot_key) {
            Ok(connection) => self.connections.push(connection),
            Err(error) => {
                tracing::warn!(
                    target: "helix_conduit_core::bundle",
                    signal = signal_key,
                    slot = slot_key,
                    %error,
                    "skipping connection"
                );
            }
        }
    }

    /// Wire a list of (signal key, slot key) pairs between the same owners.
    pub fn connect_pairs(
        &mut self,
        signals: &SignalTable,
        slots: &SlotTable,
        pairs: &[(&str, &str)],
    ) {
        for &(signal_key, slot_key) in pairs {
            self.connect(signals, signal_key, slots, slot_key);
        }
    }

    fn wire(
        signals: &SignalTable,
        signal_key: &str,
        slots: &SlotTable,
        slot_key: &str,
    ) -> Result<Connection, WiringError> {
        let signal = signals
            .get(signal_key)
            .ok_or_else(|| WiringError::BadSignal(signal_key.to_string()))?;
        let slot = slots
            .get(slot_key)
            .ok_or_else(|| WiringError::BadSlot(slot_key.to_string()))?;
        signal.connect_any(&**slot)
    }

    /// Disconnect every recorded connection, newest first, and clear the
    /// list.
    ///
    /// Reverse order matches destructor-unwind expectations of dependent
    /// services. Idempotent: a second call finds the list empty and does
    /// nothing.
    pub fn disconnect(&mut self) {
        for connection in self.connections.drain(..).rev() {
            connection.disconnect();
        }
    }

    /// Number of recorded connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Whether the bundle holds no connections.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl Drop for ConnectionBundle {
    fn drop(&mut self) {
        self.disconnect();
    }
}
