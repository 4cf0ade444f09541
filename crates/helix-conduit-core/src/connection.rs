//! Connection handles: disconnectable, blockable references to one edge.

use std::fmt;
use std::sync::Arc;

/// Internal control surface for one signal→slot edge.
///
/// Implemented by the signal side; [`Connection`] and [`Blocker`] only talk
/// to edges through this trait, which keeps them free of the signal's
/// argument type.
pub(crate) trait EdgeHandle: Send + Sync {
    /// Remove the edge from its signal. Returns `false` when already gone.
    fn disconnect(&self) -> bool;

    /// Whether the edge is still registered on its signal.
    fn is_connected(&self) -> bool;

    /// Increment the edge's block count.
    fn block(&self);

    /// Decrement the edge's block count.
    fn unblock(&self);
}

/// A handle to one signal→slot edge.
///
/// `Connection` is a value object with reference semantics: clones refer to
/// the same underlying edge. It holds only a weak reference to the signal,
/// so a connection outliving its signal is harmless — `disconnect` simply
/// becomes a no-op.
///
/// # Example
///
/// ```
/// use helix_conduit_core::{Signal, Slot};
///
/// let signal = Signal::<i32>::new();
/// let slot = Slot::new(|_: &i32| {});
///
/// let connection = signal.connect(&slot).unwrap();
/// assert!(connection.is_connected());
///
/// connection.disconnect();
/// assert!(!connection.is_connected());
///
/// // Disconnecting again is a no-op.
/// connection.disconnect();
/// ```
#[derive(Clone)]
pub struct Connection {
    edge: Arc<dyn EdgeHandle>,
}

impl Connection {
    pub(crate) fn from_edge(edge: Arc<dyn EdgeHandle>) -> Self {
        Self { edge }
    }

    /// Remove the edge from its signal.
    ///
    /// Idempotent: returns `true` only the first time the edge is actually
    /// removed; later calls (or calls after the signal was dropped) return
    /// `false` and have no effect.
    pub fn disconnect(&self) -> bool {
        self.edge.disconnect()
    }

    /// Whether the edge is still registered on its signal.
    pub fn is_connected(&self) -> bool {
        self.edge.is_connected()
    }

    /// Suppress delivery over this edge for the returned guard's lifetime.
    ///
    /// While a [`Blocker`] is alive the edge remains registered but does
    /// not fire. Blockers nest: the edge fires again once every guard has
    /// been dropped. Dropping is what releases the block, so suppression
    /// ends deterministically even if the scope unwinds from a panic.
    pub fn blocker(&self) -> Blocker {
        Blocker::new(self.edge.clone())
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("connected", &self.is_connected())
            .finish()
    }
}

/// Scoped suppression of one connection.
///
/// Created via [`Connection::blocker`]. The edge stays registered but does
/// not fire while any blocker for it is alive.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use helix_conduit_core::{Signal, Slot};
///
/// let signal = Signal::<()>::new();
/// let hits = Arc::new(AtomicU32::new(0));
///
/// let hits_clone = hits.clone();
/// let slot = Slot::new(move |_: &()| {
///     hits_clone.fetch_add(1, Ordering::SeqCst);
/// });
/// let connection = signal.connect(&slot).unwrap();
///
/// signal.emit(());
/// {
///     let _blocker = connection.blocker();
///     signal.emit(()); // suppressed
/// }
/// signal.emit(());
///
/// assert_eq!(hits.load(Ordering::SeqCst), 2);
/// ```
#[must_use = "the connection is only blocked while the Blocker is alive"]
pub struct Blocker {
    edge: Arc<dyn EdgeHandle>,
}

impl Blocker {
    fn new(edge: Arc<dyn EdgeHandle>) -> Self {
        edge.block();
        Self { edge }
    }
}

impl Drop for Blocker {
    fn drop(&mut self) {
        self.edge.unblock();
    }
}

impl fmt::Debug for Blocker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blocker").finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(Connection: Send, Sync);
