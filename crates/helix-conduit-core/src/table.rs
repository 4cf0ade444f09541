//! String-keyed endpoint tables.
//!
//! Services and data objects publish their signals and slots under stable
//! string keys; configuration and the runtime's proxy refer to endpoints by
//! those keys alone. Keys are declared in the owner's constructor, before
//! any configuration runs, and never change afterwards — the tables are
//! therefore built with `&mut` access and only read concurrently.

use std::collections::HashMap;
use std::sync::Arc;

use crate::signal::{AnySignal, Signal};
use crate::slot::{AnySlot, Slot};

/// A string-keyed map of published signals.
///
/// # Example
///
/// ```
/// use helix_conduit_core::{Signal, SignalTable};
///
/// let modified = Signal::<u64>::new();
///
/// let mut signals = SignalTable::new();
/// signals.insert("modified", &modified);
///
/// assert!(signals.get("modified").is_some());
/// let typed = signals.get_typed::<u64>("modified").unwrap();
/// assert_eq!(typed.id(), modified.id());
/// ```
#[derive(Default)]
pub struct SignalTable {
    entries: HashMap<String, Arc<dyn AnySignal>>,
}

impl SignalTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a signal under `key`. Replaces any previous entry.
    pub fn insert<Args: Clone + Send + 'static>(
        &mut self,
        key: impl Into<String>,
        signal: &Signal<Args>,
    ) {
        self.entries.insert(key.into(), Arc::new(signal.clone()));
    }

    /// Look up a signal by key.
    pub fn get(&self, key: &str) -> Option<&Arc<dyn AnySignal>> {
        self.entries.get(key)
    }

    /// Look up a signal by key, recovering its concrete argument type.
    ///
    /// Returns `None` when the key is unknown or the argument type differs.
    pub fn get_typed<Args: Clone + Send + 'static>(&self, key: &str) -> Option<Signal<Args>> {
        self.entries
            .get(key)?
            .as_any()
            .downcast_ref::<Signal<Args>>()
            .cloned()
    }

    /// Whether a signal is published under `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Iterate over the published keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of published signals.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A string-keyed map of published slots.
#[derive(Default)]
pub struct SlotTable {
    entries: HashMap<String, Arc<dyn AnySlot>>,
}

impl SlotTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a slot under `key`. Replaces any previous entry.
    pub fn insert<Args: Clone + Send + 'static>(
        &mut self,
        key: impl Into<String>,
        slot: &Slot<Args>,
    ) {
        self.entries.insert(key.into(), Arc::new(slot.clone()));
    }

    /// Look up a slot by key.
    pub fn get(&self, key: &str) -> Option<&Arc<dyn AnySlot>> {
        self.entries.get(key)
    }

    /// Look up a slot by key, recovering its concrete argument type.
    ///
    /// Returns `None` when the key is unknown or the argument type differs.
    pub fn get_typed<Args: Clone + Send + 'static>(&self, key: &str) -> Option<Slot<Args>> {
        self.entries
            .get(key)?
            .as_any()
            .downcast_ref::<Slot<Args>>()
            .cloned()
    }

    /// Whether a slot is published under `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Iterate over the published keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Bind every published slot to the given worker.
    ///
    /// Used when a whole service is affined to one worker.
    pub fn bind_worker(&self, worker: Option<Arc<crate::worker::Worker>>) {
        for slot in self.entries.values() {
            slot.bind_worker(worker.clone());
        }
    }

    /// Number of published slots.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
