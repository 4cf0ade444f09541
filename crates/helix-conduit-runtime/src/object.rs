//! Data objects and the UID-keyed object registry.
//!
//! Data objects (images, meshes, series, transforms in the consuming
//! framework) are passive holders of shared state. The kernel cares about
//! two things only: each object is reachable by UID, and each object
//! publishes signals — typically a `"modified"` signal — that services
//! subscribe to through auto-connections or proxy channels.
//!
//! Concurrent mutation of one object from two threads without external
//! locking is out of contract; objects are single-writer unless the caller
//! wraps them in its own lock.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use helix_conduit_core::SignalTable;
use parking_lot::RwLock;

use crate::error::RuntimeError;

/// A shared data object participating in signal wiring.
pub trait DataObject: Any + Send + Sync {
    /// The signals this object publishes, keyed by name.
    fn signals(&self) -> &SignalTable;
}

/// UID-keyed registry of shared data objects.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use helix_conduit_core::{Signal, SignalTable};
/// use helix_conduit_runtime::{DataObject, ObjectRegistry};
///
/// struct Image {
///     signals: SignalTable,
/// }
///
/// impl Image {
///     fn new() -> Self {
///         let mut signals = SignalTable::new();
///         signals.insert("modified", &Signal::<()>::new());
///         Self { signals }
///     }
/// }
///
/// impl DataObject for Image {
///     fn signals(&self) -> &SignalTable { &self.signals }
/// }
///
/// let registry = ObjectRegistry::new();
/// registry.register("image", Arc::new(Image::new())).unwrap();
/// assert!(registry.get("image").is_some());
/// assert!(registry.get_typed::<Image>("image").is_some());
/// ```
#[derive(Default)]
pub struct ObjectRegistry {
    objects: RwLock<HashMap<String, Arc<dyn DataObject>>>,
}

impl ObjectRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an object under `uid`.
    ///
    /// Fails with [`RuntimeError::DuplicateUid`] when the UID is taken.
    pub fn register(
        &self,
        uid: impl Into<String>,
        object: Arc<dyn DataObject>,
    ) -> Result<(), RuntimeError> {
        let uid = uid.into();
        let mut objects = self.objects.write();
        if objects.contains_key(&uid) {
            return Err(RuntimeError::DuplicateUid(uid));
        }
        tracing::debug!(target: "helix_conduit_runtime::object", %uid, "registered object");
        objects.insert(uid, object);
        Ok(())
    }

    /// Remove and return the object registered under `uid`.
    pub fn unregister(&self, uid: &str) -> Option<Arc<dyn DataObject>> {
        let removed = self.objects.write().remove(uid);
        if removed.is_some() {
            tracing::debug!(target: "helix_conduit_runtime::object", %uid, "unregistered object");
        }
        removed
    }

    /// Look up an object by UID.
    pub fn get(&self, uid: &str) -> Option<Arc<dyn DataObject>> {
        self.objects.read().get(uid).cloned()
    }

    /// Look up an object by UID, failing with a typed error.
    pub fn expect(&self, uid: &str) -> Result<Arc<dyn DataObject>, RuntimeError> {
        self.get(uid)
            .ok_or_else(|| RuntimeError::UnknownObject(uid.to_string()))
    }

    /// Look up an object by UID and downcast it to its concrete type.
    pub fn get_typed<T: DataObject>(&self, uid: &str) -> Option<Arc<T>> {
        let object = self.get(uid)?;
        let any: Arc<dyn Any + Send + Sync> = object;
        any.downcast::<T>().ok()
    }

    /// Whether an object is registered under `uid`.
    pub fn contains(&self, uid: &str) -> bool {
        self.objects.read().contains_key(uid)
    }

    /// Number of registered objects.
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}
