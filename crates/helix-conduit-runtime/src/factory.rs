//! Constructor registries for configuration-declared types.
//!
//! Configuration refers to services and data objects by textual type keys
//! (`type="imaging::negato_viewer"`). Applications register a constructor
//! per key at startup; the launcher instantiates through these registries
//! while walking a resolved configuration.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::object::DataObject;
use crate::service::Service;

type ServiceCtor = Box<dyn Fn() -> Box<dyn Service> + Send + Sync>;
type ObjectCtor = Box<dyn Fn() -> Arc<dyn DataObject> + Send + Sync>;

/// Registry mapping service type keys to constructors.
#[derive(Default)]
pub struct ServiceFactory {
    ctors: RwLock<HashMap<String, ServiceCtor>>,
}

impl ServiceFactory {
    /// Create an empty factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor under `kind`. Replaces (with a warning) any
    /// previous registration for the same key.
    pub fn register<F>(&self, kind: impl Into<String>, ctor: F)
    where
        F: Fn() -> Box<dyn Service> + Send + Sync + 'static,
    {
        let kind = kind.into();
        let mut ctors = self.ctors.write();
        if ctors.insert(kind.clone(), Box::new(ctor)).is_some() {
            tracing::warn!(
                target: "helix_conduit_runtime::factory",
                %kind,
                "service constructor replaced"
            );
        }
    }

    /// Instantiate a service of the given kind.
    pub fn create(&self, kind: &str) -> Option<Box<dyn Service>> {
        self.ctors.read().get(kind).map(|ctor| ctor())
    }

    /// Whether a constructor is registered under `kind`.
    pub fn contains(&self, kind: &str) -> bool {
        self.ctors.read().contains_key(kind)
    }
}

/// Registry mapping data-object type keys to constructors.
#[derive(Default)]
pub struct ObjectFactory {
    ctors: RwLock<HashMap<String, ObjectCtor>>,
}

impl ObjectFactory {
    /// Create an empty factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor under `kind`. Replaces (with a warning) any
    /// previous registration for the same key.
    pub fn register<F>(&self, kind: impl Into<String>, ctor: F)
    where
        F: Fn() -> Arc<dyn DataObject> + Send + Sync + 'static,
    {
        let kind = kind.into();
        let mut ctors = self.ctors.write();
        if ctors.insert(kind.clone(), Box::new(ctor)).is_some() {
            tracing::warn!(
                target: "helix_conduit_runtime::factory",
                %kind,
                "object constructor replaced"
            );
        }
    }

    /// Instantiate a data object of the given kind.
    pub fn create(&self, kind: &str) -> Option<Arc<dyn DataObject>> {
        self.ctors.read().get(kind).map(|ctor| ctor())
    }

    /// Whether a constructor is registered under `kind`.
    pub fn contains(&self, kind: &str) -> bool {
        self.ctors.read().contains_key(kind)
    }
}
