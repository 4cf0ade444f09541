//! The assembled runtime: one handle bundling every registry.
//!
//! Nothing in the kernel is a process-global singleton; a [`Runtime`] is an
//! explicitly constructed bundle of registries shared by `Arc`, so several
//! independent runtimes can coexist (one per test, one per embedded
//! launcher). Cloning a `Runtime` clones the handles, not the registries.

use std::sync::Arc;

use crate::config::TemplateRegistry;
use crate::factory::{ObjectFactory, ServiceFactory};
use crate::launcher::AppConfigManager;
use crate::object::ObjectRegistry;
use crate::proxy::Proxy;
use crate::registry::ServiceRegistry;
use crate::workers::WorkerRegistry;

/// Shared handles to the runtime's registries.
///
/// # Example
///
/// ```
/// use helix_conduit_runtime::Runtime;
///
/// let runtime = Runtime::new();
/// runtime.service_factory.register("demo::noop", || unimplemented!());
/// assert!(runtime.service_factory.contains("demo::noop"));
/// runtime.shutdown();
/// ```
#[derive(Clone, Default)]
pub struct Runtime {
    /// Named configuration templates.
    pub templates: Arc<TemplateRegistry>,
    /// Live service instances.
    pub services: Arc<ServiceRegistry>,
    /// Live data objects.
    pub objects: Arc<ObjectRegistry>,
    /// Service constructors, keyed by type.
    pub service_factory: Arc<ServiceFactory>,
    /// Data-object constructors, keyed by type.
    pub object_factory: Arc<ObjectFactory>,
    /// The named-channel registry.
    pub proxy: Arc<Proxy>,
    /// Named long-lived workers.
    pub workers: Arc<WorkerRegistry>,
}

impl Runtime {
    /// Create a fresh, empty runtime.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a configuration manager bound to this runtime.
    pub fn config_manager(&self) -> AppConfigManager {
        AppConfigManager::new(self.clone())
    }

    /// Tear the runtime down: destroy remaining services (stopping started
    /// ones first) and drain every worker.
    ///
    /// Configuration instances are expected to have withdrawn their proxy
    /// channels already — the proxy asserts emptiness when it is finally
    /// dropped.
    pub fn shutdown(&self) {
        self.services.destroy_all();
        self.workers.shutdown_all();
    }
}
