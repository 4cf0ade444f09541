//! UID-keyed registry of managed services.
//!
//! The registry owns every service instance for its whole life: services
//! enter wrapped in a [`ManagedService`] and leave through [`destroy`]
//! (which enforces that started services were stopped first). Bulk teardown
//! runs in reverse registration order, matching the reverse-creation
//! ordering the configuration launcher relies on.
//!
//! [`destroy`]: ServiceRegistry::destroy

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::error::RuntimeError;
use crate::service::{ManagedService, Service};

#[derive(Default)]
struct ServiceMap {
    entries: HashMap<String, Arc<Mutex<ManagedService>>>,
    /// Registration order; bulk operations walk this (reversed for
    /// teardown).
    order: Vec<String>,
}

/// Registry of all live service instances, keyed by UID.
///
/// Entries are `Arc<Mutex<ManagedService>>`: lifecycle driving takes the
/// service lock, endpoint resolution clones the `Arc` handles out and
/// releases it. Holding a service lock while emitting one of that
/// service's own signals synchronously is the caller's deadlock to avoid,
/// as with any re-entrant delivery.
#[derive(Default)]
pub struct ServiceRegistry {
    services: RwLock<ServiceMap>,
}

impl ServiceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap and register a service implementation under `uid`.
    ///
    /// Fails with [`RuntimeError::DuplicateUid`] when the UID is taken.
    pub fn register(
        &self,
        uid: impl Into<String>,
        service: Box<dyn Service>,
    ) -> Result<Arc<Mutex<ManagedService>>, RuntimeError> {
        let uid = uid.into();
        let mut services = self.services.write();
        if services.entries.contains_key(&uid) {
            return Err(RuntimeError::DuplicateUid(uid));
        }
        let managed = Arc::new(Mutex::new(ManagedService::new(uid.clone(), service)));
        services.entries.insert(uid.clone(), managed.clone());
        services.order.push(uid.clone());
        tracing::debug!(target: "helix_conduit_runtime::registry", %uid, "registered service");
        Ok(managed)
    }

    /// Look up a service by UID.
    pub fn get(&self, uid: &str) -> Option<Arc<Mutex<ManagedService>>> {
        self.services.read().entries.get(uid).cloned()
    }

    /// Look up a service by UID, failing with a typed error.
    pub fn expect(&self, uid: &str) -> Result<Arc<Mutex<ManagedService>>, RuntimeError> {
        self.get(uid)
            .ok_or_else(|| RuntimeError::UnknownService(uid.to_string()))
    }

    /// Whether a service is registered under `uid`.
    pub fn contains(&self, uid: &str) -> bool {
        self.services.read().entries.contains_key(uid)
    }

    /// Destroy the service registered under `uid` and remove it.
    ///
    /// # Panics
    ///
    /// Panics (via [`ManagedService::destroy`]) when the service is still
    /// started — the registry never auto-stops.
    pub fn destroy(&self, uid: &str) -> Result<(), RuntimeError> {
        let managed = self.expect(uid)?;
        managed.lock().destroy();

        let mut services = self.services.write();
        services.entries.remove(uid);
        services.order.retain(|entry| entry != uid);
        tracing::debug!(target: "helix_conduit_runtime::registry", %uid, "removed service");
        Ok(())
    }

    /// Stop every started service, in reverse registration order.
    ///
    /// Stop failures are logged and do not abort the sweep; teardown always
    /// reaches every service.
    pub fn stop_all(&self) {
        for managed in self.snapshot_reversed() {
            let mut managed = managed.lock();
            if managed.state() == crate::service::ServiceState::Started {
                if let Err(error) = managed.stop() {
                    tracing::error!(
                        target: "helix_conduit_runtime::registry",
                        uid = %managed.uid(),
                        %error,
                        "service failed to stop during bulk teardown"
                    );
                }
            }
        }
    }

    /// Destroy every service, in reverse registration order.
    ///
    /// Services still started are stopped first via [`stop_all`]'s
    /// per-service path; this is the registry's end-of-life sweep.
    ///
    /// [`stop_all`]: ServiceRegistry::stop_all
    pub fn destroy_all(&self) {
        self.stop_all();
        let drained: Vec<Arc<Mutex<ManagedService>>> = {
            let mut services = self.services.write();
            let drained = services
                .order
                .iter()
                .rev()
                .filter_map(|uid| services.entries.get(uid).cloned())
                .collect();
            services.entries.clear();
            services.order.clear();
            drained
        };
        for managed in drained {
            managed.lock().destroy();
        }
    }

    /// UIDs in registration order.
    pub fn uids(&self) -> Vec<String> {
        self.services.read().order.clone()
    }

    /// Number of registered services.
    pub fn len(&self) -> usize {
        self.services.read().entries.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.services.read().entries.is_empty()
    }

    fn snapshot_reversed(&self) -> Vec<Arc<Mutex<ManagedService>>> {
        let services = self.services.read();
        services
            .order
            .iter()
            .rev()
            .filter_map(|uid| services.entries.get(uid).cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigNode;
    use crate::service::ServiceResult;
    use helix_conduit_core::{SignalTable, SlotTable};

    struct Ordered {
        tag: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
        signals: SignalTable,
        slots: SlotTable,
    }

    impl Ordered {
        fn new(tag: &'static str, log: Arc<Mutex<Vec<&'static str>>>) -> Box<dyn Service> {
            Box::new(Self {
                tag,
                log,
                signals: SignalTable::new(),
                slots: SlotTable::new(),
            })
        }
    }

    impl Service for Ordered {
        fn configuring(&mut self, _config: &ConfigNode) -> ServiceResult {
            Ok(())
        }

        fn starting(&mut self) -> ServiceResult {
            Ok(())
        }

        fn updating(&mut self) -> ServiceResult {
            Ok(())
        }

        fn stopping(&mut self) -> ServiceResult {
            self.log.lock().push(self.tag);
            Ok(())
        }

        fn signals(&self) -> &SignalTable {
            &self.signals
        }

        fn slots(&self) -> &SlotTable {
            &self.slots
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = ServiceRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        registry.register("a", Ordered::new("a", log.clone())).unwrap();
        assert!(registry.contains("a"));
        assert!(registry.get("a").is_some());
        assert!(registry.get("b").is_none());
        assert!(matches!(
            registry.expect("b"),
            Err(RuntimeError::UnknownService(_))
        ));
    }

    #[test]
    fn test_duplicate_uid_rejected() {
        let registry = ServiceRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        registry.register("a", Ordered::new("a", log.clone())).unwrap();
        assert!(matches!(
            registry.register("a", Ordered::new("a", log)),
            Err(RuntimeError::DuplicateUid(_))
        ));
    }

    #[test]
    fn test_stop_all_reverse_order() {
        let registry = ServiceRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        for tag in ["a", "b", "c"] {
            let managed = registry.register(tag, Ordered::new(tag, log.clone())).unwrap();
            let mut managed = managed.lock();
            managed.configure(&ConfigNode::new("config")).unwrap();
            managed.start().unwrap();
        }

        registry.stop_all();

        assert_eq!(*log.lock(), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_destroy_all_clears_registry() {
        let registry = ServiceRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        for tag in ["a", "b"] {
            let managed = registry.register(tag, Ordered::new(tag, log.clone())).unwrap();
            let mut managed = managed.lock();
            managed.configure(&ConfigNode::new("config")).unwrap();
            managed.start().unwrap();
        }

        registry.destroy_all();

        assert!(registry.is_empty());
        assert_eq!(*log.lock(), vec!["b", "a"]);
    }

    #[test]
    #[should_panic(expected = "stop it before destroying")]
    fn test_destroy_started_service_panics() {
        let registry = ServiceRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let managed = registry.register("a", Ordered::new("a", log)).unwrap();
        {
            let mut managed = managed.lock();
            managed.configure(&ConfigNode::new("config")).unwrap();
            managed.start().unwrap();
        }

        let _ = registry.destroy("a");
    }

    #[test]
    fn test_destroy_removes_entry() {
        let registry = ServiceRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        registry.register("a", Ordered::new("a", log)).unwrap();
        registry.destroy("a").unwrap();

        assert!(!registry.contains("a"));
        assert!(matches!(
            registry.destroy("a"),
            Err(RuntimeError::UnknownService(_))
        ));
    }
}
