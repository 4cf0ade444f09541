//! Named long-lived workers.
//!
//! Applications keep a small set of execution queues alive for the whole
//! session: a `"default"` worker that UI-affine services share, plus ad hoc
//! workers for I/O-heavy services (network push/pull, file writing). The
//! registry hands out `Arc<Worker>` handles by name, spawning on first
//! request, and drains everything in reverse creation order at shutdown.

use std::collections::HashMap;
use std::sync::Arc;

use helix_conduit_core::{Worker, WorkerBuilder};
use parking_lot::Mutex;

/// Name of the worker UI-affine services share by default.
pub const DEFAULT_WORKER: &str = "default";

#[derive(Default)]
struct WorkerMap {
    workers: HashMap<String, Arc<Worker>>,
    order: Vec<String>,
}

/// Registry of named workers.
#[derive(Default)]
pub struct WorkerRegistry {
    map: Mutex<WorkerMap>,
}

impl WorkerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the worker registered under `name`, spawning it on first use.
    pub fn get_or_spawn(&self, name: &str) -> Arc<Worker> {
        let mut map = self.map.lock();
        if let Some(worker) = map.workers.get(name) {
            return worker.clone();
        }
        let worker = Arc::new(WorkerBuilder::new().name(name).build());
        map.workers.insert(name.to_string(), worker.clone());
        map.order.push(name.to_string());
        tracing::debug!(target: "helix_conduit_runtime::workers", %name, "spawned worker");
        worker
    }

    /// Get the worker registered under `name`, if it has been spawned.
    pub fn get(&self, name: &str) -> Option<Arc<Worker>> {
        self.map.lock().workers.get(name).cloned()
    }

    /// The shared default worker.
    pub fn default_worker(&self) -> Arc<Worker> {
        self.get_or_spawn(DEFAULT_WORKER)
    }

    /// Number of spawned workers.
    pub fn len(&self) -> usize {
        self.map.lock().workers.len()
    }

    /// Whether no workers have been spawned.
    pub fn is_empty(&self) -> bool {
        self.map.lock().workers.is_empty()
    }

    /// Stop and join every worker, in reverse creation order.
    ///
    /// Pending tasks are drained before each worker exits.
    pub fn shutdown_all(&self) {
        let drained: Vec<Arc<Worker>> = {
            let mut map = self.map.lock();
            let drained = map
                .order
                .iter()
                .rev()
                .filter_map(|name| map.workers.get(name).cloned())
                .collect();
            map.workers.clear();
            map.order.clear();
            drained
        };
        for worker in drained {
            worker.stop_and_join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_get_or_spawn_reuses() {
        let registry = WorkerRegistry::new();

        let first = registry.get_or_spawn("io");
        let second = registry.get_or_spawn("io");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);

        registry.shutdown_all();
    }

    #[test]
    fn test_default_worker() {
        let registry = WorkerRegistry::new();
        let worker = registry.default_worker();
        assert!(worker.is_running());
        assert!(registry.get(DEFAULT_WORKER).is_some());
        registry.shutdown_all();
    }

    #[test]
    fn test_shutdown_drains_tasks() {
        let registry = WorkerRegistry::new();
        let counter = Arc::new(AtomicU32::new(0));

        let worker = registry.get_or_spawn("io");
        for _ in 0..5 {
            let counter_clone = counter.clone();
            worker.post(move || {
                counter_clone.fetch_add(1, Ordering::SeqCst);
            });
        }

        registry.shutdown_all();

        assert_eq!(counter.load(Ordering::SeqCst), 5);
        assert!(registry.is_empty());
        assert!(!worker.is_running());
    }
}
