//! The configuration launcher.
//!
//! [`AppConfigManager`] turns a resolved configuration template into a live
//! graph: data objects first, then services (with their object bindings and
//! worker affinity), then the declared channels, and finally the
//! configure/start/update sweep over auto-start services — all in
//! declaration order. Any failure rolls the partial graph back in reverse
//! before the error is returned, so a failed launch leaves nothing behind.
//!
//! [`stop_and_destroy`] is the mirror image: stop started services in
//! reverse creation order, withdraw this configuration's proxy members,
//! destroy the services, release the objects. It is safe to call after a
//! partial launch (rollback already drained the books) and safe to call
//! twice.
//!
//! [`stop_and_destroy`]: AppConfigManager::stop_and_destroy

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use helix_conduit_core::{AnySignal, AnySlot};

use crate::config::{AppConfig, ChannelDecl, EndpointRef};
use crate::error::{ConfigError, Result, RuntimeError};
use crate::runtime::Runtime;

/// Counter behind `${GENERIC_UID}` values.
static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

/// A proxy member added by this launcher, remembered for teardown.
enum ChannelMember {
    Signal(Arc<dyn AnySignal>),
    Slot(Arc<dyn AnySlot>),
}

struct ChannelRecord {
    channel: String,
    member: ChannelMember,
}

/// Instantiates and tears down one configuration instance.
///
/// # Example
///
/// ```no_run
/// use std::collections::HashMap;
/// use helix_conduit_runtime::Runtime;
///
/// let runtime = Runtime::new();
/// // ... register factories and templates ...
///
/// let mut manager = runtime.config_manager();
/// manager.set_config("viewer", HashMap::new()).unwrap();
/// manager.launch().unwrap();
/// // ... the graph is live ...
/// manager.stop_and_destroy();
/// ```
pub struct AppConfigManager {
    runtime: Runtime,
    /// Value substituted for `${GENERIC_UID}`.
    instance_uid: String,
    resolved: Option<AppConfig>,
    /// Counter for generated (anonymous) channel names.
    next_channel: u64,
    created_objects: Vec<String>,
    created_services: Vec<String>,
    started_services: Vec<String>,
    channel_records: Vec<ChannelRecord>,
}

impl AppConfigManager {
    /// Create a manager bound to the runtime's registries.
    pub fn new(runtime: Runtime) -> Self {
        let instance = NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed);
        Self {
            runtime,
            instance_uid: format!("hc{instance}"),
            resolved: None,
            next_channel: 0,
            created_objects: Vec::new(),
            created_services: Vec::new(),
            started_services: Vec::new(),
            channel_records: Vec::new(),
        }
    }

    /// The `${GENERIC_UID}` value of this configuration instance.
    pub fn instance_uid(&self) -> &str {
        &self.instance_uid
    }

    /// Resolve a registered template into this manager's launchable
    /// configuration.
    ///
    /// `${GENERIC_UID}` is injected automatically unless the caller
    /// supplies its own value; every other placeholder comes from
    /// `params` or the template's declared defaults.
    pub fn set_config(&mut self, config_id: &str, params: HashMap<String, String>) -> Result<()> {
        let params = self.with_generic_uid(params);
        let node = self.runtime.templates.resolve(config_id, &params)?;
        self.resolved = Some(AppConfig::lower(&node)?);
        tracing::debug!(
            target: "helix_conduit_runtime::launcher",
            config_id,
            instance = %self.instance_uid,
            "configuration resolved"
        );
        Ok(())
    }

    /// Resolve configuration directly from XML text, outside the template
    /// registry. Placeholders are substituted from `params` exactly as for
    /// templates.
    pub fn set_config_text(&mut self, xml: &str, params: HashMap<String, String>) -> Result<()> {
        let params = self.with_generic_uid(params);
        let node = crate::config::parse_config(xml)?;
        let node = crate::config::substitute(&node, &params)?;
        self.resolved = Some(AppConfig::lower(&node)?);
        Ok(())
    }

    fn with_generic_uid(&self, mut params: HashMap<String, String>) -> HashMap<String, String> {
        params
            .entry("GENERIC_UID".to_string())
            .or_insert_with(|| self.instance_uid.clone());
        params
    }

    /// Instantiate the resolved configuration.
    ///
    /// Walks the declarations in order: objects, services (bindings and
    /// worker affinity included), channels, then configure + start (+
    /// optional first update) for auto-start services. On any failure the
    /// partially-created graph is rolled back in reverse order before the
    /// error is returned.
    ///
    /// # Panics
    ///
    /// Panics when called while a previous launch of this manager is still
    /// live.
    pub fn launch(&mut self) -> Result<()> {
        assert!(
            self.created_objects.is_empty()
                && self.created_services.is_empty()
                && self.channel_records.is_empty(),
            "configuration instance '{}' is already launched",
            self.instance_uid
        );
        let config = self.resolved.clone().ok_or(RuntimeError::NoConfiguration)?;

        if let Err(error) = self.launch_inner(&config) {
            tracing::error!(
                target: "helix_conduit_runtime::launcher",
                instance = %self.instance_uid,
                %error,
                "launch failed, rolling back"
            );
            self.stop_and_destroy();
            return Err(error);
        }
        tracing::info!(
            target: "helix_conduit_runtime::launcher",
            instance = %self.instance_uid,
            objects = config.objects.len(),
            services = config.services.len(),
            channels = config.channels.len(),
            "configuration launched"
        );
        Ok(())
    }

    fn launch_inner(&mut self, config: &AppConfig) -> Result<()> {
        // Data objects, in declaration order.
        for decl in &config.objects {
            let object = self
                .runtime
                .object_factory
                .create(&decl.kind)
                .ok_or_else(|| ConfigError::UnknownObjectKind(decl.kind.clone()))?;
            self.runtime.objects.register(&decl.uid, object)?;
            self.created_objects.push(decl.uid.clone());
        }

        // Services: instantiate, bind objects, set worker affinity.
        for decl in &config.services {
            let service = self
                .runtime
                .service_factory
                .create(&decl.kind)
                .ok_or_else(|| ConfigError::UnknownServiceKind(decl.kind.clone()))?;
            let managed = self.runtime.services.register(&decl.uid, service)?;
            self.created_services.push(decl.uid.clone());

            let mut managed = managed.lock();
            for binding in &decl.bindings {
                let object = self.runtime.objects.expect(&binding.uid)?;
                managed.bind_object(&binding.key, binding.access, object);
            }
            if let Some(worker_name) = &decl.worker {
                let worker = self.runtime.workers.get_or_spawn(worker_name);
                managed.service().slots().bind_worker(Some(worker));
            }
        }

        // Channels: feed every declared member into the proxy.
        for decl in &config.channels {
            let channel = self.channel_name(decl);
            for endpoint in &decl.signals {
                let signal = self.resolve_signal(endpoint)?;
                self.add_signal_member(&channel, signal);
            }
            for endpoint in &decl.slots {
                let slot = self.resolve_slot(endpoint)?;
                self.add_slot_member(&channel, slot);
            }
        }

        // Configure and start auto-start services, in declaration order.
        for decl in &config.services {
            if !decl.auto_start {
                continue;
            }
            let managed = self.runtime.services.expect(&decl.uid)?;
            let mut managed = managed.lock();
            managed.configure(&decl.config)?;
            managed.start()?;
            self.started_services.push(decl.uid.clone());
            if decl.auto_update {
                managed.update()?;
            }
        }

        Ok(())
    }

    /// Stop, unwire, and destroy everything this manager created.
    ///
    /// Reverse creation order throughout: started services stop first,
    /// then this configuration's proxy members are withdrawn (erasing
    /// channels that empty out), then services are destroyed and data
    /// objects released. Individual stop failures are logged and do not
    /// abort the sweep. Calling this on a never-launched or already-torn
    /// -down manager is a no-op.
    pub fn stop_and_destroy(&mut self) {
        for uid in std::mem::take(&mut self.started_services).into_iter().rev() {
            if let Some(managed) = self.runtime.services.get(&uid) {
                if let Err(error) = managed.lock().stop() {
                    tracing::error!(
                        target: "helix_conduit_runtime::launcher",
                        %uid,
                        %error,
                        "service failed to stop during teardown"
                    );
                }
            }
        }

        for record in std::mem::take(&mut self.channel_records).into_iter().rev() {
            match record.member {
                ChannelMember::Signal(signal) => {
                    self.runtime
                        .proxy
                        .disconnect_signal(&record.channel, signal.id());
                }
                ChannelMember::Slot(slot) => {
                    self.runtime
                        .proxy
                        .disconnect_slot(&record.channel, slot.id());
                }
            }
        }

        for uid in std::mem::take(&mut self.created_services).into_iter().rev() {
            if let Err(error) = self.runtime.services.destroy(&uid) {
                tracing::error!(
                    target: "helix_conduit_runtime::launcher",
                    %uid,
                    %error,
                    "service could not be destroyed during teardown"
                );
            }
        }

        for uid in std::mem::take(&mut self.created_objects).into_iter().rev() {
            self.runtime.objects.unregister(&uid);
        }
    }

    fn channel_name(&mut self, decl: &ChannelDecl) -> String {
        match &decl.channel {
            Some(channel) => channel.clone(),
            None => {
                let generated = format!("proxy-{}-{}", self.instance_uid, self.next_channel);
                self.next_channel += 1;
                generated
            }
        }
    }

    fn add_signal_member(&mut self, channel: &str, signal: Arc<dyn AnySignal>) {
        // Only members this manager actually inserted are recorded; a
        // member another configuration already contributed stays theirs
        // to withdraw.
        if self.runtime.proxy.connect_signal(channel, signal.clone()) {
            self.channel_records.push(ChannelRecord {
                channel: channel.to_string(),
                member: ChannelMember::Signal(signal),
            });
        }
    }

    fn add_slot_member(&mut self, channel: &str, slot: Arc<dyn AnySlot>) {
        if self.runtime.proxy.connect_slot(channel, slot.clone()) {
            self.channel_records.push(ChannelRecord {
                channel: channel.to_string(),
                member: ChannelMember::Slot(slot),
            });
        }
    }

    fn resolve_signal(&self, endpoint: &EndpointRef) -> Result<Arc<dyn AnySignal>> {
        if let Some(managed) = self.runtime.services.get(&endpoint.uid) {
            return managed
                .lock()
                .signal(&endpoint.key)
                .ok_or_else(|| RuntimeError::UnknownEndpoint {
                    uid: endpoint.uid.clone(),
                    key: endpoint.key.clone(),
                    role: "signal",
                });
        }
        if let Some(object) = self.runtime.objects.get(&endpoint.uid) {
            return object.signals().get(&endpoint.key).cloned().ok_or_else(|| {
                RuntimeError::UnknownEndpoint {
                    uid: endpoint.uid.clone(),
                    key: endpoint.key.clone(),
                    role: "signal",
                }
            });
        }
        Err(RuntimeError::UnknownService(endpoint.uid.clone()))
    }

    fn resolve_slot(&self, endpoint: &EndpointRef) -> Result<Arc<dyn AnySlot>> {
        if let Some(managed) = self.runtime.services.get(&endpoint.uid) {
            return managed
                .lock()
                .slot(&endpoint.key)
                .ok_or_else(|| RuntimeError::UnknownEndpoint {
                    uid: endpoint.uid.clone(),
                    key: endpoint.key.clone(),
                    role: "slot",
                });
        }
        if self.runtime.objects.contains(&endpoint.uid) {
            return Err(RuntimeError::UnknownEndpoint {
                uid: endpoint.uid.clone(),
                key: endpoint.key.clone(),
                role: "slot",
            });
        }
        Err(RuntimeError::UnknownService(endpoint.uid.clone()))
    }
}

impl Drop for AppConfigManager {
    fn drop(&mut self) {
        self.stop_and_destroy();
    }
}
