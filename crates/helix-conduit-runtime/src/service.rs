//! Services and the lifecycle state machine.
//!
//! A service is a stateful unit following the
//! `configuring → starting → updating → stopping` contract. Service
//! implementations provide the four capability methods plus their published
//! endpoint tables; [`ManagedService`] wraps an implementation and enforces
//! the state machine on behalf of the registry:
//!
//! ```text
//! Created → Configured → Started → (Updated ⇄ Started) → Stopped → Destroyed
//! ```
//!
//! Transitions are invoked explicitly by a manager, never implicitly.
//! Calling a transition from the wrong state is a programming error and
//! panics; it is not a recoverable condition. Failures *inside* a service's
//! own lifecycle code are the service's business and are propagated as
//! [`RuntimeError::Lifecycle`] without interpretation.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use helix_conduit_core::{AnySignal, AnySlot, ConnectionBundle, Signal, SignalTable, SlotTable};

use crate::config::ConfigNode;
use crate::error::RuntimeError;
use crate::object::DataObject;

/// Result type for service-implemented lifecycle methods.
///
/// The kernel does not interpret these errors; it wraps them with the UID
/// and phase and hands them to the lifecycle caller.
pub type ServiceResult = std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// How a service accesses a bound data object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessMode {
    /// Read-only input.
    In,
    /// Read-write access.
    InOut,
    /// Output produced by the service.
    Out,
}

impl AccessMode {
    /// Parse the configuration spelling (`in`/`inout`/`out`).
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "in" => Some(Self::In),
            "inout" => Some(Self::InOut),
            "out" => Some(Self::Out),
            _ => None,
        }
    }
}

/// A declared object-signal → service-slot wiring, established when the
/// service starts and torn down when it stops.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AutoConnection {
    /// Key of the bound data object on the service side.
    pub object_key: String,
    /// Signal key on the data object.
    pub signal_key: String,
    /// Slot key on the service.
    pub slot_key: String,
}

impl AutoConnection {
    /// Convenience constructor.
    pub fn new(
        object_key: impl Into<String>,
        signal_key: impl Into<String>,
        slot_key: impl Into<String>,
    ) -> Self {
        Self {
            object_key: object_key.into(),
            signal_key: signal_key.into(),
            slot_key: slot_key.into(),
        }
    }
}

/// The capability set every service implements.
///
/// Implementations register their named signals and slots at construction
/// time, before any configuration runs; the string keys are what XML
/// `<connect>` and `<proxy>` declarations refer to.
pub trait Service: Send + Sync {
    /// Parse service-specific configuration into internal parameters.
    ///
    /// Called once, from the `Created` state. No side effects beyond
    /// internal state.
    fn configuring(&mut self, config: &ConfigNode) -> ServiceResult;

    /// Acquire resources. May open files, attach to containers, and make
    /// signal/slot connections.
    fn starting(&mut self) -> ServiceResult;

    /// Perform the service's main action. Callable repeatedly while
    /// started.
    fn updating(&mut self) -> ServiceResult;

    /// Release everything acquired in `starting` — its mirror image. Every
    /// connection made in `starting` must be gone when this returns.
    fn stopping(&mut self) -> ServiceResult;

    /// The signals this service publishes, keyed by name.
    fn signals(&self) -> &SignalTable;

    /// The slots this service publishes, keyed by name.
    fn slots(&self) -> &SlotTable;

    /// A bound data object was attached under `key`.
    ///
    /// The default implementation ignores the binding; services that hold
    /// typed references to their data override this.
    fn object_bound(&mut self, key: &str, access: AccessMode, object: &Arc<dyn DataObject>) {
        let _ = (key, access, object);
    }

    /// Object-signal → service-slot wirings to establish automatically on
    /// start and tear down on stop.
    fn auto_connections(&self) -> Vec<AutoConnection> {
        Vec::new()
    }
}

/// Lifecycle states of a managed service.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServiceState {
    /// Constructed, not yet configured.
    Created,
    /// Configuration parsed.
    Configured,
    /// Resources acquired; updatable.
    Started,
    /// Resources released.
    Stopped,
    /// Terminal state; the registry entry is gone.
    Destroyed,
}

/// The lifecycle phase during which a service-level failure occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecyclePhase {
    Configure,
    Start,
    Update,
    Stop,
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configure => write!(f, "configure"),
            Self::Start => write!(f, "start"),
            Self::Update => write!(f, "update"),
            Self::Stop => write!(f, "stop"),
        }
    }
}

/// Built-in signals every managed service publishes.
struct LifecycleSignals {
    started: Signal<()>,
    updated: Signal<()>,
    stopped: Signal<()>,
}

impl LifecycleSignals {
    fn new() -> Self {
        Self {
            started: Signal::new(),
            updated: Signal::new(),
            stopped: Signal::new(),
        }
    }
}

/// A registry-owned service wrapped with state-machine enforcement.
///
/// All lifecycle driving goes through this type. Besides enforcing legal
/// transitions it provides the pieces of the kernel contract that are
/// common to every service: the built-in `"started"`/`"updated"`/
/// `"stopped"` signals, object binding, and automatic wiring of the
/// service's declared [`AutoConnection`]s on start/stop.
pub struct ManagedService {
    uid: String,
    state: ServiceState,
    inner: Box<dyn Service>,
    lifecycle: LifecycleSignals,
    objects: HashMap<String, (AccessMode, Arc<dyn DataObject>)>,
    auto_bundle: ConnectionBundle,
}

impl ManagedService {
    /// Wrap a service implementation.
    pub fn new(uid: impl Into<String>, inner: Box<dyn Service>) -> Self {
        Self {
            uid: uid.into(),
            state: ServiceState::Created,
            inner,
            lifecycle: LifecycleSignals::new(),
            objects: HashMap::new(),
            auto_bundle: ConnectionBundle::new(),
        }
    }

    /// The service's unique instance identifier.
    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// The current lifecycle state.
    pub fn state(&self) -> ServiceState {
        self.state
    }

    /// Borrow the wrapped implementation.
    pub fn service(&self) -> &dyn Service {
        &*self.inner
    }

    /// Mutably borrow the wrapped implementation.
    pub fn service_mut(&mut self) -> &mut dyn Service {
        &mut *self.inner
    }

    /// Attach a data object under `key`.
    ///
    /// # Panics
    ///
    /// Panics when called on a started or destroyed service; bindings are
    /// established before start.
    pub fn bind_object(&mut self, key: impl Into<String>, access: AccessMode, object: Arc<dyn DataObject>) {
        assert!(
            matches!(
                self.state,
                ServiceState::Created | ServiceState::Configured | ServiceState::Stopped
            ),
            "service '{}' cannot bind objects while {:?}",
            self.uid,
            self.state
        );
        let key = key.into();
        self.inner.object_bound(&key, access, &object);
        self.objects.insert(key, (access, object));
    }

    /// The data object bound under `key`, if any.
    pub fn bound_object(&self, key: &str) -> Option<&Arc<dyn DataObject>> {
        self.objects.get(key).map(|(_, object)| object)
    }

    /// Resolve a published signal: built-in lifecycle signals first, then
    /// the service's own table.
    pub fn signal(&self, key: &str) -> Option<Arc<dyn AnySignal>> {
        match key {
            "started" => Some(Arc::new(self.lifecycle.started.clone())),
            "updated" => Some(Arc::new(self.lifecycle.updated.clone())),
            "stopped" => Some(Arc::new(self.lifecycle.stopped.clone())),
            _ => self.inner.signals().get(key).cloned(),
        }
    }

    /// Resolve a published slot from the service's table.
    pub fn slot(&self, key: &str) -> Option<Arc<dyn AnySlot>> {
        self.inner.slots().get(key).cloned()
    }

    /// Emitted after a successful `start`.
    pub fn started_signal(&self) -> &Signal<()> {
        &self.lifecycle.started
    }

    /// Emitted after a successful `update`.
    pub fn updated_signal(&self) -> &Signal<()> {
        &self.lifecycle.updated
    }

    /// Emitted after a successful `stop`.
    pub fn stopped_signal(&self) -> &Signal<()> {
        &self.lifecycle.stopped
    }

    /// Drive `configuring`.
    ///
    /// # Panics
    ///
    /// Panics unless the service is in the `Created` state.
    pub fn configure(&mut self, config: &ConfigNode) -> Result<(), RuntimeError> {
        assert_eq!(
            self.state,
            ServiceState::Created,
            "service '{}' must be Created to configure, is {:?}",
            self.uid,
            self.state
        );
        self.inner
            .configuring(config)
            .map_err(|e| RuntimeError::lifecycle(&self.uid, LifecyclePhase::Configure, e))?;
        self.state = ServiceState::Configured;
        tracing::debug!(target: "helix_conduit_runtime::service", uid = %self.uid, "configured");
        Ok(())
    }

    /// Drive `starting`, then wire the declared auto-connections.
    ///
    /// # Panics
    ///
    /// Panics unless the service is `Configured` (or `Stopped`, for
    /// restart).
    pub fn start(&mut self) -> Result<(), RuntimeError> {
        assert!(
            matches!(self.state, ServiceState::Configured | ServiceState::Stopped),
            "service '{}' must be Configured or Stopped to start, is {:?}",
            self.uid,
            self.state
        );
        self.inner
            .starting()
            .map_err(|e| RuntimeError::lifecycle(&self.uid, LifecyclePhase::Start, e))?;

        for auto in self.inner.auto_connections() {
            match self.objects.get(&auto.object_key) {
                Some((_, object)) => {
                    self.auto_bundle.connect(
                        object.signals(),
                        &auto.signal_key,
                        self.inner.slots(),
                        &auto.slot_key,
                    );
                }
                None => {
                    tracing::warn!(
                        target: "helix_conduit_runtime::service",
                        uid = %self.uid,
                        object_key = %auto.object_key,
                        "auto-connection references an unbound object key"
                    );
                }
            }
        }

        self.state = ServiceState::Started;
        tracing::debug!(target: "helix_conduit_runtime::service", uid = %self.uid, "started");
        self.lifecycle.started.emit(());
        Ok(())
    }

    /// Drive `updating`.
    ///
    /// # Panics
    ///
    /// Panics unless the service is `Started`.
    pub fn update(&mut self) -> Result<(), RuntimeError> {
        assert_eq!(
            self.state,
            ServiceState::Started,
            "service '{}' must be Started to update, is {:?}",
            self.uid,
            self.state
        );
        self.inner
            .updating()
            .map_err(|e| RuntimeError::lifecycle(&self.uid, LifecyclePhase::Update, e))?;
        self.lifecycle.updated.emit(());
        Ok(())
    }

    /// Tear down the auto-connections, then drive `stopping`.
    ///
    /// # Panics
    ///
    /// Panics unless the service is `Started`.
    pub fn stop(&mut self) -> Result<(), RuntimeError> {
        assert_eq!(
            self.state,
            ServiceState::Started,
            "service '{}' must be Started to stop, is {:?}",
            self.uid,
            self.state
        );
        self.auto_bundle.disconnect();
        self.inner
            .stopping()
            .map_err(|e| RuntimeError::lifecycle(&self.uid, LifecyclePhase::Stop, e))?;
        self.state = ServiceState::Stopped;
        tracing::debug!(target: "helix_conduit_runtime::service", uid = %self.uid, "stopped");
        self.lifecycle.stopped.emit(());
        Ok(())
    }

    /// Mark the service destroyed and release its object bindings.
    ///
    /// # Panics
    ///
    /// Panics when the service is still `Started` — a started service must
    /// be stopped first; destroy never auto-stops.
    pub fn destroy(&mut self) {
        assert!(
            !matches!(self.state, ServiceState::Started),
            "service '{}' is still Started; stop it before destroying",
            self.uid
        );
        assert!(
            !matches!(self.state, ServiceState::Destroyed),
            "service '{}' is already Destroyed",
            self.uid
        );
        self.objects.clear();
        self.state = ServiceState::Destroyed;
        tracing::debug!(target: "helix_conduit_runtime::service", uid = %self.uid, "destroyed");
    }
}
