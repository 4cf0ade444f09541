//! Service runtime for Helix Conduit.
//!
//! This crate is the kernel that the surrounding application framework —
//! editors, visualization adaptors, readers and writers — plugs into:
//!
//! - **Proxy**: named channels wiring N signals to M slots with no direct
//!   references between the two sides
//! - **Service lifecycle**: the `configuring/starting/updating/stopping`
//!   state machine, enforced by a UID-keyed registry
//! - **Data objects**: UID-keyed shared objects publishing signals that
//!   services subscribe to
//! - **Configuration**: XML templates with `${KEY}` substitution, lowered
//!   into a typed AST and launched as a live object/service graph
//!
//! # A Minimal Session
//!
//! ```no_run
//! use std::collections::HashMap;
//! use helix_conduit_runtime::Runtime;
//!
//! let runtime = Runtime::new();
//!
//! // The application registers its service/object constructors...
//! // runtime.service_factory.register("viz::negato", || Box::new(Negato::new()));
//! // runtime.object_factory.register("imaging::image", || Arc::new(Image::new()));
//!
//! // ...and its configuration templates:
//! runtime.templates.register_str(r#"
//!     <template id="viewer">
//!         <param name="SERIES_PATH"/>
//!         <config>
//!             <object uid="image" type="imaging::image"/>
//!             <service uid="reader" type="io::volume_reader" auto_start="true" auto_update="true">
//!                 <inout key="target" uid="image"/>
//!                 <config path="${SERIES_PATH}"/>
//!             </service>
//!             <connect>
//!                 <signal>image/modified</signal>
//!                 <slot>reader/refresh</slot>
//!             </connect>
//!         </config>
//!     </template>
//! "#).unwrap();
//!
//! // Launch an instance:
//! let mut manager = runtime.config_manager();
//! let mut params = HashMap::new();
//! params.insert("SERIES_PATH".to_string(), "/data/series.vtk".to_string());
//! manager.set_config("viewer", params).unwrap();
//! manager.launch().unwrap();
//!
//! // ... the graph is live; emitting image/modified refreshes the reader ...
//!
//! manager.stop_and_destroy();
//! runtime.shutdown();
//! ```

pub mod config;
mod error;
mod factory;
mod launcher;
mod object;
mod proxy;
mod registry;
mod runtime;
pub mod service;
mod workers;

pub use config::{
    AppConfig, ChannelDecl, ConfigNode, ConfigTemplate, EndpointRef, ObjectBinding, ObjectDecl,
    ServiceDecl, TemplateParam, TemplateRegistry, parse_config, substitute,
};
pub use error::{ConfigError, Result, RuntimeError};
pub use factory::{ObjectFactory, ServiceFactory};
pub use launcher::AppConfigManager;
pub use object::{DataObject, ObjectRegistry};
pub use proxy::Proxy;
pub use registry::ServiceRegistry;
pub use runtime::Runtime;
pub use service::{
    AccessMode, AutoConnection, LifecyclePhase, ManagedService, Service, ServiceResult,
    ServiceState,
};
pub use workers::{DEFAULT_WORKER, WorkerRegistry};
