//! Error types for the service runtime.
//!
//! The split follows the kernel's error taxonomy: configuration problems and
//! runtime lookups are `Result`s, while programming errors — wrong-state
//! lifecycle transitions, disconnecting untracked proxy members, leaked
//! channels at shutdown — panic instead of returning.

use crate::service::LifecyclePhase;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Errors raised while resolving, validating, or lowering configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The XML text could not be parsed.
    #[error("XML parse error: {0}")]
    Xml(String),

    /// No template is registered under the requested identifier.
    #[error("unknown configuration template '{0}'")]
    UnknownTemplate(String),

    /// A declared parameter was neither supplied nor given a default.
    #[error("template '{template}' requires parameter '{name}'")]
    MissingParameter { template: String, name: String },

    /// A `${KEY}` placeholder survived substitution.
    #[error("unresolved placeholder '${{{key}}}'")]
    UnresolvedPlaceholder { key: String },

    /// A declaration is structurally invalid.
    #[error("malformed <{element}> declaration: {message}")]
    Malformed { element: String, message: String },

    /// Two declarations claim the same UID.
    #[error("duplicate uid '{0}' in configuration")]
    DuplicateUid(String),

    /// No service implementation is registered under the declared type.
    #[error("unknown service type '{0}'")]
    UnknownServiceKind(String),

    /// No data-object implementation is registered under the declared type.
    #[error("unknown object type '{0}'")]
    UnknownObjectKind(String),
}

impl ConfigError {
    /// Create a malformed-declaration error.
    pub fn malformed(element: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Malformed {
            element: element.into(),
            message: message.into(),
        }
    }
}

/// Errors raised by the service registry and the configuration launcher.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// Configuration resolution or lowering failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// No service is registered under the UID.
    #[error("no service registered under uid '{0}'")]
    UnknownService(String),

    /// No data object is registered under the UID.
    #[error("no data object registered under uid '{0}'")]
    UnknownObject(String),

    /// A service or object with this UID already exists.
    #[error("uid '{0}' is already registered")]
    DuplicateUid(String),

    /// A `<connect>`/`<proxy>` declaration references an endpoint that the
    /// named owner does not publish.
    #[error("'{uid}' publishes no {role} under key '{key}'")]
    UnknownEndpoint {
        uid: String,
        key: String,
        /// `"signal"` or `"slot"`.
        role: &'static str,
    },

    /// `launch()` was called before a configuration was resolved.
    #[error("no configuration has been resolved; call set_config first")]
    NoConfiguration,

    /// A service's own lifecycle code failed.
    #[error("service '{uid}' failed during {phase}: {source}")]
    Lifecycle {
        uid: String,
        phase: LifecyclePhase,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl RuntimeError {
    /// Wrap a service-level failure with its UID and lifecycle phase.
    pub fn lifecycle(
        uid: impl Into<String>,
        phase: LifecyclePhase,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Lifecycle {
            uid: uid.into(),
            phase,
            source,
        }
    }
}
