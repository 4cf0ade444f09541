//! Logging facilities for Helix Conduit.
//!
//! Helix Conduit uses the `tracing` crate for instrumentation. To see logs,
//! install a tracing subscriber in your application:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt::init();
//!
//!     // Your application code...
//! }
//! ```
//!
//! Wiring failures that are tolerated by design (duplicate connections,
//! unknown keys in a batch connect) are reported at `warn` level under the
//! targets below rather than surfaced as errors.

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core primitives target.
    pub const CORE: &str = "helix_conduit_core";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "helix_conduit_core::signal";
    /// Connection bundle target.
    pub const BUNDLE: &str = "helix_conduit_core::bundle";
    /// Worker system target.
    pub const WORKER: &str = "helix_conduit_core::worker";
}
