//! Error types for the communication primitives.

use std::fmt;

/// Recoverable wiring failures.
///
/// These are returned by connect paths ([`crate::Signal::connect`],
/// [`crate::AnySignal::connect_any`], the keyed lookups used by
/// [`crate::ConnectionBundle`]). Batch connect helpers catch and log them so
/// that one bad entry never aborts its siblings. Precondition violations
/// (programming errors) are *not* represented here; those panic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WiringError {
    /// No signal is published under the requested key.
    BadSignal(String),
    /// No slot is published under the requested key.
    BadSlot(String),
    /// The slot is already connected to this signal.
    AlreadyConnected,
    /// The signal and slot argument types do not match.
    TypeMismatch {
        /// The argument type expected by the signal.
        expected: &'static str,
    },
}

impl fmt::Display for WiringError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadSignal(key) => write!(f, "no signal published under key '{key}'"),
            Self::BadSlot(key) => write!(f, "no slot published under key '{key}'"),
            Self::AlreadyConnected => write!(f, "slot is already connected to this signal"),
            Self::TypeMismatch { expected } => {
                write!(f, "slot argument type does not match signal argument type {expected}")
            }
        }
    }
}

impl std::error::Error for WiringError {}
