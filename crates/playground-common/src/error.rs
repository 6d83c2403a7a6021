//! Error types for the playground.
//!
//! [`PlaygroundError`] covers everything that is a genuine failure of the
//! bridge or the runtime. Execution failure reported by a backend (a non-200
//! response, or error text produced by the executed program) is *not* an
//! error here: it travels as a normal outcome value with `succeeded = false`.

use std::io;

use thiserror::Error;

/// Failures of the execution bridge, the runtime loader, and the service.
///
/// The variants split into classes the UI layer treats differently:
/// transport failures (the request never completed), completed responses
/// outside the success class, readiness violations (the local runtime is not
/// loaded yet), and runtime defects (load, instantiation, or trap failures).
#[derive(Error, Debug)]
pub enum PlaygroundError {
    /// The request never completed: network unreachable, connection refused,
    /// or the response body could not be read at all.
    #[error("Transport failure: {reason}")]
    Transport {
        /// Description of the transport failure.
        reason: String,
    },

    /// A catalog request completed, but the service answered with a status
    /// outside the success class (e.g. 404 for an unknown example).
    #[error("Service returned {status}: {body}")]
    UnexpectedStatus {
        /// HTTP status code of the completed response.
        status: u16,
        /// Response body text.
        body: String,
    },

    /// The local runtime's execute entry point does not exist yet.
    ///
    /// Submitting before the runtime is loaded is a precondition violation;
    /// the call is not attempted.
    #[error("Runtime is not ready")]
    RuntimeNotReady,

    /// Loading the runtime module failed (fetch, compile, or start).
    #[error("Runtime load failed: {reason}")]
    LoadFailed {
        /// Description of the load failure.
        reason: String,
    },

    /// The guest module trapped during execution.
    #[error("Guest trap: {message}")]
    Trap {
        /// Description of the trap.
        message: String,
    },

    /// The guest module does not honor the expected ABI (missing or
    /// mistyped export, out-of-bounds result region, invalid UTF-8).
    #[error("Guest interface error: {reason}")]
    GuestInterface {
        /// Description of the interface violation.
        reason: String,
    },

    /// Invalid configuration was provided.
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the configuration error.
        reason: String,
    },

    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl PlaygroundError {
    /// Create a new `Transport` error.
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport {
            reason: reason.into(),
        }
    }

    /// Create a new `UnexpectedStatus` error.
    pub fn unexpected_status(status: u16, body: impl Into<String>) -> Self {
        Self::UnexpectedStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a new `LoadFailed` error.
    pub fn load_failed(reason: impl Into<String>) -> Self {
        Self::LoadFailed {
            reason: reason.into(),
        }
    }

    /// Create a new `Trap` error.
    pub fn trap(message: impl Into<String>) -> Self {
        Self::Trap {
            message: message.into(),
        }
    }

    /// Create a new `GuestInterface` error.
    pub fn guest_interface(reason: impl Into<String>) -> Self {
        Self::GuestInterface {
            reason: reason.into(),
        }
    }

    /// Create a new `InvalidConfig` error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Returns `true` if the request never completed at the transport level.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Returns `true` if this is a readiness precondition violation.
    pub fn is_not_ready(&self) -> bool {
        matches!(self, Self::RuntimeNotReady)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PlaygroundError::transport("connection refused");
        assert_eq!(err.to_string(), "Transport failure: connection refused");

        let err = PlaygroundError::RuntimeNotReady;
        assert_eq!(err.to_string(), "Runtime is not ready");
    }

    #[test]
    fn test_is_transport() {
        assert!(PlaygroundError::transport("timeout").is_transport());
        assert!(!PlaygroundError::RuntimeNotReady.is_transport());
        // A completed response is never a transport failure
        assert!(!PlaygroundError::unexpected_status(404, "example not found").is_transport());
    }

    #[test]
    fn test_unexpected_status_display() {
        let err = PlaygroundError::unexpected_status(404, "example not found: nope.tao");
        assert_eq!(
            err.to_string(),
            "Service returned 404: example not found: nope.tao"
        );
    }

    #[test]
    fn test_is_not_ready() {
        assert!(PlaygroundError::RuntimeNotReady.is_not_ready());
        assert!(!PlaygroundError::trap("unreachable").is_not_ready());
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "missing");
        let err: PlaygroundError = io_err.into();
        assert!(matches!(err, PlaygroundError::Io(_)));
    }
}
