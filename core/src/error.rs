//! Error types for the freeport-core library.

use thiserror::Error;

/// Result type alias for freeport operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving or freeing a port.
#[derive(Error, Debug)]
pub enum Error {
    /// The caller supplied a port outside 1..=65535.
    #[error("Invalid port {0}: expected a value between 1 and 65535")]
    InvalidPort(u32),

    /// The OS socket query could not be performed.
    #[error("Failed to resolve port owners: {0}")]
    Resolution(#[from] ResolutionError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether this error aborted a resolution (as opposed to a caller error).
    pub fn is_resolution_failure(&self) -> bool {
        matches!(self, Error::Resolution(_))
    }
}

/// Failures of the socket-ownership query itself.
///
/// Any of these aborts the whole resolution; no partial list is produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// Failed to execute a system command.
    #[error("Command execution failed: {0}")]
    CommandFailed(String),

    /// The caller lacks the privilege needed to see socket owners.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Failed to parse command output.
    #[error("Failed to parse output: {0}")]
    ParseError(String),

    /// Platform not supported.
    #[error("Platform not supported: {0}")]
    UnsupportedPlatform(String),
}

/// Failure to deliver a signal to a single process.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignalError {
    /// The process does not exist (anymore).
    #[error("Process {0} not found")]
    NoSuchProcess(u32),

    /// The OS refused to let us signal the process.
    #[error("Permission denied to signal process {0}")]
    PermissionDenied(u32),

    /// Any other delivery failure.
    #[error("Failed to signal process {pid}: {reason}")]
    Failed { pid: u32, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidPort(70000);
        assert!(err.to_string().contains("70000"));

        let err = SignalError::PermissionDenied(5678);
        assert!(err.to_string().contains("5678"));

        let err: Error = ResolutionError::CommandFailed("ss missing".to_string()).into();
        assert!(err.is_resolution_failure());
        assert!(err.to_string().contains("ss missing"));
    }

    #[test]
    fn test_invalid_port_is_not_resolution_failure() {
        assert!(!Error::InvalidPort(0).is_resolution_failure());
    }
}
