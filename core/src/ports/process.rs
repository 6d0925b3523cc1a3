//! Process control port (interface).

use serde::{Deserialize, Serialize};

use crate::error::SignalError;

/// Kind of termination request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SignalKind {
    /// A request the process may intercept to clean up (SIGTERM, taskkill).
    Graceful,
    /// Termination enforced by the OS (SIGKILL, taskkill /F).
    Forceful,
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalKind::Graceful => f.write_str("graceful"),
            SignalKind::Forceful => f.write_str("forceful"),
        }
    }
}

/// Port for signaling processes and checking liveness.
///
/// This trait defines the interface for process termination.
/// Implementations handle platform-specific signal handling.
pub trait ProcessControlPort: Send + Sync {
    /// Deliver a termination request to `pid`.
    fn send_signal(&self, pid: u32, kind: SignalKind) -> Result<(), SignalError>;

    /// Check if a process is still running.
    fn is_alive(&self, pid: u32) -> bool;
}
