//! Socket ownership port (interface).

use crate::domain::{PortNumber, ProcessRecord, Protocol};
use crate::error::ResolutionError;

/// Port for querying which processes own sockets on a port.
///
/// Implementations handle platform-specific details (ss, lsof, netstat).
pub trait SocketOwnerPort: Send + Sync {
    /// List the owners of every listening or connected socket whose local
    /// port is `port`, optionally restricted to one protocol.
    ///
    /// Returns an empty list when nothing is bound. Fails only when the OS
    /// query itself cannot be performed.
    fn list_owners(
        &self,
        port: PortNumber,
        protocol: Option<Protocol>,
    ) -> impl std::future::Future<Output = Result<Vec<ProcessRecord>, ResolutionError>> + Send;
}
