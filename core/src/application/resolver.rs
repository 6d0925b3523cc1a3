//! Port to process resolution.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::domain::{PortNumber, ProcessRecord, Protocol};
use crate::error::Result;
use crate::ports::SocketOwnerPort;

/// Resolves the processes currently bound to a port.
///
/// Holds no state between calls; every resolution queries the OS afresh.
pub struct PortResolver<S: SocketOwnerPort> {
    scanner: S,
}

impl<S: SocketOwnerPort> PortResolver<S> {
    pub fn new(scanner: S) -> Self {
        Self { scanner }
    }

    /// Resolve the owners of `port` across TCP and UDP.
    ///
    /// Fails with `InvalidPort` for port 0 before touching the OS.
    pub async fn resolve(&self, port: u16) -> Result<Vec<ProcessRecord>> {
        self.resolve_protocol(port, None).await
    }

    /// Resolve the owners of `port`, optionally restricted to one protocol.
    pub async fn resolve_protocol(
        &self,
        port: u16,
        protocol: Option<Protocol>,
    ) -> Result<Vec<ProcessRecord>> {
        let port = PortNumber::new(port)?;
        self.resolve_port(port, protocol).await
    }

    /// Resolve an already validated port.
    ///
    /// The result holds one record per (pid, protocol), sorted by pid, and
    /// every record's port equals `port`.
    pub async fn resolve_port(
        &self,
        port: PortNumber,
        protocol: Option<Protocol>,
    ) -> Result<Vec<ProcessRecord>> {
        debug!(port = %port, protocol = ?protocol, "Resolving port owners");

        let owners = self
            .scanner
            .list_owners(port, protocol)
            .await
            .inspect_err(|e| warn!(port = %port, error = %e, "Port resolution failed"))?;

        let mut seen = HashSet::new();
        let mut records: Vec<ProcessRecord> = owners
            .into_iter()
            .filter(|r| {
                let matches = r.port == port && r.protocol.allowed_by(protocol);
                if !matches {
                    debug!(pid = r.pid, found = %r.port, protocol = %r.protocol, "Dropping mismatched socket");
                }
                matches
            })
            .filter(|r| seen.insert((r.pid, r.protocol)))
            .collect();

        records.sort_by_key(|r| (r.pid, r.protocol));
        debug!(port = %port, owners = records.len(), "Resolved port owners");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ResolutionError};
    use crate::testing::{Call, FakeSystem};

    fn port(p: u16) -> PortNumber {
        PortNumber::new(p).unwrap()
    }

    #[tokio::test]
    async fn test_resolve_single_listener() {
        let system = FakeSystem::new().with_socket(4321, 8080, Protocol::Tcp, "python3");
        let resolver = PortResolver::new(system);

        let records = resolver.resolve(8080).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].pid, 4321);
        assert_eq!(records[0].port, 8080);
        assert_eq!(records[0].protocol, Protocol::Tcp);
    }

    #[tokio::test]
    async fn test_resolve_unbound_port_is_empty() {
        let resolver = PortResolver::new(FakeSystem::new());
        assert!(resolver.resolve(9999).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_port_never_queries_os() {
        let system = FakeSystem::new();
        let resolver = PortResolver::new(system.clone());

        let err = resolver.resolve(0).await.unwrap_err();
        assert!(matches!(err, Error::InvalidPort(0)));
        assert!(system.calls().is_empty());
    }

    #[tokio::test]
    async fn test_every_record_matches_requested_port() {
        let system = FakeSystem::new()
            .with_socket(111, 3000, Protocol::Tcp, "node")
            .with_socket(112, 3000, Protocol::Tcp, "node")
            .with_socket(200, 3001, Protocol::Tcp, "node")
            .with_socket(201, 30000, Protocol::Udp, "node");
        let resolver = PortResolver::new(system);

        let records = resolver.resolve(3000).await.unwrap();
        let pids: Vec<u32> = records.iter().map(|r| r.pid).collect();
        assert_eq!(pids, vec![111, 112]);
        assert!(records.iter().all(|r| r.port == port(3000)));
    }

    #[tokio::test]
    async fn test_duplicate_sockets_collapse() {
        let system = FakeSystem::new()
            .with_socket(50, 5353, Protocol::Udp, "avahi")
            .with_socket(50, 5353, Protocol::Udp, "avahi")
            .with_socket(50, 5353, Protocol::Tcp, "avahi");
        let resolver = PortResolver::new(system);

        let records = resolver.resolve(5353).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].protocol, Protocol::Tcp);
        assert_eq!(records[1].protocol, Protocol::Udp);
    }

    #[tokio::test]
    async fn test_protocol_restriction() {
        let system = FakeSystem::new()
            .with_socket(60, 53, Protocol::Udp, "dnsmasq")
            .with_socket(61, 53, Protocol::Tcp, "dnsmasq");
        let resolver = PortResolver::new(system.clone());

        let records = resolver.resolve_protocol(53, Some(Protocol::Udp)).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].pid, 60);
        assert_eq!(system.calls(), vec![Call::ListOwners(53, Some(Protocol::Udp))]);
    }

    #[tokio::test]
    async fn test_resolution_failure_aborts() {
        let system = FakeSystem::new()
            .with_socket(1, 8080, Protocol::Tcp, "node")
            .failing_with(ResolutionError::PermissionDenied("not root".to_string()));
        let resolver = PortResolver::new(system);

        let err = resolver.resolve(8080).await.unwrap_err();
        assert!(err.is_resolution_failure());
    }
}
