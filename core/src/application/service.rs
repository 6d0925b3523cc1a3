//! Free-port application service.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::adapters::{PortScanner, ProcessController};
use crate::domain::{
    filter_records, Excluded, ExclusionPolicy, FilterOutcome, OperationStatus, PortNumber,
    ProcessRecord, Protocol, TerminationResult,
};
use crate::error::Result;
use crate::ports::{ProcessControlPort, SocketOwnerPort};

use super::{PortResolver, ProcessTerminator, TerminationPolicy};

/// Everything a caller needs to summarize one free-port run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreePortReport {
    pub port: PortNumber,
    /// Records that were handed to the terminator.
    pub kept: Vec<ProcessRecord>,
    /// Records held back by the exclusion policy.
    pub excluded: Vec<Excluded>,
    /// One result per terminated pid.
    pub results: Vec<TerminationResult>,
    pub status: OperationStatus,
}

/// Composes resolve, filter and terminate.
///
/// The service uses the `SocketOwnerPort` and `ProcessControlPort` traits
/// for all OS access, allowing different implementations to be injected.
pub struct FreePortService<S: SocketOwnerPort, C: ProcessControlPort> {
    resolver: PortResolver<S>,
    terminator: ProcessTerminator<C>,
    exclusions: ExclusionPolicy,
}

impl FreePortService<PortScanner, ProcessController> {
    /// A service backed by the current platform's adapters.
    pub fn platform(policy: TerminationPolicy, exclusions: ExclusionPolicy) -> Self {
        Self::new(PortScanner::new(), ProcessController::new())
            .with_policy(policy)
            .with_exclusions(exclusions)
    }
}

impl<S: SocketOwnerPort, C: ProcessControlPort> FreePortService<S, C> {
    /// Create a service with the default escalation timing and exclusions.
    pub fn new(scanner: S, control: C) -> Self {
        Self {
            resolver: PortResolver::new(scanner),
            terminator: ProcessTerminator::new(control),
            exclusions: ExclusionPolicy::default(),
        }
    }

    pub fn with_policy(self, policy: TerminationPolicy) -> Self {
        let Self {
            resolver,
            terminator,
            exclusions,
        } = self;
        let control = terminator.into_control();
        Self {
            resolver,
            terminator: ProcessTerminator::with_policy(control, policy),
            exclusions,
        }
    }

    pub fn with_exclusions(mut self, exclusions: ExclusionPolicy) -> Self {
        self.exclusions = exclusions;
        self
    }

    pub fn exclusions(&self) -> &ExclusionPolicy {
        &self.exclusions
    }

    pub fn policy(&self) -> &TerminationPolicy {
        self.terminator.policy()
    }

    /// Resolve the owners of `port` across TCP and UDP.
    pub async fn resolve(&self, port: u16) -> Result<Vec<ProcessRecord>> {
        self.resolver.resolve(port).await
    }

    /// Apply the exclusion policy to resolved records.
    pub fn filter(&self, records: &[ProcessRecord], port: PortNumber) -> FilterOutcome {
        filter_records(records, port, &self.exclusions)
    }

    /// Terminate the given pids.
    pub async fn terminate<I>(&self, pids: I) -> Vec<TerminationResult>
    where
        I: IntoIterator<Item = u32>,
    {
        self.terminator.terminate(pids).await
    }

    /// Resolve and filter without terminating anything.
    pub async fn inspect(&self, port: PortNumber, protocol: Option<Protocol>) -> Result<FilterOutcome> {
        let records = self.resolver.resolve_port(port, protocol).await?;
        Ok(self.filter(&records, port))
    }

    /// Resolve, filter and terminate the owners of `port`.
    ///
    /// Fails only when resolution fails, in which case nothing was signaled.
    pub async fn free_port(&self, port: PortNumber, protocol: Option<Protocol>) -> Result<FreePortReport> {
        let FilterOutcome { kept, excluded } = self.inspect(port, protocol).await?;

        for held in &excluded {
            info!(pid = held.record.pid, owner = %held.record.owner_name, reason = %held.reason, "Leaving process untouched");
        }

        let results = self.terminator.terminate(kept.iter().map(|r| r.pid)).await;
        let status = OperationStatus::from_results(&results);
        info!(port = %port, status = ?status, "Free port finished");

        Ok(FreePortReport {
            port,
            kept,
            excluded,
            results,
            status,
        })
    }
}
