//! Freeport Core Library
//!
//! Frees a network port by finding the processes bound to it and terminating
//! them. Provides functionality to:
//! - Resolve the owners of a TCP/UDP port from a fresh OS query
//! - Filter out processes that must never be terminated (browsers, ourselves)
//! - Terminate processes gracefully, escalating to a forceful signal
//!
//! # Architecture
//! This library follows hexagonal architecture (ports & adapters):
//! - `domain`: Pure data models and filtering rules
//! - `ports`: Trait definitions for OS capabilities
//! - `adapters`: Platform implementations of those traits
//! - `application`: Use case services
//!
//! # Platform Support
//! - macOS: Uses `lsof` and `ps` commands
//! - Linux: Uses `ss` and `ps` commands
//! - Windows: Uses `netstat`, `tasklist` and `taskkill` commands

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;

#[cfg(test)]
pub(crate) mod testing;

pub use adapters::{PortScanner, ProcessController};
pub use application::{
    FreePortReport, FreePortService, PortResolver, ProcessTerminator, TerminationPolicy,
};
pub use config::{ConfigStore, Settings};
pub use domain::{
    filter_records, ExclusionPolicy, ExclusionReason, Excluded, FilterOutcome, OperationStatus,
    PortNumber, ProcessRecord, Protocol, TerminationOutcome, TerminationResult,
};
pub use error::{Error, ResolutionError, Result, SignalError};

/// Resolve the processes bound to `port` using the platform scanner.
pub async fn resolve(port: u16) -> Result<Vec<ProcessRecord>> {
    PortResolver::new(PortScanner::new()).resolve(port).await
}

/// Terminate `pids` with the default escalation timing.
pub async fn terminate<I>(pids: I) -> Vec<TerminationResult>
where
    I: IntoIterator<Item = u32>,
{
    ProcessTerminator::new(ProcessController::new())
        .terminate(pids)
        .await
}
