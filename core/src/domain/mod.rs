//! Domain layer - Pure business logic and data models.
//!
//! This module contains domain entities that represent core business concepts.
//! These types have no I/O dependencies and can be tested in isolation.

mod filter;
mod outcome;
mod port;
mod record;

// Re-export all domain types
pub use filter::{filter_records, ExclusionPolicy, ExclusionReason, Excluded, FilterOutcome};
pub use outcome::{OperationStatus, TerminationOutcome, TerminationResult};
pub use port::{PortNumber, Protocol};
pub use record::ProcessRecord;
