//! Application layer - Use case services.
//!
//! Services are thin orchestrators that:
//! - Accept domain types as inputs
//! - Use ports (traits) for OS access
//! - Return domain types as outputs

mod resolver;
mod service;
mod terminator;

pub use resolver::PortResolver;
pub use service::{FreePortReport, FreePortService};
pub use terminator::{
    ProcessTerminator, TerminationPolicy, DEFAULT_FORCE_TIMEOUT, DEFAULT_GRACE_PERIOD,
    DEFAULT_POLL_INTERVAL,
};
