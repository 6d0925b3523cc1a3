//! Ports layer - Trait definitions (interfaces).
//!
//! This module defines the capabilities the application layer needs from the
//! operating system. Implementations live in `adapters`; tests substitute an
//! in-memory fake.

mod process;
mod scanner;

pub use process::{ProcessControlPort, SignalKind};
pub use scanner::SocketOwnerPort;
