//! Process control adapters.
//!
//! Platform-specific implementations of [`ProcessControlPort`]:
//! - Unix: `kill(2)` via nix (SIGTERM graceful, SIGKILL forceful, null signal for liveness)
//! - Windows: `taskkill` and `tasklist`

#[cfg(unix)]
mod unix;

#[cfg(windows)]
mod windows;

use crate::error::SignalError;
use crate::ports::{ProcessControlPort, SignalKind};

#[cfg(unix)]
use unix::UnixProcessController as PlatformController;

#[cfg(windows)]
use windows::WindowsProcessController as PlatformController;

/// Signals processes on the current platform.
#[derive(Debug, Default)]
pub struct ProcessController {
    inner: PlatformController,
}

impl ProcessController {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProcessControlPort for ProcessController {
    fn send_signal(&self, pid: u32, kind: SignalKind) -> Result<(), SignalError> {
        self.inner.send_signal(pid, kind)
    }

    fn is_alive(&self, pid: u32) -> bool {
        self.inner.is_alive(pid)
    }
}
