//! Unix process control using `kill(2)`.

use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tracing::{debug, warn};

use crate::error::SignalError;
use crate::ports::SignalKind;

#[derive(Debug, Default)]
pub struct UnixProcessController;

/// Convert to a nix pid, refusing values that address process groups.
///
/// `kill(0, ..)` signals our own process group and negative values signal
/// whole groups, so pid 0 and anything above `i32::MAX` are never valid.
fn target(pid: u32) -> Option<Pid> {
    match i32::try_from(pid) {
        Ok(raw) if raw > 0 => Some(Pid::from_raw(raw)),
        _ => None,
    }
}

impl UnixProcessController {
    pub fn send_signal(&self, pid: u32, kind: SignalKind) -> Result<(), SignalError> {
        let Some(target) = target(pid) else {
            warn!(pid = pid, "Refusing to signal an invalid pid");
            return Err(SignalError::NoSuchProcess(pid));
        };

        let signal = match kind {
            SignalKind::Graceful => Signal::SIGTERM,
            SignalKind::Forceful => Signal::SIGKILL,
        };
        debug!(pid = pid, signal = signal.as_str(), "Sending signal to process");

        match kill(target, signal) {
            Ok(()) => Ok(()),
            Err(Errno::ESRCH) => Err(SignalError::NoSuchProcess(pid)),
            Err(Errno::EPERM) => Err(SignalError::PermissionDenied(pid)),
            Err(e) => Err(SignalError::Failed {
                pid,
                reason: e.desc().to_string(),
            }),
        }
    }

    pub fn is_alive(&self, pid: u32) -> bool {
        let Some(target) = target(pid) else {
            return false;
        };

        // The null signal only checks existence; EPERM means it exists but is not ours
        match kill(target, None) {
            Ok(()) | Err(Errno::EPERM) => !is_zombie(pid),
            Err(_) => false,
        }
    }
}

/// A zombie has exited and only waits to be reaped by its parent.
#[cfg(target_os = "linux")]
fn is_zombie(pid: u32) -> bool {
    std::fs::read_to_string(format!("/proc/{}/stat", pid))
        .ok()
        .and_then(|stat| stat_state(&stat))
        .map_or(false, |state| state == 'Z')
}

#[cfg(not(target_os = "linux"))]
fn is_zombie(_pid: u32) -> bool {
    false
}

/// The state field of `/proc/<pid>/stat`; the command name may contain spaces
/// and parentheses, so parsing starts after the last `)`.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn stat_state(stat: &str) -> Option<char> {
    let rest = &stat[stat.rfind(')')? + 1..];
    rest.trim_start().chars().next()
}
