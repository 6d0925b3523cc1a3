//! Windows process control using taskkill and tasklist.
//!
//! - `taskkill /PID xxx` requests termination (WM_CLOSE)
//! - `taskkill /PID xxx /F` forces termination (TerminateProcess)
//! - `tasklist /FI "PID eq xxx"` checks whether a process exists

use std::process::Command;

use tracing::debug;

use crate::adapters::scanner::utils::Utils;
use crate::error::SignalError;
use crate::ports::SignalKind;

#[derive(Debug, Default)]
pub struct WindowsProcessController;

impl WindowsProcessController {
    pub fn send_signal(&self, pid: u32, kind: SignalKind) -> Result<(), SignalError> {
        if pid == 0 {
            return Err(SignalError::NoSuchProcess(pid));
        }
        debug!(pid = pid, kind = %kind, "Executing taskkill");

        let mut cmd = Command::new("taskkill");
        cmd.arg("/PID").arg(pid.to_string());
        if kind == SignalKind::Forceful {
            cmd.arg("/F");
        }

        let output = cmd.output().map_err(|e| SignalError::Failed {
            pid,
            reason: format!("Failed to run taskkill: {}", e),
        })?;

        if output.status.success() {
            return Ok(());
        }

        let message = format!(
            "{}{}",
            String::from_utf8_lossy(&output.stderr),
            String::from_utf8_lossy(&output.stdout)
        );
        let lower = message.to_lowercase();

        if lower.contains("not found") {
            return Err(SignalError::NoSuchProcess(pid));
        }
        if lower.contains("access is denied") {
            return Err(SignalError::PermissionDenied(pid));
        }

        Err(SignalError::Failed {
            pid,
            reason: message.trim().to_string(),
        })
    }

    pub fn is_alive(&self, pid: u32) -> bool {
        if pid == 0 {
            return false;
        }

        let output = Command::new("tasklist")
            .args(["/FI", &format!("PID eq {}", pid), "/FO", "CSV", "/NH"])
            .output();

        match output {
            Ok(output) => {
                Utils::parse_tasklist_csv(&String::from_utf8_lossy(&output.stdout)).contains_key(&pid)
            }
            Err(e) => {
                debug!(pid = pid, error = %e, "tasklist unavailable, assuming process is gone");
                false
            }
        }
    }
}
