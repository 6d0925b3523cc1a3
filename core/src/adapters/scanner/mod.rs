//! Socket owner scanner adapters.
//!
//! Platform-specific implementations of [`SocketOwnerPort`]. The parsers are
//! compiled on every platform so their tests run everywhere; only the
//! selection in [`PortScanner`] is platform dependent.

mod darwin;
mod linux;
pub(crate) mod utils;
mod windows;

use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::domain::{PortNumber, ProcessRecord, Protocol};
use crate::error::ResolutionError;
use crate::ports::SocketOwnerPort;

use utils::Utils;

/// The main port scanner that uses platform-specific implementations.
pub struct PortScanner {
    #[cfg(target_os = "macos")]
    inner: darwin::DarwinScanner,

    #[cfg(target_os = "linux")]
    inner: linux::LinuxScanner,

    #[cfg(target_os = "windows")]
    inner: windows::WindowsScanner,

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    inner: UnsupportedScanner,
}

impl PortScanner {
    /// Create a new port scanner for the current platform.
    pub fn new() -> Self {
        Self {
            #[cfg(target_os = "macos")]
            inner: darwin::DarwinScanner::new(),

            #[cfg(target_os = "linux")]
            inner: linux::LinuxScanner::new(),

            #[cfg(target_os = "windows")]
            inner: windows::WindowsScanner::new(),

            #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
            inner: UnsupportedScanner,
        }
    }
}

impl Default for PortScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl SocketOwnerPort for PortScanner {
    async fn list_owners(
        &self,
        port: PortNumber,
        protocol: Option<Protocol>,
    ) -> Result<Vec<ProcessRecord>, ResolutionError> {
        self.inner.list_owners(port, protocol).await
    }
}

/// Internal trait for platform-specific implementations.
trait Scanner: Send + Sync {
    fn list_owners(
        &self,
        port: PortNumber,
        protocol: Option<Protocol>,
    ) -> impl std::future::Future<Output = Result<Vec<ProcessRecord>, ResolutionError>> + Send;
}

#[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
struct UnsupportedScanner;

#[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
impl Scanner for UnsupportedScanner {
    async fn list_owners(
        &self,
        _port: PortNumber,
        _protocol: Option<Protocol>,
    ) -> Result<Vec<ProcessRecord>, ResolutionError> {
        Err(ResolutionError::UnsupportedPlatform(
            std::env::consts::OS.to_string(),
        ))
    }
}

/// Whether socket owners of other users may be invisible to us.
#[cfg(unix)]
fn unprivileged() -> bool {
    !nix::unistd::geteuid().is_root()
}

#[cfg(not(unix))]
#[allow(dead_code)]
fn unprivileged() -> bool {
    false
}

/// Fill in user and full command line from `ps`.
///
/// Enrichment is best effort: if ps fails the records are returned as-is,
/// since a missing command line never invalidates a socket owner.
async fn enrich(records: Vec<ProcessRecord>) -> Vec<ProcessRecord> {
    if records.is_empty() {
        return records;
    }

    let mut pids: Vec<u32> = records.iter().map(|r| r.pid).collect();
    pids.sort_unstable();
    pids.dedup();
    let pid_list = pids
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(",");

    // Each column needs its own -o: a header rename runs to the end of the argument
    let output = match Command::new("/bin/ps")
        .args(["-o", "pid=", "-o", "user=", "-o", "args=", "-p", &pid_list])
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .await
    {
        Ok(output) => output,
        Err(e) => {
            debug!(error = %e, "ps unavailable, skipping record enrichment");
            return records;
        }
    };

    let details = Utils::parse_ps_output(&String::from_utf8_lossy(&output.stdout));

    records
        .into_iter()
        .map(|record| match details.get(&record.pid) {
            Some(info) => {
                let record = if record.user.is_empty() {
                    record.with_user(info.user.clone())
                } else {
                    record
                };
                record.with_command(info.command.clone())
            }
            None => record,
        })
        .collect()
}
