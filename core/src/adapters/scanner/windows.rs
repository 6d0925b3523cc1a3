//! Windows socket owner lookup using netstat and tasklist.
#![cfg_attr(not(target_os = "windows"), allow(dead_code))]

use std::collections::HashMap;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::domain::{PortNumber, ProcessRecord, Protocol};
use crate::error::ResolutionError;

use super::utils::Utils;
use super::Scanner;

/// Windows-specific scanner.
pub struct WindowsScanner;

impl WindowsScanner {
    pub fn new() -> Self {
        Self
    }

    /// Image names of all running processes; empty when tasklist is unavailable.
    async fn get_process_names(&self) -> HashMap<u32, String> {
        let output = match Command::new("tasklist")
            .args(["/FO", "CSV", "/NH"])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await
        {
            Ok(output) => output,
            Err(_) => return HashMap::new(),
        };

        Utils::parse_tasklist_csv(&String::from_utf8_lossy(&output.stdout))
    }

    /// Parse `netstat -a -n -o` output into records for `port`.
    ///
    /// ```text
    ///   Proto  Local Address          Foreign Address        State           PID
    ///   TCP    0.0.0.0:8080           0.0.0.0:0              LISTENING       4321
    ///   UDP    0.0.0.0:5353           *:*                                    1180
    /// ```
    fn parse_netstat_output(
        &self,
        output: &str,
        port: PortNumber,
        protocol: Option<Protocol>,
        names: &HashMap<u32, String>,
    ) -> Vec<ProcessRecord> {
        let mut records = Vec::new();

        for line in output.lines() {
            let components: Vec<&str> = line.split_whitespace().collect();
            if components.len() < 4 {
                continue;
            }

            let Ok(proto) = components[0].parse::<Protocol>() else {
                continue;
            };
            if !proto.allowed_by(protocol) {
                continue;
            }

            // Sockets lingering in TIME_WAIT are owned by the idle process (pid 0)
            if proto == Protocol::Tcp && components.get(3) == Some(&"TIME_WAIT") {
                continue;
            }

            let Some((address, local_port)) = Utils::parse_address(components[1]) else {
                continue;
            };
            if local_port != port.get() {
                continue;
            }

            let Some(pid) = components.last().and_then(|p| p.parse::<u32>().ok()) else {
                continue;
            };
            if pid == 0 {
                continue;
            }

            let owner_name = names
                .get(&pid)
                .cloned()
                .unwrap_or_else(|| "unknown".to_string());
            debug!(pid = pid, owner = %owner_name, protocol = %proto, "Found socket owner");

            records.push(
                ProcessRecord::new(pid, port, proto, owner_name.clone())
                    .with_address(address)
                    .with_command(owner_name),
            );
        }

        records
    }
}

impl Default for WindowsScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Scanner for WindowsScanner {
    async fn list_owners(
        &self,
        port: PortNumber,
        protocol: Option<Protocol>,
    ) -> Result<Vec<ProcessRecord>, ResolutionError> {
        let output = Command::new("netstat")
            .args(["-a", "-n", "-o"])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| ResolutionError::CommandFailed(format!("Failed to run netstat: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ResolutionError::CommandFailed(format!(
                "netstat exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let names = self.get_process_names().await;

        Ok(self.parse_netstat_output(&stdout, port, protocol, &names))
    }
}
