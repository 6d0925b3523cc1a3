//! macOS socket owner lookup using lsof.
#![cfg_attr(not(target_os = "macos"), allow(dead_code))]

use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::domain::{PortNumber, ProcessRecord, Protocol};
use crate::error::ResolutionError;

use super::utils::Utils;
use super::{enrich, unprivileged, Scanner};

/// macOS-specific scanner using lsof.
pub struct DarwinScanner;

impl DarwinScanner {
    /// Create a new macOS scanner.
    pub fn new() -> Self {
        Self
    }
}

pub(super) fn lsof_args(port: PortNumber, protocol: Option<Protocol>) -> Vec<String> {
    let mut args: Vec<String> = ["-n", "-P", "+c", "0"].iter().map(|s| s.to_string()).collect();
    for proto in Protocol::ALL {
        if proto.allowed_by(protocol) {
            args.push(format!("-i{}:{}", proto.as_str().to_uppercase(), port));
        }
    }
    args
}

/// Parse lsof output into records for `port`.
///
/// `lsof -i :PORT` also reports clients connected *to* the port; their
/// local endpoint is an ephemeral port, so they are dropped here.
pub(super) fn parse_lsof_output(output: &str, port: PortNumber) -> Vec<ProcessRecord> {
    let mut records = Vec::new();

    for line in output.lines().skip(1) {
        let components: Vec<&str> = line.split_whitespace().collect();
        if components.len() < 9 {
            continue;
        }

        let owner_name = components[0].replace("\\x20", " ").replace("\\x2f", "/");

        let pid: u32 = match components[1].parse() {
            Ok(p) => p,
            Err(_) => continue,
        };
        let user = components[2];

        let Ok(protocol) = components[7].parse::<Protocol>() else {
            continue;
        };

        let Some(name) = components[8..]
            .iter()
            .rev()
            .find(|c| c.contains(':') && !c.starts_with("0x") && !c.starts_with("0t"))
        else {
            continue;
        };

        let Some((address, local_port)) = Utils::parse_address(Utils::local_endpoint(name)) else {
            continue;
        };
        if local_port != port.get() {
            debug!(pid = pid, owner = %owner_name, local_port, "Skipping client socket");
            continue;
        }

        records.push(
            ProcessRecord::new(pid, port, protocol, owner_name)
                .with_address(address)
                .with_user(user),
        );
    }

    records
}

/// Run lsof and parse its output; exit status 1 only means nothing matched.
pub(super) async fn run_lsof(
    program: &str,
    port: PortNumber,
    protocol: Option<Protocol>,
) -> Result<Vec<ProcessRecord>, ResolutionError> {
    let output = Command::new(program)
        .args(lsof_args(port, protocol))
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| ResolutionError::CommandFailed(format!("Failed to run lsof: {}", e)))?;

    match output.status.code() {
        Some(0) | Some(1) => {}
        _ => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ResolutionError::CommandFailed(format!(
                "lsof exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
    }

    let stdout = String::from_utf8(output.stdout)
        .map_err(|e| ResolutionError::ParseError(format!("Invalid UTF-8 in lsof output: {}", e)))?;

    let records = parse_lsof_output(&stdout, port);

    // Without root, lsof silently omits sockets of other users' processes
    if unprivileged() {
        if records.is_empty() {
            warn!(port = %port, "lsof ran without root; a port held by another user's process would appear free");
        } else {
            debug!(port = %port, "lsof ran without root; other users' sockets may be missing");
        }
    }

    Ok(records)
}

impl Default for DarwinScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Scanner for DarwinScanner {
    async fn list_owners(
        &self,
        port: PortNumber,
        protocol: Option<Protocol>,
    ) -> Result<Vec<ProcessRecord>, ResolutionError> {
        let records = run_lsof("/usr/sbin/lsof", port, protocol).await?;

        Ok(enrich(records).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LSOF_OUTPUT: &str = r#"COMMAND             PID  USER   FD   TYPE             DEVICE SIZE/OFF NODE NAME
node              34805  code   19u  IPv6 0x3d8015e195af1f3f      0t0  TCP [::1]:3000 (LISTEN)
node              34805  code   23u  IPv6 0x3d8015e195af2a1f      0t0  TCP [::1]:3000->[::1]:61234 (ESTABLISHED)
Google\x20Chrome  51200  code   41u  IPv6 0x3d8015e195af3b2f      0t0  TCP [::1]:61234->[::1]:3000 (ESTABLISHED)
mDNSResponder       412  _mdns   8u  IPv4 0x1234567890abcdef      0t0  UDP *:3000
"#;

    fn port(p: u16) -> PortNumber {
        PortNumber::new(p).unwrap()
    }

    #[test]
    fn test_parse_lsof_output() {
        let records = parse_lsof_output(LSOF_OUTPUT, port(3000));

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].pid, 34805);
        assert_eq!(records[0].address, "[::1]");
        assert_eq!(records[0].user, "code");
        assert_eq!(records[2].protocol, Protocol::Udp);
        assert_eq!(records[2].address, "*");
    }

    #[test]
    fn test_client_connections_are_not_owners() {
        let records = parse_lsof_output(LSOF_OUTPUT, port(3000));
        assert!(records.iter().all(|r| r.owner_name != "Google Chrome"));
    }

    #[test]
    fn test_lsof_args() {
        let args = lsof_args(port(8080), None);
        assert!(args.contains(&"-iTCP:8080".to_string()));
        assert!(args.contains(&"-iUDP:8080".to_string()));

        let args = lsof_args(port(8080), Some(Protocol::Udp));
        assert!(!args.contains(&"-iTCP:8080".to_string()));
    }
}
