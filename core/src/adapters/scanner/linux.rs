//! Linux socket owner lookup.
//!
//! `ss -H -a -n -p -t -u` lists every TCP and UDP socket together with the
//! processes holding it. Minimal systems often lack `ss`, so the lookup falls
//! back to `lsof` and then to `netstat -t -u -a -n -p`.
//!
//! Only sockets in a state that a live process holds (listening, connected,
//! or a bound UDP socket) are attributed. Without sufficient privilege the
//! owner of such a socket is simply missing from the output; any such socket
//! makes the whole lookup fail, since a partial owner list would report a
//! port as freed while it is still held.
#![cfg_attr(not(target_os = "linux"), allow(dead_code))]

use std::process::Stdio;
use std::sync::OnceLock;

use regex::Regex;
use tokio::process::Command;
use tracing::debug;

use crate::domain::{PortNumber, ProcessRecord, Protocol};
use crate::error::ResolutionError;

use super::darwin::run_lsof;
use super::utils::Utils;
use super::{enrich, Scanner};

/// ss states of sockets that are held by a process.
const SS_OWNED_STATES: &[&str] = &["LISTEN", "ESTAB", "UNCONN"];

/// netstat states of sockets that are held by a process.
const NETSTAT_OWNED_STATES: &[&str] = &["LISTEN", "ESTABLISHED"];

/// Linux-specific socket owner scanner.
pub struct LinuxScanner;

/// Owners found by one scan, plus the number of held sockets whose owner
/// was not visible.
#[derive(Debug, Default)]
struct SocketScan {
    records: Vec<ProcessRecord>,
    hidden: usize,
}

impl SocketScan {
    /// The owners, or `PermissionDenied` if any owner was not visible.
    fn into_owners(self, port: PortNumber) -> Result<Vec<ProcessRecord>, ResolutionError> {
        if self.hidden > 0 {
            return Err(ResolutionError::PermissionDenied(format!(
                "{} socket(s) bound to port {} belong to processes that are not visible; retry with elevated privileges",
                self.hidden, port
            )));
        }
        Ok(self.records)
    }
}

fn users_regex() -> &'static Regex {
    static USERS: OnceLock<Regex> = OnceLock::new();
    USERS.get_or_init(|| {
        Regex::new(r#"\("(.*?)",pid=(\d+),fd=(\d+)\)"#).expect("static regex is valid")
    })
}

impl LinuxScanner {
    pub fn new() -> Self {
        Self
    }

    /// Parse ss output into records for `port`.
    ///
    /// Expected ss output format (`-H` drops the header):
    /// ```text
    /// tcp   LISTEN 0      4096         0.0.0.0:8080      0.0.0.0:*    users:(("python3",pid=4321,fd=3))
    /// udp   UNCONN 0      0      127.0.0.53%lo:53        0.0.0.0:*    users:(("systemd-resolve",pid=612,fd=13))
    /// ```
    fn parse_ss_output(&self, output: &str, port: PortNumber, protocol: Option<Protocol>) -> SocketScan {
        let mut scan = SocketScan::default();

        for line in output.lines() {
            // [Netid] [State] [Recv-Q] [Send-Q] [Local Address:Port] [Peer Address:Port] [Process]
            let components: Vec<&str> = line.split_whitespace().collect();
            if components.len() < 6 {
                continue;
            }

            let Ok(proto) = components[0].parse::<Protocol>() else {
                continue;
            };
            if !proto.allowed_by(protocol) {
                continue;
            }

            let Some((address, local_port)) = Utils::parse_address(components[4]) else {
                continue;
            };
            if local_port != port.get() {
                continue;
            }

            // TIME-WAIT and the other closing states have no owning process
            if !SS_OWNED_STATES.contains(&components[1]) {
                debug!(port = %port, state = components[1], "Skipping socket without an owner");
                continue;
            }

            let process_column = components[6..].join(" ");
            let mut owners = 0;
            for caps in users_regex().captures_iter(&process_column) {
                let Ok(pid) = caps[2].parse::<u32>() else {
                    continue;
                };
                owners += 1;
                scan.records.push(
                    ProcessRecord::new(pid, port, proto, &caps[1]).with_address(address.clone()),
                );
            }

            if owners == 0 {
                debug!(port = %port, protocol = %proto, "Socket without visible owner");
                scan.hidden += 1;
            }
        }

        scan
    }

    /// Parse `netstat -t -u -a -n -p` output into records for `port`.
    ///
    /// ```text
    /// Proto Recv-Q Send-Q Local Address           Foreign Address         State       PID/Program name
    /// tcp        0      0 0.0.0.0:8080            0.0.0.0:*               LISTEN      4321/python3
    /// udp        0      0 0.0.0.0:5353            0.0.0.0:*                           -
    /// ```
    fn parse_netstat_output(
        &self,
        output: &str,
        port: PortNumber,
        protocol: Option<Protocol>,
    ) -> SocketScan {
        let mut scan = SocketScan::default();

        for line in output.lines() {
            let components: Vec<&str> = line.split_whitespace().collect();
            if components.len() < 6 {
                continue;
            }

            let Ok(proto) = components[0].parse::<Protocol>() else {
                continue;
            };
            if !proto.allowed_by(protocol) {
                continue;
            }

            let Some((address, local_port)) = Utils::parse_address(components[3]) else {
                continue;
            };
            if local_port != port.get() {
                continue;
            }

            // UDP sockets usually have an empty State column
            let (state, owner) = match components[5] {
                s if is_state(s) => (Some(s), components[6..].join(" ")),
                _ => (None, components[5..].join(" ")),
            };
            let held = match state {
                Some(s) => NETSTAT_OWNED_STATES.contains(&s),
                None => proto == Protocol::Udp,
            };
            if !held {
                debug!(port = %port, state = ?state, "Skipping socket without an owner");
                continue;
            }

            let parsed = owner
                .split_once('/')
                .and_then(|(pid, name)| Some((pid.parse::<u32>().ok()?, name)));
            match parsed {
                Some((pid, name)) => scan
                    .records
                    .push(ProcessRecord::new(pid, port, proto, name).with_address(address)),
                None => {
                    debug!(port = %port, protocol = %proto, "Socket without visible owner");
                    scan.hidden += 1;
                }
            }
        }

        scan
    }

    async fn query_ss(
        &self,
        port: PortNumber,
        protocol: Option<Protocol>,
    ) -> Result<Vec<ProcessRecord>, ResolutionError> {
        // Both netids are always requested so the Netid column is present.
        let stdout = run("ss", &["-H", "-a", "-n", "-p", "-t", "-u"]).await?;
        self.parse_ss_output(&stdout, port, protocol).into_owners(port)
    }

    async fn query_netstat(
        &self,
        port: PortNumber,
        protocol: Option<Protocol>,
    ) -> Result<Vec<ProcessRecord>, ResolutionError> {
        let stdout = run("netstat", &["-t", "-u", "-a", "-n", "-p"]).await?;
        self.parse_netstat_output(&stdout, port, protocol).into_owners(port)
    }
}

fn is_state(column: &str) -> bool {
    column.starts_with(|c: char| c.is_ascii_uppercase())
        && column.chars().all(|c| c.is_ascii_uppercase() || c == '_')
}

/// Run a socket listing command and return its stdout.
async fn run(program: &str, args: &[&str]) -> Result<String, ResolutionError> {
    let output = Command::new(program)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| ResolutionError::CommandFailed(format!("Failed to run {}: {}", program, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ResolutionError::CommandFailed(format!(
            "{} exited with {}: {}",
            program,
            output.status,
            stderr.trim()
        )));
    }

    String::from_utf8(output.stdout).map_err(|e| {
        ResolutionError::ParseError(format!("Invalid UTF-8 in {} output: {}", program, e))
    })
}

impl Default for LinuxScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Scanner for LinuxScanner {
    async fn list_owners(
        &self,
        port: PortNumber,
        protocol: Option<Protocol>,
    ) -> Result<Vec<ProcessRecord>, ResolutionError> {
        let records = match self.query_ss(port, protocol).await {
            Err(ResolutionError::CommandFailed(reason)) => {
                debug!(reason = %reason, "ss unavailable, falling back to lsof");
                match run_lsof("lsof", port, protocol).await {
                    Err(ResolutionError::CommandFailed(reason)) => {
                        debug!(reason = %reason, "lsof unavailable, falling back to netstat");
                        self.query_netstat(port, protocol).await?
                    }
                    other => other?,
                }
            }
            other => other?,
        };

        Ok(enrich(records).await)
    }
}
