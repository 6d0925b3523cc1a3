//! Process record domain model.

use serde::{Deserialize, Serialize};

use super::{PortNumber, Protocol};

/// Maximum length of a stored command line before truncation.
const MAX_COMMAND_LEN: usize = 200;

/// A process found bound to a port at resolution time.
///
/// This is a snapshot, not a handle: the process may exit and its pid be
/// reused the moment after the record was produced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRecord {
    /// Process ID of the socket owner.
    pub pid: u32,
    /// The local port the socket is bound to.
    pub port: PortNumber,
    /// Transport protocol of the socket.
    pub protocol: Protocol,
    /// Short process name as reported by the OS (e.g. `node`).
    pub owner_name: String,
    /// Local address the socket is bound to (`*` for any).
    #[serde(default)]
    pub address: String,
    /// Username of the process owner, if known.
    #[serde(default)]
    pub user: String,
    /// Full command line, if known.
    #[serde(default)]
    pub command: String,
}

impl ProcessRecord {
    pub fn new(pid: u32, port: PortNumber, protocol: Protocol, owner_name: impl Into<String>) -> Self {
        Self {
            pid,
            port,
            protocol,
            owner_name: owner_name.into(),
            address: String::new(),
            user: String::new(),
            command: String::new(),
        }
    }

    /// Set the local bind address.
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    /// Set the owning user.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// Set the command line, truncating very long ones.
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = truncate_command(command.into());
        self
    }

    /// The command line, or the owner name when none was captured.
    pub fn display_command(&self) -> &str {
        if self.command.is_empty() {
            &self.owner_name
        } else {
            &self.command
        }
    }
}

impl std::fmt::Display for ProcessRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{} (PID: {}, Process: {})",
            self.protocol, self.port, self.pid, self.owner_name
        )
    }
}

fn truncate_command(command: String) -> String {
    if command.len() <= MAX_COMMAND_LEN {
        return command;
    }
    let mut end = MAX_COMMAND_LEN;
    while !command.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &command[..end])
}
