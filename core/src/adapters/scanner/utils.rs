//! Parsing helpers shared by the platform scanners.

use std::collections::HashMap;

/// Details of a process looked up after the socket scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessDetails {
    pub user: String,
    pub command: String,
}

pub struct Utils;

impl Utils {
    /// Parse an address:port string.
    ///
    /// Handles multiple address formats:
    /// - IPv4: "127.0.0.1:3000" or "*:8080"
    /// - IPv6: "\[::1]:3000" or "\[fe80::1]:8080"
    /// - Scoped: "127.0.0.53%lo:53" or "\[fe80::1]%eth0:546"
    ///
    /// Peer columns such as `*:*` or `0.0.0.0:*` yield `None`.
    pub fn parse_address(address: &str) -> Option<(String, u16)> {
        let (host, port_str) = address.rsplit_once(':')?;
        let port: u16 = port_str.parse().ok()?;

        let host = match host.find('%') {
            Some(idx) if !host.starts_with('[') || host[..idx].ends_with(']') => &host[..idx],
            _ => host,
        };

        let host = match host {
            "" | "0.0.0.0" | "[::]" | "*" => "*",
            other => other,
        };
        Some((host.to_string(), port))
    }

    /// The local endpoint of an lsof NAME column (`local->peer` or `local`).
    pub fn local_endpoint(name: &str) -> &str {
        name.split("->").next().unwrap_or(name)
    }

    /// Parse `ps -o pid=,user=,args=` output into a pid lookup table.
    pub fn parse_ps_output(output: &str) -> HashMap<u32, ProcessDetails> {
        let mut details = HashMap::new();

        for line in output.lines() {
            let trimmed = line.trim_start();
            let Some((pid_str, rest)) = trimmed.split_once(char::is_whitespace) else {
                continue;
            };
            let Ok(pid) = pid_str.parse::<u32>() else {
                continue;
            };

            let rest = rest.trim_start();
            let (user, command) = rest
                .split_once(char::is_whitespace)
                .map(|(u, c)| (u, c.trim()))
                .unwrap_or((rest, ""));

            details.insert(
                pid,
                ProcessDetails {
                    user: user.to_string(),
                    command: command.to_string(),
                },
            );
        }

        details
    }

    /// Parse `tasklist /FO CSV /NH` output into a pid -> image name table.
    ///
    /// Each row looks like `"node.exe","4321","Console","1","45,000 K"`.
    pub fn parse_tasklist_csv(output: &str) -> HashMap<u32, String> {
        let mut names = HashMap::new();

        for line in output.lines() {
            let line = line.trim();
            let Some(inner) = line.strip_prefix('"') else {
                continue;
            };
            let mut fields = inner.split("\",\"");
            let (Some(name), Some(pid_str)) = (fields.next(), fields.next()) else {
                continue;
            };
            if let Ok(pid) = pid_str.trim_end_matches('"').parse::<u32>() {
                names.insert(pid, name.to_string());
            }
        }

        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ipv4_address() {
        let (addr, port) = Utils::parse_address("127.0.0.1:3000").unwrap();
        assert_eq!(addr, "127.0.0.1");
        assert_eq!(port, 3000);

        let (addr, port) = Utils::parse_address("0.0.0.0:8080").unwrap();
        assert_eq!(addr, "*");
        assert_eq!(port, 8080);
    }

    #[test]
    fn test_parse_ipv6_address() {
        let (addr, port) = Utils::parse_address("[::1]:3000").unwrap();
        assert_eq!(addr, "[::1]");
        assert_eq!(port, 3000);

        let (addr, port) = Utils::parse_address("[::]:8080").unwrap();
        assert_eq!(addr, "*");
        assert_eq!(port, 8080);
    }

    #[test]
    fn test_parse_scoped_address() {
        let (addr, port) = Utils::parse_address("127.0.0.53%lo:53").unwrap();
        assert_eq!(addr, "127.0.0.53");
        assert_eq!(port, 53);

        let (addr, port) = Utils::parse_address("[fe80::1]%eth0:546").unwrap();
        assert_eq!(addr, "[fe80::1]");
        assert_eq!(port, 546);
    }

    #[test]
    fn test_parse_wildcard_peer() {
        assert!(Utils::parse_address("*:*").is_none());
        assert!(Utils::parse_address("0.0.0.0:*").is_none());
    }

    #[test]
    fn test_local_endpoint() {
        assert_eq!(
            Utils::local_endpoint("127.0.0.1:54321->127.0.0.1:3000"),
            "127.0.0.1:54321"
        );
        assert_eq!(Utils::local_endpoint("*:3000"), "*:3000");
    }

    #[test]
    fn test_parse_ps_output() {
        let output = "  4321 dev      python3 -m http.server 8080\n   112 root     nginx: worker process\n bogus line\n";
        let details = Utils::parse_ps_output(output);

        assert_eq!(details.len(), 2);
        assert_eq!(details[&4321].user, "dev");
        assert_eq!(details[&4321].command, "python3 -m http.server 8080");
        assert_eq!(details[&112].command, "nginx: worker process");
    }

    #[test]
    fn test_parse_tasklist_csv() {
        let output = "\"node.exe\",\"4321\",\"Console\",\"1\",\"45,000 K\"\r\n\"System Idle Process\",\"0\",\"Services\",\"0\",\"8 K\"\r\nINFO: No tasks\r\n";
        let names = Utils::parse_tasklist_csv(output);

        assert_eq!(names[&4321], "node.exe");
        assert_eq!(names[&0], "System Idle Process");
        assert_eq!(names.len(), 2);
    }
}
