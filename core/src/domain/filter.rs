//! Record filtering applied between resolution and termination.
//!
//! Filtering is pure: it never touches the OS and never mutates its input.
//! Everything that could make a destructive action wrong (a browser that is
//! merely connected to the port, a record for another port, our own process)
//! is dropped here.

use std::collections::HashSet;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use super::{PortNumber, ProcessRecord};
use crate::error::{Error, Result};

/// Owner-name patterns of interactive browsers, matched case-insensitively.
const BROWSER_PATTERNS: &[&str] = &[
    r"chrom(e|ium)",
    r"firefox",
    r"^safari",
    r"webkit\.network",
    r"msedge|microsoft edge",
    r"brave",
    r"^opera",
    r"vivaldi",
    r"^arc( helper.*)?$",
];

// ============================================================================
// ExclusionPolicy
// ============================================================================

/// Which records must never be handed to the terminator.
#[derive(Debug, Clone)]
pub struct ExclusionPolicy {
    owner_patterns: Vec<Regex>,
    protected_pids: HashSet<u32>,
}

impl ExclusionPolicy {
    /// An empty policy: only the port re-check applies.
    pub fn none() -> Self {
        Self {
            owner_patterns: Vec::new(),
            protected_pids: HashSet::new(),
        }
    }

    /// The default policy: browsers and the calling process are protected.
    pub fn browsers() -> Self {
        let owner_patterns = BROWSER_PATTERNS
            .iter()
            .filter_map(|p| compile(p).ok())
            .collect();

        Self {
            owner_patterns,
            protected_pids: HashSet::from([std::process::id()]),
        }
    }

    /// Add an owner-name pattern (regex, case-insensitive).
    pub fn with_pattern(mut self, pattern: &str) -> Result<Self> {
        let regex = compile(pattern)
            .map_err(|e| Error::Config(format!("Invalid exclusion pattern '{}': {}", pattern, e)))?;
        self.owner_patterns.push(regex);
        Ok(self)
    }

    /// Never terminate the given pid.
    pub fn with_protected_pid(mut self, pid: u32) -> Self {
        self.protected_pids.insert(pid);
        self
    }

    /// The configured owner patterns as source strings.
    pub fn patterns(&self) -> Vec<&str> {
        self.owner_patterns.iter().map(|r| r.as_str()).collect()
    }

    /// The first pattern matching `owner_name`, if any.
    pub fn matching_pattern(&self, owner_name: &str) -> Option<&str> {
        self.owner_patterns
            .iter()
            .find(|r| r.is_match(owner_name))
            .map(|r| r.as_str())
    }

    /// Why `record` must not be terminated when freeing `port`, if at all.
    pub fn check(&self, record: &ProcessRecord, port: PortNumber) -> Option<ExclusionReason> {
        if record.port != port {
            return Some(ExclusionReason::PortMismatch {
                found: record.port.get(),
            });
        }
        if self.protected_pids.contains(&record.pid) {
            return Some(ExclusionReason::ProtectedPid);
        }
        self.matching_pattern(&record.owner_name)
            .map(|pattern| ExclusionReason::ExcludedOwner {
                pattern: pattern.to_string(),
            })
    }

    /// Keep only the records that may be terminated.
    pub fn filter(&self, records: &[ProcessRecord], port: PortNumber) -> Vec<ProcessRecord> {
        records
            .iter()
            .filter(|r| self.check(r, port).is_none())
            .cloned()
            .collect()
    }
}

impl Default for ExclusionPolicy {
    fn default() -> Self {
        Self::browsers()
    }
}

fn compile(pattern: &str) -> std::result::Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

// ============================================================================
// FilterOutcome
// ============================================================================

/// Reason a record was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ExclusionReason {
    /// The owner name matched an exclusion pattern.
    ExcludedOwner { pattern: String },
    /// The record is for a different port than the one being freed.
    PortMismatch { found: u16 },
    /// The pid is explicitly protected.
    ProtectedPid,
}

impl std::fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExclusionReason::ExcludedOwner { pattern } => write!(f, "owner matches '{}'", pattern),
            ExclusionReason::PortMismatch { found } => write!(f, "bound to port {}", found),
            ExclusionReason::ProtectedPid => f.write_str("protected pid"),
        }
    }
}

/// A dropped record together with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Excluded {
    pub record: ProcessRecord,
    pub reason: ExclusionReason,
}

/// Result of filtering: what may be terminated, and what was held back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOutcome {
    pub kept: Vec<ProcessRecord>,
    pub excluded: Vec<Excluded>,
}

impl FilterOutcome {
    /// Distinct pids of the kept records, in first-seen order.
    pub fn pids(&self) -> Vec<u32> {
        let mut seen = HashSet::new();
        self.kept
            .iter()
            .map(|r| r.pid)
            .filter(|pid| seen.insert(*pid))
            .collect()
    }
}

/// Split records into those that may be terminated and those excluded.
pub fn filter_records(
    records: &[ProcessRecord],
    port: PortNumber,
    policy: &ExclusionPolicy,
) -> FilterOutcome {
    let mut outcome = FilterOutcome::default();

    for record in records {
        match policy.check(record, port) {
            Some(reason) => outcome.excluded.push(Excluded {
                record: record.clone(),
                reason,
            }),
            None => outcome.kept.push(record.clone()),
        }
    }

    outcome
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Protocol;

    fn port(p: u16) -> PortNumber {
        PortNumber::new(p).unwrap()
    }

    fn record(pid: u32, p: u16, name: &str) -> ProcessRecord {
        ProcessRecord::new(pid, port(p), Protocol::Tcp, name)
    }

    #[test]
    fn test_browsers_are_excluded() {
        let policy = ExclusionPolicy::browsers();
        for name in [
            "Google Chrome Helper",
            "chromium-browser",
            "firefox",
            "Safari",
            "com.apple.WebKit.Networking",
            "msedge.exe",
            "Brave Browser",
            "Opera",
            "vivaldi-bin",
            "Arc",
        ] {
            assert!(policy.matching_pattern(name).is_some(), "{} not excluded", name);
        }
    }

    #[test]
    fn test_servers_are_kept() {
        let policy = ExclusionPolicy::browsers();
        for name in ["node", "python3", "nginx", "postgres", "java", "search"] {
            assert!(policy.matching_pattern(name).is_none(), "{} excluded", name);
        }
    }

    #[test]
    fn test_filter_drops_port_mismatch() {
        let records = vec![record(1, 3000, "node"), record(2, 3001, "node")];
        let kept = ExclusionPolicy::none().filter(&records, port(3000));
        assert_eq!(kept, vec![record(1, 3000, "node")]);
    }

    #[test]
    fn test_filter_does_not_mutate_input() {
        let records = vec![record(1, 3000, "firefox"), record(2, 3000, "node")];
        let snapshot = records.clone();
        let kept = ExclusionPolicy::browsers().filter(&records, port(3000));
        assert_eq!(records, snapshot);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].pid, 2);
    }

    #[test]
    fn test_filter_records_reports_reasons() {
        let own_pid = std::process::id();
        let records = vec![
            record(10, 8080, "node"),
            record(11, 8080, "Google Chrome"),
            record(12, 9090, "node"),
            record(own_pid, 8080, "freeport"),
        ];

        let outcome = filter_records(&records, port(8080), &ExclusionPolicy::browsers());

        assert_eq!(outcome.pids(), vec![10]);
        assert_eq!(outcome.excluded.len(), 3);
        assert!(matches!(
            outcome.excluded[0].reason,
            ExclusionReason::ExcludedOwner { .. }
        ));
        assert_eq!(
            outcome.excluded[1].reason,
            ExclusionReason::PortMismatch { found: 9090 }
        );
        assert_eq!(outcome.excluded[2].reason, ExclusionReason::ProtectedPid);
    }

    #[test]
    fn test_protected_pid_covers_every_socket() {
        let mut udp = record(20, 5353, "node");
        udp.protocol = Protocol::Udp;
        let records = vec![record(20, 5353, "node"), udp];
        let policy = ExclusionPolicy::none().with_protected_pid(20);

        let outcome = filter_records(&records, port(5353), &policy);
        assert!(outcome.kept.is_empty());
        assert_eq!(outcome.excluded.len(), 2);
    }

    #[test]
    fn test_custom_pattern() {
        let policy = ExclusionPolicy::none().with_pattern("^postgres$").unwrap();
        let records = vec![record(1, 5432, "Postgres"), record(2, 5432, "postgres-exporter")];
        let kept = policy.filter(&records, port(5432));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].pid, 2);
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        let result = ExclusionPolicy::none().with_pattern("(unclosed");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_pids_are_distinct() {
        let mut udp = record(5, 53, "dnsmasq");
        udp.protocol = Protocol::Udp;
        let outcome = FilterOutcome {
            kept: vec![record(5, 53, "dnsmasq"), udp, record(6, 53, "dnsmasq")],
            excluded: Vec::new(),
        };
        assert_eq!(outcome.pids(), vec![5, 6]);
    }
}
