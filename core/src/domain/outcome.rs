//! Termination outcomes and the overall operation status.

use serde::{Deserialize, Serialize};

/// Terminal state of terminating a single process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TerminationOutcome {
    /// The process exited after one of our signals.
    Exited,
    /// The process was gone before any signal reached it.
    AlreadyExited,
    /// The OS refused to let us signal the process.
    PermissionDenied,
    /// The process survived both the graceful and the forceful phase.
    Unkillable,
}

impl TerminationOutcome {
    /// Whether the port owner is gone.
    pub fn is_success(&self) -> bool {
        matches!(self, TerminationOutcome::Exited | TerminationOutcome::AlreadyExited)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            TerminationOutcome::Exited => "Exited",
            TerminationOutcome::AlreadyExited => "Already exited",
            TerminationOutcome::PermissionDenied => "Permission denied",
            TerminationOutcome::Unkillable => "Unkillable",
        }
    }
}

impl std::fmt::Display for TerminationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Outcome for one submitted process id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminationResult {
    pub pid: u32,
    pub outcome: TerminationOutcome,
}

impl TerminationResult {
    pub fn new(pid: u32, outcome: TerminationOutcome) -> Self {
        Self { pid, outcome }
    }
}

/// Overall status of a free-port operation as reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationStatus {
    /// Every requested process reached `Exited` or `AlreadyExited`.
    Success,
    /// At least one process was `PermissionDenied` or `Unkillable`.
    PartialFailure,
    /// Resolution itself failed; nothing was terminated.
    ResolutionFailure,
}

impl OperationStatus {
    /// Derive the status of a completed termination batch.
    ///
    /// An empty batch ("nothing to free") is a success.
    pub fn from_results(results: &[TerminationResult]) -> Self {
        if results.iter().all(|r| r.outcome.is_success()) {
            OperationStatus::Success
        } else {
            OperationStatus::PartialFailure
        }
    }

    /// Process exit code used by command-line callers.
    pub fn exit_code(&self) -> i32 {
        match self {
            OperationStatus::Success => 0,
            OperationStatus::PartialFailure => 1,
            OperationStatus::ResolutionFailure => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TerminationOutcome::*;

    #[test]
    fn test_status_from_results() {
        assert_eq!(OperationStatus::from_results(&[]), OperationStatus::Success);

        let ok = [
            TerminationResult::new(1, Exited),
            TerminationResult::new(2, AlreadyExited),
        ];
        assert_eq!(OperationStatus::from_results(&ok), OperationStatus::Success);

        let partial = [
            TerminationResult::new(1, Exited),
            TerminationResult::new(2, PermissionDenied),
        ];
        assert_eq!(
            OperationStatus::from_results(&partial),
            OperationStatus::PartialFailure
        );

        let stuck = [TerminationResult::new(3, Unkillable)];
        assert_eq!(
            OperationStatus::from_results(&stuck),
            OperationStatus::PartialFailure
        );
    }

    #[test]
    fn test_outcome_serialization() {
        let result = TerminationResult::new(4321, AlreadyExited);
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(json, r#"{"pid":4321,"outcome":"alreadyExited"}"#);
    }
}
