//! Race-aware process termination.
//!
//! Each pid goes through the same escalation:
//! 1. Re-check liveness; a pid that is already gone is never signaled
//! 2. Send the graceful signal and poll until the grace period elapses
//! 3. If still running, send the forceful signal and poll again
//! 4. Whatever survives both phases is reported as unkillable

use std::collections::HashSet;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::domain::{TerminationOutcome, TerminationResult};
use crate::error::{Error, Result, SignalError};
use crate::ports::{ProcessControlPort, SignalKind};

/// Default wait after the graceful signal.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_millis(2000);
/// Default wait after the forceful signal.
pub const DEFAULT_FORCE_TIMEOUT: Duration = Duration::from_millis(1000);
/// Default liveness poll interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Timing of the graceful-then-forceful escalation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminationPolicy {
    /// How long a process gets to exit after the graceful signal.
    pub grace_period: Duration,
    /// How long to wait for exit after the forceful signal.
    pub force_timeout: Duration,
    /// How often liveness is polled while waiting.
    pub poll_interval: Duration,
}

impl Default for TerminationPolicy {
    fn default() -> Self {
        Self {
            grace_period: DEFAULT_GRACE_PERIOD,
            force_timeout: DEFAULT_FORCE_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl TerminationPolicy {
    pub fn new(grace_period: Duration, force_timeout: Duration, poll_interval: Duration) -> Result<Self> {
        let policy = Self {
            grace_period,
            force_timeout,
            poll_interval,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Reject a zero poll interval, which would spin.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(Error::Config("poll interval must be greater than zero".to_string()));
        }
        Ok(())
    }
}

/// Terminates processes with a graceful-then-forceful escalation.
pub struct ProcessTerminator<C: ProcessControlPort> {
    control: C,
    policy: TerminationPolicy,
}

impl<C: ProcessControlPort> ProcessTerminator<C> {
    pub fn new(control: C) -> Self {
        Self::with_policy(control, TerminationPolicy::default())
    }

    pub fn with_policy(control: C, policy: TerminationPolicy) -> Self {
        Self { control, policy }
    }

    pub fn policy(&self) -> &TerminationPolicy {
        &self.policy
    }

    pub fn into_control(self) -> C {
        self.control
    }

    /// Terminate every pid, returning one result per distinct pid in input order.
    ///
    /// Pids are processed one after another; a failure for one pid never
    /// stops the rest of the batch. An empty input performs no OS calls.
    pub async fn terminate<I>(&self, pids: I) -> Vec<TerminationResult>
    where
        I: IntoIterator<Item = u32>,
    {
        let mut seen = HashSet::new();
        let mut results = Vec::new();

        for pid in pids {
            if !seen.insert(pid) {
                continue;
            }
            let outcome = self.terminate_one(pid).await;
            info!(pid = pid, outcome = %outcome, "Termination finished");
            results.push(TerminationResult::new(pid, outcome));
        }

        results
    }

    async fn terminate_one(&self, pid: u32) -> TerminationOutcome {
        // The pid came from a snapshot; it may have exited (and been reused) since
        if !self.control.is_alive(pid) {
            debug!(pid = pid, "Process already gone, not signaling");
            return TerminationOutcome::AlreadyExited;
        }

        match self.control.send_signal(pid, SignalKind::Graceful) {
            Ok(()) => {
                debug!(pid = pid, "Graceful signal sent, waiting for exit");
                if self.wait_for_exit(pid, self.policy.grace_period).await {
                    return TerminationOutcome::Exited;
                }
                debug!(pid = pid, "Process still running after grace period");
            }
            Err(SignalError::NoSuchProcess(_)) => {
                debug!(pid = pid, "Process exited before the graceful signal");
                return TerminationOutcome::AlreadyExited;
            }
            Err(SignalError::PermissionDenied(_)) => {
                warn!(pid = pid, "Permission denied to signal process");
                return TerminationOutcome::PermissionDenied;
            }
            Err(e) => {
                warn!(pid = pid, error = %e, "Graceful signal failed, escalating");
            }
        }

        match self.control.send_signal(pid, SignalKind::Forceful) {
            Ok(()) => {
                debug!(pid = pid, "Forceful signal sent, waiting for exit");
            }
            Err(SignalError::NoSuchProcess(_)) => {
                debug!(pid = pid, "Process exited during the grace period");
                return TerminationOutcome::Exited;
            }
            Err(SignalError::PermissionDenied(_)) => {
                warn!(pid = pid, "Permission denied to force kill process");
                return TerminationOutcome::PermissionDenied;
            }
            Err(e) => {
                warn!(pid = pid, error = %e, "Forceful signal failed");
                return if self.control.is_alive(pid) {
                    TerminationOutcome::Unkillable
                } else {
                    TerminationOutcome::Exited
                };
            }
        }

        if self.wait_for_exit(pid, self.policy.force_timeout).await {
            TerminationOutcome::Exited
        } else {
            warn!(pid = pid, "Process survived the forceful signal");
            TerminationOutcome::Unkillable
        }
    }

    /// Poll liveness until the process is gone or `timeout` elapses.
    async fn wait_for_exit(&self, pid: u32, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let interval = self.policy.poll_interval.max(Duration::from_millis(1));

        loop {
            if !self.control.is_alive(pid) {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            sleep(interval.min(deadline - now)).await;
        }
    }
}
