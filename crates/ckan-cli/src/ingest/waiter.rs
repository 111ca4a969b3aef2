//! Ingestion waiter
//!
//! Waits for a server-side ingestion job to reach a terminal state. The decision
//! logic lives in [`IngestionWaiter`], a state machine that is fed the current
//! time and the result of each side effect and answers with the next [`Action`].
//! [`wait_for_ingestion`] drives it against a real monitor and the tokio clock.
//!
//! Each iteration checks the deadline before querying the status, so a job that
//! completes right as the timeout passes is still judged by elapsed time.

use crate::error::Result;
use crate::ingest::monitor::{IngestionMonitor, PollStatus};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

// ============================================================================
// Waiter Defaults
// ============================================================================

/// Time one ingestion attempt may take before it is considered stuck
pub const DEFAULT_WAIT_TIMEOUT_SECS: u64 = 120;

/// Pause between two status checks
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Times a stuck job is re-triggered (only for monitors that support it)
pub const DEFAULT_MAX_RESUBMISSIONS: u32 = 2;

/// Waiter settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    /// Per-attempt timeout; reset after every successful resubmission
    pub timeout: Duration,
    pub poll_interval: Duration,
    pub max_resubmissions: u32,
    /// Sleep one poll interval before the first check
    pub initial_delay: bool,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_WAIT_TIMEOUT_SECS),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            max_resubmissions: DEFAULT_MAX_RESUBMISSIONS,
            initial_delay: false,
        }
    }
}

impl WaitConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_resubmissions(mut self, max: u32) -> Self {
        self.max_resubmissions = max;
        self
    }

    pub fn with_initial_delay(mut self, initial_delay: bool) -> Self {
        self.initial_delay = initial_delay;
        self
    }
}

/// States of the waiter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitState {
    Waiting,
    Resubmitting,
    Succeeded,
    Failed,
    Aborted,
}

/// How a wait ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    Succeeded,
    /// The job itself reported a failure
    JobFailed(String),
    /// Timeout reached with no resubmissions left
    TimedOut,
    /// Re-triggering the job failed; waiting was abandoned
    ResubmitFailed(String),
}

impl WaitOutcome {
    pub fn state(&self) -> WaitState {
        match self {
            WaitOutcome::Succeeded => WaitState::Succeeded,
            WaitOutcome::JobFailed(_) | WaitOutcome::TimedOut => WaitState::Failed,
            WaitOutcome::ResubmitFailed(_) => WaitState::Aborted,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, WaitOutcome::Succeeded)
    }
}

impl std::fmt::Display for WaitOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WaitOutcome::Succeeded => write!(f, "ingestion completed"),
            WaitOutcome::JobFailed(reason) => write!(f, "ingestion failed: {}", reason),
            WaitOutcome::TimedOut => write!(f, "ingestion timed out"),
            WaitOutcome::ResubmitFailed(reason) => {
                write!(f, "resubmitting the ingestion job failed: {}", reason)
            },
        }
    }
}

/// Next thing the driver has to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Sleep(Duration),
    Poll,
    Resubmit,
    Finish(WaitOutcome),
}

/// Resubmission-and-wait state machine
#[derive(Debug, Clone)]
pub struct IngestionWaiter {
    config: WaitConfig,
    budget: u32,
    state: WaitState,
    started_at: Option<Instant>,
    outcome: Option<WaitOutcome>,
    polls: u32,
    resubmissions: u32,
}

impl IngestionWaiter {
    /// Create a waiter. Without resubmission support the retry budget is zero.
    pub fn new(config: WaitConfig, can_resubmit: bool) -> Self {
        Self {
            budget: if can_resubmit { config.max_resubmissions } else { 0 },
            config,
            state: WaitState::Waiting,
            started_at: None,
            outcome: None,
            polls: 0,
            resubmissions: 0,
        }
    }

    pub fn state(&self) -> WaitState {
        self.state
    }

    pub fn polls(&self) -> u32 {
        self.polls
    }

    pub fn resubmissions(&self) -> u32 {
        self.resubmissions
    }

    /// First action. The attempt clock starts after the optional initial delay.
    pub fn begin(&mut self, now: Instant) -> Action {
        if self.config.initial_delay {
            return Action::Sleep(self.config.poll_interval);
        }
        self.tick(now)
    }

    /// Check the deadline at `now` and decide between polling, resubmitting and giving up
    pub fn tick(&mut self, now: Instant) -> Action {
        if let Some(outcome) = &self.outcome {
            return Action::Finish(outcome.clone());
        }

        let started = *self.started_at.get_or_insert(now);
        if now.saturating_duration_since(started) <= self.config.timeout {
            return Action::Poll;
        }

        if self.resubmissions < self.budget {
            self.resubmissions += 1;
            self.state = WaitState::Resubmitting;
            return Action::Resubmit;
        }

        self.finish(WaitOutcome::TimedOut)
    }

    /// Feed the result of a status query
    pub fn on_status(&mut self, status: Result<PollStatus>) -> Action {
        self.polls += 1;

        match status {
            Err(e) => {
                warn!(error = %e, "Error checking ingestion status, retrying");
                Action::Sleep(self.config.poll_interval)
            },
            Ok(PollStatus::Complete) => self.finish(WaitOutcome::Succeeded),
            Ok(PollStatus::Absent) => {
                debug!("Ingestion job not found, treating it as already complete");
                self.finish(WaitOutcome::Succeeded)
            },
            Ok(PollStatus::Failed(reason)) => self.finish(WaitOutcome::JobFailed(reason)),
            Ok(PollStatus::InProgress) => Action::Sleep(self.config.poll_interval),
        }
    }

    /// Feed the result of a resubmission; success restarts the attempt clock
    pub fn on_resubmitted(&mut self, result: Result<()>, now: Instant) -> Action {
        match result {
            Ok(()) => {
                self.state = WaitState::Waiting;
                self.started_at = Some(now);
                self.tick(now)
            },
            Err(e) => self.finish(WaitOutcome::ResubmitFailed(e.to_string())),
        }
    }

    fn finish(&mut self, outcome: WaitOutcome) -> Action {
        self.state = outcome.state();
        self.outcome = Some(outcome.clone());
        Action::Finish(outcome)
    }
}

/// Summary of a finished wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitReport {
    pub outcome: WaitOutcome,
    pub polls: u32,
    pub resubmissions: u32,
    pub elapsed: Duration,
}

impl WaitReport {
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}

/// Poll `monitor` until the ingestion of `resource_id` reaches a terminal state
///
/// Never fails: transport errors while polling are retried, everything else
/// ends up in the report's outcome.
pub async fn wait_for_ingestion(
    monitor: &dyn IngestionMonitor,
    resource_id: &str,
    config: &WaitConfig,
) -> WaitReport {
    let mut waiter = IngestionWaiter::new(*config, monitor.can_resubmit());
    let started = Instant::now();

    info!(
        resource_id,
        monitor = monitor.name(),
        timeout_secs = config.timeout.as_secs(),
        "Waiting for DataStore ingestion"
    );

    let mut action = waiter.begin(started);
    loop {
        action = match action {
            Action::Sleep(interval) => {
                debug!(resource_id, interval_ms = interval.as_millis() as u64, "Ingestion not finished yet");
                tokio::time::sleep(interval).await;
                waiter.tick(Instant::now())
            },
            Action::Poll => waiter.on_status(monitor.poll(resource_id).await),
            Action::Resubmit => {
                warn!(
                    resource_id,
                    attempt = waiter.resubmissions(),
                    max = config.max_resubmissions,
                    "Ingestion timed out, resubmitting job"
                );
                let result = monitor.resubmit(resource_id).await;
                waiter.on_resubmitted(result, Instant::now())
            },
            Action::Finish(outcome) => {
                let report = WaitReport {
                    outcome,
                    polls: waiter.polls(),
                    resubmissions: waiter.resubmissions(),
                    elapsed: started.elapsed(),
                };
                match &report.outcome {
                    WaitOutcome::Succeeded => info!(resource_id, polls = report.polls, "DataStore is now active"),
                    other => warn!(resource_id, outcome = %other, "Ingestion did not complete"),
                }
                return report;
            },
        };
    }
}
