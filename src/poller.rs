//! Polls a migration's status until it reaches a terminal state.
//!
//! [`StatusPoller`] fetches a [`JobStatus`] through a [`StatusSource`],
//! hands every snapshot to a [`StatusObserver`], and stops as soon as the
//! [`Classifier`] says the state is terminal. Transient fetch failures are
//! retried on the same interval up to a consecutive-failure budget.
//! Cancellation is checked before each fetch and raced against each sleep.

use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::{ApiError, MigrationApi};
use crate::state_machine::{Classifier, JobStatus, MigrationState, PollSummary};

/// Anything that can report the current status of a job.
#[allow(async_fn_in_trait)]
pub trait StatusSource {
    async fn fetch(&self, job_id: i64) -> Result<JobStatus, ApiError>;
}

/// Adapts a [`MigrationApi`] into a [`StatusSource`] via `get_migration`.
pub struct ApiStatusSource<'a, A>(pub &'a A);

impl<A: MigrationApi> StatusSource for ApiStatusSource<'_, A> {
    async fn fetch(&self, job_id: i64) -> Result<JobStatus, ApiError> {
        Ok(self.0.get_migration(job_id).await?.status())
    }
}

/// Receives every successfully fetched status, including the final one.
pub trait StatusObserver {
    fn on_status(&mut self, status: &JobStatus);
}

impl<F: FnMut(&JobStatus)> StatusObserver for F {
    fn on_status(&mut self, status: &JobStatus) {
        self(status)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    interval: Duration,
    max_consecutive_failures: u32,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_consecutive_failures: 3,
        }
    }
}

impl PollerConfig {
    /// Both the interval and the failure budget must be non-zero.
    pub fn new(interval: Duration, max_consecutive_failures: u32) -> Result<Self, PollError> {
        if interval.is_zero() {
            return Err(PollError::Config("polling interval must be > 0".into()));
        }
        if max_consecutive_failures == 0 {
            return Err(PollError::Config(
                "max consecutive failures must be > 0".into(),
            ));
        }
        Ok(Self {
            interval,
            max_consecutive_failures,
        })
    }
}

/// How a polling run ended without error.
#[derive(Debug, Clone)]
pub enum PollOutcome {
    /// A terminal state was observed.
    Finished(PollSummary),
    /// The caller cancelled before a terminal state was seen.
    Cancelled {
        last_status: Option<JobStatus>,
        polls: u32,
    },
}

#[derive(Debug, Error)]
pub enum PollError {
    #[error("invalid poller configuration: {0}")]
    Config(String),

    #[error(
        "giving up after {attempts} consecutive failed fetches (last state: {})",
        state_label(.last_state)
    )]
    Exhausted {
        attempts: u32,
        last_state: Option<MigrationState>,
        #[source]
        cause: ApiError,
    },

    #[error("status fetch rejected (last state: {})", state_label(.last_state))]
    Rejected {
        last_state: Option<MigrationState>,
        #[source]
        cause: ApiError,
    },
}

fn state_label(state: &Option<MigrationState>) -> String {
    state
        .as_ref()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "none".to_string())
}

pub struct StatusPoller {
    config: PollerConfig,
    classifier: Classifier,
}

impl StatusPoller {
    pub fn new(config: PollerConfig, classifier: Classifier) -> Self {
        Self { config, classifier }
    }

    /// Poll `job_id` until a terminal state, a cancellation, or an error.
    ///
    /// The observer is called exactly once per successful fetch, before the
    /// termination check. A terminal state returns without sleeping.
    pub async fn poll<S, O>(
        &self,
        job_id: i64,
        source: &S,
        observer: &mut O,
        cancel: &CancellationToken,
    ) -> Result<PollOutcome, PollError>
    where
        S: StatusSource,
        O: StatusObserver,
    {
        let started_at = Utc::now();
        let mut polls: u32 = 0;
        let mut failures: u32 = 0;
        let mut consecutive: u32 = 0;
        let mut last_status: Option<JobStatus> = None;
        let mut states: Vec<MigrationState> = Vec::new();
        debug!(
            job_id,
            interval_ms = self.config.interval.as_millis() as u64,
            max_failures = self.config.max_consecutive_failures,
            "polling started"
        );

        loop {
            if cancel.is_cancelled() {
                return Ok(PollOutcome::Cancelled { last_status, polls });
            }

            match source.fetch(job_id).await {
                Ok(status) => {
                    consecutive = 0;
                    polls += 1;
                    if status.state.is_unknown() {
                        warn!(job_id, state = %status.state, "unrecognised migration state, still polling");
                    }
                    debug!(job_id, state = %status.state, bytes = ?status.bytes_processed, "polled");

                    observer.on_status(&status);
                    if states.last() != Some(&status.state) {
                        states.push(status.state.clone());
                    }

                    if self.classifier.is_terminal(&status.state) {
                        return Ok(PollOutcome::Finished(PollSummary::new(
                            job_id, status, polls, failures, states, started_at,
                        )));
                    }
                    last_status = Some(status);
                }
                Err(cause) if cause.is_transient() => {
                    consecutive += 1;
                    failures += 1;
                    if consecutive >= self.config.max_consecutive_failures {
                        return Err(PollError::Exhausted {
                            attempts: consecutive,
                            last_state: last_status.map(|s| s.state),
                            cause,
                        });
                    }
                    warn!(
                        job_id,
                        attempt = consecutive,
                        max = self.config.max_consecutive_failures,
                        error = %cause,
                        "status fetch failed, retrying"
                    );
                }
                Err(cause) => {
                    return Err(PollError::Rejected {
                        last_state: last_status.map(|s| s.state),
                        cause,
                    });
                }
            }

            if cancel.is_cancelled() {
                return Ok(PollOutcome::Cancelled { last_status, polls });
            }
            tokio::select! {
                _ = cancel.cancelled() => {
                    return Ok(PollOutcome::Cancelled { last_status, polls });
                }
                _ = sleep(self.config.interval) => {}
            }
        }
    }
}
