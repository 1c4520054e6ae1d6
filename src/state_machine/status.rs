use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::MigrationState;

/// A single snapshot of a migration's progress, built fresh on every poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatus {
    pub state: MigrationState,
    /// Present once the transfer has begun.
    pub bytes_processed: Option<u64>,
    /// Only meaningful once the migration has succeeded.
    pub objects_failed: Option<u64>,
}

#[cfg(test)]
impl JobStatus {
    pub fn new(state: MigrationState) -> Self {
        Self {
            state,
            bytes_processed: None,
            objects_failed: None,
        }
    }

    pub fn with_bytes(mut self, bytes: u64) -> Self {
        self.bytes_processed = Some(bytes);
        self
    }

    pub fn with_objects_failed(mut self, failed: u64) -> Self {
        self.objects_failed = Some(failed);
        self
    }
}

impl JobStatus {
    /// True only for a SUCCEEDED migration with no failed objects.
    pub fn is_clean_success(&self) -> bool {
        self.state == MigrationState::Succeeded && self.objects_failed.unwrap_or(0) == 0
    }
}

/// Structured record produced when polling finishes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollSummary {
    pub job_id: i64,
    pub final_status: JobStatus,
    /// Successful fetches, including the terminal one.
    pub polls: u32,
    /// Transient fetch failures absorbed along the way.
    pub failures: u32,
    /// Observed states with consecutive duplicates collapsed.
    pub states: Vec<MigrationState>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: i64,
}

impl PollSummary {
    pub fn new(
        job_id: i64,
        final_status: JobStatus,
        polls: u32,
        failures: u32,
        states: Vec<MigrationState>,
        started_at: DateTime<Utc>,
    ) -> Self {
        let finished_at = Utc::now();
        Self {
            job_id,
            final_status,
            polls,
            failures,
            states,
            started_at,
            finished_at,
            duration_ms: (finished_at - started_at).num_milliseconds(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_counters() {
        let status = JobStatus::new(MigrationState::InProgress).with_bytes(1024);
        assert_eq!(status.bytes_processed, Some(1024));
        assert_eq!(status.objects_failed, None);
    }

    #[test]
    fn clean_success_requires_no_failed_objects() {
        assert!(JobStatus::new(MigrationState::Succeeded).is_clean_success());
        assert!(
            JobStatus::new(MigrationState::Succeeded)
                .with_objects_failed(0)
                .is_clean_success()
        );
        assert!(
            !JobStatus::new(MigrationState::Succeeded)
                .with_objects_failed(3)
                .is_clean_success()
        );
        assert!(!JobStatus::new(MigrationState::Failed).is_clean_success());
    }

    #[test]
    fn summary_serializes_states_by_wire_name() {
        let started = Utc::now();
        let summary = PollSummary::new(
            42,
            JobStatus::new(MigrationState::Succeeded).with_objects_failed(0),
            3,
            1,
            vec![MigrationState::Waiting, MigrationState::Succeeded],
            started,
        );
        assert!(summary.duration_ms >= 0);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["job_id"], 42);
        assert_eq!(json["states"][0], "WAITING");
        assert_eq!(json["final_status"]["state"], "SUCCEEDED");
    }
}
