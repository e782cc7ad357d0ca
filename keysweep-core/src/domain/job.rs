//! Job domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Search job record
///
/// Structure owned by the server registry. Every read hands out a clone, so a
/// `Job` value is always a complete, consistent copy of one committed state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub fingerprint: String,
    pub alphabet: String,
    pub max_length: usize,
    pub total_keyspace: u64,
    pub status: JobStatus,
    pub progress_count: u64,
    pub result: Option<String>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Creates a new job in the `Queued` state
    pub fn new(
        id: Uuid,
        fingerprint: String,
        alphabet: String,
        max_length: usize,
        total_keyspace: u64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            fingerprint,
            alphabet,
            max_length,
            total_keyspace,
            status: JobStatus::Queued,
            progress_count: 0,
            result: None,
            failure_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Progress as a whole percentage, derived from the current counters
    pub fn progress_percent(&self) -> u8 {
        progress_percent(self.progress_count, self.total_keyspace)
    }

    /// Applies a terminal outcome to the record
    ///
    /// Callers are responsible for checking that the transition is legal.
    pub fn apply_outcome(&mut self, outcome: Outcome) {
        self.status = outcome.status();
        match outcome {
            Outcome::Succeeded(candidate) => self.result = Some(candidate),
            Outcome::Failed(reason) => self.failure_reason = Some(reason),
            Outcome::NotFound | Outcome::Cancelled => {}
        }
        self.updated_at = Utc::now();
    }
}

/// Job execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    Queued,
    Running,
    Succeeded,
    NotFound,
    Cancelled,
    Failed,
}

impl JobStatus {
    /// Terminal statuses are final: no field of the job changes afterwards
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Succeeded | JobStatus::NotFound | JobStatus::Cancelled | JobStatus::Failed
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "Queued",
            JobStatus::Running => "Running",
            JobStatus::Succeeded => "Succeeded",
            JobStatus::NotFound => "NotFound",
            JobStatus::Cancelled => "Cancelled",
            JobStatus::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal result written by a search worker
///
/// Carrying the candidate and the failure reason inside the variant keeps
/// `result` and `failure_reason` consistent with the status by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Succeeded(String),
    NotFound,
    Cancelled,
    Failed(String),
}

impl Outcome {
    pub fn status(&self) -> JobStatus {
        match self {
            Outcome::Succeeded(_) => JobStatus::Succeeded,
            Outcome::NotFound => JobStatus::NotFound,
            Outcome::Cancelled => JobStatus::Cancelled,
            Outcome::Failed(_) => JobStatus::Failed,
        }
    }
}

/// Read projection of a job, as returned by the status service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub id: Uuid,
    pub status: JobStatus,
    pub progress_count: u64,
    pub total_keyspace: u64,
    pub result: Option<String>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobSnapshot {
    pub fn progress_percent(&self) -> u8 {
        progress_percent(self.progress_count, self.total_keyspace)
    }
}

impl From<&Job> for JobSnapshot {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id,
            status: job.status,
            progress_count: job.progress_count,
            total_keyspace: job.total_keyspace,
            result: job.result.clone(),
            failure_reason: job.failure_reason.clone(),
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

/// round(100 * done / total), with halves rounded up
///
/// An empty keyspace reports 0.
pub fn progress_percent(done: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let done = u128::from(done.min(total));
    let total = u128::from(total);
    ((200 * done + total) / (2 * total)) as u8
}
