//! Job Registry
//!
//! In-memory store of every job accepted by this process.
//!
//! Each job lives behind its own `watch` channel. Writers go through
//! `send_if_modified`, which serializes mutations of one job without touching
//! any other job, and readers clone the last committed record, so a reader
//! never sees a half-applied update. The same channel backs `subscribe`, which
//! lets callers wait for changes instead of polling.
//!
//! The map itself is only locked (per shard) to look a job up, insert it, or
//! purge it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use keysweep_core::domain::job::{Job, JobStatus, Outcome};
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Registry error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("job {0} not found")]
    NotFound(Uuid),

    #[error("job {0} already exists")]
    DuplicateId(Uuid),

    #[error("cannot {action} job {id} in state {status}")]
    InvalidTransition {
        id: Uuid,
        status: JobStatus,
        action: &'static str,
    },

    #[error("progress for job {id} cannot go back from {current} to {requested}")]
    ProgressRegression {
        id: Uuid,
        current: u64,
        requested: u64,
    },

    #[error("progress {requested} for job {id} exceeds keyspace of {total}")]
    ProgressOverflow { id: Uuid, requested: u64, total: u64 },
}

struct JobEntry {
    record: watch::Sender<Job>,
    cancel: CancellationToken,
}

/// Concurrency-safe mapping from job id to job record
#[derive(Default)]
pub struct Registry {
    jobs: DashMap<Uuid, Arc<JobEntry>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, id: Uuid) -> Result<Arc<JobEntry>, RegistryError> {
        self.jobs
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(RegistryError::NotFound(id))
    }

    /// Inserts a new job; it must still be `Queued`
    pub fn create(&self, job: Job) -> Result<(), RegistryError> {
        if job.status != JobStatus::Queued {
            return Err(RegistryError::InvalidTransition {
                id: job.id,
                status: job.status,
                action: "register",
            });
        }

        match self.jobs.entry(job.id) {
            Entry::Occupied(_) => Err(RegistryError::DuplicateId(job.id)),
            Entry::Vacant(slot) => {
                let (record, _) = watch::channel(job);
                slot.insert(Arc::new(JobEntry {
                    record,
                    cancel: CancellationToken::new(),
                }));
                Ok(())
            }
        }
    }

    /// Moves a job from `Queued` to `Running`
    ///
    /// Returns `false` without changing anything when the job is not queued,
    /// e.g. because it was cancelled before a worker picked it up or a worker
    /// already claimed it.
    pub fn transition_to_running(&self, id: Uuid) -> Result<bool, RegistryError> {
        let entry = self.entry(id)?;
        let moved = entry.record.send_if_modified(|job| {
            if job.status != JobStatus::Queued {
                return false;
            }
            job.status = JobStatus::Running;
            job.updated_at = Utc::now();
            true
        });
        Ok(moved)
    }

    /// Records how many candidates a running job has evaluated
    ///
    /// Lower values than the current count are rejected rather than clamped,
    /// as are values beyond the keyspace and updates to jobs that are not
    /// running. Writing the current value again is accepted and changes
    /// nothing.
    pub fn update_progress(&self, id: Uuid, count: u64) -> Result<(), RegistryError> {
        let entry = self.entry(id)?;
        let mut result = Ok(());
        entry.record.send_if_modified(|job| {
            if job.status != JobStatus::Running {
                result = Err(RegistryError::InvalidTransition {
                    id,
                    status: job.status,
                    action: "update progress of",
                });
                return false;
            }
            if count < job.progress_count {
                result = Err(RegistryError::ProgressRegression {
                    id,
                    current: job.progress_count,
                    requested: count,
                });
                return false;
            }
            if count > job.total_keyspace {
                result = Err(RegistryError::ProgressOverflow {
                    id,
                    requested: count,
                    total: job.total_keyspace,
                });
                return false;
            }
            if count == job.progress_count {
                return false;
            }
            job.progress_count = count;
            job.updated_at = Utc::now();
            true
        });
        result
    }

    /// Writes a terminal outcome
    ///
    /// `Succeeded` and `NotFound` require a running job. `Cancelled` and
    /// `Failed` are also accepted for a job that is still queued, so a job
    /// that never reached a worker can be closed out.
    pub fn complete(&self, id: Uuid, outcome: Outcome) -> Result<(), RegistryError> {
        let entry = self.entry(id)?;
        let mut result = Ok(());
        entry.record.send_if_modified(|job| {
            let allowed = match job.status {
                JobStatus::Running => true,
                JobStatus::Queued => matches!(outcome, Outcome::Cancelled | Outcome::Failed(_)),
                _ => false,
            };
            if !allowed {
                result = Err(RegistryError::InvalidTransition {
                    id,
                    status: job.status,
                    action: "complete",
                });
                return false;
            }
            job.apply_outcome(outcome);
            true
        });
        result
    }

    /// Requests cooperative cancellation
    ///
    /// A queued job is cancelled on the spot. A running job gets its
    /// cancellation flag set and is moved to `Cancelled` by its worker at the
    /// next check. Terminal jobs are left alone. Calling this repeatedly has
    /// the same effect as calling it once.
    pub fn request_cancellation(&self, id: Uuid) -> Result<(), RegistryError> {
        let entry = self.entry(id)?;
        entry.cancel.cancel();
        entry.record.send_if_modified(|job| {
            if job.status != JobStatus::Queued {
                return false;
            }
            job.apply_outcome(Outcome::Cancelled);
            true
        });
        Ok(())
    }

    /// Returns a copy of the latest committed record
    pub fn snapshot(&self, id: Uuid) -> Result<Job, RegistryError> {
        let entry = self.entry(id)?;
        let job = entry.record.borrow().clone();
        Ok(job)
    }

    /// Subscribes to every committed change of a job
    pub fn subscribe(&self, id: Uuid) -> Result<watch::Receiver<Job>, RegistryError> {
        Ok(self.entry(id)?.record.subscribe())
    }

    /// The cancellation flag a worker polls while searching
    pub fn cancellation_token(&self, id: Uuid) -> Result<CancellationToken, RegistryError> {
        Ok(self.entry(id)?.cancel.clone())
    }

    /// Removes terminal jobs last updated before `cutoff`
    ///
    /// Queued and running jobs are never removed. Returns how many jobs were
    /// dropped.
    pub fn purge_terminal(&self, cutoff: DateTime<Utc>) -> usize {
        let mut removed = 0;
        self.jobs.retain(|_, entry| {
            let job = entry.record.borrow();
            let expired = job.status.is_terminal() && job.updated_at < cutoff;
            if expired {
                removed += 1;
            }
            !expired
        });
        removed
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
