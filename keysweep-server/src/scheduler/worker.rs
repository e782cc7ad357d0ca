//! Search worker
//!
//! Runs the enumeration for one job on a blocking thread: claims the job,
//! walks the candidate generator, reports progress in batches, and writes the
//! terminal outcome.

use std::sync::Arc;
use std::time::Duration;

use keysweep_core::domain::job::{Job, Outcome};
use keysweep_core::generator::CandidateGenerator;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::matcher::Matcher;
use crate::registry::{Registry, RegistryError};

/// Tuning knobs shared by every worker
#[derive(Debug, Clone, Copy)]
pub struct WorkerSettings {
    /// Candidates evaluated between progress writes and cancellation checks
    pub progress_interval: u64,

    /// Pause after each candidate; zero disables throttling
    pub candidate_delay: Duration,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            progress_interval: 100,
            candidate_delay: Duration::ZERO,
        }
    }
}

/// Executes searches against the registry
pub struct SearchWorker {
    registry: Arc<Registry>,
    matcher: Arc<dyn Matcher>,
    settings: WorkerSettings,
}

impl SearchWorker {
    pub fn new(registry: Arc<Registry>, matcher: Arc<dyn Matcher>, settings: WorkerSettings) -> Self {
        Self {
            registry,
            matcher,
            settings,
        }
    }

    /// Runs the search for `job_id` to completion
    ///
    /// Blocks the calling thread. Returns the outcome that was written, or
    /// `None` when the job was no longer queued (for instance because it was
    /// cancelled before the worker got to it).
    pub fn run(&self, job_id: Uuid) -> Result<Option<Outcome>, RegistryError> {
        if !self.registry.transition_to_running(job_id)? {
            debug!("Job {} is no longer queued, skipping", job_id);
            return Ok(None);
        }

        let job = self.registry.snapshot(job_id)?;
        let cancel = self.registry.cancellation_token(job_id)?;

        info!(
            "Searching job {} ({} candidates, matcher: {})",
            job_id,
            job.total_keyspace,
            self.matcher.name()
        );

        let (outcome, evaluated) = self.search(&job, &cancel);

        if let Err(e) = self.registry.update_progress(job_id, evaluated) {
            warn!("Failed to write final progress for job {}: {}", job_id, e);
        }
        self.registry.complete(job_id, outcome.clone())?;

        info!(
            "Job {} finished as {} after {} candidate(s)",
            job_id,
            outcome.status(),
            evaluated
        );

        Ok(Some(outcome))
    }

    /// Walks the keyspace; returns the outcome and the exact number of
    /// candidates evaluated
    fn search(&self, job: &Job, cancel: &CancellationToken) -> (Outcome, u64) {
        let generator = match CandidateGenerator::new(&job.alphabet, job.max_length) {
            Ok(generator) => generator,
            Err(e) => return (Outcome::Failed(format!("invalid search space: {}", e)), 0),
        };

        let interval = self.settings.progress_interval.max(1);
        let mut evaluated: u64 = 0;

        for candidate in &generator {
            if evaluated % interval == 0 {
                if cancel.is_cancelled() {
                    debug!("Job {} cancelled at {} candidate(s)", job.id, evaluated);
                    return (Outcome::Cancelled, evaluated);
                }
                if evaluated > 0 {
                    if let Err(e) = self.registry.update_progress(job.id, evaluated) {
                        return (Outcome::Failed(format!("progress update rejected: {}", e)), evaluated);
                    }
                }
            }

            if !self.settings.candidate_delay.is_zero() {
                std::thread::sleep(self.settings.candidate_delay);
            }

            evaluated += 1;
            match self.matcher.is_match(&candidate, &job.fingerprint) {
                Ok(true) => return (Outcome::Succeeded(candidate), evaluated),
                Ok(false) => {}
                Err(e) => return (Outcome::Failed(e.to_string()), evaluated),
            }
        }

        (Outcome::NotFound, evaluated)
    }
}
