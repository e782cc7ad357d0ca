//! Job executors
//!
//! The dispatcher hands accepted jobs to a `JobExecutor` and returns right
//! away. `PooledExecutor` is the in-process implementation: a semaphore caps
//! how many searches run at once, and every job waits for a permit on its own
//! task, so submitting never blocks on pool capacity.

use std::sync::Arc;

use keysweep_core::domain::job::Outcome;
use tokio::sync::Semaphore;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::registry::Registry;
use crate::scheduler::worker::SearchWorker;

/// Execution strategy for accepted jobs
pub trait JobExecutor: Send + Sync {
    /// Schedules `job_id` for execution without waiting for it to start
    fn execute(&self, job_id: Uuid);
}

/// Bounded worker pool running searches on Tokio's blocking threads
pub struct PooledExecutor {
    registry: Arc<Registry>,
    worker: Arc<SearchWorker>,
    semaphore: Arc<Semaphore>,
}

impl PooledExecutor {
    /// Creates a pool with `max_parallel_jobs` slots
    pub fn new(registry: Arc<Registry>, worker: Arc<SearchWorker>, max_parallel_jobs: usize) -> Self {
        Self {
            registry,
            worker,
            semaphore: Arc::new(Semaphore::new(max_parallel_jobs)),
        }
    }

    /// Number of free worker slots
    pub fn available_slots(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Records `reason` as the failure of a job that did not get to finish
    fn fail_job(registry: &Registry, job_id: Uuid, reason: String) {
        match registry.snapshot(job_id) {
            Ok(job) if job.status.is_terminal() => {}
            Ok(_) => {
                if let Err(e) = registry.complete(job_id, Outcome::Failed(reason)) {
                    error!("Failed to mark job {} as failed: {}", job_id, e);
                }
            }
            Err(e) => error!("Lost track of job {}: {}", job_id, e),
        }
    }
}

impl JobExecutor for PooledExecutor {
    /// Must be called from within a Tokio runtime
    fn execute(&self, job_id: Uuid) {
        let registry = Arc::clone(&self.registry);
        let worker = Arc::clone(&self.worker);
        let semaphore = Arc::clone(&self.semaphore);

        tokio::spawn(async move {
            let cancel = match registry.cancellation_token(job_id) {
                Ok(cancel) => cancel,
                Err(e) => {
                    error!("Cannot schedule job {}: {}", job_id, e);
                    return;
                }
            };

            // A job cancelled while waiting gives up its place in line; the
            // registry has already moved it to Cancelled.
            let permit = tokio::select! {
                permit = semaphore.acquire_owned() => permit,
                _ = cancel.cancelled() => {
                    debug!("Job {} cancelled while waiting for a worker slot", job_id);
                    return;
                }
            };

            let permit = match permit {
                Ok(permit) => permit,
                Err(e) => {
                    warn!("Worker pool closed before job {} could start: {}", job_id, e);
                    Self::fail_job(&registry, job_id, "worker pool closed".to_string());
                    return;
                }
            };

            debug!("Job {} acquired a worker slot", job_id);

            let result = tokio::task::spawn_blocking(move || worker.run(job_id)).await;

            match result {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => {
                    error!("Search worker for job {} failed: {}", job_id, e);
                    Self::fail_job(&registry, job_id, format!("internal error: {}", e));
                }
                Err(e) => {
                    error!("Search worker for job {} panicked: {}", job_id, e);
                    Self::fail_job(&registry, job_id, "search worker panicked".to_string());
                }
            }

            drop(permit);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::{LiteralMatcher, MatchError, Matcher};
    use crate::scheduler::worker::WorkerSettings;
    use keysweep_core::domain::job::{Job, JobStatus};
    use keysweep_core::generator::CandidateGenerator;
    use std::time::Duration;

    fn create_job(registry: &Registry, fingerprint: &str, alphabet: &str, max_length: usize) -> Uuid {
        let total = CandidateGenerator::new(alphabet, max_length).unwrap().total();
        let job = Job::new(
            Uuid::new_v4(),
            fingerprint.to_string(),
            alphabet.to_string(),
            max_length,
            total,
        );
        let id = job.id;
        registry.create(job).unwrap();
        id
    }

    fn pool(registry: &Arc<Registry>, matcher: Arc<dyn Matcher>, slots: usize) -> PooledExecutor {
        let settings = WorkerSettings {
            progress_interval: 50,
            candidate_delay: Duration::ZERO,
        };
        let worker = Arc::new(SearchWorker::new(Arc::clone(registry), matcher, settings));
        PooledExecutor::new(Arc::clone(registry), worker, slots)
    }

    async fn wait_terminal(registry: &Registry, id: Uuid) -> Job {
        let mut rx = registry.subscribe(id).unwrap();
        let job = rx.wait_for(|job| job.status.is_terminal()).await.unwrap().clone();
        job
    }

    struct Panicking;

    impl Matcher for Panicking {
        fn is_match(&self, _candidate: &str, _fingerprint: &str) -> Result<bool, MatchError> {
            panic!("matcher exploded");
        }

        fn name(&self) -> &'static str {
            "panicking"
        }
    }

    #[tokio::test]
    async fn test_executes_job_to_completion() {
        let registry = Arc::new(Registry::new());
        let executor = pool(&registry, Arc::new(LiteralMatcher), 2);
        let id = create_job(&registry, "ab", "ab", 2);

        executor.execute(id);
        let job = wait_terminal(&registry, id).await;

        assert_eq!(job.status, JobStatus::Succeeded);
        assert_eq!(job.result.as_deref(), Some("ab"));
        assert_eq!(job.progress_count, 4);

        // The slot is released by the scheduling task after the worker returns
        tokio::time::timeout(Duration::from_secs(1), async {
            while executor.available_slots() != 2 {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("worker slot was not released");
    }

    #[tokio::test]
    async fn test_saturated_pool_keeps_jobs_queued() {
        let registry = Arc::new(Registry::new());
        let executor = pool(&registry, Arc::new(LiteralMatcher), 1);
        let blocker = Arc::clone(&executor.semaphore).acquire_owned().await.unwrap();

        let id = create_job(&registry, "b", "ab", 2);
        executor.execute(id);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(registry.snapshot(id).unwrap().status, JobStatus::Queued);

        drop(blocker);
        let job = wait_terminal(&registry, id).await;
        assert_eq!(job.status, JobStatus::Succeeded);
    }

    #[tokio::test]
    async fn test_cancel_while_waiting_for_slot() {
        let registry = Arc::new(Registry::new());
        let executor = pool(&registry, Arc::new(LiteralMatcher), 1);
        let blocker = Arc::clone(&executor.semaphore).acquire_owned().await.unwrap();

        let id = create_job(&registry, "b", "ab", 2);
        executor.execute(id);
        registry.request_cancellation(id).unwrap();

        let job = wait_terminal(&registry, id).await;
        assert_eq!(job.status, JobStatus::Cancelled);
        assert_eq!(job.progress_count, 0);
        drop(blocker);
    }

    #[tokio::test]
    async fn test_worker_panic_marks_job_failed() {
        let registry = Arc::new(Registry::new());
        let executor = pool(&registry, Arc::new(Panicking), 1);
        let id = create_job(&registry, "b", "ab", 2);

        executor.execute(id);
        let job = wait_terminal(&registry, id).await;

        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.failure_reason.as_deref(), Some("search worker panicked"));
    }

    #[tokio::test]
    async fn test_closed_pool_fails_job() {
        let registry = Arc::new(Registry::new());
        let executor = pool(&registry, Arc::new(LiteralMatcher), 1);
        executor.semaphore.close();

        let id = create_job(&registry, "b", "ab", 2);
        executor.execute(id);
        let job = wait_terminal(&registry, id).await;

        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.failure_reason.as_deref(), Some("worker pool closed"));
    }
}
