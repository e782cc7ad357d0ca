//! Dispatcher
//!
//! Validates search submissions, registers them as queued jobs, and hands
//! them to the executor. Validation happens before anything is registered,
//! so a rejected submission leaves no trace.

use std::sync::Arc;

use keysweep_core::domain::job::Job;
use keysweep_core::generator::{CandidateGenerator, GeneratorError};
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use crate::registry::{Registry, RegistryError};
use crate::scheduler::JobExecutor;

/// Service error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("job {0} not found")]
    NotFound(Uuid),

    #[error("job id {0} is already registered")]
    DuplicateId(Uuid),

    #[error(transparent)]
    Registry(RegistryError),
}

impl From<RegistryError> for DispatchError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(id) => DispatchError::NotFound(id),
            RegistryError::DuplicateId(id) => DispatchError::DuplicateId(id),
            other => DispatchError::Registry(other),
        }
    }
}

impl From<GeneratorError> for DispatchError {
    fn from(err: GeneratorError) -> Self {
        DispatchError::InvalidInput(err.to_string())
    }
}

pub struct Dispatcher {
    registry: Arc<Registry>,
    executor: Arc<dyn JobExecutor>,
    max_length_limit: usize,
}

impl Dispatcher {
    /// Creates a dispatcher
    ///
    /// # Arguments
    /// * `registry` - Where accepted jobs are recorded
    /// * `executor` - Execution strategy for accepted jobs
    /// * `max_length_limit` - Largest candidate length a submission may ask for
    pub fn new(
        registry: Arc<Registry>,
        executor: Arc<dyn JobExecutor>,
        max_length_limit: usize,
    ) -> Self {
        Self {
            registry,
            executor,
            max_length_limit,
        }
    }

    /// Accepts a search and returns its job id without waiting for it to run
    pub fn submit(
        &self,
        fingerprint: String,
        alphabet: String,
        max_length: i64,
    ) -> Result<Uuid, DispatchError> {
        if alphabet.is_empty() {
            return Err(DispatchError::InvalidInput(
                "alphabet must not be empty".to_string(),
            ));
        }

        if max_length <= 0 {
            return Err(DispatchError::InvalidInput(format!(
                "max_length must be greater than 0 (got {})",
                max_length
            )));
        }

        let max_length = usize::try_from(max_length)
            .ok()
            .filter(|&len| len <= self.max_length_limit)
            .ok_or_else(|| {
                DispatchError::InvalidInput(format!(
                    "max_length {} exceeds the limit of {}",
                    max_length, self.max_length_limit
                ))
            })?;

        let generator = CandidateGenerator::new(&alphabet, max_length)?;
        let total_keyspace = generator.total();

        let job = Job::new(
            Uuid::new_v4(),
            fingerprint,
            alphabet,
            max_length,
            total_keyspace,
        );
        let id = job.id;

        if let Err(e) = self.registry.create(job) {
            error!("Failed to register job {}: {}", id, e);
            return Err(e.into());
        }

        info!("Job {} queued ({} candidates)", id, total_keyspace);

        self.executor.execute(id);

        Ok(id)
    }

    /// Requests cancellation of a job
    pub fn cancel(&self, id: Uuid) -> Result<(), DispatchError> {
        self.registry.request_cancellation(id)?;
        info!("Cancellation requested for job {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::{LiteralMatcher, Sha256Matcher};
    use crate::scheduler::{PooledExecutor, SearchWorker, WorkerSettings};
    use crate::service::status::StatusService;
    use keysweep_core::domain::job::{JobSnapshot, JobStatus};
    use keysweep_core::dto::job::JobStatusResponse;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Records scheduled ids without running anything
    #[derive(Default)]
    struct RecordingExecutor {
        scheduled: Mutex<Vec<Uuid>>,
    }

    impl JobExecutor for RecordingExecutor {
        fn execute(&self, job_id: Uuid) {
            self.scheduled.lock().unwrap().push(job_id);
        }
    }

    fn recording() -> (Arc<Registry>, Arc<RecordingExecutor>, Dispatcher) {
        let registry = Arc::new(Registry::new());
        let executor = Arc::new(RecordingExecutor::default());
        let dispatcher = Dispatcher::new(Arc::clone(&registry), executor.clone(), 8);
        (registry, executor, dispatcher)
    }

    fn pooled(settings: WorkerSettings) -> (Arc<Registry>, Dispatcher, StatusService) {
        let registry = Arc::new(Registry::new());
        let worker = Arc::new(SearchWorker::new(
            Arc::clone(&registry),
            Arc::new(LiteralMatcher),
            settings,
        ));
        let executor = Arc::new(PooledExecutor::new(Arc::clone(&registry), worker, 2));
        let dispatcher = Dispatcher::new(Arc::clone(&registry), executor, 8);
        let status = StatusService::new(Arc::clone(&registry));
        (registry, dispatcher, status)
    }

    async fn wait_terminal(status: &StatusService, id: Uuid) -> JobSnapshot {
        let mut rx = status.watch(id).unwrap();
        tokio::time::timeout(
            Duration::from_secs(10),
            rx.wait_for(|job| job.status.is_terminal()),
        )
        .await
        .expect("job did not finish in time")
        .unwrap();
        status.get_status(id).unwrap()
    }

    #[test]
    fn test_submit_registers_and_schedules() {
        let (registry, executor, dispatcher) = recording();

        let id = dispatcher
            .submit("b".to_string(), "ab".to_string(), 2)
            .unwrap();

        let job = registry.snapshot(id).unwrap();
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.total_keyspace, 6);
        assert_eq!(job.fingerprint, "b");
        assert_eq!(*executor.scheduled.lock().unwrap(), vec![id]);
    }

    #[test]
    fn test_submit_assigns_unique_ids() {
        let (registry, _, dispatcher) = recording();
        let a = dispatcher.submit("x".to_string(), "ab".to_string(), 1).unwrap();
        let b = dispatcher.submit("x".to_string(), "ab".to_string(), 1).unwrap();
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_invalid_submissions_create_nothing() {
        let (registry, executor, dispatcher) = recording();

        let cases = [
            ("", 3),
            ("ab", 0),
            ("ab", -4),
            ("ab", 9),
            ("aab", 2),
            ("ab", i64::MAX),
        ];
        for (alphabet, max_length) in cases {
            let result = dispatcher.submit("x".to_string(), alphabet.to_string(), max_length);
            assert!(
                matches!(result, Err(DispatchError::InvalidInput(_))),
                "alphabet {:?} max_length {} gave {:?}",
                alphabet,
                max_length,
                result
            );
        }

        assert!(registry.is_empty());
        assert!(executor.scheduled.lock().unwrap().is_empty());
    }

    #[test]
    fn test_limit_is_inclusive() {
        let (_, _, dispatcher) = recording();
        assert!(dispatcher.submit("x".to_string(), "ab".to_string(), 8).is_ok());
    }

    #[test]
    fn test_keyspace_overflow_is_invalid_input() {
        let registry = Arc::new(Registry::new());
        let executor = Arc::new(RecordingExecutor::default());
        let dispatcher = Dispatcher::new(Arc::clone(&registry), executor, 64);
        let alphabet: String = ('a'..='z').chain('A'..='Z').collect();

        let result = dispatcher.submit("x".to_string(), alphabet, 20);

        assert!(matches!(result, Err(DispatchError::InvalidInput(_))));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_cancel_unknown_job() {
        let (_, _, dispatcher) = recording();
        let id = Uuid::new_v4();
        assert_eq!(dispatcher.cancel(id), Err(DispatchError::NotFound(id)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_scenario_match_found() {
        let (_, dispatcher, status) = pooled(WorkerSettings::default());

        let id = dispatcher
            .submit("b".to_string(), "ab".to_string(), 2)
            .unwrap();
        let snapshot = wait_terminal(&status, id).await;

        assert_eq!(snapshot.status, JobStatus::Succeeded);
        assert_eq!(snapshot.result.as_deref(), Some("b"));
        assert_eq!(snapshot.progress_count, 2);
        assert_eq!(
            JobStatusResponse::from(&snapshot),
            JobStatusResponse {
                status: JobStatus::Succeeded,
                progress: 33,
                result: Some("b".to_string()),
            }
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_scenario_not_found() {
        let (_, dispatcher, status) = pooled(WorkerSettings::default());

        let id = dispatcher
            .submit("nothing".to_string(), "xyz".to_string(), 1)
            .unwrap();
        let snapshot = wait_terminal(&status, id).await;

        assert_eq!(snapshot.status, JobStatus::NotFound);
        assert_eq!(snapshot.progress_count, 3);
        assert_eq!(snapshot.progress_percent(), 100);
        assert!(snapshot.result.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_scenario_cancel_large_keyspace() {
        let (_, dispatcher, status) = pooled(WorkerSettings::default());

        let id = dispatcher
            .submit(
                "never".to_string(),
                "abcdefghijklmnopqrstuvwxyz".to_string(),
                6,
            )
            .unwrap();
        dispatcher.cancel(id).unwrap();
        let snapshot = wait_terminal(&status, id).await;

        assert_eq!(snapshot.status, JobStatus::Cancelled);
        assert!(snapshot.progress_count < snapshot.total_keyspace);
        assert!(snapshot.result.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancel_running_job_freezes_progress() {
        let (_, dispatcher, status) = pooled(WorkerSettings {
            progress_interval: 10,
            candidate_delay: Duration::from_millis(1),
        });

        let id = dispatcher
            .submit("never".to_string(), "abcdefghij".to_string(), 5)
            .unwrap();

        let mut rx = status.watch(id).unwrap();
        tokio::time::timeout(
            Duration::from_secs(10),
            rx.wait_for(|job| job.progress_count > 0),
        )
        .await
        .expect("job never reported progress")
        .unwrap();

        dispatcher.cancel(id).unwrap();
        let cancelled = wait_terminal(&status, id).await;
        assert_eq!(cancelled.status, JobStatus::Cancelled);

        tokio::time::sleep(Duration::from_millis(50)).await;
        let later = status.get_status(id).unwrap();
        assert_eq!(later.progress_count, cancelled.progress_count);
        assert_eq!(later.updated_at, cancelled.updated_at);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_polled_progress_is_monotonic() {
        let (_, dispatcher, status) = pooled(WorkerSettings {
            progress_interval: 500,
            candidate_delay: Duration::ZERO,
        });

        let id = dispatcher
            .submit("never".to_string(), "0123456789".to_string(), 5)
            .unwrap();

        let mut observed = Vec::new();
        loop {
            let snapshot = status.get_status(id).unwrap();
            observed.push(snapshot.progress_count);
            assert!(snapshot.progress_count <= snapshot.total_keyspace);
            if snapshot.status.is_terminal() {
                assert_eq!(snapshot.status, JobStatus::NotFound);
                assert_eq!(snapshot.progress_count, snapshot.total_keyspace);
                break;
            }
            tokio::task::yield_now().await;
        }

        assert!(observed.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_failed_job_is_reported_through_status() {
        let registry = Arc::new(Registry::new());
        let worker = Arc::new(SearchWorker::new(
            Arc::clone(&registry),
            Arc::new(Sha256Matcher),
            WorkerSettings::default(),
        ));
        let executor = Arc::new(PooledExecutor::new(Arc::clone(&registry), worker, 1));
        let dispatcher = Dispatcher::new(Arc::clone(&registry), executor, 8);
        let status = StatusService::new(Arc::clone(&registry));

        let id = dispatcher
            .submit("not-hex".to_string(), "ab".to_string(), 2)
            .unwrap();
        let snapshot = wait_terminal(&status, id).await;

        assert_eq!(snapshot.status, JobStatus::Failed);
        assert!(snapshot.failure_reason.is_some());
        assert!(snapshot.result.is_none());
    }
}
