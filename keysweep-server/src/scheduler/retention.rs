//! Retention sweep
//!
//! Finished jobs stay in the registry until the process exits unless a
//! retention age is configured, in which case this task periodically drops
//! terminal jobs that have not changed for longer than that age.

use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use tokio::time::{self, Duration};
use tracing::{debug, info, warn};

use crate::registry::Registry;

/// Runs one sweep; returns the number of jobs removed
pub fn sweep_once(registry: &Registry, retention: Duration) -> usize {
    let Ok(age) = TimeDelta::from_std(retention) else {
        warn!("Retention of {:?} is out of range, skipping sweep", retention);
        return 0;
    };
    let Some(cutoff) = Utc::now().checked_sub_signed(age) else {
        return 0;
    };
    registry.purge_terminal(cutoff)
}

/// Spawns the background sweep loop
pub fn spawn_retention_sweeper(
    registry: Arc<Registry>,
    retention: Duration,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    info!(
        "Retention sweep enabled (retention: {:?}, interval: {:?})",
        retention, interval
    );

    tokio::spawn(async move {
        let mut ticker = time::interval(interval);

        loop {
            ticker.tick().await;

            let removed = sweep_once(&registry, retention);
            if removed > 0 {
                info!("Removed {} expired job(s)", removed);
            } else {
                debug!("No expired jobs");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use keysweep_core::domain::job::Job;
    use uuid::Uuid;

    fn finished_job(registry: &Registry) -> Uuid {
        let job = Job::new(Uuid::new_v4(), "x".to_string(), "x".to_string(), 1, 1);
        let id = job.id;
        registry.create(job).unwrap();
        registry.request_cancellation(id).unwrap();
        id
    }

    #[test]
    fn test_sweep_keeps_recent_jobs() {
        let registry = Registry::new();
        finished_job(&registry);

        assert_eq!(sweep_once(&registry, Duration::from_secs(3600)), 0);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_sweep_removes_old_terminal_jobs() {
        let registry = Registry::new();
        finished_job(&registry);
        let active = Job::new(Uuid::new_v4(), "x".to_string(), "x".to_string(), 1, 1);
        registry.create(active).unwrap();

        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(sweep_once(&registry, Duration::from_millis(5)), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_sweep_with_huge_retention_is_noop() {
        let registry = Registry::new();
        let id = finished_job(&registry);

        assert_eq!(sweep_once(&registry, Duration::MAX), 0);
        assert!(registry.snapshot(id).is_ok());
    }

    #[tokio::test]
    async fn test_sweeper_task_runs_periodically() {
        let registry = Arc::new(Registry::new());
        finished_job(&registry);
        std::thread::sleep(Duration::from_millis(5));

        let handle =
            spawn_retention_sweeper(Arc::clone(&registry), Duration::ZERO, Duration::from_secs(60));
        time::sleep(Duration::from_millis(20)).await;

        assert!(registry.is_empty());
        handle.abort();
    }
}
