//! Status Service
//!
//! Read-only projection over the registry. Nothing here mutates a job.

use std::sync::Arc;

use keysweep_core::domain::job::{Job, JobSnapshot};
use thiserror::Error;
use tokio::sync::watch;
use uuid::Uuid;

use crate::registry::{Registry, RegistryError};

/// Status error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatusError {
    #[error("job {0} not found")]
    NotFound(Uuid),

    #[error(transparent)]
    Registry(RegistryError),
}

impl From<RegistryError> for StatusError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(id) => StatusError::NotFound(id),
            other => StatusError::Registry(other),
        }
    }
}

pub struct StatusService {
    registry: Arc<Registry>,
}

impl StatusService {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Latest snapshot of a job
    pub fn get_status(&self, id: Uuid) -> Result<JobSnapshot, StatusError> {
        let job = self.registry.snapshot(id)?;
        Ok(JobSnapshot::from(&job))
    }

    /// Receiver notified on every committed change of a job
    pub fn watch(&self, id: Uuid) -> Result<watch::Receiver<Job>, StatusError> {
        Ok(self.registry.subscribe(id)?)
    }
}
