//! Job DTOs for the HTTP surface

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::job::{JobSnapshot, JobStatus};

/// Request to submit a new search
///
/// The aliases accept the field names used by the first version of the API
/// (`hash`, `charset`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitSearch {
    #[serde(alias = "hash")]
    pub fingerprint: String,
    #[serde(alias = "charset")]
    pub alphabet: String,
    pub max_length: i64,
}

/// Response to an accepted submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub job_id: Uuid,
}

/// Response to a submission on the first-version `/brut_hash` route
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacySubmitResponse {
    pub task_id: Uuid,
}

/// Polling response: status, derived percentage, and result if any
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub status: JobStatus,
    pub progress: u8,
    pub result: Option<String>,
}

impl From<&JobSnapshot> for JobStatusResponse {
    fn from(snapshot: &JobSnapshot) -> Self {
        Self {
            status: snapshot.status,
            progress: snapshot.progress_percent(),
            result: snapshot.result.clone(),
        }
    }
}
