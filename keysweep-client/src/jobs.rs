//! Job-related API endpoints

use std::time::Duration;

use keysweep_core::domain::job::JobSnapshot;
use keysweep_core::dto::job::{JobStatusResponse, SubmitResponse, SubmitSearch};
use tracing::debug;
use uuid::Uuid;

use crate::KeysweepClient;
use crate::error::Result;

impl KeysweepClient {
    /// Check that the server is up
    pub async fn health(&self) -> Result<()> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;

        self.handle_empty_response(response).await
    }

    /// Submit a new search
    ///
    /// # Returns
    /// The id of the queued job
    pub async fn submit_search(&self, req: &SubmitSearch) -> Result<SubmitResponse> {
        let url = format!("{}/brute", self.base_url);
        let response = self.client.post(&url).json(req).send().await?;

        self.handle_response(response).await
    }

    /// Get status, progress percentage, and result of a job
    pub async fn get_status(&self, job_id: Uuid) -> Result<JobStatusResponse> {
        let url = format!("{}/job/{}", self.base_url, job_id);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Get the full snapshot of a job
    pub async fn get_job_detail(&self, job_id: Uuid) -> Result<JobSnapshot> {
        let url = format!("{}/job/{}/detail", self.base_url, job_id);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Request cancellation of a job
    pub async fn cancel_job(&self, job_id: Uuid) -> Result<()> {
        let url = format!("{}/job/{}/cancel", self.base_url, job_id);
        let response = self.client.post(&url).send().await?;

        self.handle_empty_response(response).await
    }

    /// Poll a job until it reaches a terminal status
    ///
    /// `on_update` is called with every snapshot fetched, including the last.
    pub async fn wait_for_completion<F>(
        &self,
        job_id: Uuid,
        poll_interval: Duration,
        mut on_update: F,
    ) -> Result<JobSnapshot>
    where
        F: FnMut(&JobSnapshot),
    {
        let mut ticker = tokio::time::interval(poll_interval);

        loop {
            ticker.tick().await;

            let snapshot = self.get_job_detail(job_id).await?;
            on_update(&snapshot);

            if snapshot.status.is_terminal() {
                return Ok(snapshot);
            }

            debug!(
                "Job {} is {} ({}/{})",
                job_id, snapshot.status, snapshot.progress_count, snapshot.total_keyspace
            );
        }
    }
}
