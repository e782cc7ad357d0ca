//! Job API Handlers
//!
//! HTTP endpoints for submitting, polling, and cancelling searches.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use keysweep_core::domain::job::JobSnapshot;
use keysweep_core::dto::job::{
    JobStatusResponse, LegacySubmitResponse, SubmitResponse, SubmitSearch,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::AppState;
use crate::api::error::ApiResult;

/// POST /brute
/// Submit a new search
pub async fn submit_search(
    State(state): State<AppState>,
    Json(req): Json<SubmitSearch>,
) -> ApiResult<(StatusCode, Json<SubmitResponse>)> {
    tracing::info!(
        "Submitting search (alphabet size {}, max length {})",
        req.alphabet.chars().count(),
        req.max_length
    );

    let job_id = state
        .dispatcher
        .submit(req.fingerprint, req.alphabet, req.max_length)?;

    Ok((StatusCode::ACCEPTED, Json(SubmitResponse { job_id })))
}

/// GET /job/{id}
/// Status, progress percentage, and result of a job
pub async fn get_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<JobStatusResponse>> {
    tracing::debug!("Getting status of job: {}", id);

    let snapshot = state.status.get_status(id)?;
    Ok(Json(JobStatusResponse::from(&snapshot)))
}

/// GET /job/{id}/detail
/// Full snapshot of a job
pub async fn get_detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<JobSnapshot>> {
    tracing::debug!("Getting details of job: {}", id);

    let snapshot = state.status.get_status(id)?;
    Ok(Json(snapshot))
}

/// POST /job/{id}/cancel
/// Request cancellation of a job
pub async fn cancel_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    tracing::info!("Cancelling job: {}", id);

    state.dispatcher.cancel(id)?;
    Ok(StatusCode::ACCEPTED)
}

/// POST /brut_hash
/// Same as `/brute`, answering with `task_id`
pub async fn submit_search_legacy(
    State(state): State<AppState>,
    Json(req): Json<SubmitSearch>,
) -> ApiResult<(StatusCode, Json<LegacySubmitResponse>)> {
    let (status, Json(SubmitResponse { job_id })) = submit_search(State(state), Json(req)).await?;
    Ok((status, Json(LegacySubmitResponse { task_id: job_id })))
}

#[derive(Debug, Deserialize)]
pub struct LegacyStatusQuery {
    pub task_id: Uuid,
}

/// GET /get_status?task_id={id}
pub async fn get_status_legacy(
    State(state): State<AppState>,
    Query(query): Query<LegacyStatusQuery>,
) -> ApiResult<Json<JobStatusResponse>> {
    get_status(State(state), Path(query.task_id)).await
}
