//! API Module
//!
//! HTTP API layer for the server.
//! Each submodule handles endpoints for a specific concern.

pub mod error;
pub mod health;
pub mod job;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::service::{Dispatcher, StatusService};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub status: Arc<StatusService>,
}

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Job endpoints
        .route("/brute", post(job::submit_search))
        .route("/job/{id}", get(job::get_status))
        .route("/job/{id}/detail", get(job::get_detail))
        .route("/job/{id}/cancel", post(job::cancel_job))
        // Routes kept from the first version of the API
        .route("/brut_hash", post(job::submit_search_legacy))
        .route("/get_status", get(job::get_status_legacy))
        // Add state and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
