//! API Module
//!
//! HTTP API layer for the coordinator.
//! Each submodule handles endpoints for a specific domain.

pub mod error;
pub mod health;
pub mod job;
pub mod worker;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::repository::Store;

/// Store handle shared with the request handlers
pub type SharedStore = Arc<dyn Store>;

/// Create the main API router with all endpoints
pub fn create_router(store: SharedStore) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Approval gateway intake
        .route("/item/approved", post(job::item_approved))
        // Job endpoints
        .route("/job/list/active", get(job::list_active_jobs))
        .route("/job/list/backlog", get(job::list_backlog))
        .route("/job/{id}", get(job::get_job))
        .route("/job/{id}/complete", post(job::complete_job))
        // Worker endpoints
        .route("/worker/register", post(worker::register_worker))
        .route("/worker/list", get(worker::list_workers))
        .route("/worker/{id}", get(worker::get_worker))
        .route("/worker/{id}/poll", post(worker::poll_worker))
        // Add state and middleware
        .with_state(store)
        .layer(TraceLayer::new_for_http())
}
