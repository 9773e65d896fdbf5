//! Worker API Handlers
//!
//! HTTP endpoints for worker registration, polling and status.

use axum::{
    Json,
    extract::{Path, State},
};

use foreman_core::domain::worker::Worker;
use foreman_core::dto::worker::{PollResponse, RegisterWorker};

use crate::api::SharedStore;
use crate::api::error::ApiResult;
use crate::service::worker_service;

/// POST /worker/register
/// Register a worker with the coordinator
pub async fn register_worker(
    State(store): State<SharedStore>,
    Json(req): Json<RegisterWorker>,
) -> ApiResult<Json<Worker>> {
    tracing::info!("Registering worker: {}", req.worker_id);

    let worker = worker_service::register_worker(store.as_ref(), req).await?;

    Ok(Json(worker))
}

/// POST /worker/{id}/poll
/// Refresh a worker's liveness and return any job bound to it
pub async fn poll_worker(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> ApiResult<Json<PollResponse>> {
    let job = worker_service::poll(store.as_ref(), &id).await?;

    Ok(Json(PollResponse { job }))
}

/// GET /worker/list
/// List all registered workers
pub async fn list_workers(State(store): State<SharedStore>) -> ApiResult<Json<Vec<Worker>>> {
    tracing::debug!("Listing all workers");

    let workers = worker_service::list_workers(store.as_ref()).await?;

    Ok(Json(workers))
}

/// GET /worker/{id}
/// Get details for a specific worker
pub async fn get_worker(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> ApiResult<Json<Worker>> {
    tracing::debug!("Getting worker: {}", id);

    let worker = worker_service::get_worker(store.as_ref(), &id).await?;

    Ok(Json(worker))
}
