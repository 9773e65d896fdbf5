//! Job API Handlers
//!
//! HTTP endpoints for the job lifecycle: approval intake, completion
//! reports and the human-facing status listings.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use foreman_core::domain::job::Job;
use foreman_core::dto::item::ApprovedItem;
use foreman_core::dto::job::CompleteJob;

use crate::api::SharedStore;
use crate::api::error::ApiResult;
use crate::service::job_service;

/// POST /item/approved
/// Create a job for an approved item; assigns a worker when one is eligible
pub async fn item_approved(
    State(store): State<SharedStore>,
    Json(req): Json<ApprovedItem>,
) -> ApiResult<Json<Job>> {
    tracing::info!("Item approved: {}", req.item_id);

    let job = job_service::create_from_approval(store.as_ref(), req).await?;

    Ok(Json(job))
}

/// GET /job/{id}
/// Get job details by ID
pub async fn get_job(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> ApiResult<Json<Job>> {
    tracing::debug!("Getting job: {}", id);

    let job = job_service::get_job(store.as_ref(), &id).await?;

    Ok(Json(job))
}

/// POST /job/{id}/complete
/// Record a terminal status reported by the bound worker
pub async fn complete_job(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
    Json(req): Json<CompleteJob>,
) -> ApiResult<StatusCode> {
    tracing::info!("Completion report for job {} from worker {}", id, req.worker_id);

    job_service::complete_job(store.as_ref(), &id, req).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /job/list/active
/// List jobs currently assigned to a worker
pub async fn list_active_jobs(State(store): State<SharedStore>) -> ApiResult<Json<Vec<Job>>> {
    tracing::debug!("Listing active jobs");

    let jobs = job_service::list_active(store.as_ref()).await?;

    Ok(Json(jobs))
}

/// GET /job/list/backlog
/// List jobs waiting for a worker
pub async fn list_backlog(State(store): State<SharedStore>) -> ApiResult<Json<Vec<Job>>> {
    tracing::debug!("Listing backlogged jobs");

    let jobs = job_service::list_backlog(store.as_ref()).await?;

    Ok(Json(jobs))
}
