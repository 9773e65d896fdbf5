//! Job Lifecycle Service
//!
//! Creates jobs from approved items, exposes status views, and handles
//! completion reports from workers.

use chrono::Utc;
use thiserror::Error;

use foreman_core::domain::job::{Job, JobStatus};
use foreman_core::dto::item::ApprovedItem;
use foreman_core::dto::job::CompleteJob;

use crate::repository::{Store, StoreError};
use crate::service::assignment_service::{self, AssignError};

/// Service error type
#[derive(Debug, Error)]
pub enum JobError {
    #[error("job {0} not found")]
    NotFound(String),

    #[error("job {0} already exists")]
    AlreadyExists(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("invalid request: {0}")]
    Validation(String),

    /// The binding transaction could not commit
    #[error("assignment failed: {0}")]
    AssignmentFailed(StoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<AssignError> for JobError {
    fn from(err: AssignError) -> Self {
        match err {
            AssignError::Failed(e) => JobError::AssignmentFailed(e),
            AssignError::Store(e) => JobError::Store(e),
        }
    }
}

/// Create a job for an approved item and attempt to assign it
///
/// The returned job is either `Assigned` with a bound worker or
/// `Backlogged`; no other state is observable from this call.
pub async fn create_from_approval(store: &dyn Store, item: ApprovedItem) -> Result<Job, JobError> {
    let now = Utc::now();
    let mut job = Job::backlogged(item.item_id, now);

    match store.create_job(&job).await {
        Ok(()) => {}
        Err(StoreError::Duplicate) => return Err(JobError::AlreadyExists(job.id)),
        Err(e) => return Err(e.into()),
    }

    tracing::info!("Job created: {}", job.id);

    assignment_service::assign(store, &mut job).await?;

    Ok(job)
}

/// Get a job by ID
pub async fn get_job(store: &dyn Store, id: &str) -> Result<Job, JobError> {
    let job = store
        .get_job(id)
        .await?
        .ok_or_else(|| JobError::NotFound(id.to_string()))?;

    Ok(job)
}

/// List jobs currently assigned to a worker
pub async fn list_active(store: &dyn Store) -> Result<Vec<Job>, JobError> {
    let jobs = store.list_jobs_by_status(JobStatus::Assigned).await?;
    Ok(jobs)
}

/// List jobs waiting for a worker
pub async fn list_backlog(store: &dyn Store) -> Result<Vec<Job>, JobError> {
    let jobs = store.list_jobs_by_status(JobStatus::Backlogged).await?;
    Ok(jobs)
}

/// Record a completion report from a worker
///
/// Releases the mutual binding on both rows and then drains the backlog
/// onto the freed worker (and any other worker that became eligible).
pub async fn complete_job(store: &dyn Store, job_id: &str, req: CompleteJob) -> Result<(), JobError> {
    validate_completion_status(req.status)?;

    // Confirm the job exists so the caller can tell "unknown job" apart
    // from "not bound to you".
    let job = store
        .get_job(job_id)
        .await?
        .ok_or_else(|| JobError::NotFound(job_id.to_string()))?;

    let released = store
        .release_job(&req.worker_id, job_id, req.status, Utc::now())
        .await?;

    if !released {
        return Err(JobError::InvalidState(format!(
            "Job {} is not assigned to worker {} (current: {})",
            job_id, req.worker_id, job.status
        )));
    }

    tracing::info!(
        "Job {} completed by worker {} with status {}",
        job_id,
        req.worker_id,
        req.status
    );

    assignment_service::drain_backlog(store).await?;

    Ok(())
}

// =============================================================================
// Validation
// =============================================================================

fn validate_completion_status(status: JobStatus) -> Result<(), JobError> {
    if status.is_terminal() {
        Ok(())
    } else {
        Err(JobError::Validation(format!(
            "Invalid completion status: {}",
            status
        )))
    }
}
