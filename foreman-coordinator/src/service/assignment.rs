//! Assignment Engine
//!
//! Atomically binds exactly one eligible worker to a job, and chooses which
//! worker when more than one is eligible. The availability snapshot is
//! taken without a lock, so the store-side bind is guarded on both rows:
//! two concurrent assignments can pick the same worker, but only one bind
//! commits and the loser retries with the next candidate.

use chrono::Utc;
use thiserror::Error;

use foreman_core::domain::job::{Job, JobStatus};
use foreman_core::domain::worker::{Worker, select_worker};

use crate::repository::{BindOutcome, Store, StoreError};
use crate::service::worker_service;

/// Service error type
#[derive(Debug, Error)]
pub enum AssignError {
    /// The binding transaction could not commit; the job keeps its prior
    /// state and the caller may retry or leave it backlogged.
    #[error("assignment failed: {0}")]
    Failed(StoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<worker_service::WorkerError> for AssignError {
    fn from(err: worker_service::WorkerError) -> Self {
        match err {
            worker_service::WorkerError::Store(e) => AssignError::Store(e),
            // list_available only surfaces store errors
            other => AssignError::Store(StoreError::Backend(other.to_string())),
        }
    }
}

/// How an assignment attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOutcome {
    /// This call bound the job to a worker
    Assigned,

    /// No eligible worker; the job stays backlogged
    Backlogged,

    /// Another caller moved the job out of the backlog first
    AlreadyTaken,
}

/// Try to bind an eligible worker to the job.
///
/// An empty candidate set is a success: the job simply stays backlogged.
/// On commit the in-memory job mirrors the persisted binding, so callers
/// observe a consistent view without a re-read.
pub async fn assign(store: &dyn Store, job: &mut Job) -> Result<AssignOutcome, AssignError> {
    let now = Utc::now();
    let mut candidates: Vec<Worker> = worker_service::list_available(store, now).await?;

    loop {
        let Some(chosen) = select_worker(&candidates).map(|w| w.id.clone()) else {
            tracing::info!("No available worker, job {} stays backlogged", job.id);
            return Ok(AssignOutcome::Backlogged);
        };

        match store.bind_job(&chosen, &job.id, now).await {
            Ok(BindOutcome::Bound) => {
                job.status = JobStatus::Assigned;
                job.worker_id = Some(chosen.clone());
                job.updated_at = now;
                tracing::info!("Job {} assigned to worker {}", job.id, chosen);
                return Ok(AssignOutcome::Assigned);
            }
            Ok(BindOutcome::WorkerBusy) => {
                // Snapshot was stale for this worker; drop it and re-select.
                tracing::debug!("Worker {} picked up another job, retrying selection", chosen);
                candidates.retain(|w| w.id != chosen);
            }
            Ok(BindOutcome::JobUnavailable) => {
                // Another caller moved the job out of the backlog. Mirror
                // whatever the store now holds.
                if let Some(persisted) = store.get_job(&job.id).await? {
                    *job = persisted;
                }
                tracing::debug!("Job {} left the backlog concurrently", job.id);
                return Ok(AssignOutcome::AlreadyTaken);
            }
            Err(e) => return Err(AssignError::Failed(e)),
        }
    }
}

/// Assign backlogged jobs, oldest first, until no worker is free.
///
/// Called after a completion frees a worker. Stops at the first job that
/// stays backlogged: later jobs would find the same empty candidate set.
/// Only binds made by this drain are counted; a job that a concurrent
/// caller took is skipped.
pub async fn drain_backlog(store: &dyn Store) -> Result<usize, AssignError> {
    let mut assigned = 0;

    for mut job in store.list_jobs_by_status(JobStatus::Backlogged).await? {
        match assign(store, &mut job).await? {
            AssignOutcome::Assigned => assigned += 1,
            AssignOutcome::Backlogged => break,
            AssignOutcome::AlreadyTaken => {}
        }
    }

    if assigned > 0 {
        tracing::info!("Drained {} job(s) from the backlog", assigned);
    }

    Ok(assigned)
}
