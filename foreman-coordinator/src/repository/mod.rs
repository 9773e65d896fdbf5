//! Repository Module
//!
//! Data access layer for the coordinator. The `Store` trait is the single
//! seam to persistence: the coordinator receives a store handle at
//! construction time instead of reaching for ambient globals, and all
//! cross-entity invariants (the mutual Job/Worker binding) are established
//! inside one store transaction.

pub mod memory;
pub mod postgres;

pub use memory::MemStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use foreman_core::domain::job::{Job, JobStatus};
use foreman_core::domain::worker::Worker;

/// Errors surfaced by a store backend
#[derive(Debug, Error)]
pub enum StoreError {
    /// Insert violated a primary-key constraint
    #[error("row already exists")]
    Duplicate,

    /// Any transport or transaction failure from the backend
    #[error("store backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if err
            .as_database_error()
            .is_some_and(|db| db.is_unique_violation())
        {
            StoreError::Duplicate
        } else {
            StoreError::Backend(err.to_string())
        }
    }
}

/// Result of attempting to bind a worker to a job.
///
/// The bind is guarded on both rows; either guard failing rolls back the
/// whole transaction and reports which side was stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindOutcome {
    /// Both rows updated and committed
    Bound,

    /// The worker picked up another job since the availability snapshot
    WorkerBusy,

    /// The job left the backlog (assigned or completed concurrently)
    JobUnavailable,
}

/// Transactional store for jobs and workers
#[async_trait]
pub trait Store: Send + Sync {
    /// Insert a new worker. `StoreError::Duplicate` if the id is taken.
    async fn create_worker(&self, worker: &Worker) -> Result<(), StoreError>;

    /// Persist the mutable fields of a worker. Returns false if no row
    /// matched.
    async fn save_worker(&self, worker: &Worker) -> Result<bool, StoreError>;

    async fn get_worker(&self, id: &str) -> Result<Option<Worker>, StoreError>;

    /// All workers, in no guaranteed order.
    async fn list_workers(&self) -> Result<Vec<Worker>, StoreError>;

    /// Insert a new job. `StoreError::Duplicate` if the id is taken.
    async fn create_job(&self, job: &Job) -> Result<(), StoreError>;

    async fn get_job(&self, id: &str) -> Result<Option<Job>, StoreError>;

    /// Jobs in the given status, oldest first.
    async fn list_jobs_by_status(&self, status: JobStatus) -> Result<Vec<Job>, StoreError>;

    /// The job currently assigned to a worker, if any.
    async fn job_for_worker(&self, worker_id: &str) -> Result<Option<Job>, StoreError>;

    /// Atomically bind a worker to a job.
    ///
    /// In one transaction: set the worker's `current_job_id` and `last_job`
    /// (only while its `current_job_id` is still null) and set the job's
    /// `worker_id` and `Assigned` status (only while it is still
    /// `Backlogged`). A failed guard rolls everything back.
    async fn bind_job(
        &self,
        worker_id: &str,
        job_id: &str,
        now: DateTime<Utc>,
    ) -> Result<BindOutcome, StoreError>;

    /// Atomically release a binding when a worker reports completion.
    ///
    /// Moves the job to the given terminal status with a null `worker_id`
    /// and clears the worker's `current_job_id`, guarded on the mutual
    /// binding still being in place. Returns false (with no changes) if the
    /// job is not assigned to that worker.
    async fn release_job(
        &self,
        worker_id: &str,
        job_id: &str,
        status: JobStatus,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError>;
}
