//! Postgres Store
//!
//! Handles all database operations for jobs and workers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use foreman_core::domain::job::{Job, JobStatus};
use foreman_core::domain::worker::Worker;

use super::{BindOutcome, Store, StoreError};

/// `Store` backed by a Postgres connection pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_worker(&self, worker: &Worker) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO workers (id, last_poll, last_job, current_job_id)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&worker.id)
        .bind(worker.last_poll)
        .bind(worker.last_job)
        .bind(&worker.current_job_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn save_worker(&self, worker: &Worker) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE workers
            SET last_poll = $1, last_job = $2, current_job_id = $3
            WHERE id = $4
            "#,
        )
        .bind(worker.last_poll)
        .bind(worker.last_job)
        .bind(&worker.current_job_id)
        .bind(&worker.id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_worker(&self, id: &str) -> Result<Option<Worker>, StoreError> {
        let row = sqlx::query_as::<_, WorkerRow>(
            r#"
            SELECT id, last_poll, last_job, current_job_id
            FROM workers
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into()))
    }

    async fn list_workers(&self) -> Result<Vec<Worker>, StoreError> {
        let rows = sqlx::query_as::<_, WorkerRow>(
            r#"
            SELECT id, last_poll, last_job, current_job_id
            FROM workers
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn create_job(&self, job: &Job) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO jobs (id, status, worker_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&job.id)
        .bind(status_to_string(job.status))
        .bind(&job.worker_id)
        .bind(job.created_at)
        .bind(job.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_job(&self, id: &str) -> Result<Option<Job>, StoreError> {
        let row = sqlx::query_as::<_, JobRow>(
            r#"
            SELECT id, status, worker_id, created_at, updated_at
            FROM jobs
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into()))
    }

    async fn list_jobs_by_status(&self, status: JobStatus) -> Result<Vec<Job>, StoreError> {
        let rows = sqlx::query_as::<_, JobRow>(
            r#"
            SELECT id, status, worker_id, created_at, updated_at
            FROM jobs
            WHERE status = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(status_to_string(status))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn job_for_worker(&self, worker_id: &str) -> Result<Option<Job>, StoreError> {
        let row = sqlx::query_as::<_, JobRow>(
            r#"
            SELECT id, status, worker_id, created_at, updated_at
            FROM jobs
            WHERE worker_id = $1 AND status = $2
            "#,
        )
        .bind(worker_id)
        .bind(status_to_string(JobStatus::Assigned))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into()))
    }

    async fn bind_job(
        &self,
        worker_id: &str,
        job_id: &str,
        now: DateTime<Utc>,
    ) -> Result<BindOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        let worker_side = sqlx::query(
            r#"
            UPDATE workers
            SET current_job_id = $1, last_job = $2
            WHERE id = $3 AND current_job_id IS NULL
            "#,
        )
        .bind(job_id)
        .bind(now)
        .bind(worker_id)
        .execute(&mut *tx)
        .await?;

        if worker_side.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(BindOutcome::WorkerBusy);
        }

        let job_side = sqlx::query(
            r#"
            UPDATE jobs
            SET worker_id = $1, status = $2, updated_at = $3
            WHERE id = $4 AND status = $5
            "#,
        )
        .bind(worker_id)
        .bind(status_to_string(JobStatus::Assigned))
        .bind(now)
        .bind(job_id)
        .bind(status_to_string(JobStatus::Backlogged))
        .execute(&mut *tx)
        .await?;

        if job_side.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(BindOutcome::JobUnavailable);
        }

        tx.commit().await?;
        Ok(BindOutcome::Bound)
    }

    async fn release_job(
        &self,
        worker_id: &str,
        job_id: &str,
        status: JobStatus,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;

        let job_side = sqlx::query(
            r#"
            UPDATE jobs
            SET status = $1, worker_id = NULL, updated_at = $2
            WHERE id = $3 AND worker_id = $4 AND status = $5
            "#,
        )
        .bind(status_to_string(status))
        .bind(now)
        .bind(job_id)
        .bind(worker_id)
        .bind(status_to_string(JobStatus::Assigned))
        .execute(&mut *tx)
        .await?;

        if job_side.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        let worker_side = sqlx::query(
            r#"
            UPDATE workers
            SET current_job_id = NULL
            WHERE id = $1 AND current_job_id = $2
            "#,
        )
        .bind(worker_id)
        .bind(job_id)
        .execute(&mut *tx)
        .await?;

        if worker_side.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        tx.commit().await?;
        Ok(true)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn status_to_string(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Backlogged => "Backlogged",
        JobStatus::Assigned => "Assigned",
        JobStatus::Succeeded => "Succeeded",
        JobStatus::Failed => "Failed",
    }
}

fn string_to_status(s: &str) -> JobStatus {
    match s {
        "Backlogged" => JobStatus::Backlogged,
        "Assigned" => JobStatus::Assigned,
        "Succeeded" => JobStatus::Succeeded,
        "Failed" => JobStatus::Failed,
        _ => JobStatus::Backlogged,
    }
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct WorkerRow {
    id: String,
    last_poll: chrono::DateTime<Utc>,
    last_job: Option<chrono::DateTime<Utc>>,
    current_job_id: Option<String>,
}

impl From<WorkerRow> for Worker {
    fn from(row: WorkerRow) -> Self {
        Worker {
            id: row.id,
            last_poll: row.last_poll,
            last_job: row.last_job,
            current_job_id: row.current_job_id,
        }
    }
}

#[derive(sqlx::FromRow)]
struct JobRow {
    id: String,
    status: String,
    worker_id: Option<String>,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
}

impl From<JobRow> for Job {
    fn from(row: JobRow) -> Self {
        Job {
            id: row.id,
            status: string_to_status(&row.status),
            worker_id: row.worker_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
