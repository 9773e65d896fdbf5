//! Worker Registry Service
//!
//! Tracks liveness and availability of worker processes. Liveness is
//! polling-based: every poll refreshes `last_poll`, and a worker counts as
//! online while that timestamp is within the online threshold. A dead
//! worker can therefore appear online for up to one threshold after it
//! stopped polling; that staleness bound is accepted in exchange for not
//! running a failure detector.

use chrono::{DateTime, Utc};
use thiserror::Error;

use foreman_core::domain::job::Job;
use foreman_core::domain::worker::Worker;
use foreman_core::dto::worker::RegisterWorker;

use crate::repository::{Store, StoreError};

/// Service error type
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("worker {0} not found")]
    NotFound(String),

    #[error("worker {0} already registered")]
    AlreadyExists(String),

    #[error("invalid registration: {0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, WorkerError>;

/// Register a worker with the coordinator
///
/// Creates a new worker record with `last_poll` set to now. Re-registering
/// an existing id is rejected.
pub async fn register_worker(store: &dyn Store, req: RegisterWorker) -> Result<Worker> {
    validate_register_request(&req)?;

    let worker = Worker::registered(req.worker_id, Utc::now());
    match store.create_worker(&worker).await {
        Ok(()) => {}
        Err(StoreError::Duplicate) => return Err(WorkerError::AlreadyExists(worker.id)),
        Err(e) => return Err(e.into()),
    }

    tracing::info!("Worker registered: {}", worker.id);

    Ok(worker)
}

/// Handle a poll from a worker
///
/// Refreshes the worker's `last_poll` and returns the job currently bound
/// to it, if any.
pub async fn poll(store: &dyn Store, worker_id: &str) -> Result<Option<Job>> {
    let mut worker = store
        .get_worker(worker_id)
        .await?
        .ok_or_else(|| WorkerError::NotFound(worker_id.to_string()))?;

    worker.last_poll = Utc::now();
    store.save_worker(&worker).await?;

    let job = store.job_for_worker(worker_id).await?;

    tracing::debug!(
        "Poll from worker {}: {}",
        worker_id,
        match &job {
            Some(j) => format!("job {} bound", j.id),
            None => "no job bound".to_string(),
        }
    );

    Ok(job)
}

/// Get a worker by ID
pub async fn get_worker(store: &dyn Store, id: &str) -> Result<Worker> {
    let worker = store
        .get_worker(id)
        .await?
        .ok_or_else(|| WorkerError::NotFound(id.to_string()))?;

    Ok(worker)
}

/// List all workers
pub async fn list_workers(store: &dyn Store) -> Result<Vec<Worker>> {
    let workers = store.list_workers().await?;
    Ok(workers)
}

/// List workers that can take a new job right now
///
/// A point-in-time snapshot: availability can change before any binding
/// based on it commits, which is why the bind itself is guarded.
pub async fn list_available(store: &dyn Store, now: DateTime<Utc>) -> Result<Vec<Worker>> {
    let workers = store.list_workers().await?;
    Ok(workers.into_iter().filter(|w| w.is_available(now)).collect())
}

// =============================================================================
// Validation
// =============================================================================

fn validate_register_request(req: &RegisterWorker) -> Result<()> {
    if req.worker_id.trim().is_empty() {
        return Err(WorkerError::Validation(
            "Worker ID cannot be empty".to_string(),
        ));
    }

    if req.worker_id.len() > 255 {
        return Err(WorkerError::Validation(
            "Worker ID is too long (max 255 characters)".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemStore;

    #[tokio::test]
    async fn test_register_then_duplicate() {
        let store = MemStore::new();
        let req = RegisterWorker {
            worker_id: "w1".to_string(),
        };

        let worker = register_worker(&store, req.clone()).await.unwrap();
        assert_eq!(worker.id, "w1");
        assert!(worker.current_job_id.is_none());

        let err = register_worker(&store, req).await.unwrap_err();
        assert!(matches!(err, WorkerError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_register_rejects_empty_id() {
        let store = MemStore::new();
        let err = register_worker(
            &store,
            RegisterWorker {
                worker_id: "  ".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, WorkerError::Validation(_)));
    }

    #[tokio::test]
    async fn test_poll_unknown_worker() {
        let store = MemStore::new();
        let err = poll(&store, "ghost").await.unwrap_err();
        assert!(matches!(err, WorkerError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_poll_refreshes_last_poll() {
        let store = MemStore::new();
        let req = RegisterWorker {
            worker_id: "w1".to_string(),
        };
        let registered = register_worker(&store, req).await.unwrap();

        let job = poll(&store, "w1").await.unwrap();
        assert!(job.is_none());

        let refreshed = get_worker(&store, "w1").await.unwrap();
        assert!(refreshed.last_poll >= registered.last_poll);
    }

    #[tokio::test]
    async fn test_busy_worker_excluded_from_available() {
        let store = MemStore::new();
        for id in ["w1", "w2"] {
            register_worker(
                &store,
                RegisterWorker {
                    worker_id: id.to_string(),
                },
            )
            .await
            .unwrap();
        }

        let mut busy = get_worker(&store, "w1").await.unwrap();
        busy.current_job_id = Some("job-1".to_string());
        store.save_worker(&busy).await.unwrap();

        let available = list_available(&store, Utc::now()).await.unwrap();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].id, "w2");
    }
}
