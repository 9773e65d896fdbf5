//! In-memory Store
//!
//! A mutex-guarded map-backed `Store` used by the test suite. Bind and
//! release mutate both maps under one lock acquisition, giving the same
//! all-or-nothing semantics as the Postgres transaction. A failure switch
//! lets tests abort the bind transaction between its two row updates.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use foreman_core::domain::job::{Job, JobStatus};
use foreman_core::domain::worker::Worker;

use super::{BindOutcome, Store, StoreError};

#[derive(Debug, Default)]
struct Inner {
    workers: BTreeMap<String, Worker>,
    jobs: BTreeMap<String, Job>,
}

/// `Store` backed by in-process maps
#[derive(Debug, Default)]
pub struct MemStore {
    inner: Mutex<Inner>,
    fail_binds: AtomicBool,
}

impl MemStore {
    pub fn new() -> Self {
        MemStore::default()
    }

    /// Make every subsequent `bind_job` abort between the worker-side and
    /// job-side updates, simulating a transaction that cannot commit. The
    /// already-applied worker-side change must be rolled back.
    pub fn fail_binds(&self, fail: bool) {
        self.fail_binds.store(fail, Ordering::SeqCst);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock means a test already panicked; the data is still
        // usable for the remaining assertions.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Store for MemStore {
    async fn create_worker(&self, worker: &Worker) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if inner.workers.contains_key(&worker.id) {
            return Err(StoreError::Duplicate);
        }
        inner.workers.insert(worker.id.clone(), worker.clone());
        Ok(())
    }

    async fn save_worker(&self, worker: &Worker) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        match inner.workers.get_mut(&worker.id) {
            Some(existing) => {
                *existing = worker.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get_worker(&self, id: &str) -> Result<Option<Worker>, StoreError> {
        Ok(self.lock().workers.get(id).cloned())
    }

    async fn list_workers(&self) -> Result<Vec<Worker>, StoreError> {
        Ok(self.lock().workers.values().cloned().collect())
    }

    async fn create_job(&self, job: &Job) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if inner.jobs.contains_key(&job.id) {
            return Err(StoreError::Duplicate);
        }
        inner.jobs.insert(job.id.clone(), job.clone());
        Ok(())
    }

    async fn get_job(&self, id: &str) -> Result<Option<Job>, StoreError> {
        Ok(self.lock().jobs.get(id).cloned())
    }

    async fn list_jobs_by_status(&self, status: JobStatus) -> Result<Vec<Job>, StoreError> {
        let mut jobs: Vec<Job> = self
            .lock()
            .jobs
            .values()
            .filter(|j| j.status == status)
            .cloned()
            .collect();
        jobs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(jobs)
    }

    async fn job_for_worker(&self, worker_id: &str) -> Result<Option<Job>, StoreError> {
        Ok(self
            .lock()
            .jobs
            .values()
            .find(|j| j.status == JobStatus::Assigned && j.worker_id.as_deref() == Some(worker_id))
            .cloned())
    }

    async fn bind_job(
        &self,
        worker_id: &str,
        job_id: &str,
        now: DateTime<Utc>,
    ) -> Result<BindOutcome, StoreError> {
        let mut inner = self.lock();

        // Mirror the transaction order of the Postgres backend: worker row
        // first, job row second, and any failure after the worker-side
        // update restores the saved row.
        let rollback = match inner.workers.get(worker_id) {
            Some(w) if w.current_job_id.is_none() => w.clone(),
            _ => return Ok(BindOutcome::WorkerBusy),
        };

        {
            let worker = inner
                .workers
                .get_mut(worker_id)
                .ok_or_else(|| StoreError::Backend("worker row vanished".to_string()))?;
            worker.current_job_id = Some(job_id.to_string());
            worker.last_job = Some(now);
        }

        if self.fail_binds.load(Ordering::SeqCst) {
            inner.workers.insert(worker_id.to_string(), rollback);
            return Err(StoreError::Backend("injected bind failure".to_string()));
        }

        match inner.jobs.get(job_id) {
            Some(j) if j.status == JobStatus::Backlogged => {}
            _ => {
                inner.workers.insert(worker_id.to_string(), rollback);
                return Ok(BindOutcome::JobUnavailable);
            }
        }

        let job = inner
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| StoreError::Backend("job row vanished".to_string()))?;
        job.worker_id = Some(worker_id.to_string());
        job.status = JobStatus::Assigned;
        job.updated_at = now;

        Ok(BindOutcome::Bound)
    }

    async fn release_job(
        &self,
        worker_id: &str,
        job_id: &str,
        status: JobStatus,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut inner = self.lock();

        let bound = matches!(
            inner.jobs.get(job_id),
            Some(j) if j.status == JobStatus::Assigned && j.worker_id.as_deref() == Some(worker_id)
        ) && matches!(
            inner.workers.get(worker_id),
            Some(w) if w.current_job_id.as_deref() == Some(job_id)
        );
        if !bound {
            return Ok(false);
        }

        let job = inner
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| StoreError::Backend("job row vanished".to_string()))?;
        job.status = status;
        job.worker_id = None;
        job.updated_at = now;

        let worker = inner
            .workers
            .get_mut(worker_id)
            .ok_or_else(|| StoreError::Backend("worker row vanished".to_string()))?;
        worker.current_job_id = None;

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_second_bind_on_busy_worker_refused() {
        let store = MemStore::new();
        let now = Utc::now();
        store
            .create_worker(&Worker::registered("w1", now))
            .await
            .unwrap();
        store.create_job(&Job::backlogged("p1", now)).await.unwrap();
        store.create_job(&Job::backlogged("p2", now)).await.unwrap();

        assert_eq!(
            store.bind_job("w1", "p1", now).await.unwrap(),
            BindOutcome::Bound
        );
        assert_eq!(
            store.bind_job("w1", "p2", now).await.unwrap(),
            BindOutcome::WorkerBusy
        );

        // The refused bind changed nothing on either row.
        let worker = store.get_worker("w1").await.unwrap().unwrap();
        assert_eq!(worker.current_job_id.as_deref(), Some("p1"));
        let second = store.get_job("p2").await.unwrap().unwrap();
        assert_eq!(second.status, JobStatus::Backlogged);
        assert!(second.worker_id.is_none());
    }

    #[tokio::test]
    async fn test_bind_on_taken_job_rolls_back_worker_row() {
        let store = MemStore::new();
        let now = Utc::now();
        store
            .create_worker(&Worker::registered("w1", now))
            .await
            .unwrap();
        store
            .create_worker(&Worker::registered("w2", now))
            .await
            .unwrap();
        store.create_job(&Job::backlogged("p1", now)).await.unwrap();

        store.bind_job("w1", "p1", now).await.unwrap();
        assert_eq!(
            store.bind_job("w2", "p1", now).await.unwrap(),
            BindOutcome::JobUnavailable
        );

        // The job-side guard aborted the whole bind: w2's already-applied
        // worker-side update was rolled back.
        let w2 = store.get_worker("w2").await.unwrap().unwrap();
        assert!(w2.current_job_id.is_none());
        assert!(w2.last_job.is_none());
    }

    #[tokio::test]
    async fn test_injected_failure_restores_worker_row() {
        let store = MemStore::new();
        let now = Utc::now();
        store
            .create_worker(&Worker::registered("w1", now))
            .await
            .unwrap();
        store.create_job(&Job::backlogged("p1", now)).await.unwrap();

        store.fail_binds(true);
        store.bind_job("w1", "p1", now).await.unwrap_err();

        // The abort hit after the worker-side update; neither row may show
        // a half-applied binding.
        let worker = store.get_worker("w1").await.unwrap().unwrap();
        assert!(worker.current_job_id.is_none());
        assert!(worker.last_job.is_none());
        let job = store.get_job("p1").await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Backlogged);
        assert!(job.worker_id.is_none());
    }
}
