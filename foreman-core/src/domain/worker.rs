//! Worker domain model
//!
//! Represents a polling worker process that executes jobs handed out by the
//! coordinator. Liveness is inferred from poll recency rather than a
//! heartbeat channel: a worker is online because it asked us something
//! recently. The pure predicates here take `now` as an argument so tests can
//! use fixed instants.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// How recently a worker must have polled to count as online.
pub const ONLINE_THRESHOLD_SECS: i64 = 30;

/// A worker that can execute one job at a time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Worker {
    /// Identifier supplied by the worker process itself
    pub id: String,

    /// Last time this worker polled the coordinator
    pub last_poll: DateTime<Utc>,

    /// Last time a job was assigned to this worker
    pub last_job: Option<DateTime<Utc>>,

    /// Job currently bound to this worker, if any
    pub current_job_id: Option<String>,
}

impl Worker {
    /// Create a worker record at first registration.
    pub fn registered(id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Worker {
            id: id.into(),
            last_poll: now,
            last_job: None,
            current_job_id: None,
        }
    }

    /// Whether the worker has polled within the online threshold.
    ///
    /// A worker whose last poll is exactly the threshold old is offline.
    pub fn is_online(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.last_poll) < TimeDelta::seconds(ONLINE_THRESHOLD_SECS)
    }

    /// Whether the worker can take a new job: online and not bound to one.
    pub fn is_available(&self, now: DateTime<Utc>) -> bool {
        self.is_online(now) && self.current_job_id.is_none()
    }
}

/// Choose which worker gets the next job.
///
/// A worker that has never been assigned a job wins outright (first one
/// encountered in the snapshot). Otherwise the worker whose last assignment
/// is oldest is chosen, spreading load by recency without a separate
/// counter. Returns `None` on an empty snapshot.
pub fn select_worker(workers: &[Worker]) -> Option<&Worker> {
    if let Some(fresh) = workers.iter().find(|w| w.last_job.is_none()) {
        return Some(fresh);
    }
    workers.iter().min_by_key(|w| w.last_job)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn worker(id: &str, last_poll: DateTime<Utc>, last_job: Option<DateTime<Utc>>) -> Worker {
        Worker {
            id: id.to_string(),
            last_poll,
            last_job,
            current_job_id: None,
        }
    }

    #[test]
    fn test_online_within_threshold() {
        let now = Utc::now();
        let w = worker("w1", now - TimeDelta::seconds(29), None);
        assert!(w.is_online(now));
    }

    #[test]
    fn test_offline_beyond_threshold() {
        let now = Utc::now();
        let w = worker("w1", now - TimeDelta::seconds(31), None);
        assert!(!w.is_online(now));
    }

    #[test]
    fn test_offline_at_exact_threshold() {
        let now = Utc::now();
        let w = worker("w1", now - TimeDelta::seconds(ONLINE_THRESHOLD_SECS), None);
        assert!(!w.is_online(now));
    }

    #[test]
    fn test_busy_worker_is_not_available() {
        let now = Utc::now();
        let mut w = worker("w1", now, None);
        w.current_job_id = Some("job-1".to_string());
        assert!(w.is_online(now));
        assert!(!w.is_available(now));
    }

    #[test]
    fn test_select_prefers_never_assigned() {
        let now = Utc::now();
        let a = worker("a", now, None);
        let b = worker("b", now, Some(now - TimeDelta::hours(1)));
        let workers = [b, a];
        let chosen = select_worker(&workers).unwrap();
        assert_eq!(chosen.id, "a");
    }

    #[test]
    fn test_select_picks_least_recently_used() {
        let now = Utc::now();
        let b = worker("b", now, Some(now - TimeDelta::hours(1)));
        let c = worker("c", now, Some(now - TimeDelta::hours(2)));
        let workers = [b, c];
        let chosen = select_worker(&workers).unwrap();
        assert_eq!(chosen.id, "c");
    }

    #[test]
    fn test_select_empty_snapshot() {
        assert!(select_worker(&[]).is_none());
    }
}
