//! Job domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A unit of work created from one approved item.
///
/// Structure shared between the coordinator (persists) and workers (execute).
/// The id is the opaque identifier of the source item and never changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub status: JobStatus,
    /// Worker currently bound to this job. Non-null exactly while the job
    /// is `Assigned`.
    pub worker_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Create a fresh, unbound job for an approved item.
    pub fn backlogged(item_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Job {
            id: item_id.into(),
            status: JobStatus::Backlogged,
            worker_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Job lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    /// Created but no eligible worker was found yet
    Backlogged,

    /// Bound to exactly one worker
    Assigned,

    /// Finished successfully (reported by the worker)
    Succeeded,

    /// Finished with an error (reported by the worker)
    Failed,
}

impl JobStatus {
    /// Whether this status is a valid completion report from a worker.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Backlogged => write!(f, "Backlogged"),
            JobStatus::Assigned => write!(f, "Assigned"),
            JobStatus::Succeeded => write!(f, "Succeeded"),
            JobStatus::Failed => write!(f, "Failed"),
        }
    }
}
