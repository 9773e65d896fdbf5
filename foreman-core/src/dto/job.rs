//! Job DTOs

use serde::{Deserialize, Serialize};

use crate::domain::job::JobStatus;

/// Completion report from a worker for a job bound to it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteJob {
    /// The worker reporting completion; must match the job's binding
    pub worker_id: String,

    /// Terminal outcome; only `Succeeded` or `Failed` are accepted
    pub status: JobStatus,
}
