//! Worker DTOs

use serde::{Deserialize, Serialize};

use crate::domain::job::Job;

/// Request to register a worker with the coordinator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterWorker {
    /// Unique identifier for the worker
    pub worker_id: String,
}

/// Response to a worker poll: the job bound to the worker, if any
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollResponse {
    pub job: Option<Job>,
}
