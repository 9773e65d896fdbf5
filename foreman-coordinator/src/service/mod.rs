//! Service Module
//!
//! Business logic layer for the coordinator.
//! Services orchestrate between the store and contain domain logic.

pub mod assignment;
pub mod job;
pub mod worker;

// Re-export for convenience
pub use assignment as assignment_service;
pub use job as job_service;
pub use worker as worker_service;
