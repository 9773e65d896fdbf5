//! Data Transfer Objects
//!
//! This module contains DTOs used for communication between the coordinator
//! and its collaborators (the approval gateway and the polling workers).
//! DTOs are lightweight representations optimized for network transfer.

pub mod item;
pub mod job;
pub mod worker;
