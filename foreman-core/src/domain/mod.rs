//! Core domain types
//!
//! This module contains the core domain structures used across Foreman
//! services. These types represent the fundamental business entities and are
//! shared between the coordinator (for persistence) and its callers.

pub mod job;
pub mod worker;
