//! Foreman Core
//!
//! Core types and abstractions for the Foreman job coordination system.
//!
//! This crate contains:
//! - Domain types: Core business entities (Job, Worker)
//! - DTOs: Data transfer objects for communication with the coordinator

pub mod domain;
pub mod dto;
