//! API Error Handling
//!
//! Unified error types and conversion for API responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::repository::StoreError;
use crate::service::{job_service::JobError, worker_service::WorkerError};

/// API error type
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    Conflict(String),
    BadRequest(String),
    StoreError(StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::StoreError(err) => {
                tracing::error!("Store error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<WorkerError> for ApiError {
    fn from(err: WorkerError) -> Self {
        match err {
            WorkerError::NotFound(id) => ApiError::NotFound(format!("Worker {} not found", id)),
            WorkerError::AlreadyExists(id) => {
                ApiError::Conflict(format!("Worker {} already registered", id))
            }
            WorkerError::Validation(msg) => ApiError::BadRequest(msg),
            WorkerError::Store(e) => ApiError::StoreError(e),
        }
    }
}

impl From<JobError> for ApiError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::NotFound(id) => ApiError::NotFound(format!("Job {} not found", id)),
            JobError::AlreadyExists(id) => {
                ApiError::Conflict(format!("Job {} already exists", id))
            }
            JobError::InvalidState(msg) => ApiError::Conflict(msg),
            JobError::Validation(msg) => ApiError::BadRequest(msg),
            JobError::AssignmentFailed(e) => {
                tracing::error!("Assignment failed, retry: {}", e);
                ApiError::StoreError(e)
            }
            JobError::Store(e) => ApiError::StoreError(e),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
