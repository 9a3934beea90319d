use axum::http::StatusCode;
use thiserror::Error;
use uuid::Uuid;

use crate::common::response::ApiError;

/// Failures reported by a provider adapter.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProviderError {
    /// Transport failure, timeout, throttling, 5xx or an undecodable body.
    #[error("provider unavailable: {0}")]
    Unavailable(String),
    /// Credentials were rejected.
    #[error("provider rejected credentials: {0}")]
    Auth(String),
    /// Business-level refusal such as quota or an invalid request.
    #[error("provider rejected request: {0}")]
    Rejected(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("job {0} not found")]
    NotFound(Uuid),
    #[error("job {id} cannot move from {from}")]
    InvalidTransition { id: Uuid, from: String },
    #[error("idempotency key already used: {0}")]
    Duplicate(String),
    #[error("database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Duplicate(db.message().to_string())
            }
            _ => StoreError::Database(e.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum JobError {
    #[error("Not authorized to access this project")]
    NotAuthorized,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),
    #[error("Provider authentication failed: {0}")]
    ProviderAuthError(String),
    #[error("Invalid transition for job {0}")]
    InvalidTransition(Uuid),
    #[error("Storage error: {0}")]
    Store(String),
}

impl From<StoreError> for JobError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => JobError::NotFound(format!("Job {} not found", id)),
            StoreError::InvalidTransition { id, .. } => JobError::InvalidTransition(id),
            StoreError::Duplicate(key) => JobError::InvalidInput(format!("Duplicate idempotency key: {}", key)),
            StoreError::Database(msg) => JobError::Store(msg),
        }
    }
}

impl From<ProviderError> for JobError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::Auth(msg) => JobError::ProviderAuthError(msg),
            ProviderError::Unavailable(msg) | ProviderError::Rejected(msg) => JobError::ProviderUnavailable(msg),
        }
    }
}

impl JobError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            JobError::NotAuthorized => StatusCode::FORBIDDEN,
            JobError::NotFound(_) => StatusCode::NOT_FOUND,
            JobError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            JobError::ProviderUnavailable(_) | JobError::ProviderAuthError(_) => StatusCode::BAD_GATEWAY,
            JobError::InvalidTransition(_) | JobError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JobError> for ApiError {
    fn from(e: JobError) -> Self {
        let status = e.status_code();
        let message = match &e {
            // Internal details stay in the logs.
            JobError::Store(_) | JobError::InvalidTransition(_) => "Internal Server Error".to_string(),
            _ => e.to_string(),
        };
        ApiError(message, status)
    }
}
