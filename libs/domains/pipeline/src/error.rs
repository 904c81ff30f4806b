use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;

/// Pipeline failure taxonomy.
///
/// `Config` covers missing deployment context (server-side fault);
/// `Validation` and `EmptyResult` are client-side faults raised before any
/// external write; the per-collaborator variants wrap external-service
/// failures with a human-readable summary instead of the collaborator's raw
/// error type.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Empty result: {0}")]
    EmptyResult(String),

    #[error("Warehouse error: {0}")]
    Warehouse(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Vector index error: {0}")]
    Index(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        PipelineError::Internal(format!("HTTP transport error: {}", err))
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Internal(format!("JSON error: {}", err))
    }
}

impl From<validator::ValidationErrors> for PipelineError {
    fn from(err: validator::ValidationErrors) -> Self {
        PipelineError::Validation(err.to_string())
    }
}

/// Convert PipelineError to AppError for standardized HTTP error responses
impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Config(msg) => {
                AppError::InternalServerError(format!("Config error: {}", msg))
            }
            PipelineError::Validation(msg) => AppError::BadRequest(msg),
            PipelineError::EmptyResult(msg) => AppError::BadRequest(msg),
            PipelineError::Warehouse(msg) => {
                AppError::InternalServerError(format!("Warehouse error: {}", msg))
            }
            PipelineError::Embedding(msg) => {
                AppError::InternalServerError(format!("Embedding error: {}", msg))
            }
            PipelineError::Storage(msg) => {
                AppError::InternalServerError(format!("Storage error: {}", msg))
            }
            PipelineError::Index(msg) => {
                AppError::InternalServerError(format!("Vector index error: {}", msg))
            }
            PipelineError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}
