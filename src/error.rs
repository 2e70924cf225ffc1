//! Application error types

use serde::Serialize;
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Source error: {0}")]
    Source(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Snapshot not ready: {0}")]
    NotReady(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Serializable error response for the serving layer
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<AppError> for ErrorResponse {
    fn from(err: AppError) -> Self {
        let (code, message) = match &err {
            AppError::Source(_) => ("SOURCE_ERROR", err.to_string()),
            AppError::Http(_) => ("SOURCE_ERROR", err.to_string()),
            AppError::NotReady(_) => ("NOT_READY", err.to_string()),
            AppError::Serialization(_) => ("SERIALIZATION_ERROR", err.to_string()),
            AppError::Validation(_) => ("VALIDATION_ERROR", err.to_string()),
            AppError::Config(_) => ("CONFIG_ERROR", err.to_string()),
            AppError::Io(_) => ("IO_ERROR", err.to_string()),
            AppError::Internal(_) => ("INTERNAL_ERROR", err.to_string()),
        };

        ErrorResponse {
            code: code.to_string(),
            message,
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
