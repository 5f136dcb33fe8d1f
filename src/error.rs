use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
};

use crate::api::response;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid or unsafe URL: {0}")]
    ValidationError(String),

    #[error("Failed to scrape {url} after {attempts} attempts: {message}")]
    ScrapeError {
        url: String,
        attempts: u32,
        message: String,
    },

    #[error("Generation failed: {0}")]
    GenerationError(String),

    #[error("Generated output too large: {size} bytes (limit {limit})")]
    OversizeError { size: usize, limit: usize },

    #[error("Storage error: {0}")]
    PersistenceError(String),

    #[error("Clone not found: {0}")]
    NotFoundError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Request processing timed out")]
    Timeout,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::ScrapeError { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::GenerationError(_) => StatusCode::BAD_GATEWAY,
            AppError::OversizeError { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::PersistenceError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFoundError(_) => StatusCode::NOT_FOUND,
            AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        response::error::<()>(status, self.to_string()).into_response()
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::PersistenceError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::PersistenceError(err.to_string())
    }
}

impl From<std::env::VarError> for AppError {
    fn from(err: std::env::VarError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
