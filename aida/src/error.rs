use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AidaError {
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("No text extracted from document")]
    InsufficientText,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("OCR error: {0}")]
    Ocr(String),

    #[error("OCR unavailable: {0}")]
    OcrUnavailable(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("LLM unavailable: {0}")]
    LlmUnavailable(String),

    #[error("LLM rate limit exceeded, retry after {retry_after:?} seconds")]
    LlmRateLimit { retry_after: Option<u64> },
}

impl AidaError {
    /// Errors that stop a document before any extraction call is made.
    pub fn is_pipeline_fatal(&self) -> bool {
        matches!(
            self,
            AidaError::FileNotFound(_)
                | AidaError::UnsupportedFormat(_)
                | AidaError::InsufficientText
        )
    }
}

impl AidaError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AidaError::FileNotFound(_) => StatusCode::NOT_FOUND,
            AidaError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AidaError::InsufficientText | AidaError::Processing(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AidaError::Validation(_) | AidaError::Json(_) => StatusCode::BAD_REQUEST,
            AidaError::Io(_) | AidaError::Ocr(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AidaError::OcrUnavailable(_) | AidaError::LlmUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AidaError::Llm(_) => StatusCode::BAD_GATEWAY,
            AidaError::LlmRateLimit { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl IntoResponse for AidaError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            AidaError::Validation(msg)
            | AidaError::Processing(msg)
            | AidaError::Ocr(msg)
            | AidaError::OcrUnavailable(msg)
            | AidaError::Llm(msg)
            | AidaError::LlmUnavailable(msg) => msg.clone(),
            _ => self.to_string(),
        };

        let body = Json(json!({
            "error": true,
            "message": message,
            "code": status.as_u16()
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AidaError>;
