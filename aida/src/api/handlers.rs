use std::path::Path;

use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

use crate::api::AppState;
use crate::error::AidaError;
use crate::llm::LlmBackend;
use crate::models::{AnalysisResult, FailedDocument};

/// Comma-separated extraction fields that fell back to their default.
pub const FAILED_FIELDS_HEADER: &str = "x-aida-failed-fields";

#[derive(Debug, Clone, Serialize)]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub llm: LlmStatus,
    pub vision_fallback: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct LlmStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// `GET /api/v1/health`
pub async fn health_check(State(state): State<AppState>) -> Json<HealthData> {
    let llm = if state.llm.is_available() {
        let provider = match state.llm.backend() {
            LlmBackend::OpenAI => "openai",
            LlmBackend::OpenRouter => "openrouter",
            LlmBackend::Ollama => "ollama",
            LlmBackend::LmStudio => "lmstudio",
            LlmBackend::OpenAICompatible { .. } => "openai-compatible",
            LlmBackend::Unavailable { .. } => "unavailable",
        };
        LlmStatus {
            status: "available".to_string(),
            provider: Some(provider.to_string()),
            model: state.llm.config().map(|c| c.model.clone()),
        }
    } else {
        LlmStatus {
            status: "unavailable".to_string(),
            provider: None,
            model: None,
        }
    };

    Json(HealthData {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        llm,
        vision_fallback: state.pipeline.has_vision_fallback(),
    })
}

/// `POST /api/v1/documents:analyze`
///
/// Multipart form with a `file` field. The file name selects the format.
/// Responds with the processed document, or with the flagged error record and
/// a matching status when the document could not be processed at all.
pub async fn analyze_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, AidaError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Ok(multipart_rejection(e)),
        };

        if field.name() != Some("file") {
            continue;
        }

        let file_name = field
            .file_name()
            .map(|name| name.to_string())
            .ok_or_else(|| AidaError::Validation("Uploaded file has no file name".to_string()))?;

        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return Ok(multipart_rejection(e)),
        };

        upload = Some((file_name, bytes.to_vec()));
        break;
    }

    let Some((file_name, bytes)) = upload else {
        return Err(AidaError::Validation(
            "Missing multipart field `file`".to_string(),
        ));
    };

    match state.pipeline.process_bytes(&file_name, bytes).await {
        Ok(outcome) => {
            let mut response =
                Json(AnalysisResult::Processed(outcome.document)).into_response();
            let headers = response.headers_mut();

            headers.insert(
                header::CONTENT_LANGUAGE,
                HeaderValue::from_static(outcome.language.code()),
            );

            if !outcome.failures.is_empty() {
                let fields = outcome
                    .failures
                    .iter()
                    .map(|failure| failure.field.to_string())
                    .collect::<Vec<_>>()
                    .join(",");
                if let Ok(value) = HeaderValue::from_str(&fields) {
                    headers.insert(FAILED_FIELDS_HEADER, value);
                }
            }

            Ok(response)
        }
        Err(error) => {
            let base_name = Path::new(&file_name)
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or(file_name);
            tracing::warn!(file_name = %base_name, error = %error, "Upload could not be processed");

            let record = AnalysisResult::Failed(FailedDocument::new(base_name, &error));
            Ok((error.status_code(), Json(record)).into_response())
        }
    }
}

fn multipart_rejection(error: MultipartError) -> Response {
    let status = error.status();
    let body = Json(json!({
        "error": true,
        "message": error.body_text(),
        "code": status.as_u16()
    }));

    (status, body).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_status_omits_absent_fields() {
        let status = LlmStatus {
            status: "unavailable".to_string(),
            provider: None,
            model: None,
        };

        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value, json!({"status": "unavailable"}));
    }
}
