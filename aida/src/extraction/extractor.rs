use std::sync::Arc;

use serde_json::{Map, Value};

use super::prompts::{self, Prompt};
use super::Extraction;
use crate::config::ExtractionConfig;
use crate::error::{AidaError, Result};
use crate::llm::{CompletionOptions, ResponseMode, TextGeneration};
use crate::models::{MedicalValues, PatientInfo};
use crate::processing::Language;

/// Turns document text into typed fields with one service round trip per field.
///
/// The detected [`Language`] is passed in by the caller; nothing here
/// re-detects it.
#[derive(Clone)]
pub struct StructuredExtractor {
    llm: Arc<dyn TextGeneration>,
    config: ExtractionConfig,
}

impl StructuredExtractor {
    pub fn new(llm: Arc<dyn TextGeneration>, config: ExtractionConfig) -> Self {
        Self { llm, config }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Falls back to an all-`None` [`PatientInfo`].
    pub async fn extract_patient_info(
        &self,
        text: &str,
        language: Language,
    ) -> Extraction<PatientInfo> {
        let prompt = prompts::patient_info_prompt(
            truncate_chars(text, self.config.max_text_length),
            language,
        );

        let result = self
            .complete_json(&prompt)
            .await
            .map(|object| parse_patient_info(&object));

        settle("patient_info", language, result, PatientInfo::default)
    }

    /// Falls back to an empty mapping.
    pub async fn extract_medical_values(
        &self,
        text: &str,
        language: Language,
    ) -> Extraction<MedicalValues> {
        let prompt = prompts::medical_values_prompt(
            truncate_chars(text, self.config.max_text_length),
            language,
        );

        let result = self
            .complete_json(&prompt)
            .await
            .map(|object| parse_medical_values(&object));

        settle("medical_values", language, result, MedicalValues::new)
    }

    /// Falls back to the localized default label, also when the reply names
    /// no known category.
    pub async fn categorize_document(&self, text: &str, language: Language) -> Extraction<String> {
        let prompt = prompts::category_prompt(
            truncate_chars(text, self.config.category_text_length),
            language,
        );
        let options = CompletionOptions {
            temperature: Some(self.config.temperature),
            max_tokens: Some(self.config.category_max_tokens),
            response_mode: ResponseMode::Text,
        };

        let result = self
            .llm
            .complete(&prompt.user, Some(prompt.system), &options)
            .await
            .and_then(|reply| {
                normalize_category(&reply, language)
                    .map(str::to_string)
                    .ok_or_else(|| {
                        AidaError::Validation(format!(
                            "Reply is not a known category: {:?}",
                            reply.trim()
                        ))
                    })
            });

        settle("category", language, result, || {
            prompts::default_category(language).to_string()
        })
    }

    /// Falls back to a fixed localized failure message.
    pub async fn generate_summary(&self, text: &str, language: Language) -> Extraction<String> {
        let prompt = prompts::summary_prompt(
            truncate_chars(text, self.config.max_text_length),
            language,
            self.config.summary_max_sentences,
        );
        let options = CompletionOptions {
            temperature: Some(self.config.temperature),
            max_tokens: Some(self.config.summary_max_tokens),
            response_mode: ResponseMode::Text,
        };

        let result = self
            .llm
            .complete(&prompt.user, Some(prompt.system), &options)
            .await
            .and_then(|reply| {
                let summary = reply.trim();
                if summary.is_empty() {
                    Err(AidaError::Validation("Empty summary".to_string()))
                } else {
                    Ok(summary.to_string())
                }
            });

        settle("summary", language, result, || {
            prompts::summary_failure_message(language).to_string()
        })
    }

    async fn complete_json(&self, prompt: &Prompt) -> Result<Map<String, Value>> {
        let options = CompletionOptions {
            temperature: Some(self.config.temperature),
            max_tokens: None,
            response_mode: ResponseMode::JsonObject,
        };

        let reply = self
            .llm
            .complete(&prompt.user, Some(prompt.system), &options)
            .await?;

        parse_json_object(&reply)
    }
}

fn settle<T>(
    field: &'static str,
    language: Language,
    result: Result<T>,
    fallback: impl FnOnce() -> T,
) -> Extraction<T> {
    match result {
        Ok(value) => Extraction::Extracted(value),
        Err(error) => {
            tracing::warn!(field, %language, error = %error, "Extraction failed, using default");
            Extraction::failed(error.to_string(), fallback())
        }
    }
}

/// Hard cutoff after `max_chars` characters, on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

/// Map a free-text category reply onto one of the localized candidates.
///
/// Case-insensitive. Surrounding bullets, quotes, emphasis and trailing
/// punctuation are ignored; otherwise the longest candidate the reply
/// mentions wins.
pub fn normalize_category(reply: &str, language: Language) -> Option<&'static str> {
    let cleaned = reply
        .trim_matches(|c: char| {
            c.is_whitespace() || matches!(c, '-' | '*' | '"' | '\'' | '`' | '.' | ':')
        })
        .to_lowercase();
    if cleaned.is_empty() {
        return None;
    }

    let candidates = prompts::categories(language);

    candidates
        .iter()
        .find(|candidate| candidate.to_lowercase() == cleaned)
        .or_else(|| {
            candidates
                .iter()
                .filter(|candidate| cleaned.contains(&candidate.to_lowercase()))
                .max_by_key(|candidate| candidate.len())
        })
        .copied()
}

fn parse_json_object(reply: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(strip_code_fence(reply))? {
        Value::Object(object) => Ok(object),
        other => Err(AidaError::Validation(format!(
            "Expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

/// Some models wrap JSON in a markdown fence even in JSON mode.
fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn parse_patient_info(object: &Map<String, Value>) -> PatientInfo {
    PatientInfo {
        name: optional_field(object, "name"),
        date_of_birth: optional_field(object, "date_of_birth"),
        address: optional_field(object, "address"),
    }
}

/// Missing keys, JSON `null`, blanks and the literal string "null" are all `None`.
fn optional_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    let value = match object.get(key)? {
        Value::String(value) => value.trim().to_string(),
        Value::Number(number) => number.to_string(),
        _ => return None,
    };

    if value.is_empty() || value.eq_ignore_ascii_case("null") {
        None
    } else {
        Some(value)
    }
}

fn parse_medical_values(object: &Map<String, Value>) -> MedicalValues {
    let mut values = MedicalValues::new();

    for (label, value) in object {
        let label = label.trim();
        if label.is_empty() {
            continue;
        }

        match scalar_text(value).or_else(|| value_with_unit(value)) {
            Some(text) if !text.is_empty() => {
                values.insert(label.to_string(), text);
            }
            _ => tracing::debug!(label, "Skipping medical value without a usable value"),
        }
    }

    values
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// `{"value": 120, "unit": "mmHg"}` becomes `"120 mmHg"`.
fn value_with_unit(value: &Value) -> Option<String> {
    let object = value.as_object()?;
    let amount = scalar_text(object.get("value")?)?;

    match object.get("unit").and_then(scalar_text) {
        Some(unit) if !unit.is_empty() => Some(format!("{amount} {unit}")),
        _ => Some(amount),
    }
}
