use serde::Deserialize;
use std::env;

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

fn env_non_empty(var: &str) -> Option<String> {
    env::var(var).ok().filter(|value| !value.trim().is_empty())
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub extraction: ExtractionConfig,
    pub ocr: OcrConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upload cap for the HTTP surface, in megabytes.
    pub max_upload_mb: usize,
}

/// Text-generation service used by every extraction operation.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

/// Prompting knobs shared by the four extraction operations.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    pub temperature: f32,
    /// Hard character cutoff applied before prompting.
    pub max_text_length: usize,
    /// Categorization only needs the head of the document.
    pub category_text_length: usize,
    pub summary_max_sentences: u32,
    pub category_max_tokens: u32,
    pub summary_max_tokens: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OcrConfig {
    /// Tesseract language pack for the first local attempt.
    pub languages: String,
    /// Language pack for the retry when the first attempt is nearly empty.
    pub fallback_languages: String,
    pub vision_model: String,
    pub vision_api_key: Option<String>,
    pub vision_base_url: Option<String>,
    pub vision_max_tokens: u32,
    pub timeout_secs: u64,
    pub max_image_dimension: u32,
    pub min_image_dimension: u32,
    /// Local output shorter than this triggers the fallback language pack.
    pub retry_threshold: usize,
    /// Local output longer than this is accepted without the vision service.
    pub accept_threshold: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "openai/gpt-4o-mini".to_string(),
            api_key: None,
            base_url: None,
            timeout_secs: 60,
            max_retries: 2,
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_text_length: 3000,
            category_text_length: 1000,
            summary_max_sentences: 15,
            category_max_tokens: 50,
            summary_max_tokens: 500,
        }
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            languages: "fra+eng".to_string(),
            fallback_languages: "eng".to_string(),
            vision_model: "openai/gpt-4o-mini".to_string(),
            vision_api_key: None,
            vision_base_url: None,
            vision_max_tokens: 4096,
            timeout_secs: 60,
            max_image_dimension: 4096,
            min_image_dimension: 50,
            retry_threshold: 20,
            accept_threshold: 50,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let llm_defaults = LlmConfig::default();
        let extraction_defaults = ExtractionConfig::default();
        let ocr_defaults = OcrConfig::default();

        let api_key = env_non_empty("LLM_API_KEY").or_else(|| env_non_empty("OPENAI_API_KEY"));
        let base_url = env_non_empty("LLM_BASE_URL");

        Self {
            server: ServerConfig {
                host: env::var("AIDA_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or("AIDA_PORT", 3000),
                max_upload_mb: parse_env_or("MAX_FILE_SIZE_MB", 50),
            },
            llm: LlmConfig {
                model: env::var("LLM_MODEL")
                    .or_else(|_| env::var("CHAT_MODEL"))
                    .unwrap_or(llm_defaults.model),
                api_key: api_key.clone(),
                base_url: base_url.clone(),
                timeout_secs: parse_env_or("LLM_TIMEOUT", llm_defaults.timeout_secs),
                max_retries: parse_env_or("LLM_MAX_RETRIES", llm_defaults.max_retries),
            },
            extraction: ExtractionConfig {
                temperature: parse_env_or("LLM_TEMPERATURE", extraction_defaults.temperature),
                max_text_length: parse_env_or(
                    "MAX_TEXT_LENGTH",
                    extraction_defaults.max_text_length,
                ),
                category_text_length: parse_env_or(
                    "CATEGORY_TEXT_LENGTH",
                    extraction_defaults.category_text_length,
                ),
                summary_max_sentences: parse_env_or(
                    "SUMMARY_MAX_SENTENCES",
                    extraction_defaults.summary_max_sentences,
                ),
                category_max_tokens: extraction_defaults.category_max_tokens,
                summary_max_tokens: parse_env_or(
                    "SUMMARY_MAX_TOKENS",
                    extraction_defaults.summary_max_tokens,
                ),
            },
            ocr: OcrConfig {
                languages: env::var("OCR_LANGUAGES").unwrap_or(ocr_defaults.languages),
                fallback_languages: env::var("OCR_FALLBACK_LANGUAGES")
                    .unwrap_or(ocr_defaults.fallback_languages),
                vision_model: env::var("VISION_MODEL").unwrap_or(ocr_defaults.vision_model),
                // The vision fallback shares credentials with the chat model unless told otherwise.
                vision_api_key: env_non_empty("VISION_API_KEY").or(api_key),
                vision_base_url: env_non_empty("VISION_BASE_URL").or(base_url),
                vision_max_tokens: parse_env_or(
                    "VISION_MAX_TOKENS",
                    ocr_defaults.vision_max_tokens,
                ),
                timeout_secs: parse_env_or("OCR_TIMEOUT", ocr_defaults.timeout_secs),
                max_image_dimension: parse_env_or(
                    "OCR_MAX_DIMENSION",
                    ocr_defaults.max_image_dimension,
                ),
                min_image_dimension: parse_env_or(
                    "OCR_MIN_DIMENSION",
                    ocr_defaults.min_image_dimension,
                ),
                retry_threshold: ocr_defaults.retry_threshold,
                accept_threshold: ocr_defaults.accept_threshold,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}

/// Known LLM providers that use OpenAI-compatible APIs
pub const KNOWN_LLM_PROVIDERS: &[&str] = &["openai", "openrouter", "ollama", "lmstudio"];

/// Parse an LLM model name into (provider, model) tuple.
pub fn parse_llm_provider_model(model: &str) -> (&str, &str) {
    if let Some((prefix, rest)) = model.split_once('/') {
        let prefix_lower = prefix.to_lowercase();
        if KNOWN_LLM_PROVIDERS.contains(&prefix_lower.as_str()) {
            return (prefix, rest);
        }
    }
    // Default to treating the whole string as a local model
    ("local", model)
}
