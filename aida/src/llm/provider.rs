use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{parse_llm_provider_model, LlmConfig};
use crate::error::{AidaError, Result};
use crate::llm::api::{default_base_url, LlmApiClient};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmBackend {
    OpenAI,
    OpenRouter,
    Ollama,
    LmStudio,
    OpenAICompatible { base_url: String },
    Unavailable { reason: String },
}

/// How the service is asked to shape its reply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseMode {
    #[default]
    Text,
    /// Strict JSON object mode (`response_format = json_object`).
    JsonObject,
}

#[derive(Debug, Clone, Default)]
pub struct CompletionOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub response_mode: ResponseMode,
}

/// A text-generation service: one prompt in, one text payload out.
#[async_trait]
pub trait TextGeneration: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        options: &CompletionOptions,
    ) -> Result<String>;
}

#[derive(Clone)]
pub struct LlmProvider {
    backend: LlmBackend,
    config: Option<Arc<LlmConfig>>,
    client: Option<LlmApiClient>,
}

impl LlmProvider {
    pub fn new(config: Option<&LlmConfig>) -> Self {
        let Some(config) = config else {
            return Self::unavailable("No LLM configuration provided");
        };

        let (provider, _model) = parse_llm_provider_model(&config.model);

        let backend = match provider.to_lowercase().as_str() {
            "openai" => LlmBackend::OpenAI,
            "openrouter" => LlmBackend::OpenRouter,
            "ollama" => LlmBackend::Ollama,
            "lmstudio" => LlmBackend::LmStudio,
            "local" if config.base_url.is_none() => LlmBackend::OpenAI,
            _ => {
                if let Some(base_url) = &config.base_url {
                    LlmBackend::OpenAICompatible {
                        base_url: base_url.clone(),
                    }
                } else {
                    LlmBackend::Unavailable {
                        reason: format!("Unknown provider in model: {}", config.model),
                    }
                }
            }
        };

        if matches!(backend, LlmBackend::Unavailable { .. }) {
            return Self {
                backend,
                config: Some(Arc::new(config.clone())),
                client: None,
            };
        }

        match LlmApiClient::new(config) {
            Ok(client) => Self {
                backend,
                config: Some(Arc::new(config.clone())),
                client: Some(client),
            },
            Err(error) => {
                tracing::warn!(
                    model = %config.model,
                    error = %error,
                    "LLM client could not be created"
                );
                Self {
                    backend: LlmBackend::Unavailable {
                        reason: error.to_string(),
                    },
                    config: Some(Arc::new(config.clone())),
                    client: None,
                }
            }
        }
    }

    pub fn unavailable(reason: &str) -> Self {
        Self {
            backend: LlmBackend::Unavailable {
                reason: reason.to_string(),
            },
            config: None,
            client: None,
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self.backend, LlmBackend::Unavailable { .. })
    }

    pub fn backend(&self) -> &LlmBackend {
        &self.backend
    }

    pub fn config(&self) -> Option<&LlmConfig> {
        self.config.as_deref()
    }

    /// Endpoint requests go to, if the provider is usable.
    pub fn base_url(&self) -> Option<&str> {
        let config = self.config()?;
        match &self.backend {
            LlmBackend::Unavailable { .. } => None,
            LlmBackend::OpenAICompatible { base_url } => Some(base_url.as_str()),
            _ => Some(config.base_url.as_deref().unwrap_or_else(|| {
                let (provider, _) = parse_llm_provider_model(&config.model);
                default_base_url(provider)
            })),
        }
    }

    fn unavailable_reason(&self) -> String {
        match &self.backend {
            LlmBackend::Unavailable { reason } => reason.clone(),
            _ => "LLM client was not initialized".to_string(),
        }
    }
}

#[async_trait]
impl TextGeneration for LlmProvider {
    async fn complete(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        options: &CompletionOptions,
    ) -> Result<String> {
        let Some(client) = self.client.as_ref().filter(|_| self.is_available()) else {
            return Err(AidaError::LlmUnavailable(self.unavailable_reason()));
        };

        client.complete(prompt, system_prompt, options).await
    }
}
