use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    error::{ApiError, OpenAIError},
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs, CreateChatCompletionResponse,
        ResponseFormat,
    },
    Client,
};

use crate::{
    config::{parse_llm_provider_model, LlmConfig},
    error::{AidaError, Result},
    llm::provider::{CompletionOptions, ResponseMode},
};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
const OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";
const LMSTUDIO_BASE_URL: &str = "http://localhost:1234/v1";

#[derive(Debug, Clone)]
struct ApiConfig {
    base_url: String,
    api_key: Option<String>,
    model: String,
    timeout_secs: u64,
    max_retries: u32,
}

#[derive(Clone)]
pub struct LlmApiClient {
    client: Client<OpenAIConfig>,
    config: ApiConfig,
}

impl LlmApiClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_config = ApiConfig::from_llm_config(config);

        let (provider, _) = parse_llm_provider_model(&config.model);
        let needs_api_key = match provider.to_lowercase().as_str() {
            "ollama" | "lmstudio" => false,
            // A bare model name without an endpoint is sent to OpenAI.
            "local" => config.base_url.is_none(),
            _ => true,
        };

        if needs_api_key && api_config.api_key.is_none() {
            return Err(AidaError::Llm(
                "API key required for this provider".to_string(),
            ));
        }

        let openai_config = OpenAIConfig::new()
            .with_api_base(api_config.base_url.clone())
            .with_api_key(api_config.api_key.clone().unwrap_or_default());

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(api_config.timeout_secs))
            .build()
            .map_err(|error| {
                AidaError::Llm(format!("Failed to create LLM HTTP client: {error}"))
            })?;

        // async-openai retries 5xx on its own for up to 15 minutes by default;
        // bound it by the request timeout so our retry loop stays in charge.
        let backoff = backoff::ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(api_config.timeout_secs)),
            ..Default::default()
        };

        let client = Client::with_config(openai_config)
            .with_http_client(http_client)
            .with_backoff(backoff);

        Ok(Self {
            client,
            config: api_config,
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub async fn complete(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        options: &CompletionOptions,
    ) -> Result<String> {
        if prompt.trim().is_empty() {
            return Err(AidaError::Validation("Prompt cannot be empty".to_string()));
        }

        let mut last_error: Option<AidaError> = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let delay_ms = 100 * 2_u64.pow(attempt - 1);
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }

            let request = self.build_request(prompt, system_prompt, options)?;

            match self.client.chat().create(request).await {
                Ok(response) => {
                    let content = Self::extract_content(response)?;
                    tracing::debug!(
                        model = %self.config.model,
                        response_len = content.len(),
                        "LLM response received"
                    );
                    return Ok(content);
                }
                Err(error) => {
                    let (mapped_error, retryable) = Self::classify(error);

                    if retryable && attempt < self.config.max_retries {
                        tracing::debug!(attempt, error = %mapped_error, "Retrying LLM request");
                        last_error = Some(mapped_error);
                        continue;
                    }

                    return Err(mapped_error);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| AidaError::Llm("LLM completion failed after retries".to_string())))
    }

    fn build_request(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        options: &CompletionOptions,
    ) -> Result<CreateChatCompletionRequest> {
        let mut messages = Vec::new();

        if let Some(system_prompt) = system_prompt.filter(|value| !value.trim().is_empty()) {
            messages.push(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system_prompt)
                    .build()
                    .map_err(|error| {
                        AidaError::Validation(format!("Invalid system prompt: {error}"))
                    })?
                    .into(),
            );
        }

        messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|error| AidaError::Validation(format!("Invalid user prompt: {error}")))?
                .into(),
        );

        let mut request = CreateChatCompletionRequestArgs::default();
        request.model(self.config.model.clone()).messages(messages);
        Self::apply_completion_options(&mut request, options);

        request.build().map_err(|error| {
            AidaError::Validation(format!("Invalid LLM completion request: {error}"))
        })
    }

    // `max_tokens` is deprecated upstream but is what OpenAI-compatible servers accept.
    #[allow(deprecated)]
    fn apply_completion_options(
        request: &mut CreateChatCompletionRequestArgs,
        options: &CompletionOptions,
    ) {
        if let Some(temperature) = options.temperature {
            request.temperature(temperature);
        }

        if let Some(max_tokens) = options.max_tokens {
            request.max_tokens(max_tokens);
        }

        if options.response_mode == ResponseMode::JsonObject {
            request.response_format(ResponseFormat::JsonObject);
        }
    }

    fn extract_content(response: CreateChatCompletionResponse) -> Result<String> {
        let message = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AidaError::Llm("LLM response contained no choices".to_string()))?
            .message
            .content
            .unwrap_or_default();

        if message.trim().is_empty() {
            return Err(AidaError::Llm(
                "LLM response contained empty content".to_string(),
            ));
        }

        Ok(message)
    }

    /// Maps a client error to the crate error, and whether another attempt may
    /// succeed. Rate limits and rejected credentials are never retried.
    fn classify(error: OpenAIError) -> (AidaError, bool) {
        match error {
            OpenAIError::ApiError(api_error) => {
                let code = api_error.code.as_deref().unwrap_or_default().to_lowercase();
                let kind = api_error.r#type.as_deref().unwrap_or_default().to_lowercase();
                let message = api_error.message.to_lowercase();

                if code == "insufficient_quota"
                    || code.contains("rate_limit")
                    || kind.contains("rate_limit")
                    || message.contains("rate limit")
                {
                    (AidaError::LlmRateLimit { retry_after: None }, false)
                } else if code == "invalid_api_key"
                    || kind.contains("authentication")
                    || message.contains("invalid api key")
                {
                    let error = AidaError::Llm(format!("LLM authentication failed: {api_error}"));
                    (error, false)
                } else {
                    // Untyped errors come from gateways and proxies in front of the model.
                    let retryable = api_error.r#type.is_none() && api_error.code.is_none();
                    (AidaError::Llm(format!("LLM API error: {api_error}")), retryable)
                }
            }
            OpenAIError::Reqwest(error) => {
                let retryable = error.status().map_or(true, |status| status.is_server_error());
                (AidaError::Llm(format!("LLM request failed: {error}")), retryable)
            }
            OpenAIError::JSONDeserialize(error) => (
                AidaError::Llm(format!("Failed to parse LLM response: {error}")),
                false,
            ),
            OpenAIError::InvalidArgument(message) => (AidaError::Validation(message), false),
            other => (AidaError::Llm(other.to_string()), false),
        }
    }
}

impl ApiConfig {
    fn from_llm_config(config: &LlmConfig) -> Self {
        let (provider, model) = parse_llm_provider_model(&config.model);

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| default_base_url(provider).to_string());

        let normalized_model = if provider.eq_ignore_ascii_case("local") {
            config.model.clone()
        } else {
            model.to_string()
        };

        Self {
            base_url,
            api_key: config.api_key.clone(),
            model: normalized_model,
            timeout_secs: config.timeout_secs,
            max_retries: config.max_retries,
        }
    }
}

pub(crate) fn default_base_url(provider: &str) -> &'static str {
    match provider.to_lowercase().as_str() {
        "openai" => OPENAI_BASE_URL,
        "openrouter" => OPENROUTER_BASE_URL,
        "ollama" => OLLAMA_BASE_URL,
        "lmstudio" => LMSTUDIO_BASE_URL,
        _ => OPENAI_BASE_URL,
    }
}
