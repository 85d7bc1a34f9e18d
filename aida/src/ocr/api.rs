use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::{parse_llm_provider_model, OcrConfig};
use crate::error::{AidaError, Result};

const VISION_PROMPT: &str = "Extract all text from this image. Keep the original language of the document and do not translate it. Return only the extracted text without any explanations or formatting.";

const MAX_RETRIES: u32 = 3;

/// Remote text extraction from an image by a vision-capable model.
#[async_trait]
pub trait VisionOcr: Send + Sync {
    async fn extract_text(&self, image_bytes: &[u8]) -> Result<String>;
}

#[derive(Clone, Debug)]
pub struct OpenAiVisionClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum ContentPart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

impl OpenAiVisionClient {
    pub fn new(config: &OcrConfig) -> Result<Self> {
        let api_key = config
            .vision_api_key
            .clone()
            .ok_or_else(|| AidaError::Ocr("API key required for vision OCR".to_string()))?;

        let (provider, model) = parse_llm_provider_model(&config.vision_model);
        let base_url = config.vision_base_url.clone().unwrap_or_else(|| {
            match provider.to_lowercase().as_str() {
                "openrouter" => "https://openrouter.ai/api/v1",
                _ => "https://api.openai.com/v1",
            }
            .to_string()
        });

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AidaError::Ocr(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            max_tokens: config.vision_max_tokens,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, image_bytes: &[u8]) -> ChatRequest {
        let base64_image = STANDARD.encode(image_bytes);
        let data_url = format!("data:{};base64,{base64_image}", sniff_mime(image_bytes));

        ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: vec![
                    ContentPart::Text {
                        text: VISION_PROMPT.to_string(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl { url: data_url },
                    },
                ],
            }],
            max_tokens: self.max_tokens,
        }
    }

    async fn make_request(&self, request: &ChatRequest) -> Result<String> {
        let mut retries = 0;

        loop {
            let response = self
                .client
                .post(format!("{}/chat/completions", self.base_url))
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("Content-Type", "application/json")
                .json(request)
                .send()
                .await;

            match response {
                Ok(resp) => {
                    if resp.status().is_success() {
                        let chat_response: ChatResponse = resp.json().await.map_err(|e| {
                            AidaError::Ocr(format!("Failed to parse response: {e}"))
                        })?;

                        return chat_response
                            .choices
                            .into_iter()
                            .next()
                            .and_then(|c| c.message.content)
                            .map(|text| text.trim().to_string())
                            .ok_or_else(|| AidaError::Ocr("No response from API".to_string()));
                    } else if resp.status().as_u16() == 429 || resp.status().is_server_error() {
                        retries += 1;
                        if retries >= MAX_RETRIES {
                            return Err(AidaError::Ocr(format!(
                                "API request failed after {} retries: {}",
                                MAX_RETRIES,
                                resp.status()
                            )));
                        }
                        let delay = Duration::from_millis(100 * (2_u64.pow(retries)));
                        tokio::time::sleep(delay).await;
                        continue;
                    } else {
                        let status = resp.status();
                        let body = resp.text().await.unwrap_or_default();
                        return Err(AidaError::Ocr(format!(
                            "API request failed: {status} - {body}"
                        )));
                    }
                }
                Err(e) => {
                    retries += 1;
                    if retries >= MAX_RETRIES {
                        return Err(AidaError::Ocr(format!(
                            "API request failed after {MAX_RETRIES} retries: {e}"
                        )));
                    }
                    let delay = Duration::from_millis(100 * (2_u64.pow(retries)));
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

#[async_trait]
impl VisionOcr for OpenAiVisionClient {
    async fn extract_text(&self, image_bytes: &[u8]) -> Result<String> {
        let request = self.build_request(image_bytes);
        self.make_request(&request).await
    }
}

/// MIME type for the data URL, from magic bytes.
fn sniff_mime(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        "image/png"
    } else {
        // JPEG and anything unrecognised
        "image/jpeg"
    }
}
