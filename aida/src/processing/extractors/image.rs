use std::sync::Arc;

use super::ExtractedContent;
use crate::config::OcrConfig;
use crate::error::AidaError;
use crate::models::FileType;
use crate::ocr::{LocalOcr, VisionOcr};

/// Which stage produced the text of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSource {
    Local,
    Vision,
    /// Nothing usable from either stage.
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageText {
    pub text: String,
    pub source: TextSource,
}

/// Two-stage OCR: free local Tesseract first, the vision service only when
/// the local output is too short to trust.
///
/// 1. Local OCR with the combined language pack; below `retry_threshold`
///    characters, a second local attempt with the fallback pack.
/// 2. Local output longer than `accept_threshold` characters is final.
/// 3. Otherwise (or on local error) the vision service is called once.
/// 4. If that fails too, whatever local text exists is returned, possibly empty.
#[derive(Clone)]
pub struct ImageExtractor {
    local: Arc<dyn LocalOcr>,
    vision: Option<Arc<dyn VisionOcr>>,
    languages: String,
    fallback_languages: String,
    retry_threshold: usize,
    accept_threshold: usize,
}

impl ImageExtractor {
    pub fn new(
        local: Arc<dyn LocalOcr>,
        vision: Option<Arc<dyn VisionOcr>>,
        config: &OcrConfig,
    ) -> Self {
        Self {
            local,
            vision,
            languages: config.languages.clone(),
            fallback_languages: config.fallback_languages.clone(),
            retry_threshold: config.retry_threshold,
            accept_threshold: config.accept_threshold,
        }
    }

    pub fn has_vision_fallback(&self) -> bool {
        self.vision.is_some()
    }

    /// Images are always a single page. Never fails: a degenerate scan yields
    /// empty text and the caller's length check decides.
    pub async fn extract(&self, bytes: &[u8]) -> ExtractedContent {
        let recognized = self.recognize(bytes).await;

        ExtractedContent {
            text: recognized.text,
            page_count: 1,
            file_type: FileType::Image,
        }
    }

    pub async fn recognize(&self, bytes: &[u8]) -> ImageText {
        let local_text = self.run_local(bytes).await;
        let local_len = local_text.as_deref().map(char_len).unwrap_or(0);

        if local_len > self.accept_threshold {
            tracing::debug!(chars = local_len, "Local OCR accepted");
            return ImageText {
                text: local_text.unwrap_or_default(),
                source: TextSource::Local,
            };
        }

        let Some(vision) = &self.vision else {
            tracing::debug!(
                chars = local_len,
                "Local OCR below threshold and no vision fallback configured"
            );
            return Self::local_only(local_text);
        };

        tracing::debug!(chars = local_len, "Escalating image to vision OCR");
        match vision.extract_text(bytes).await {
            Ok(text) if char_len(&text) > local_len => ImageText {
                text: text.trim().to_string(),
                source: TextSource::Vision,
            },
            Ok(text) => {
                tracing::warn!(
                    vision_chars = char_len(&text),
                    local_chars = local_len,
                    "Vision OCR did not improve on local OCR"
                );
                Self::local_only(local_text)
            }
            Err(error) => {
                tracing::warn!(error = %error, "Vision OCR failed");
                Self::local_only(local_text)
            }
        }
    }

    async fn run_local(&self, bytes: &[u8]) -> Option<String> {
        match self.local.recognize(bytes, &self.languages).await {
            Ok(text) if char_len(&text) < self.retry_threshold => {
                tracing::debug!(
                    chars = char_len(&text),
                    languages = %self.fallback_languages,
                    "Local OCR output short, retrying with fallback language pack"
                );
                match self.local.recognize(bytes, &self.fallback_languages).await {
                    Ok(retry) if char_len(&retry) > char_len(&text) => Some(retry),
                    Ok(_) => Some(text),
                    Err(error) => {
                        tracing::debug!(error = %error, "Fallback language pack failed");
                        Some(text)
                    }
                }
            }
            Ok(text) => Some(text),
            Err(AidaError::OcrUnavailable(reason)) => {
                // The combined pack may simply not be installed.
                tracing::warn!(%reason, "Primary OCR language pack unavailable");
                self.local
                    .recognize(bytes, &self.fallback_languages)
                    .await
                    .map_err(|error| tracing::warn!(error = %error, "Local OCR failed"))
                    .ok()
            }
            Err(error) => {
                tracing::warn!(error = %error, "Local OCR failed");
                None
            }
        }
    }

    fn local_only(local_text: Option<String>) -> ImageText {
        match local_text.filter(|text| !text.trim().is_empty()) {
            Some(text) => ImageText {
                text,
                source: TextSource::Local,
            },
            None => ImageText {
                text: String::new(),
                source: TextSource::Empty,
            },
        }
    }
}

fn char_len(text: &str) -> usize {
    text.trim().chars().count()
}
