use std::time::Duration;

use async_trait::async_trait;
use leptess::LepTess;

use crate::config::OcrConfig;
use crate::error::{AidaError, Result};

use super::preprocess_image;

/// Local OCR engine. `languages` is a Tesseract language spec such as `fra+eng`.
#[async_trait]
pub trait LocalOcr: Send + Sync {
    async fn recognize(&self, image_bytes: &[u8], languages: &str) -> Result<String>;
}

/// Tesseract via leptess. A fresh engine is created per call because the
/// fallback policy switches language packs between attempts.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    config: OcrConfig,
}

impl TesseractOcr {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Whether the primary language pack can be loaded on this machine.
    pub fn is_available(&self) -> bool {
        LepTess::new(None, &self.config.languages).is_ok()
    }
}

#[async_trait]
impl LocalOcr for TesseractOcr {
    async fn recognize(&self, image_bytes: &[u8], languages: &str) -> Result<String> {
        let processed = preprocess_image(image_bytes, &self.config)?;
        let languages = languages.to_string();

        let task = tokio::task::spawn_blocking(move || {
            let mut lt = LepTess::new(None, &languages).map_err(|e| {
                AidaError::OcrUnavailable(format!("Tesseract ({languages}) not available: {e}"))
            })?;
            lt.set_image_from_mem(&processed)
                .map_err(|e| AidaError::Ocr(format!("Failed to set image: {e}")))?;
            lt.get_utf8_text()
                .map_err(|e| AidaError::Ocr(format!("Failed to extract text: {e}")))
        });

        let timeout_duration = Duration::from_secs(self.config.timeout_secs);
        let text = match tokio::time::timeout(timeout_duration, task).await {
            Ok(joined) => joined.map_err(|e| AidaError::Ocr(format!("OCR task panicked: {e}")))??,
            Err(_) => {
                return Err(AidaError::Ocr(format!(
                    "OCR operation timed out after {} seconds",
                    self.config.timeout_secs
                )))
            }
        };

        Ok(text.trim().to_string())
    }
}
