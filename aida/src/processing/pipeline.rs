use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use futures::stream::{self, StreamExt};
use serde::Serialize;

use crate::config::Config;
use crate::error::{AidaError, Result};
use crate::extraction::{Extraction, StructuredExtractor};
use crate::llm::{LlmProvider, TextGeneration};
use crate::models::{AnalysisResult, DocumentMetadata, FailedDocument, ProcessedDocument};
use crate::ocr::{OpenAiVisionClient, TesseractOcr, VisionOcr};

use super::extractors::{
    DocumentFormat, DocxExtractor, ExtractedContent, ImageExtractor, PdfExtractor,
};
use super::language::{detect_language, Language};

/// Extracted text shorter than this (after trimming) is rejected before any
/// extraction call.
pub const MIN_TEXT_CHARS: usize = 10;

/// Documents analysed at once by [`DocumentPipeline::analyze_many`].
const BATCH_CONCURRENCY: usize = 4;

const CREATION_DATE_FORMAT: &str = "%d/%m/%Y";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionField {
    PatientInfo,
    MedicalValues,
    Category,
    Summary,
}

impl std::fmt::Display for ExtractionField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::PatientInfo => "patient_info",
            Self::MedicalValues => "medical_values",
            Self::Category => "category",
            Self::Summary => "summary",
        })
    }
}

/// One extraction operation that fell back to its default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldFailure {
    pub field: ExtractionField,
    pub reason: String,
}

/// A processed document plus what the caller-facing record cannot show: the
/// language that was used for prompting and which fields are fallbacks.
#[derive(Debug, Clone)]
pub struct ProcessingOutcome {
    pub document: ProcessedDocument,
    pub language: Language,
    pub failures: Vec<FieldFailure>,
}

impl ProcessingOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// File in, [`ProcessedDocument`] out.
///
/// Stateless between documents: one pipeline can serve any number of
/// concurrent requests.
#[derive(Clone)]
pub struct DocumentPipeline {
    extractor: StructuredExtractor,
    images: ImageExtractor,
}

impl DocumentPipeline {
    pub fn new(extractor: StructuredExtractor, images: ImageExtractor) -> Self {
        Self { extractor, images }
    }

    /// Wire the production backends: the configured LLM, local Tesseract and,
    /// when an API key is present, the vision fallback.
    pub fn from_config(config: &Config) -> Self {
        let llm = LlmProvider::new(Some(&config.llm));
        if llm.is_available() {
            tracing::info!(model = %config.llm.model, "LLM provider ready");
        } else {
            tracing::warn!(
                model = %config.llm.model,
                "LLM provider unavailable, extracted fields will fall back to defaults"
            );
        }

        Self::with_llm(config, Arc::new(llm))
    }

    /// Production OCR backends around a caller-supplied text-generation service.
    pub fn with_llm(config: &Config, llm: Arc<dyn TextGeneration>) -> Self {
        let local = TesseractOcr::new(&config.ocr);
        if !local.is_available() {
            tracing::warn!(
                languages = %config.ocr.languages,
                "Tesseract could not be initialized, local OCR will fail"
            );
        }

        let vision: Option<Arc<dyn VisionOcr>> = match OpenAiVisionClient::new(&config.ocr) {
            Ok(client) => {
                tracing::info!(model = %client.model(), "Vision OCR fallback enabled");
                Some(Arc::new(client))
            }
            Err(error) => {
                tracing::info!(reason = %error, "Vision OCR fallback disabled");
                None
            }
        };

        Self::new(
            StructuredExtractor::new(llm, config.extraction.clone()),
            ImageExtractor::new(Arc::new(local), vision, &config.ocr),
        )
    }

    pub fn has_vision_fallback(&self) -> bool {
        self.images.has_vision_fallback()
    }

    pub async fn process(&self, path: impl AsRef<Path>) -> Result<ProcessingOutcome> {
        let path = path.as_ref();

        match tokio::fs::metadata(path).await {
            Ok(metadata) if metadata.is_file() => {}
            Ok(_) => return Err(AidaError::FileNotFound(path.to_path_buf())),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Err(AidaError::FileNotFound(path.to_path_buf()))
            }
            Err(error) => return Err(error.into()),
        }

        let format = DocumentFormat::from_path(path)?;
        let bytes = tokio::fs::read(path).await?;

        self.run(display_name(path), format, bytes).await
    }

    /// Same as [`process`](Self::process) for content that is already in
    /// memory, such as an upload. `file_name` selects the format.
    pub async fn process_bytes(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<ProcessingOutcome> {
        let format = DocumentFormat::from_path(file_name)?;
        self.run(display_name(Path::new(file_name)), format, bytes)
            .await
    }

    /// Never fails: pipeline-fatal errors become a flagged error record.
    pub async fn analyze_document(&self, path: impl AsRef<Path>) -> AnalysisResult {
        let path = path.as_ref();
        let result = self.process(path).await;
        Self::into_analysis(display_name(path), result)
    }

    pub async fn analyze_bytes(&self, file_name: &str, bytes: Vec<u8>) -> AnalysisResult {
        let result = self.process_bytes(file_name, bytes).await;
        Self::into_analysis(display_name(Path::new(file_name)), result)
    }

    /// Results come back in input order.
    pub async fn analyze_many(&self, paths: &[PathBuf]) -> Vec<AnalysisResult> {
        stream::iter(paths)
            .map(|path| self.analyze_document(path))
            .buffered(BATCH_CONCURRENCY)
            .collect()
            .await
    }

    fn into_analysis(file_name: String, result: Result<ProcessingOutcome>) -> AnalysisResult {
        match result {
            Ok(outcome) => AnalysisResult::Processed(outcome.document),
            Err(error) => {
                tracing::warn!(
                    file_name = %file_name,
                    error = %error,
                    "Document could not be processed"
                );
                AnalysisResult::Failed(FailedDocument::new(file_name, &error))
            }
        }
    }

    async fn run(
        &self,
        file_name: String,
        format: DocumentFormat,
        bytes: Vec<u8>,
    ) -> Result<ProcessingOutcome> {
        tracing::info!(
            file_name = %file_name,
            format = ?format,
            size = bytes.len(),
            "Processing document"
        );

        let content = self.extract_text(format, bytes).await?;

        let chars = content.text.trim().chars().count();
        if chars < MIN_TEXT_CHARS {
            tracing::info!(file_name = %file_name, chars, "Too little text, skipping extraction");
            return Err(AidaError::InsufficientText);
        }

        let language = detect_language(&content.text);
        tracing::debug!(file_name = %file_name, chars, %language, "Text extracted");

        let text = content.text.as_str();
        let (patient_info, medical_values, category, summary) = tokio::join!(
            self.extractor.extract_patient_info(text, language),
            self.extractor.extract_medical_values(text, language),
            self.extractor.categorize_document(text, language),
            self.extractor.generate_summary(text, language),
        );

        let mut failures = Vec::new();
        let patient_info = collect(ExtractionField::PatientInfo, patient_info, &mut failures);
        let extracted_values =
            collect(ExtractionField::MedicalValues, medical_values, &mut failures);
        let category = collect(ExtractionField::Category, category, &mut failures);
        let summary = collect(ExtractionField::Summary, summary, &mut failures);

        tracing::info!(
            file_name = %file_name,
            %language,
            category = %category,
            values = extracted_values.len(),
            failed_fields = failures.len(),
            "Document processed"
        );

        let document = ProcessedDocument {
            metadata: DocumentMetadata {
                file_type: content.file_type,
                category,
                creation_date: Local::now().format(CREATION_DATE_FORMAT).to_string(),
                num_pages: content.page_count,
                file_name,
            },
            patient_info,
            extracted_values,
            summary,
            raw_text: content.text,
        };

        Ok(ProcessingOutcome {
            document,
            language,
            failures,
        })
    }

    async fn extract_text(
        &self,
        format: DocumentFormat,
        bytes: Vec<u8>,
    ) -> Result<ExtractedContent> {
        match format {
            // A panicking parser surfaces as a JoinError, not a crash.
            DocumentFormat::Pdf => {
                tokio::task::spawn_blocking(move || PdfExtractor::extract(&bytes))
                    .await
                    .map_err(|e| {
                        AidaError::Processing(format!("PDF extraction task failed: {e}"))
                    })?
            }
            DocumentFormat::Docx => {
                tokio::task::spawn_blocking(move || DocxExtractor::extract(&bytes))
                    .await
                    .map_err(|e| {
                        AidaError::Processing(format!("DOCX extraction task failed: {e}"))
                    })?
            }
            DocumentFormat::Image => Ok(self.images.extract(&bytes).await),
        }
    }
}

fn collect<T>(
    field: ExtractionField,
    extraction: Extraction<T>,
    failures: &mut Vec<FieldFailure>,
) -> T {
    if let Some(reason) = extraction.failure_reason() {
        failures.push(FieldFailure {
            field,
            reason: reason.to_string(),
        });
    }
    extraction.into_value()
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
