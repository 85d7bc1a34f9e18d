use serde::{Deserialize, Serialize};

use super::ProcessedDocument;
use crate::error::AidaError;

/// Flagged error record returned when a document could not be processed at all.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FailedDocument {
    pub error: bool,
    pub message: String,
    pub file_name: String,
}

impl FailedDocument {
    pub fn new(file_name: impl Into<String>, error: &AidaError) -> Self {
        Self {
            error: true,
            message: error.to_string(),
            file_name: file_name.into(),
        }
    }
}

/// Caller-facing shape of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum AnalysisResult {
    Failed(FailedDocument),
    Processed(ProcessedDocument),
}

impl AnalysisResult {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn file_name(&self) -> &str {
        match self {
            Self::Failed(failed) => &failed.file_name,
            Self::Processed(document) => &document.metadata.file_name,
        }
    }
}
