use std::path::Path;

use crate::error::{AidaError, Result};
use crate::models::FileType;

/// Plain text and lightweight metadata produced by a format adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedContent {
    pub text: String,
    pub page_count: u32,
    pub file_type: FileType,
}

/// The closed set of input formats, selected from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Image,
}

impl DocumentFormat {
    /// Case-insensitive; accepts the extension with or without the leading dot.
    pub fn from_extension(extension: &str) -> Option<Self> {
        let extension = extension.trim_start_matches('.').to_lowercase();
        match extension.as_str() {
            "pdf" => Some(Self::Pdf),
            // Legacy binary .doc files are routed here too and fail in the parser.
            "docx" | "doc" => Some(Self::Docx),
            "jpg" | "jpeg" | "png" => Some(Self::Image),
            _ => None,
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let extension = path
            .as_ref()
            .extension()
            .map(|ext| ext.to_string_lossy().to_string())
            .unwrap_or_default();

        Self::from_extension(&extension).ok_or_else(|| {
            if extension.is_empty() {
                AidaError::UnsupportedFormat("(none)".to_string())
            } else {
                AidaError::UnsupportedFormat(format!(".{}", extension.to_lowercase()))
            }
        })
    }

    pub fn file_type(&self) -> FileType {
        match self {
            Self::Pdf => FileType::Pdf,
            Self::Docx => FileType::Docx,
            Self::Image => FileType::Image,
        }
    }
}

pub const SUPPORTED_EXTENSIONS: &[&str] = &[".pdf", ".docx", ".doc", ".jpg", ".jpeg", ".png"];

pub mod docx;
pub mod image;
pub mod pdf;

pub use docx::DocxExtractor;
pub use image::{ImageExtractor, ImageText, TextSource};
pub use pdf::PdfExtractor;
