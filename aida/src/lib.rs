//! Structured extraction from medical documents.
//!
//! PDF, DOCX and image files are reduced to plain text by format adapters
//! (images through local OCR with a vision-model fallback), the prompting
//! language is detected once, and four fail-soft LLM calls fill in patient
//! identity, measurements, a category and a summary.

pub mod api;
pub mod config;
pub mod error;
pub mod extraction;
pub mod llm;
pub mod models;
pub mod ocr;
pub mod processing;

pub use error::{AidaError, Result};
