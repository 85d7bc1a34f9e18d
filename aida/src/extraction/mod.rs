//! LLM-driven field extraction.
//!
//! Every operation is fail-soft: it returns an [`Extraction`] that always
//! carries a usable value, and records why when that value is a fallback.

mod extractor;
pub mod prompts;

pub use extractor::{normalize_category, truncate_chars, StructuredExtractor};

/// Result of one extraction operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction<T> {
    /// The service answered and the answer parsed.
    Extracted(T),
    /// The call or the parse failed; `fallback` is the defined default.
    Failed { reason: String, fallback: T },
}

impl<T> Extraction<T> {
    pub fn failed(reason: impl Into<String>, fallback: T) -> Self {
        Self::Failed {
            reason: reason.into(),
            fallback,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            Self::Extracted(_) => None,
            Self::Failed { reason, .. } => Some(reason),
        }
    }

    pub fn value(&self) -> &T {
        match self {
            Self::Extracted(value) => value,
            Self::Failed { fallback, .. } => fallback,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Self::Extracted(value) => value,
            Self::Failed { fallback, .. } => fallback,
        }
    }
}
