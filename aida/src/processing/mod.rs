mod language;
mod pipeline;

pub mod extractors;

pub use language::{detect_language, french_marker_count, Language};
pub use pipeline::{
    DocumentPipeline, ExtractionField, FieldFailure, ProcessingOutcome, MIN_TEXT_CHARS,
};
