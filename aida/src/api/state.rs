use std::sync::Arc;

use crate::config::Config;
use crate::llm::LlmProvider;
use crate::processing::DocumentPipeline;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Kept for health reporting; the pipeline owns its own handle.
    pub llm: LlmProvider,
    pub pipeline: DocumentPipeline,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let llm = LlmProvider::new(Some(&config.llm));
        if !llm.is_available() {
            tracing::warn!("LLM unavailable - extracted fields will fall back to defaults");
        }
        let pipeline = DocumentPipeline::with_llm(&config, Arc::new(llm.clone()));

        Self::from_parts(config, llm, pipeline)
    }

    pub fn from_parts(config: Config, llm: LlmProvider, pipeline: DocumentPipeline) -> Self {
        Self {
            config: Arc::new(config),
            llm,
            pipeline,
        }
    }
}
