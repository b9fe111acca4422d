use common::{error::AppError, query::Query, utils::llm::GenerationOracle};
use tracing::error;

use super::config::SynthesisConfig;

/// Per-request record accumulated as the stages run.
pub struct SynthesisContext<'a> {
    pub query: &'a Query,
    pub context_text: String,
    pub config: &'a SynthesisConfig,
    pub oracle: &'a dyn GenerationOracle,
    pub draft: Option<String>,
    pub critique: Option<String>,
}

impl<'a> SynthesisContext<'a> {
    pub fn new(
        query: &'a Query,
        context_text: String,
        config: &'a SynthesisConfig,
        oracle: &'a dyn GenerationOracle,
    ) -> Self {
        Self {
            query,
            context_text,
            config,
            oracle,
            draft: None,
            critique: None,
        }
    }

    pub fn draft(&self) -> Result<&str, AppError> {
        self.draft
            .as_deref()
            .ok_or_else(|| AppError::InternalError("draft expected to be available".into()))
    }

    pub fn critique(&self) -> Result<&str, AppError> {
        self.critique
            .as_deref()
            .ok_or_else(|| AppError::InternalError("critique expected to be available".into()))
    }

    pub fn abort(&self, stage: &str, err: AppError) -> AppError {
        error!(
            stage,
            query_chars = self.query.char_count(),
            error = %err,
            "synthesis pipeline aborted"
        );
        err
    }
}
