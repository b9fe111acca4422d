mod config;
mod context;
mod stages;
mod state;

pub use config::SynthesisConfig;

use std::{fmt, sync::Arc, time::Instant};

use common::{
    error::AppError, query::Query, storage::types::content_document::join_document_text,
    utils::{duration_millis, llm::GenerationOracle},
};
use retrieval_pipeline::CandidateSet;
use tracing::{info, instrument};

use self::{
    context::SynthesisContext,
    stages::{critique, draft, revise},
    state::ready,
};

/// The revised, persona-voiced reply to a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer(String);

impl Answer {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub struct ResponseSynthesizer {
    oracle: Arc<dyn GenerationOracle>,
    config: SynthesisConfig,
}

impl ResponseSynthesizer {
    pub fn new(oracle: Arc<dyn GenerationOracle>, config: SynthesisConfig) -> Self {
        Self { oracle, config }
    }

    /// Runs draft, critique and revise over the candidates. Any oracle failure aborts.
    #[instrument(skip_all, fields(query_chars = query.char_count(), candidates = candidates.len()))]
    pub async fn synthesize(
        &self,
        query: &Query,
        candidates: &CandidateSet,
    ) -> Result<Answer, AppError> {
        if candidates.is_empty() {
            return Err(AppError::InternalError(
                "synthesis requires at least one candidate document".into(),
            ));
        }

        let context_text = join_document_text(candidates.documents());
        let mut ctx = SynthesisContext::new(
            query,
            context_text,
            &self.config,
            self.oracle.as_ref(),
        );

        let machine = ready();
        let pipeline_started = Instant::now();

        let stage_start = Instant::now();
        let machine = draft(machine, &mut ctx)
            .await
            .map_err(|err| ctx.abort("draft", err))?;
        let draft_duration = stage_start.elapsed();

        let stage_start = Instant::now();
        let machine = critique(machine, &mut ctx)
            .await
            .map_err(|err| ctx.abort("critique", err))?;
        let critique_duration = stage_start.elapsed();

        let stage_start = Instant::now();
        let (_machine, text) = revise(machine, &mut ctx)
            .await
            .map_err(|err| ctx.abort("revise", err))?;
        let revise_duration = stage_start.elapsed();

        info!(
            total_ms = duration_millis(pipeline_started.elapsed()),
            draft_ms = duration_millis(draft_duration),
            critique_ms = duration_millis(critique_duration),
            revise_ms = duration_millis(revise_duration),
            answer_chars = text.chars().count(),
            "synthesis pipeline finished"
        );

        Ok(Answer(text))
    }
}

#[cfg(test)]
mod tests;
