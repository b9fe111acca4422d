use common::{error::AppError, query::Query};
use retrieval_pipeline::RetrievalEngine;
use synthesis_pipeline::{Answer, ResponseSynthesizer};
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    Answered(Answer),
    /// Retrieval found nothing; no answer was generated.
    NoResults,
}

/// Validates a query, retrieves candidates and synthesizes the answer.
pub struct QueryHandler {
    retrieval: RetrievalEngine,
    synthesis: ResponseSynthesizer,
}

impl QueryHandler {
    pub fn new(retrieval: RetrievalEngine, synthesis: ResponseSynthesizer) -> Self {
        Self {
            retrieval,
            synthesis,
        }
    }

    #[instrument(skip_all)]
    pub async fn handle(&self, raw_query: &str) -> Result<QueryOutcome, AppError> {
        let query = Query::parse(raw_query)?;

        let candidates = self.retrieval.retrieve(&query).await?;
        if candidates.is_empty() {
            info!(query_chars = query.char_count(), "No results found for query");
            return Ok(QueryOutcome::NoResults);
        }

        info!(
            strategy = ?candidates.strategy(),
            candidates = candidates.len(),
            "Synthesizing answer"
        );
        let answer = self.synthesis.synthesize(&query, &candidates).await?;
        Ok(QueryOutcome::Answered(answer))
    }
}
