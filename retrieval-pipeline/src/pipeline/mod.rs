mod config;
mod strategies;

pub use config::{RetrievalConfig, RetrievalTuning};
pub use strategies::{
    default_cascade, AttemptContext, BoxedStrategy, FullTextStrategy, KeywordPatternStrategy,
    RetrievalStrategy, SampleStrategy, SingleKeywordStrategy, StrategyKind, VectorStrategy,
};

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use common::{
    error::AppError,
    query::Query,
    storage::{
        store::{ContentStore, SessionGuard, StoreSession},
        types::content_document::ContentDocument,
    },
    utils::{duration_millis, embedding::EmbeddingOracle},
};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::keywords::extract_keywords;

/// Failure of a single strategy attempt. Absorbed by the engine, never returned.
#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("store query failed: {0}")]
    Store(#[from] AppError),
    #[error("store query timed out after {0:?}")]
    TimedOut(Duration),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Hit(usize),
    Empty,
    Failed(String),
    Skipped,
}

#[derive(Debug, Clone)]
pub struct StrategyAttempt {
    pub kind: StrategyKind,
    pub outcome: AttemptOutcome,
    pub elapsed: Duration,
}

/// Documents produced by the first strategy that found anything.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    documents: Vec<ContentDocument>,
    strategy: Option<StrategyKind>,
    attempts: Vec<StrategyAttempt>,
}

impl CandidateSet {
    /// A set produced outside the cascade, with no attempt trace.
    pub fn from_documents(
        strategy: StrategyKind,
        mut documents: Vec<ContentDocument>,
        take: usize,
    ) -> Self {
        documents.truncate(take);
        Self {
            documents,
            strategy: Some(strategy),
            attempts: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn documents(&self) -> &[ContentDocument] {
        &self.documents
    }

    /// The strategy that produced the documents, `None` when nothing was found.
    pub fn strategy(&self) -> Option<StrategyKind> {
        self.strategy
    }

    /// Every strategy considered, in cascade order.
    pub fn attempts(&self) -> &[StrategyAttempt] {
        &self.attempts
    }
}

pub struct RetrievalEngine {
    store: Arc<dyn ContentStore>,
    embedder: Arc<dyn EmbeddingOracle>,
    config: RetrievalConfig,
    cascade: Vec<BoxedStrategy>,
}

impl RetrievalEngine {
    pub fn new(
        store: Arc<dyn ContentStore>,
        embedder: Arc<dyn EmbeddingOracle>,
        config: RetrievalConfig,
    ) -> Self {
        Self::with_cascade(store, embedder, config, default_cascade())
    }

    pub fn with_cascade(
        store: Arc<dyn ContentStore>,
        embedder: Arc<dyn EmbeddingOracle>,
        config: RetrievalConfig,
        cascade: Vec<BoxedStrategy>,
    ) -> Self {
        Self {
            store,
            embedder,
            config,
            cascade,
        }
    }

    /// Finds the best available candidates for `query`.
    ///
    /// An empty set is a normal outcome. Fails with `StoreUnavailable` when no
    /// session can be opened and with `Oracle` when the query cannot be embedded.
    /// The session is closed once it has been opened, including when this
    /// future is dropped before completing.
    #[instrument(skip_all, fields(query_chars = query.char_count()))]
    pub async fn retrieve(&self, query: &Query) -> Result<CandidateSet, AppError> {
        let guard = self.open_session().await?;
        let outcome = self.run_cascade(guard.session(), query).await;
        guard.release().await;
        outcome
    }

    async fn open_session(&self) -> Result<SessionGuard, AppError> {
        let limit = self.config.tuning.store_timeout();
        match tokio::time::timeout(limit, self.store.connect()).await {
            Ok(Ok(session)) => Ok(SessionGuard::new(session)),
            Ok(Err(err @ AppError::StoreUnavailable(_))) => Err(err),
            Ok(Err(other)) => Err(AppError::StoreUnavailable(other.to_string())),
            Err(_) => Err(AppError::StoreUnavailable(format!(
                "connecting timed out after {limit:?}"
            ))),
        }
    }

    async fn embed_query(&self, query: &Query) -> Result<Vec<f32>, AppError> {
        let limit = self.config.tuning.oracle_timeout();
        let embedding = tokio::time::timeout(limit, self.embedder.embed(query.as_str()))
            .await
            .map_err(|_| AppError::Oracle(format!("embedding timed out after {limit:?}")))??;
        debug!(dimensions = embedding.len(), "Generated query embedding");
        Ok(embedding)
    }

    async fn run_cascade(
        &self,
        session: &dyn StoreSession,
        query: &Query,
    ) -> Result<CandidateSet, AppError> {
        let embedding = self.embed_query(query).await?;
        let keywords = extract_keywords(query.as_str());
        info!(
            preview = %query.preview(120),
            keywords = ?keywords,
            "Starting retrieval cascade"
        );

        let ctx = AttemptContext {
            query,
            embedding: &embedding,
            keywords: &keywords,
            vector_index: &self.config.vector_index,
            tuning: &self.config.tuning,
            session,
        };

        let mut attempts = Vec::with_capacity(self.cascade.len());
        for strategy in &self.cascade {
            let kind = strategy.kind();
            if !strategy.applies(&ctx) {
                debug!(strategy = %kind, "Strategy not applicable; skipping");
                attempts.push(StrategyAttempt {
                    kind,
                    outcome: AttemptOutcome::Skipped,
                    elapsed: Duration::ZERO,
                });
                continue;
            }

            let started = Instant::now();
            let result = strategy.attempt(&ctx).await;
            let elapsed = started.elapsed();

            match result {
                Ok(mut documents) if !documents.is_empty() => {
                    documents.truncate(self.config.tuning.take);
                    attempts.push(StrategyAttempt {
                        kind,
                        outcome: AttemptOutcome::Hit(documents.len()),
                        elapsed,
                    });
                    info!(
                        strategy = %kind,
                        candidates = documents.len(),
                        elapsed_ms = duration_millis(elapsed),
                        first_preview = %documents.first().map(|doc| doc.preview(100)).unwrap_or_default(),
                        "Retrieval strategy produced candidates"
                    );
                    return Ok(CandidateSet {
                        documents,
                        strategy: Some(kind),
                        attempts,
                    });
                }
                Ok(_) => {
                    debug!(strategy = %kind, "Retrieval strategy found nothing");
                    attempts.push(StrategyAttempt {
                        kind,
                        outcome: AttemptOutcome::Empty,
                        elapsed,
                    });
                }
                Err(err) => {
                    warn!(strategy = %kind, error = %err, "Retrieval strategy failed; falling through");
                    attempts.push(StrategyAttempt {
                        kind,
                        outcome: AttemptOutcome::Failed(err.to_string()),
                        elapsed,
                    });
                }
            }
        }

        info!("Retrieval cascade exhausted without candidates");
        Ok(CandidateSet {
            documents: Vec::new(),
            strategy: None,
            attempts,
        })
    }
}

#[cfg(test)]
mod tests;
