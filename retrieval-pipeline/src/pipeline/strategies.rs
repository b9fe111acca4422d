use std::{fmt, future::Future, time::Duration};

use async_trait::async_trait;
use common::{
    error::AppError,
    query::Query,
    storage::{store::StoreSession, types::content_document::ContentDocument},
};

use super::{config::RetrievalTuning, StrategyError};
use crate::keywords::keyword_pattern;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    Vector,
    FullText,
    KeywordPattern,
    SingleKeyword,
    Sample,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StrategyKind::Vector => "vector",
            StrategyKind::FullText => "full_text",
            StrategyKind::KeywordPattern => "keyword_pattern",
            StrategyKind::SingleKeyword => "single_keyword",
            StrategyKind::Sample => "sample",
        };
        f.write_str(label)
    }
}

/// Everything a strategy may look at while making one attempt.
pub struct AttemptContext<'a> {
    pub query: &'a Query,
    pub embedding: &'a [f32],
    pub keywords: &'a [String],
    pub vector_index: &'a str,
    pub tuning: &'a RetrievalTuning,
    pub session: &'a dyn StoreSession,
}

impl AttemptContext<'_> {
    /// Runs one store call under the store timeout.
    async fn bounded<F>(&self, call: F) -> Result<Vec<ContentDocument>, StrategyError>
    where
        F: Future<Output = Result<Vec<ContentDocument>, AppError>> + Send,
    {
        let limit: Duration = self.tuning.store_timeout();
        match tokio::time::timeout(limit, call).await {
            Ok(result) => result.map_err(StrategyError::from),
            Err(_) => Err(StrategyError::TimedOut(limit)),
        }
    }
}

#[async_trait]
pub trait RetrievalStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Whether the strategy has anything to work with for this query.
    fn applies(&self, _ctx: &AttemptContext<'_>) -> bool {
        true
    }

    async fn attempt(&self, ctx: &AttemptContext<'_>) -> Result<Vec<ContentDocument>, StrategyError>;
}

pub type BoxedStrategy = Box<dyn RetrievalStrategy>;

/// The cascade, strongest first. The order is a relevance ranking and must not change.
pub fn default_cascade() -> Vec<BoxedStrategy> {
    vec![
        Box::new(VectorStrategy),
        Box::new(FullTextStrategy),
        Box::new(KeywordPatternStrategy),
        Box::new(SingleKeywordStrategy),
        Box::new(SampleStrategy),
    ]
}

pub struct VectorStrategy;

#[async_trait]
impl RetrievalStrategy for VectorStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Vector
    }

    async fn attempt(&self, ctx: &AttemptContext<'_>) -> Result<Vec<ContentDocument>, StrategyError> {
        ctx.bounded(ctx.session.vector_search(
            ctx.vector_index,
            ctx.embedding,
            ctx.tuning.take,
            ctx.tuning.vector_candidates,
        ))
        .await
    }
}

pub struct FullTextStrategy;

#[async_trait]
impl RetrievalStrategy for FullTextStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::FullText
    }

    async fn attempt(&self, ctx: &AttemptContext<'_>) -> Result<Vec<ContentDocument>, StrategyError> {
        ctx.bounded(ctx.session.text_search(ctx.query.as_str(), ctx.tuning.take))
            .await
    }
}

pub struct KeywordPatternStrategy;

#[async_trait]
impl RetrievalStrategy for KeywordPatternStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::KeywordPattern
    }

    fn applies(&self, ctx: &AttemptContext<'_>) -> bool {
        !ctx.keywords.is_empty()
    }

    async fn attempt(&self, ctx: &AttemptContext<'_>) -> Result<Vec<ContentDocument>, StrategyError> {
        let Some(pattern) = keyword_pattern(ctx.keywords) else {
            return Ok(Vec::new());
        };
        ctx.bounded(ctx.session.pattern_search(&pattern, ctx.tuning.take))
            .await
    }
}

pub struct SingleKeywordStrategy;

#[async_trait]
impl RetrievalStrategy for SingleKeywordStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::SingleKeyword
    }

    fn applies(&self, ctx: &AttemptContext<'_>) -> bool {
        !ctx.keywords.is_empty()
    }

    async fn attempt(&self, ctx: &AttemptContext<'_>) -> Result<Vec<ContentDocument>, StrategyError> {
        let Some(first) = ctx.keywords.first() else {
            return Ok(Vec::new());
        };
        ctx.bounded(ctx.session.pattern_search(first, ctx.tuning.take))
            .await
    }
}

/// Last resort for degenerate queries: any documents at all.
pub struct SampleStrategy;

#[async_trait]
impl RetrievalStrategy for SampleStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Sample
    }

    fn applies(&self, ctx: &AttemptContext<'_>) -> bool {
        ctx.keywords.is_empty()
    }

    async fn attempt(&self, ctx: &AttemptContext<'_>) -> Result<Vec<ContentDocument>, StrategyError> {
        ctx.bounded(ctx.session.sample(ctx.tuning.take)).await
    }
}
