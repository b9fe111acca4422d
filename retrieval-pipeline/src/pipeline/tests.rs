use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use common::{
    error::AppError,
    query::Query,
    testing::{docs, Scripted, ScriptedStore, StaticEmbedder},
    utils::embedding::EmbeddingOracle,
};

use super::*;

const CORPUS: [&str; 4] = [
    "The biggest challenge was migrating the billing system without downtime.",
    "I led a team of six engineers across two time zones.",
    "Leadership means removing obstacles for the people doing the work.",
    "Side projects: a home weather station and a bread-baking log.",
];

fn engine(store: Arc<ScriptedStore>, embedder: Arc<dyn EmbeddingOracle>) -> RetrievalEngine {
    RetrievalEngine::new(store, embedder, RetrievalConfig::default())
}

fn embedder() -> Arc<StaticEmbedder> {
    Arc::new(StaticEmbedder::new(vec![0.1, 0.2, 0.3]))
}

fn query(raw: &str) -> Query {
    Query::parse(raw).expect("valid query")
}

#[tokio::test]
async fn vector_hit_stops_the_cascade() {
    let store = Arc::new(
        ScriptedStore::new(docs(&CORPUS))
            .with_vector(Scripted::Docs(docs(&["vector one", "vector two"]))),
    );
    let engine = engine(Arc::clone(&store), embedder());

    let set = engine
        .retrieve(&query("biggest challenge"))
        .await
        .expect("retrieval succeeds");

    assert_eq!(set.strategy(), Some(StrategyKind::Vector));
    assert_eq!(set.len(), 2);
    assert_eq!(set.documents()[0].text, "vector one");
    assert_eq!(store.calls().await, vec!["vector".to_string()]);
    assert_eq!(store.close_count(), 1);
}

#[tokio::test]
async fn results_are_capped_at_take() {
    let store = Arc::new(ScriptedStore::new(Vec::new()).with_vector(Scripted::Docs(docs(&[
        "a", "b", "c", "d", "e",
    ]))));
    let engine = engine(Arc::clone(&store), embedder());

    let set = engine
        .retrieve(&query("anything"))
        .await
        .expect("retrieval succeeds");

    assert_eq!(set.len(), 3);
}

#[tokio::test]
async fn empty_vector_result_falls_through_to_full_text() {
    let store = Arc::new(
        ScriptedStore::new(docs(&CORPUS))
            .with_vector(Scripted::empty())
            .with_text(Scripted::Docs(docs(&["full text match"]))),
    );
    let engine = engine(Arc::clone(&store), embedder());

    let set = engine
        .retrieve(&query("billing migration"))
        .await
        .expect("retrieval succeeds");

    assert_eq!(set.strategy(), Some(StrategyKind::FullText));
    assert_eq!(
        store.calls().await,
        vec!["vector".to_string(), "text:billing migration".to_string()]
    );
    assert_eq!(
        set.attempts()[0].outcome,
        AttemptOutcome::Empty,
        "an empty vector result is not a failure"
    );
}

#[tokio::test]
async fn failing_strategies_fall_through_to_keyword_pattern() {
    let store = Arc::new(ScriptedStore::new(docs(&CORPUS)));
    let engine = engine(Arc::clone(&store), embedder());

    let set = engine
        .retrieve(&query("tell me about your biggest challenge"))
        .await
        .expect("errors in strategies are absorbed");

    assert_eq!(set.strategy(), Some(StrategyKind::KeywordPattern));
    assert_eq!(set.len(), 1);
    assert!(set.documents()[0].text.contains("biggest challenge"));
    assert_eq!(
        store.calls().await,
        vec![
            "vector".to_string(),
            "text:tell me about your biggest challenge".to_string(),
            "pattern:biggest|challenge".to_string(),
        ]
    );
    assert!(matches!(set.attempts()[0].outcome, AttemptOutcome::Failed(_)));
    assert!(matches!(set.attempts()[1].outcome, AttemptOutcome::Failed(_)));
    assert_eq!(set.attempts()[2].outcome, AttemptOutcome::Hit(1));
    assert_eq!(store.close_count(), 1);
}

/// Pattern store whose alternation never matches, so only the single keyword can.
struct StrictPatternStore {
    inner: ScriptedStore,
}

#[async_trait]
impl ContentStore for StrictPatternStore {
    async fn connect(&self) -> Result<Box<dyn StoreSession>, AppError> {
        let inner = self.inner.connect().await?;
        Ok(Box::new(StrictPatternSession { inner }))
    }
}

struct StrictPatternSession {
    inner: Box<dyn StoreSession>,
}

#[async_trait]
impl StoreSession for StrictPatternSession {
    async fn vector_search(
        &self,
        index: &str,
        embedding: &[f32],
        take: usize,
        candidates: usize,
    ) -> Result<Vec<ContentDocument>, AppError> {
        self.inner
            .vector_search(index, embedding, take, candidates)
            .await
    }

    async fn text_search(
        &self,
        terms: &str,
        take: usize,
    ) -> Result<Vec<ContentDocument>, AppError> {
        self.inner.text_search(terms, take).await
    }

    async fn pattern_search(
        &self,
        pattern: &str,
        take: usize,
    ) -> Result<Vec<ContentDocument>, AppError> {
        let found = self.inner.pattern_search(pattern, take).await?;
        if pattern.contains('|') {
            return Ok(Vec::new());
        }
        Ok(found)
    }

    async fn sample(&self, take: usize) -> Result<Vec<ContentDocument>, AppError> {
        self.inner.sample(take).await
    }

    async fn close(&self) {
        self.inner.close().await;
    }
}

#[tokio::test]
async fn single_keyword_is_tried_after_the_pattern() {
    let store = Arc::new(StrictPatternStore {
        inner: ScriptedStore::new(docs(&CORPUS)).with_text(Scripted::empty()),
    });
    let engine = RetrievalEngine::new(
        Arc::clone(&store) as Arc<dyn ContentStore>,
        embedder(),
        RetrievalConfig::default(),
    );

    let set = engine
        .retrieve(&query("leadership philosophy"))
        .await
        .expect("retrieval succeeds");

    assert_eq!(set.strategy(), Some(StrategyKind::SingleKeyword));
    assert!(set.documents()[0].text.starts_with("Leadership"));
    assert_eq!(
        store.inner.calls().await,
        vec![
            "vector".to_string(),
            "text:leadership philosophy".to_string(),
            "pattern:leadership|philosophy".to_string(),
            "pattern:leadership".to_string(),
        ]
    );
    assert_eq!(store.inner.close_count(), 1);
}

#[tokio::test]
async fn stop_word_query_goes_straight_to_sample() {
    let store = Arc::new(ScriptedStore::new(docs(&CORPUS)));
    let engine = engine(Arc::clone(&store), embedder());

    let set = engine
        .retrieve(&query("tell me about you"))
        .await
        .expect("retrieval succeeds");

    assert_eq!(set.strategy(), Some(StrategyKind::Sample));
    assert_eq!(set.len(), 3);
    let calls = store.calls().await;
    assert_eq!(calls.last().map(String::as_str), Some("sample"));
    assert!(
        !calls.iter().any(|call| call.starts_with("pattern:")),
        "keyword strategies have nothing to match"
    );
    assert_eq!(set.attempts()[2].outcome, AttemptOutcome::Skipped);
    assert_eq!(set.attempts()[3].outcome, AttemptOutcome::Skipped);
}

#[tokio::test]
async fn unmatched_keywords_yield_an_empty_set_without_sampling() {
    let store = Arc::new(ScriptedStore::new(docs(&CORPUS)).with_text(Scripted::empty()));
    let engine = engine(Arc::clone(&store), embedder());

    let set = engine
        .retrieve(&query("quantum chromodynamics"))
        .await
        .expect("an empty result is not an error");

    assert!(set.is_empty());
    assert_eq!(set.strategy(), None);
    assert!(!store.calls().await.contains(&"sample".to_string()));
    assert_eq!(set.attempts().last().map(|a| a.kind), Some(StrategyKind::Sample));
    assert_eq!(store.close_count(), 1);
}

#[tokio::test]
async fn embedding_failure_is_fatal_and_still_closes_the_session() {
    let store = Arc::new(ScriptedStore::new(docs(&CORPUS)));
    let embedder = Arc::new(StaticEmbedder::failing("rate limited"));
    let engine = engine(Arc::clone(&store), Arc::clone(&embedder) as Arc<dyn EmbeddingOracle>);

    let err = engine
        .retrieve(&query("biggest challenge"))
        .await
        .expect_err("embedding failure must propagate");

    assert!(matches!(err, AppError::Oracle(ref msg) if msg.contains("rate limited")));
    assert_eq!(embedder.call_count(), 1);
    assert!(store.calls().await.is_empty(), "no strategy should run");
    assert_eq!(store.close_count(), 1);
}

struct StallingEmbedder;

#[async_trait]
impl EmbeddingOracle for StallingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, AppError> {
        tokio::time::sleep(Duration::from_millis(200)).await;
        Ok(vec![0.0; 3])
    }
}

#[tokio::test]
async fn embedding_timeout_surfaces_as_oracle_error() {
    let store = Arc::new(ScriptedStore::new(docs(&CORPUS)));
    let config = RetrievalConfig::new(
        "vector_index",
        RetrievalTuning {
            oracle_timeout_secs: 0,
            ..RetrievalTuning::default()
        },
    );
    let engine = RetrievalEngine::new(
        Arc::clone(&store) as Arc<dyn ContentStore>,
        Arc::new(StallingEmbedder),
        config,
    );

    let err = engine
        .retrieve(&query("biggest challenge"))
        .await
        .expect_err("stalled embedding must time out");

    assert!(matches!(err, AppError::Oracle(ref msg) if msg.contains("timed out")));
    assert_eq!(store.close_count(), 1);
}

#[tokio::test]
async fn unreachable_store_is_reported_without_embedding() {
    let store = Arc::new(ScriptedStore::new(Vec::new()).unreachable("connection refused"));
    let embedder = embedder();
    let engine = engine(Arc::clone(&store), Arc::clone(&embedder) as Arc<dyn EmbeddingOracle>);

    let err = engine
        .retrieve(&query("biggest challenge"))
        .await
        .expect_err("connect failure must propagate");

    assert!(matches!(err, AppError::StoreUnavailable(ref msg) if msg.contains("refused")));
    assert_eq!(embedder.call_count(), 0);
    assert_eq!(store.close_count(), 0, "nothing was opened, nothing to close");
}

#[tokio::test]
async fn stalled_strategy_times_out_and_falls_through() {
    let store = Arc::new(
        ScriptedStore::new(docs(&CORPUS))
            .with_vector(Scripted::Stall(Duration::from_secs(5)))
            .with_text(Scripted::Docs(docs(&["full text match"]))),
    );
    let config = RetrievalConfig::new(
        "vector_index",
        RetrievalTuning {
            store_timeout_secs: 1,
            ..RetrievalTuning::default()
        },
    );
    let engine = RetrievalEngine::new(
        Arc::clone(&store) as Arc<dyn ContentStore>,
        embedder(),
        config,
    );

    let set = engine
        .retrieve(&query("billing migration"))
        .await
        .expect("a timed out strategy is not fatal");

    assert_eq!(set.strategy(), Some(StrategyKind::FullText));
    let vector = set.attempts().first().expect("vector attempt recorded");
    assert_eq!(vector.kind, StrategyKind::Vector);
    assert!(
        matches!(vector.outcome, AttemptOutcome::Failed(ref msg) if msg.contains("timed out")),
        "unexpected outcome {:?}",
        vector.outcome
    );
    assert_eq!(store.close_count(), 1);
}

#[tokio::test]
async fn cancelled_retrieval_still_closes_the_session() {
    let store = Arc::new(
        ScriptedStore::new(docs(&CORPUS)).with_text(Scripted::Stall(Duration::from_secs(5))),
    );
    let engine = engine(Arc::clone(&store), embedder());

    let cancelled =
        tokio::time::timeout(Duration::from_millis(50), engine.retrieve(&query("leadership")))
            .await;
    assert!(cancelled.is_err(), "retrieval should still be stalled");

    for _ in 0..50 {
        if store.close_count() > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(store.close_count(), 1);
}
