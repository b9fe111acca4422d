use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use common::{
    error::AppError,
    query::Query,
    testing::{docs, ScriptedGenerator},
    utils::llm::GenerationOracle,
};
use retrieval_pipeline::{CandidateSet, StrategyKind};

use super::{ResponseSynthesizer, SynthesisConfig};
use crate::prompts::REVISE_INSTRUCTION;

fn candidates() -> CandidateSet {
    CandidateSet::from_documents(
        StrategyKind::Vector,
        docs(&[
            "The biggest challenge was migrating billing without downtime.",
            "We ran both systems in parallel for six weeks.",
        ]),
        3,
    )
}

fn query() -> Query {
    Query::parse("What was your biggest challenge?").expect("valid query")
}

fn synthesizer(oracle: Arc<dyn GenerationOracle>) -> ResponseSynthesizer {
    ResponseSynthesizer::new(oracle, SynthesisConfig::default())
}

#[tokio::test]
async fn runs_exactly_three_stages_and_returns_the_revision() {
    let oracle = Arc::new(ScriptedGenerator::new(vec![
        Ok("DRAFT TEXT".into()),
        Ok("CRITIQUE TEXT".into()),
        Ok("FINAL TEXT".into()),
    ]));
    let answer = synthesizer(Arc::clone(&oracle) as Arc<dyn GenerationOracle>)
        .synthesize(&query(), &candidates())
        .await
        .expect("synthesis succeeds");

    assert_eq!(answer.as_str(), "FINAL TEXT");

    let calls = oracle.calls().await;
    assert_eq!(calls.len(), 3);

    let revise_prompt = calls[2].prompt();
    assert!(revise_prompt.contains("DRAFT TEXT"));
    assert!(revise_prompt.contains("CRITIQUE TEXT"));
    assert!(revise_prompt.ends_with(REVISE_INSTRUCTION));
}

#[tokio::test]
async fn stages_use_configured_temperatures_and_persona() {
    let oracle = Arc::new(ScriptedGenerator::echoing());
    synthesizer(Arc::clone(&oracle) as Arc<dyn GenerationOracle>)
        .synthesize(&query(), &candidates())
        .await
        .expect("synthesis succeeds");

    let calls = oracle.calls().await;
    let temperatures: Vec<f32> = calls.iter().map(|call| call.temperature).collect();
    assert_eq!(temperatures, vec![0.7, 0.3, 0.7]);

    assert!(calls[0].persona.starts_with("You are Ross M.G."));
    assert!(calls[1].persona.starts_with("You are a critical editor"));
    assert!(calls[2].persona.starts_with("You are Ross M.G. Revise"));
}

#[tokio::test]
async fn context_is_joined_with_blank_lines() {
    let oracle = Arc::new(ScriptedGenerator::echoing());
    synthesizer(Arc::clone(&oracle) as Arc<dyn GenerationOracle>)
        .synthesize(&query(), &candidates())
        .await
        .expect("synthesis succeeds");

    let calls = oracle.calls().await;
    let draft_prompt = calls[0].prompt();
    assert!(draft_prompt.contains(
        "without downtime.\n\nWe ran both systems in parallel for six weeks."
    ));
    assert!(draft_prompt.ends_with("Question: What was your biggest challenge?"));
    assert!(calls[1].prompt().contains("Draft response: reply 1"));
}

#[tokio::test]
async fn oracle_failure_in_critique_stops_the_pipeline() {
    let oracle = Arc::new(ScriptedGenerator::new(vec![
        Ok("draft".into()),
        Err("model overloaded".into()),
    ]));
    let err = synthesizer(Arc::clone(&oracle) as Arc<dyn GenerationOracle>)
        .synthesize(&query(), &candidates())
        .await
        .expect_err("critique failure must propagate");

    assert!(matches!(err, AppError::Oracle(ref msg) if msg.contains("overloaded")));
    assert_eq!(oracle.calls().await.len(), 2, "revise must not run");
}

#[tokio::test]
async fn blank_completion_is_an_oracle_error() {
    let oracle = Arc::new(ScriptedGenerator::new(vec![Ok("  \n".into())]));
    let err = synthesizer(Arc::clone(&oracle) as Arc<dyn GenerationOracle>)
        .synthesize(&query(), &candidates())
        .await
        .expect_err("blank draft must be rejected");

    assert!(matches!(err, AppError::Oracle(ref msg) if msg.contains("draft")));
    assert_eq!(oracle.calls().await.len(), 1);
}

#[tokio::test]
async fn empty_candidate_set_is_rejected_without_oracle_calls() {
    let oracle = Arc::new(ScriptedGenerator::echoing());
    let err = synthesizer(Arc::clone(&oracle) as Arc<dyn GenerationOracle>)
        .synthesize(&query(), &CandidateSet::default())
        .await
        .expect_err("empty set is a caller bug");

    assert!(matches!(err, AppError::InternalError(_)));
    assert!(oracle.calls().await.is_empty());
}

struct StallingGenerator;

#[async_trait]
impl GenerationOracle for StallingGenerator {
    async fn generate(
        &self,
        _persona: &str,
        _messages: &[String],
        _temperature: f32,
    ) -> Result<String, AppError> {
        tokio::time::sleep(Duration::from_millis(200)).await;
        Ok("too late".into())
    }
}

#[tokio::test]
async fn stage_timeout_is_an_oracle_error() {
    let config = SynthesisConfig {
        oracle_timeout_secs: 0,
        ..SynthesisConfig::default()
    };
    let err = ResponseSynthesizer::new(Arc::new(StallingGenerator), config)
        .synthesize(&query(), &candidates())
        .await
        .expect_err("stalled stage must time out");

    assert!(matches!(err, AppError::Oracle(ref msg) if msg.contains("timed out")));
}
