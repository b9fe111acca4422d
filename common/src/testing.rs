//! Scripted stand-ins for the store and the oracles, shared by the pipeline tests.

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    error::AppError,
    storage::{
        store::{ContentStore, StoreSession},
        types::content_document::ContentDocument,
    },
    utils::{embedding::EmbeddingOracle, llm::GenerationOracle},
};

/// What a scripted query answers with.
#[derive(Clone, Debug)]
pub enum Scripted {
    Docs(Vec<ContentDocument>),
    Fail(String),
    /// Sleeps this long, then answers with nothing.
    Stall(Duration),
}

impl Scripted {
    pub fn empty() -> Self {
        Self::Docs(Vec::new())
    }

    async fn resolve(&self, take: usize) -> Result<Vec<ContentDocument>, AppError> {
        match self {
            Self::Docs(docs) => Ok(docs.iter().take(take).cloned().collect()),
            Self::Fail(message) => Err(AppError::Validation(message.clone())),
            Self::Stall(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(Vec::new())
            }
        }
    }
}

pub fn docs(texts: &[&str]) -> Vec<ContentDocument> {
    texts
        .iter()
        .map(|text| ContentDocument::new((*text).to_string(), None))
        .collect()
}

/// In-process store. Vector and full-text answers are scripted; pattern and
/// sample queries run against `corpus`.
pub struct ScriptedStore {
    pub vector: Scripted,
    pub text: Scripted,
    pub corpus: Vec<ContentDocument>,
    pub connect_error: Option<String>,
    calls: Arc<Mutex<Vec<String>>>,
    closes: Arc<AtomicUsize>,
}

impl ScriptedStore {
    pub fn new(corpus: Vec<ContentDocument>) -> Self {
        Self {
            vector: Scripted::Fail("vector index 'vector_index' is not defined".into()),
            text: Scripted::Fail("no full-text index".into()),
            corpus,
            connect_error: None,
            calls: Arc::new(Mutex::new(Vec::new())),
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_vector(mut self, vector: Scripted) -> Self {
        self.vector = vector;
        self
    }

    pub fn with_text(mut self, text: Scripted) -> Self {
        self.text = text;
        self
    }

    pub fn unreachable(mut self, message: &str) -> Self {
        self.connect_error = Some(message.to_string());
        self
    }

    /// Queries issued so far, e.g. `["vector", "text:foo", "pattern:foo|bar"]`.
    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentStore for ScriptedStore {
    async fn connect(&self) -> Result<Box<dyn StoreSession>, AppError> {
        if let Some(message) = &self.connect_error {
            return Err(AppError::StoreUnavailable(message.clone()));
        }
        Ok(Box::new(ScriptedSession {
            vector: self.vector.clone(),
            text: self.text.clone(),
            corpus: self.corpus.clone(),
            calls: Arc::clone(&self.calls),
            closes: Arc::clone(&self.closes),
        }))
    }
}

struct ScriptedSession {
    vector: Scripted,
    text: Scripted,
    corpus: Vec<ContentDocument>,
    calls: Arc<Mutex<Vec<String>>>,
    closes: Arc<AtomicUsize>,
}

impl ScriptedSession {
    async fn record(&self, call: String) {
        self.calls.lock().await.push(call);
    }
}

#[async_trait]
impl StoreSession for ScriptedSession {
    async fn vector_search(
        &self,
        _index: &str,
        _embedding: &[f32],
        take: usize,
        _candidates: usize,
    ) -> Result<Vec<ContentDocument>, AppError> {
        self.record("vector".into()).await;
        self.vector.resolve(take).await
    }

    async fn text_search(
        &self,
        terms: &str,
        take: usize,
    ) -> Result<Vec<ContentDocument>, AppError> {
        self.record(format!("text:{terms}")).await;
        self.text.resolve(take).await
    }

    async fn pattern_search(
        &self,
        pattern: &str,
        take: usize,
    ) -> Result<Vec<ContentDocument>, AppError> {
        self.record(format!("pattern:{pattern}")).await;
        let alternatives: Vec<String> = pattern.split('|').map(str::to_lowercase).collect();
        Ok(self
            .corpus
            .iter()
            .filter(|doc| {
                let text = doc.text.to_lowercase();
                alternatives.iter().any(|alt| text.contains(alt.as_str()))
            })
            .take(take)
            .cloned()
            .collect())
    }

    async fn sample(&self, take: usize) -> Result<Vec<ContentDocument>, AppError> {
        self.record("sample".into()).await;
        Ok(self.corpus.iter().take(take).cloned().collect())
    }

    async fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Embedder returning a fixed vector, or failing every call.
pub struct StaticEmbedder {
    vector: Result<Vec<f32>, String>,
    calls: AtomicUsize,
}

impl StaticEmbedder {
    pub fn new(vector: Vec<f32>) -> Self {
        Self {
            vector: Ok(vector),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            vector: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingOracle for StaticEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.vector.clone().map_err(AppError::Oracle)
    }
}

/// One recorded generation call.
#[derive(Clone, Debug)]
pub struct GenerationCall {
    pub persona: String,
    pub messages: Vec<String>,
    pub temperature: f32,
}

impl GenerationCall {
    pub fn prompt(&self) -> String {
        self.messages.join("\n")
    }
}

/// Generator that answers with queued replies, then `"reply {n}"`.
pub struct ScriptedGenerator {
    replies: Mutex<Vec<Result<String, String>>>,
    calls: Mutex<Vec<GenerationCall>>,
}

impl ScriptedGenerator {
    pub fn new(replies: Vec<Result<String, String>>) -> Self {
        Self {
            replies: Mutex::new(replies),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn echoing() -> Self {
        Self::new(Vec::new())
    }

    pub async fn calls(&self) -> Vec<GenerationCall> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl GenerationOracle for ScriptedGenerator {
    async fn generate(
        &self,
        persona: &str,
        messages: &[String],
        temperature: f32,
    ) -> Result<String, AppError> {
        let mut calls = self.calls.lock().await;
        calls.push(GenerationCall {
            persona: persona.to_string(),
            messages: messages.to_vec(),
            temperature,
        });
        let call_number = calls.len();
        drop(calls);

        let mut replies = self.replies.lock().await;
        if replies.is_empty() {
            Ok(format!("reply {call_number}"))
        } else {
            replies.remove(0).map_err(AppError::Oracle)
        }
    }
}
