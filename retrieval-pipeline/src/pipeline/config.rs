use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunable parameters for the retrieval cascade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalTuning {
    /// Upper bound on documents in any candidate set.
    pub take: usize,
    /// Candidate pool handed to the approximate nearest-neighbour search.
    pub vector_candidates: usize,
    pub store_timeout_secs: u64,
    pub oracle_timeout_secs: u64,
}

impl Default for RetrievalTuning {
    fn default() -> Self {
        Self {
            take: 3,
            vector_candidates: 10,
            store_timeout_secs: 10,
            oracle_timeout_secs: 60,
        }
    }
}

impl RetrievalTuning {
    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }

    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_secs(self.oracle_timeout_secs)
    }
}

#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Name of the vector index the similarity search must use.
    pub vector_index: String,
    pub tuning: RetrievalTuning,
}

impl RetrievalConfig {
    pub fn new(vector_index: impl Into<String>, tuning: RetrievalTuning) -> Self {
        Self {
            vector_index: vector_index.into(),
            tuning,
        }
    }

    pub fn from_app_config(config: &common::utils::config::AppConfig) -> Self {
        Self::new(
            config.vector_index.clone(),
            RetrievalTuning {
                store_timeout_secs: config.store_timeout_secs,
                oracle_timeout_secs: config.oracle_timeout_secs,
                ..RetrievalTuning::default()
            },
        )
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self::new("vector_index", RetrievalTuning::default())
    }
}
