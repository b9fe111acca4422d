pub mod keywords;
pub mod pipeline;

pub use pipeline::{
    AttemptOutcome, CandidateSet, RetrievalConfig, RetrievalEngine, RetrievalStrategy,
    RetrievalTuning, StrategyAttempt, StrategyError, StrategyKind,
};
