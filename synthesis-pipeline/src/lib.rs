pub mod pipeline;
pub mod prompts;

pub use pipeline::{Answer, ResponseSynthesizer, SynthesisConfig};
