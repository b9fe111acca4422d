use std::time::Duration;

use common::utils::config::AppConfig;

#[derive(Debug, Clone)]
pub struct SynthesisConfig {
    /// Name the drafting and revising stages speak as.
    pub persona_name: String,
    pub draft_temperature: f32,
    pub critique_temperature: f32,
    pub oracle_timeout_secs: u64,
}

impl SynthesisConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            persona_name: config.persona_name.clone(),
            draft_temperature: config.draft_temperature,
            critique_temperature: config.critique_temperature,
            oracle_timeout_secs: config.oracle_timeout_secs,
        }
    }

    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_secs(self.oracle_timeout_secs)
    }
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self::from_app_config(&AppConfig::default())
    }
}
