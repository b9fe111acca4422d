use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::storage::db::SurrealConnectionParams;

#[derive(Clone, Copy, Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    #[default]
    OpenAI,
    Hashed,
}

#[derive(Clone, Deserialize, Debug)]
pub struct AppConfig {
    pub openai_api_key: String,
    #[serde(default = "default_base_url")]
    pub openai_base_url: String,
    pub surrealdb_address: String,
    pub surrealdb_username: String,
    pub surrealdb_password: String,
    pub surrealdb_namespace: String,
    pub surrealdb_database: String,
    #[serde(default = "default_content_table")]
    pub content_table: String,
    #[serde(default = "default_vector_index")]
    pub vector_index: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    #[serde(default)]
    pub embedding_backend: EmbeddingBackend,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default)]
    pub embedding_dimensions: Option<u32>,
    #[serde(default = "default_generation_model")]
    pub generation_model: String,
    #[serde(default = "default_persona_name")]
    pub persona_name: String,
    #[serde(default = "default_draft_temperature")]
    pub draft_temperature: f32,
    #[serde(default = "default_critique_temperature")]
    pub critique_temperature: f32,
    #[serde(default = "default_oracle_timeout_secs")]
    pub oracle_timeout_secs: u64,
    #[serde(default = "default_store_timeout_secs")]
    pub store_timeout_secs: u64,
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
    #[serde(default)]
    pub image_api_key: Option<String>,
    #[serde(default = "default_image_model")]
    pub image_model: String,
    #[serde(default)]
    pub ensure_indexes: bool,
}

impl AppConfig {
    pub fn surreal_params(&self) -> SurrealConnectionParams {
        SurrealConnectionParams {
            address: self.surrealdb_address.clone(),
            username: self.surrealdb_username.clone(),
            password: self.surrealdb_password.clone(),
            namespace: self.surrealdb_namespace.clone(),
            database: self.surrealdb_database.clone(),
        }
    }

    /// Vector width used when the backend cannot report one itself.
    pub fn embedding_dimension_or_default(&self) -> usize {
        self.embedding_dimensions.map_or(DEFAULT_EMBEDDING_DIMENSION, |d| d as usize)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            openai_api_key: String::new(),
            openai_base_url: default_base_url(),
            surrealdb_address: "mem://".to_string(),
            surrealdb_username: "root".to_string(),
            surrealdb_password: "root".to_string(),
            surrealdb_namespace: "persona".to_string(),
            surrealdb_database: "persona".to_string(),
            content_table: default_content_table(),
            vector_index: default_vector_index(),
            http_port: default_http_port(),
            embedding_backend: EmbeddingBackend::default(),
            embedding_model: default_embedding_model(),
            embedding_dimensions: None,
            generation_model: default_generation_model(),
            persona_name: default_persona_name(),
            draft_temperature: default_draft_temperature(),
            critique_temperature: default_critique_temperature(),
            oracle_timeout_secs: default_oracle_timeout_secs(),
            store_timeout_secs: default_store_timeout_secs(),
            allowed_origins: default_allowed_origins(),
            image_api_key: None,
            image_model: default_image_model(),
            ensure_indexes: false,
        }
    }
}

/// Width of `text-embedding-ada-002` vectors.
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 1536;

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_content_table() -> String {
    "content".to_string()
}

fn default_vector_index() -> String {
    "vector_index".to_string()
}

const fn default_http_port() -> u16 {
    3001
}

fn default_embedding_model() -> String {
    "text-embedding-ada-002".to_string()
}

fn default_generation_model() -> String {
    "gpt-4".to_string()
}

fn default_persona_name() -> String {
    "Ross M.G.".to_string()
}

const fn default_draft_temperature() -> f32 {
    0.7
}

const fn default_critique_temperature() -> f32 {
    0.3
}

const fn default_oracle_timeout_secs() -> u64 {
    60
}

const fn default_store_timeout_secs() -> u64 {
    10
}

fn default_allowed_origins() -> Vec<String> {
    [
        "http://localhost:3000",
        "https://localhost:3000",
        "https://ai.rossmguthrie.com",
        "http://ai.rossmguthrie.com",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

fn default_image_model() -> String {
    "gemini-2.5-flash-image".to_string()
}

pub fn get_config() -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(
            Environment::default()
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("allowed_origins"),
        )
        .build()?;

    config.try_deserialize()
}
