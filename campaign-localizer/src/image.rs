use std::time::Duration;

use async_trait::async_trait;
use common::error::AppError;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Turns a prompt into an image URL. `Ok(None)` means the backend produced no image.
#[async_trait]
pub trait ImageOracle: Send + Sync {
    async fn generate_image(&self, prompt: &str) -> Result<Option<String>, AppError>;
}

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiImageClient {
    http: reqwest::Client,
    api_base: String,
    model: String,
    api_key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [RequestContent<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(alias = "inlineData")]
    inline_data: Option<InlineData>,
}

#[derive(Deserialize)]
struct InlineData {
    #[serde(alias = "mimeType")]
    mime_type: Option<String>,
    data: Option<String>,
}

impl GeminiImageClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        Self::with_api_base(GEMINI_API_BASE, api_key, model, timeout)
    }

    pub fn with_api_base(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let http = reqwest::ClientBuilder::new().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_base: api_base.into(),
            model: model.into(),
            api_key: api_key.into(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl ImageOracle for GeminiImageClient {
    async fn generate_image(&self, prompt: &str) -> Result<Option<String>, AppError> {
        let text = format!("Generate an image: {prompt}");
        let request = GenerateRequest {
            contents: [RequestContent {
                parts: [RequestPart { text: &text }],
            }],
            generation_config: GenerationConfig {
                temperature: 1.0,
                top_p: 0.95,
                top_k: 40,
                max_output_tokens: 8192,
            },
        };

        let response = self
            .http
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Oracle(format!(
                "image generation returned {status}: {body}"
            )));
        }

        let parsed: GenerateResponse = response.json().await?;
        let image = first_inline_image(parsed);
        if image.is_none() {
            warn!(model = %self.model, "No image data found in generation response");
        } else {
            debug!(model = %self.model, "Image generated");
        }
        Ok(image)
    }
}

fn first_inline_image(response: GenerateResponse) -> Option<String> {
    let candidate = response.candidates.into_iter().next()?;
    candidate
        .content?
        .parts
        .into_iter()
        .filter_map(|part| part.inline_data)
        .find_map(|inline| {
            let data = inline.data?;
            let mime = inline.mime_type.unwrap_or_else(|| "image/png".to_string());
            Some(format!("data:{mime};base64,{data}"))
        })
}
