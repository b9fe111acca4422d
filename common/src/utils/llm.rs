use std::sync::Arc;

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestUserMessage, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tracing::debug;

use crate::error::AppError;

/// Produces natural-language text for a persona and a sequence of user turns.
#[async_trait]
pub trait GenerationOracle: Send + Sync {
    async fn generate(
        &self,
        persona: &str,
        messages: &[String],
        temperature: f32,
    ) -> Result<String, AppError>;
}

/// Chat-completions backed generator.
#[derive(Clone)]
pub struct OpenAiGenerator {
    client: Arc<Client<OpenAIConfig>>,
    model: String,
}

impl OpenAiGenerator {
    pub fn new(client: Arc<Client<OpenAIConfig>>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl GenerationOracle for OpenAiGenerator {
    async fn generate(
        &self,
        persona: &str,
        messages: &[String],
        temperature: f32,
    ) -> Result<String, AppError> {
        let mut turns: Vec<ChatCompletionRequestMessage> = Vec::with_capacity(messages.len() + 1);
        turns.push(ChatCompletionRequestSystemMessage::from(persona).into());
        turns.extend(
            messages
                .iter()
                .map(|message| ChatCompletionRequestUserMessage::from(message.as_str()).into()),
        );

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(turns)
            .temperature(temperature)
            .build()
            .map_err(AppError::oracle)?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(AppError::oracle)?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AppError::Oracle("No content found in LLM response".into()))?;

        debug!(
            model = %self.model,
            temperature,
            output_chars = content.chars().count(),
            "Generation completed"
        );

        Ok(content)
    }
}
