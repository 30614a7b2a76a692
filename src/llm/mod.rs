//! Language model capability used by conversational search.
//!
//! Providers only implement [`CompletionClient`] (prompt in, text out). [`PromptedLanguageModel`]
//! renders the keyword and summary prompts on top of any completion client and is what the
//! pipeline consumes through [`LanguageModel`].

mod ollama;
mod openai;
pub mod prompts;

pub use ollama::OllamaCompletion;
pub use openai::OpenAiCompletion;

use crate::config::{Config, LlmProvider};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by completion providers.
#[derive(Debug, Error)]
pub enum LlmClientError {
    /// Provider could not be reached or constructed.
    #[error("Language model provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// Provider returned an error response.
    #[error("Failed to generate completion: {0}")]
    GenerationFailed(String),
    /// Provider response could not be parsed.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

/// Failures of the two language model operations.
#[derive(Debug, Error)]
pub enum LanguageModelError {
    /// Keyword extraction failed.
    #[error("Keyword extraction failed")]
    KeywordExtraction(#[source] LlmClientError),
    /// Summarization failed.
    #[error("Summarization failed")]
    Summarization(#[source] LlmClientError),
}

/// Raw text completion provider.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Generate a completion for `prompt`.
    async fn complete(&self, prompt: String) -> Result<String, LlmClientError>;
}

/// Operations the query orchestrator needs from a language model.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Reduce `query` to a comma-separated, punctuation-free list of entities and topics.
    async fn extract_keywords(&self, query: &str) -> Result<String, LanguageModelError>;

    /// Answer `query` using only `hits` as context.
    async fn summarize(&self, query: &str, hits: &[Value]) -> Result<String, LanguageModelError>;
}

/// [`LanguageModel`] built from a completion client and the prompt templates in [`prompts`].
pub struct PromptedLanguageModel<C> {
    client: C,
}

impl<C: CompletionClient> PromptedLanguageModel<C> {
    /// Wrap `client`.
    pub const fn new(client: C) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: CompletionClient> LanguageModel for PromptedLanguageModel<C> {
    async fn extract_keywords(&self, query: &str) -> Result<String, LanguageModelError> {
        let raw = self
            .client
            .complete(prompts::keyword_prompt(query))
            .await
            .map_err(LanguageModelError::KeywordExtraction)?;
        let keywords = prompts::clean_keywords(&raw);
        if keywords.is_empty() {
            return Err(LanguageModelError::KeywordExtraction(
                LlmClientError::InvalidResponse("model returned no keywords".into()),
            ));
        }
        Ok(keywords)
    }

    async fn summarize(&self, query: &str, hits: &[Value]) -> Result<String, LanguageModelError> {
        self.client
            .complete(prompts::summary_prompt(query, hits))
            .await
            .map_err(LanguageModelError::Summarization)
    }
}

/// Build the language model selected by configuration.
pub fn build_language_model(config: &Config) -> Result<Arc<dyn LanguageModel>, LlmClientError> {
    tracing::debug!(
        provider = ?config.llm_provider,
        model = %config.llm_model,
        "Building language model client"
    );
    let model: Arc<dyn LanguageModel> = match config.llm_provider {
        LlmProvider::Ollama => Arc::new(PromptedLanguageModel::new(OllamaCompletion::new(
            &config.ollama_url,
            &config.llm_model,
            config.request_timeout,
        )?)),
        LlmProvider::OpenAI => Arc::new(PromptedLanguageModel::new(OpenAiCompletion::new(
            config.openai_api_key.as_deref().unwrap_or_default(),
            &config.openai_base_url,
            &config.llm_model,
            config.request_timeout,
        )?)),
    };
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct ScriptedClient {
        reply: Result<String, String>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedClient {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: Err("offline".to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        async fn complete(&self, prompt: String) -> Result<String, LlmClientError> {
            self.prompts.lock().unwrap().push(prompt);
            self.reply
                .clone()
                .map_err(LlmClientError::ProviderUnavailable)
        }
    }

    #[tokio::test]
    async fn keywords_are_cleaned() {
        let model = PromptedLanguageModel::new(ScriptedClient::replying("AI, technology."));
        let keywords = model.extract_keywords("What is AI?").await.expect("keywords");
        assert_eq!(keywords, "AI, technology");

        let prompts = model.client.prompts.lock().unwrap();
        assert!(prompts[0].contains("Query: What is AI?"));
    }

    #[tokio::test]
    async fn blank_keyword_reply_is_an_extraction_error() {
        let model = PromptedLanguageModel::new(ScriptedClient::replying("..."));
        let error = model.extract_keywords("?").await.unwrap_err();
        assert!(matches!(error, LanguageModelError::KeywordExtraction(_)));
    }

    #[tokio::test]
    async fn summarize_failure_is_tagged() {
        let model = PromptedLanguageModel::new(ScriptedClient::failing());
        let error = model.summarize("q", &[]).await.unwrap_err();
        assert!(matches!(
            error,
            LanguageModelError::Summarization(LlmClientError::ProviderUnavailable(_))
        ));
    }
}
