//! Embedding capability and its provider adapters.
//!
//! The pipeline only sees [`Embedder`]. Adapters for Ollama and OpenAI-compatible endpoints
//! issue HTTP requests directly; [`HashEmbedder`] produces deterministic vectors without any
//! network access.

mod hash;
mod ollama;
mod openai;

pub use hash::HashEmbedder;
pub use ollama::OllamaEmbedder;
pub use openai::OpenAiEmbedder;

use crate::config::{Config, EmbeddingProvider};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by embedding providers.
#[derive(Debug, Error)]
pub enum EmbeddingClientError {
    /// Provider could not be reached or constructed.
    #[error("Embedding provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// Provider was unable to produce embeddings for the supplied input.
    #[error("Failed to generate embeddings: {0}")]
    GenerationFailed(String),
    /// Provider response could not be decoded.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
    /// Provider returned a different number of vectors than inputs.
    #[error("Embedding provider returned {actual} vectors for {expected} inputs")]
    CountMismatch {
        /// Number of inputs submitted.
        expected: usize,
        /// Number of vectors returned.
        actual: usize,
    },
    /// Returned embedding dimension does not match configuration.
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension configured for the index.
        expected: usize,
        /// Dimension produced by the provider.
        actual: usize,
    },
}

/// Interface implemented by embedding backends.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Produce one embedding per input text, preserving order.
    async fn embed_documents(
        &self,
        texts: Vec<String>,
    ) -> Result<Vec<Vec<f32>>, EmbeddingClientError>;

    /// Produce a single embedding for a search query.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingClientError> {
        let vectors = self.embed_documents(vec![text.to_string()]).await?;
        match <[Vec<f32>; 1]>::try_from(vectors) {
            Ok([vector]) => Ok(vector),
            Err(vectors) => Err(EmbeddingClientError::CountMismatch {
                expected: 1,
                actual: vectors.len(),
            }),
        }
    }
}

/// Build the embedding adapter selected by configuration.
pub fn build_embedder(config: &Config) -> Result<Arc<dyn Embedder>, EmbeddingClientError> {
    tracing::debug!(
        provider = ?config.embedding_provider,
        model = %config.embedding_model,
        dimension = config.embedding_dimension,
        "Building embedding client"
    );
    let embedder: Arc<dyn Embedder> = match config.embedding_provider {
        EmbeddingProvider::Ollama => Arc::new(OllamaEmbedder::new(
            &config.ollama_url,
            &config.embedding_model,
            config.embedding_dimension,
            config.request_timeout,
        )?),
        EmbeddingProvider::OpenAI => Arc::new(OpenAiEmbedder::new(
            config.openai_api_key.as_deref().unwrap_or_default(),
            &config.openai_base_url,
            &config.embedding_model,
            config.embedding_dimension,
            config.request_timeout,
        )?),
        EmbeddingProvider::Hash => Arc::new(HashEmbedder::new(config.embedding_dimension)),
    };
    Ok(embedder)
}

/// Verify that a provider returned one vector per input with the configured dimension.
pub(crate) fn validate_batch(
    inputs: usize,
    dimension: usize,
    vectors: Vec<Vec<f32>>,
) -> Result<Vec<Vec<f32>>, EmbeddingClientError> {
    if vectors.len() != inputs {
        return Err(EmbeddingClientError::CountMismatch {
            expected: inputs,
            actual: vectors.len(),
        });
    }
    if let Some(vector) = vectors.iter().find(|vector| vector.len() != dimension) {
        return Err(EmbeddingClientError::DimensionMismatch {
            expected: dimension,
            actual: vector.len(),
        });
    }
    Ok(vectors)
}
