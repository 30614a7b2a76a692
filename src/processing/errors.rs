//! Pipeline-level error taxonomy.
//!
//! Capability errors (embedding, index, language model) never leave the service unwrapped: each
//! operation folds them into the one [`ServiceError`] kind that names the failing operation while
//! keeping the underlying error reachable through [`std::error::Error::source`].

use thiserror::Error;

/// Boxed capability error carried as a source.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors reported by [`crate::processing::SearchService`].
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Embedding failed or returned a mismatched batch while indexing.
    #[error("{message}")]
    Embedding {
        /// Human readable summary.
        message: String,
        /// Underlying capability error.
        #[source]
        source: BoxError,
    },
    /// The index rejected a write.
    #[error("{message}")]
    Indexing {
        /// Human readable summary.
        message: String,
        /// Underlying capability error.
        #[source]
        source: BoxError,
    },
    /// Semantic search failed while embedding the query or searching.
    #[error("{message}")]
    SemanticSearch {
        /// Human readable summary.
        message: String,
        /// Underlying capability error.
        #[source]
        source: BoxError,
    },
    /// Any step of conversational search failed.
    #[error("{message}")]
    ConversationalSearch {
        /// Human readable summary.
        message: String,
        /// Underlying capability error.
        #[source]
        source: BoxError,
    },
    /// Similarity lookup failed.
    #[error("{message}")]
    SimilaritySearch {
        /// Human readable summary.
        message: String,
        /// Underlying capability error.
        #[source]
        source: BoxError,
    },
}

/// Discriminant of [`ServiceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// See [`ServiceError::Embedding`].
    Embedding,
    /// See [`ServiceError::Indexing`].
    Indexing,
    /// See [`ServiceError::SemanticSearch`].
    SemanticSearch,
    /// See [`ServiceError::ConversationalSearch`].
    ConversationalSearch,
    /// See [`ServiceError::SimilaritySearch`].
    SimilaritySearch,
}

impl ServiceError {
    pub(crate) fn embedding(source: impl Into<BoxError>) -> Self {
        Self::Embedding {
            message: "Failed to index documents. Check if the embedder is configured correctly."
                .into(),
            source: source.into(),
        }
    }

    pub(crate) fn indexing(source: impl Into<BoxError>) -> Self {
        Self::Indexing {
            message: "Failed to write records to the index.".into(),
            source: source.into(),
        }
    }

    pub(crate) fn semantic_search(source: impl Into<BoxError>) -> Self {
        Self::SemanticSearch {
            message: "Semantic search failed.".into(),
            source: source.into(),
        }
    }

    pub(crate) fn conversational_search(source: impl Into<BoxError>) -> Self {
        Self::ConversationalSearch {
            message: "Conversational search failed.".into(),
            source: source.into(),
        }
    }

    pub(crate) fn similarity_search(source: impl Into<BoxError>) -> Self {
        Self::SimilaritySearch {
            message: "Similar search failed.".into(),
            source: source.into(),
        }
    }

    /// Which operation failed.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Embedding { .. } => ErrorKind::Embedding,
            Self::Indexing { .. } => ErrorKind::Indexing,
            Self::SemanticSearch { .. } => ErrorKind::SemanticSearch,
            Self::ConversationalSearch { .. } => ErrorKind::ConversationalSearch,
            Self::SimilaritySearch { .. } => ErrorKind::SimilaritySearch,
        }
    }

    /// Stable machine-readable code exposed to HTTP clients.
    pub fn code(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Embedding => "embedding_failed",
            ErrorKind::Indexing => "indexing_failed",
            ErrorKind::SemanticSearch => "semantic_search_failed",
            ErrorKind::ConversationalSearch => "conversational_search_failed",
            ErrorKind::SimilaritySearch => "similar_search_failed",
        }
    }

    /// Summary message without the source chain.
    pub fn message(&self) -> &str {
        match self {
            Self::Embedding { message, .. }
            | Self::Indexing { message, .. }
            | Self::SemanticSearch { message, .. }
            | Self::ConversationalSearch { message, .. }
            | Self::SimilaritySearch { message, .. } => message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::EmbeddingClientError;
    use std::error::Error as _;

    #[test]
    fn codes_are_distinct_per_kind() {
        let errors = [
            ServiceError::embedding("a"),
            ServiceError::indexing("b"),
            ServiceError::semantic_search("c"),
            ServiceError::conversational_search("d"),
            ServiceError::similarity_search("e"),
        ];
        let mut codes: Vec<_> = errors.iter().map(ServiceError::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn source_chain_is_preserved() {
        let error = ServiceError::semantic_search(EmbeddingClientError::GenerationFailed(
            "model offline".into(),
        ));
        assert_eq!(error.kind(), ErrorKind::SemanticSearch);
        let source = error.source().expect("source");
        assert!(source.to_string().contains("model offline"));
        assert!(source.downcast_ref::<EmbeddingClientError>().is_some());
    }
}
