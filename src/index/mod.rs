//! Vector index capability and its Meilisearch adapter.

mod identifier;
mod meilisearch;
mod types;

use async_trait::async_trait;

pub use identifier::{MAX_KEY_BYTES, RESERVED_SUFFIX_BYTES, sanitize_identifier, sanitize_record_id};
pub use meilisearch::{MeilisearchIndex, SEMANTIC_RATIO};
pub use types::{IndexError, RecordId, SearchResult, VectorRecord};

/// Store that holds embedded chunks and answers hybrid and similarity queries.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Persist a batch of records. Records become searchable eventually, not necessarily on return.
    async fn add_records(&self, records: Vec<VectorRecord>) -> Result<(), IndexError>;

    /// Rank records against both the query text and its embedding.
    async fn hybrid_search(
        &self,
        query: &str,
        vector: Vec<f32>,
        limit: usize,
    ) -> Result<SearchResult, IndexError>;

    /// Find records whose stored embeddings are closest to the record identified by `id`.
    async fn similarity_search(&self, id: &RecordId, limit: usize)
    -> Result<SearchResult, IndexError>;
}
