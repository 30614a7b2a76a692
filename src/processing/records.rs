//! Turning chunked, embedded documents into index records.

use super::types::Document;
use crate::embedding::EmbeddingClientError;
use crate::index::VectorRecord;

/// Identifier of the `position`-th chunk of `document_id`.
pub fn record_id(document_id: &str, position: usize) -> String {
    format!("{document_id}::{position}")
}

/// Pair chunks with their embeddings positionally.
///
/// The embedder must have returned exactly one vector per chunk; anything else is rejected
/// instead of being truncated or padded.
pub(crate) fn zip_records(
    document: &Document,
    chunks: Vec<String>,
    embeddings: Vec<Vec<f32>>,
) -> Result<Vec<VectorRecord>, EmbeddingClientError> {
    if chunks.len() != embeddings.len() {
        return Err(EmbeddingClientError::CountMismatch {
            expected: chunks.len(),
            actual: embeddings.len(),
        });
    }

    Ok(chunks
        .into_iter()
        .zip(embeddings)
        .enumerate()
        .map(|(position, (chunk, vector))| VectorRecord {
            id: record_id(&document.id, position),
            vector,
            chunk,
            url: document.url.clone(),
        })
        .collect())
}
