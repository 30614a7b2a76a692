//! Request and result types flowing through the processing pipeline.

use crate::index::RecordId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A document submitted for indexing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Caller-assigned identifier; record ids derive from it.
    pub id: String,
    /// Full body text to chunk and embed.
    pub body: String,
    /// Optional source URL copied onto every record.
    #[serde(default)]
    pub url: Option<String>,
}

/// Query text plus the number of hits to return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// Raw query text.
    pub query: String,
    /// Maximum number of hits, always positive.
    pub limit: usize,
}

/// Lookup of records similar to an already indexed one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimilarityRequest {
    /// Identifier of the reference record.
    pub id: RecordId,
    /// Maximum number of hits, always positive.
    pub limit: usize,
}

/// Answer produced by conversational search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationalResult {
    /// Language model answer grounded in `sources`.
    pub summary: String,
    /// Hits the summary was generated from.
    pub sources: Vec<Value>,
}

/// Counts reported after an indexing batch is written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexingOutcome {
    /// Documents in the batch.
    pub documents: usize,
    /// Records submitted to the index.
    pub records: usize,
    /// Documents whose body produced no chunks.
    pub skipped_empty: usize,
}
