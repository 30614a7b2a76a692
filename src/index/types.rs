//! Shared types used by the vector index capability and its adapters.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Errors returned while interacting with the vector index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Base URL failed to parse or normalize.
    #[error("Invalid index URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The index responded with an unexpected status code.
    #[error("Unexpected index response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the index.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// An asynchronous index task finished unsuccessfully.
    #[error("Index task {task_uid} failed: {reason}")]
    TaskFailed {
        /// Identifier of the failed task.
        task_uid: u64,
        /// Error reported by the index.
        reason: String,
    },
}

/// One embedded chunk ready to be written to the index.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRecord {
    /// `<document id>::<chunk position>`, sanitized by the adapter on write.
    pub id: String,
    /// Embedding vector produced for the chunk.
    pub vector: Vec<f32>,
    /// Raw chunk text.
    pub chunk: String,
    /// Source URL inherited from the parent document.
    pub url: Option<String>,
}

/// Identifier of a stored record, as accepted by similarity lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    /// Numeric primary key.
    Number(u64),
    /// String primary key.
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<u64> for RecordId {
    fn from(value: u64) -> Self {
        Self::Number(value)
    }
}

/// Search response returned by the index: the hit list plus every other response field as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Matching records in ranked order.
    #[serde(default)]
    pub hits: Vec<Value>,
    /// Remaining top-level response fields (`query`, `processingTimeMs`, `limit`, ...).
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}
