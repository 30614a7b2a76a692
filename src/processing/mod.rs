//! Document processing pipeline: chunking, embedding, index writes and query orchestration.

pub mod chunking;
pub mod errors;
mod queue;
pub mod records;
mod service;
pub mod types;

pub use chunking::{ChunkingError, TextChunker};
pub use errors::{BoxError, ErrorKind, ServiceError};
pub use queue::{
    EnqueueError, IndexingQueue, IndexingReceiver, indexing_channel, spawn_indexing_worker,
};
pub use service::{SearchApi, SearchService};
pub use types::{ConversationalResult, Document, IndexingOutcome, SearchRequest, SimilarityRequest};
