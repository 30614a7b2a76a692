//! Search service coordinating chunking, embedding, index writes, and the three query modes.

use crate::{
    embedding::Embedder,
    index::{SearchResult, VectorIndex},
    llm::LanguageModel,
    metrics::{MetricsSnapshot, QueryMode, ServiceMetrics},
    processing::{
        chunking::TextChunker,
        errors::{BoxError, ServiceError},
        records::zip_records,
        types::{ConversationalResult, Document, IndexingOutcome, SearchRequest, SimilarityRequest},
    },
};
use async_trait::async_trait;
use std::sync::Arc;

/// Coordinates the indexing pipeline and query orchestration over injected capabilities.
///
/// Construct once near process start and share through an `Arc`; the HTTP handlers and the
/// indexing worker reuse the same instance.
pub struct SearchService {
    chunker: TextChunker,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    llm: Arc<dyn LanguageModel>,
    metrics: Arc<ServiceMetrics>,
}

/// Abstraction over the pipeline used by the HTTP surface and the indexing worker.
#[async_trait]
pub trait SearchApi: Send + Sync {
    /// Chunk, embed and write every document in one index call.
    async fn index_documents(
        &self,
        documents: Vec<Document>,
    ) -> Result<IndexingOutcome, ServiceError>;

    /// Hybrid search with the embedded query text.
    async fn semantic_search(&self, request: SearchRequest) -> Result<SearchResult, ServiceError>;

    /// Keyword reduction, hybrid search, then a summary grounded in the hits.
    async fn conversational_search(
        &self,
        request: SearchRequest,
    ) -> Result<ConversationalResult, ServiceError>;

    /// Nearest neighbours of an indexed record.
    async fn similar_search(
        &self,
        request: SimilarityRequest,
    ) -> Result<SearchResult, ServiceError>;

    /// Record a batch that failed outside the request path.
    fn record_failed_batch(&self);

    /// Current counters.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl SearchService {
    /// Assemble the service from its capabilities.
    pub fn new(
        chunker: TextChunker,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        llm: Arc<dyn LanguageModel>,
    ) -> Self {
        Self {
            chunker,
            embedder,
            index,
            llm,
            metrics: Arc::new(ServiceMetrics::new()),
        }
    }

    async fn hybrid(&self, request: &SearchRequest) -> Result<SearchResult, BoxError> {
        let vector = self.embedder.embed_query(&request.query).await?;
        let result = self
            .index
            .hybrid_search(&request.query, vector, request.limit)
            .await?;
        Ok(result)
    }
}

#[async_trait]
impl SearchApi for SearchService {
    async fn index_documents(
        &self,
        documents: Vec<Document>,
    ) -> Result<IndexingOutcome, ServiceError> {
        let mut outcome = IndexingOutcome {
            documents: documents.len(),
            ..IndexingOutcome::default()
        };
        let mut records = Vec::new();

        for document in &documents {
            let chunks = self.chunker.chunk(&document.body);
            tracing::debug!(
                document_id = %document.id,
                chunks = chunks.len(),
                chunk_size = self.chunker.chunk_size(),
                "Chunked document"
            );
            if chunks.is_empty() {
                outcome.skipped_empty += 1;
                continue;
            }

            let embeddings = self
                .embedder
                .embed_documents(chunks.clone())
                .await
                .map_err(ServiceError::embedding)?;
            let document_records =
                zip_records(document, chunks, embeddings).map_err(ServiceError::embedding)?;
            records.extend(document_records);
        }

        outcome.records = records.len();
        if records.is_empty() {
            tracing::info!(
                documents = outcome.documents,
                "No records produced; skipping index write"
            );
            return Ok(outcome);
        }

        self.index
            .add_records(records)
            .await
            .map_err(ServiceError::indexing)?;
        self.metrics
            .record_batch(outcome.documents as u64, outcome.records as u64);
        tracing::info!(
            documents = outcome.documents,
            records = outcome.records,
            skipped_empty = outcome.skipped_empty,
            "Indexed documents"
        );
        Ok(outcome)
    }

    async fn semantic_search(&self, request: SearchRequest) -> Result<SearchResult, ServiceError> {
        tracing::debug!(limit = request.limit, "Semantic search");
        let result = self
            .hybrid(&request)
            .await
            .map_err(ServiceError::semantic_search)?;
        self.metrics.record_query(QueryMode::Semantic);
        Ok(result)
    }

    async fn conversational_search(
        &self,
        request: SearchRequest,
    ) -> Result<ConversationalResult, ServiceError> {
        let keywords = self
            .llm
            .extract_keywords(&request.query)
            .await
            .map_err(ServiceError::conversational_search)?;
        tracing::info!(keywords = %keywords, limit = request.limit, "Extracted keywords");

        let keyword_request = SearchRequest {
            query: keywords,
            limit: request.limit,
        };
        let result = self
            .hybrid(&keyword_request)
            .await
            .map_err(ServiceError::conversational_search)?;

        let summary = self
            .llm
            .summarize(&request.query, &result.hits)
            .await
            .map_err(ServiceError::conversational_search)?;
        self.metrics.record_query(QueryMode::Conversational);
        Ok(ConversationalResult {
            summary,
            sources: result.hits,
        })
    }

    async fn similar_search(
        &self,
        request: SimilarityRequest,
    ) -> Result<SearchResult, ServiceError> {
        tracing::debug!(id = %request.id, limit = request.limit, "Similar search");
        let result = self
            .index
            .similarity_search(&request.id, request.limit)
            .await
            .map_err(ServiceError::similarity_search)?;
        self.metrics.record_query(QueryMode::Similar);
        Ok(result)
    }

    fn record_failed_batch(&self) {
        self.metrics.record_failed_batch();
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}
