use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing indexing and query activity.
#[derive(Default)]
pub struct ServiceMetrics {
    documents_indexed: AtomicU64,
    records_indexed: AtomicU64,
    failed_batches: AtomicU64,
    semantic_queries: AtomicU64,
    conversational_queries: AtomicU64,
    similar_queries: AtomicU64,
}

/// Query mode used when recording a served search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    /// Hybrid search over the embedded query.
    Semantic,
    /// Keyword extraction, hybrid search, and summarization.
    Conversational,
    /// Nearest-neighbour lookup by record identifier.
    Similar,
}

impl ServiceMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a committed indexing batch.
    pub fn record_batch(&self, documents: u64, records: u64) {
        self.documents_indexed
            .fetch_add(documents, Ordering::Relaxed);
        self.records_indexed.fetch_add(records, Ordering::Relaxed);
    }

    /// Record an indexing batch that was aborted.
    pub fn record_failed_batch(&self) {
        self.failed_batches.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successfully served query.
    pub fn record_query(&self, mode: QueryMode) {
        let counter = match mode {
            QueryMode::Semantic => &self.semantic_queries,
            QueryMode::Conversational => &self.conversational_queries,
            QueryMode::Similar => &self.similar_queries,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_indexed: self.documents_indexed.load(Ordering::Relaxed),
            records_indexed: self.records_indexed.load(Ordering::Relaxed),
            failed_batches: self.failed_batches.load(Ordering::Relaxed),
            semantic_queries: self.semantic_queries.load(Ordering::Relaxed),
            conversational_queries: self.conversational_queries.load(Ordering::Relaxed),
            similar_queries: self.similar_queries.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of service counters used for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Number of documents committed to the index since startup.
    pub documents_indexed: u64,
    /// Number of vector records committed to the index since startup.
    pub records_indexed: u64,
    /// Number of indexing batches aborted by an embedding or index failure.
    pub failed_batches: u64,
    /// Semantic searches served.
    pub semantic_queries: u64,
    /// Conversational searches served.
    pub conversational_queries: u64,
    /// Similarity searches served.
    pub similar_queries: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_batches_and_failures() {
        let metrics = ServiceMetrics::new();
        metrics.record_batch(2, 5);
        metrics.record_batch(1, 3);
        metrics.record_failed_batch();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.documents_indexed, 3);
        assert_eq!(snapshot.records_indexed, 8);
        assert_eq!(snapshot.failed_batches, 1);
    }

    #[test]
    fn query_counters_are_per_mode() {
        let metrics = ServiceMetrics::new();
        metrics.record_query(QueryMode::Semantic);
        metrics.record_query(QueryMode::Semantic);
        metrics.record_query(QueryMode::Similar);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.semantic_queries, 2);
        assert_eq!(snapshot.conversational_queries, 0);
        assert_eq!(snapshot.similar_queries, 1);
    }
}
