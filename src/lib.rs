#![deny(missing_docs)]

//! Core library for the ragsearch retrieval-augmented search server.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Embedding capability and adapters.
pub mod embedding;
/// Vector index capability and the Meilisearch adapter.
pub mod index;
/// Language model capability, prompts and adapters.
pub mod llm;
/// Structured logging and tracing setup.
pub mod logging;
/// Indexing and query metrics helpers.
pub mod metrics;
/// Document indexing pipeline and query orchestration.
pub mod processing;
