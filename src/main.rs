use anyhow::Context;
use ragsearch::{
    api::{self, SearchLimits},
    config, embedding,
    index::MeilisearchIndex,
    llm, logging,
    processing::{self, SearchService, TextChunker},
};
use std::net::Ipv4Addr;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config::init_config();
    logging::init_tracing();
    let config = config::get_config();
    config.log_summary();

    tracing::info!("Initializing capability clients");
    let embedder =
        embedding::build_embedder(config).context("Failed to build embedding client")?;
    let language_model =
        llm::build_language_model(config).context("Failed to build language model client")?;
    let index = MeilisearchIndex::new(
        &config.meilisearch_url,
        config.meili_master_key.clone(),
        &config.meilisearch_index,
        &config.embedder_name,
        config.request_timeout,
    )
    .context("Failed to build Meilisearch client")?;
    index
        .ensure_index(config.embedding_dimension)
        .await
        .context("Failed to prepare Meilisearch index")?;
    let chunker = TextChunker::new(
        config.text_splitter_chunk_size,
        config.text_splitter_chunk_overlap,
        config.text_splitter_unit,
        config.embedding_provider,
        &config.embedding_model,
    )
    .context("Failed to configure text splitter")?;

    let service = Arc::new(SearchService::new(
        chunker,
        embedder,
        Arc::new(index),
        language_model,
    ));
    let (queue, receiver) = processing::indexing_channel(config.indexing_queue_capacity);
    let worker = processing::spawn_indexing_worker(receiver, service.clone());
    let app = api::create_router(
        service,
        queue,
        SearchLimits {
            default_limit: config.search_default_limit,
            max_limit: config.search_max_limit,
        },
    );

    let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, config.server_port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.server_port))?;
    tracing::info!("Listening on http://0.0.0.0:{}", config.server_port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    // The router owned the last queue sender; the worker drains what is left and exits.
    worker.await.context("Indexing worker panicked")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %error, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
