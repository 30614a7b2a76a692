//! HTTP surface for ragsearch.
//!
//! This module exposes a compact Axum router:
//!
//! - `POST /index/document` – Queue a batch of documents for chunking, embedding and indexing.
//!   Returns `202 Accepted` as soon as the batch is queued.
//! - `POST /search/semantic` – Hybrid search with the embedded query.
//! - `POST /search/conversational` – Keyword-reduced hybrid search followed by a grounded summary.
//! - `POST /search/similar` – Records nearest to an already indexed record.
//! - `GET /metrics` – Indexing and query counters.
//! - `GET /commands` – Machine-readable command catalog for quick discovery by tools/hosts.
//!
//! Failures are rendered as `{"error": {"code", "message"}}`.

use crate::index::{RecordId, SearchResult};
use crate::logging::render_error_chain;
use crate::metrics::MetricsSnapshot;
use crate::processing::{
    ConversationalResult, Document, EnqueueError, IndexingQueue, SearchApi, SearchRequest,
    ServiceError, SimilarityRequest,
};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Bounds applied to the `limit` of every search request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    /// Limit used when the request omits one.
    pub default_limit: usize,
    /// Largest accepted limit (inclusive).
    pub max_limit: usize,
}

/// State shared by every handler.
struct AppState<S: ?Sized> {
    service: Arc<S>,
    queue: IndexingQueue,
    limits: SearchLimits,
}

impl<S: ?Sized> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            queue: self.queue.clone(),
            limits: self.limits,
        }
    }
}

/// Build the HTTP router over `service`, feeding ingestion batches into `queue`.
pub fn create_router<S>(service: Arc<S>, queue: IndexingQueue, limits: SearchLimits) -> Router
where
    S: SearchApi + ?Sized + 'static,
{
    Router::new()
        .route("/index/document", post(index_documents::<S>))
        .route("/search/semantic", post(semantic_search::<S>))
        .route("/search/conversational", post(conversational_search::<S>))
        .route("/search/similar", post(similar_search::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .with_state(AppState {
            service,
            queue,
            limits,
        })
}

/// Body of the search routes.
#[derive(Deserialize)]
struct SearchBody {
    query: String,
    #[serde(default)]
    limit: Option<usize>,
}

/// Body of `POST /search/similar`.
#[derive(Deserialize)]
struct SimilarBody {
    id: RecordId,
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Serialize)]
struct AcceptedResponse {
    status: &'static str,
}

impl SearchLimits {
    fn resolve(&self, requested: Option<usize>) -> Result<usize, AppError> {
        let limit = requested.unwrap_or(self.default_limit);
        if limit == 0 || limit > self.max_limit {
            return Err(AppError::Validation(format!(
                "limit must be between 1 and {}",
                self.max_limit
            )));
        }
        Ok(limit)
    }
}

impl SearchBody {
    fn into_request(self, limits: &SearchLimits) -> Result<SearchRequest, AppError> {
        if self.query.trim().is_empty() {
            return Err(AppError::Validation("query must not be empty".into()));
        }
        Ok(SearchRequest {
            query: self.query,
            limit: limits.resolve(self.limit)?,
        })
    }
}

/// Queue documents for background indexing.
///
/// The caller learns about acceptance only; indexing failures are logged by the worker.
async fn index_documents<S>(
    State(state): State<AppState<S>>,
    Json(documents): Json<Vec<Document>>,
) -> Result<(StatusCode, Json<AcceptedResponse>), AppError>
where
    S: SearchApi + ?Sized,
{
    let count = documents.len();
    state.queue.enqueue(documents)?;
    tracing::info!(documents = count, "Indexing batch accepted");
    Ok((
        StatusCode::ACCEPTED,
        Json(AcceptedResponse { status: "success" }),
    ))
}

async fn semantic_search<S>(
    State(state): State<AppState<S>>,
    Json(body): Json<SearchBody>,
) -> Result<Json<SearchResult>, AppError>
where
    S: SearchApi + ?Sized,
{
    let request = body.into_request(&state.limits)?;
    Ok(Json(state.service.semantic_search(request).await?))
}

async fn conversational_search<S>(
    State(state): State<AppState<S>>,
    Json(body): Json<SearchBody>,
) -> Result<Json<ConversationalResult>, AppError>
where
    S: SearchApi + ?Sized,
{
    let request = body.into_request(&state.limits)?;
    Ok(Json(state.service.conversational_search(request).await?))
}

async fn similar_search<S>(
    State(state): State<AppState<S>>,
    Json(body): Json<SimilarBody>,
) -> Result<Json<SearchResult>, AppError>
where
    S: SearchApi + ?Sized,
{
    let request = SimilarityRequest {
        id: body.id,
        limit: state.limits.resolve(body.limit)?,
    };
    Ok(Json(state.service.similar_search(request).await?))
}

/// Return indexing and query counters.
async fn get_metrics<S>(State(state): State<AppState<S>>) -> Json<MetricsSnapshot>
where
    S: SearchApi + ?Sized,
{
    Json(state.service.metrics_snapshot())
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery/UX in hosts and tools.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "index_documents",
                method: "POST",
                path: "/index/document",
                description: "Queue documents to chunk, embed and write to the hybrid index. Responds 202 once queued.",
                request_example: Some(json!([
                    { "id": "1", "body": "Document contents", "url": "https://example.org/doc" }
                ])),
            },
            CommandDescriptor {
                name: "semantic_search",
                method: "POST",
                path: "/search/semantic",
                description: "Hybrid lexical and vector search for the query text.",
                request_example: Some(json!({ "query": "What is AI?", "limit": 5 })),
            },
            CommandDescriptor {
                name: "conversational_search",
                method: "POST",
                path: "/search/conversational",
                description: "Answer a question from indexed documents. Response returns { \"summary\": string, \"sources\": [hit] }.",
                request_example: Some(json!({ "query": "What is AI?", "limit": 5 })),
            },
            CommandDescriptor {
                name: "similar_search",
                method: "POST",
                path: "/search/similar",
                description: "Find records similar to an indexed record id such as \"<document id>::<chunk>\".",
                request_example: Some(json!({ "id": "1::0", "limit": 3 })),
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return indexing and query counters useful for observability dashboards.",
                request_example: None,
            },
        ],
    })
}

/// Errors rendered by the HTTP layer.
#[derive(Debug)]
enum AppError {
    Service(ServiceError),
    Validation(String),
    QueueFull,
    Internal(String),
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            Self::Service(error) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                error.code(),
                error.message().to_string(),
            ),
            Self::Validation(message) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                message.clone(),
            ),
            Self::QueueFull => (
                StatusCode::SERVICE_UNAVAILABLE,
                "indexing_queue_full",
                "Indexing queue is full; retry later.".into(),
            ),
            Self::Internal(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                message.clone(),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        match &self {
            Self::Service(error) => {
                tracing::error!(code, error = %render_error_chain(error), "Request failed");
            }
            Self::Internal(_) => tracing::error!(code, detail = %message, "Request failed"),
            Self::Validation(_) | Self::QueueFull => {
                tracing::debug!(code, detail = %message, "Request rejected");
            }
        }
        let body = json!({ "error": { "code": code, "message": message } });
        (status, Json(body)).into_response()
    }
}

impl From<ServiceError> for AppError {
    fn from(inner: ServiceError) -> Self {
        Self::Service(inner)
    }
}

impl From<EnqueueError> for AppError {
    fn from(inner: EnqueueError) -> Self {
        match inner {
            EnqueueError::Full => Self::QueueFull,
            EnqueueError::Closed => Self::Internal(inner.to_string()),
        }
    }
}
