//! HTTP client wrapper for a Meilisearch hybrid index.

use super::VectorIndex;
use super::identifier::sanitize_record_id;
use super::types::{IndexError, RecordId, SearchResult, VectorRecord};
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;

/// Share of the hybrid ranking given to vector relevance (the rest goes to lexical matching).
///
/// Applied to every hybrid query; callers cannot override it per request.
pub const SEMANTIC_RATIO: f64 = 0.7;

const TASK_POLL_INTERVAL: Duration = Duration::from_millis(100);
const TASK_POLL_ATTEMPTS: usize = 100;

/// Lightweight HTTP client for Meilisearch operations on a single index.
pub struct MeilisearchIndex {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) api_key: Option<String>,
    pub(crate) index_uid: String,
    pub(crate) embedder_name: String,
}

#[derive(Deserialize)]
struct TaskReceipt {
    #[serde(rename = "taskUid")]
    task_uid: u64,
}

#[derive(Deserialize)]
struct TaskStatus {
    status: String,
    #[serde(default)]
    error: Option<TaskFailure>,
}

#[derive(Deserialize)]
struct TaskFailure {
    message: String,
}

impl MeilisearchIndex {
    /// Construct a client for `index_uid` on the Meilisearch instance at `url`.
    pub fn new(
        url: &str,
        api_key: Option<String>,
        index_uid: &str,
        embedder_name: &str,
        timeout: Duration,
    ) -> Result<Self, IndexError> {
        let client = Client::builder()
            .user_agent("ragsearch/0.1")
            .timeout(timeout)
            .build()?;
        let base_url = normalize_base_url(url).map_err(IndexError::InvalidUrl)?;
        tracing::debug!(
            url = %base_url,
            index = index_uid,
            embedder = embedder_name,
            has_api_key = api_key.as_deref().map(|key| !key.is_empty()).unwrap_or(false),
            "Initialized Meilisearch HTTP client"
        );

        Ok(Self {
            client,
            base_url,
            api_key,
            index_uid: index_uid.to_string(),
            embedder_name: embedder_name.to_string(),
        })
    }

    /// Create the index when missing and register the user-provided embedder.
    ///
    /// Waits for both tasks so the index is queryable once this returns.
    pub async fn ensure_index(&self, dimension: usize) -> Result<(), IndexError> {
        if !self.index_exists().await? {
            tracing::debug!(index = %self.index_uid, "Creating index");
            let response = self
                .request(Method::POST, "indexes")
                .json(&json!({ "uid": self.index_uid, "primaryKey": "id" }))
                .send()
                .await?;
            let receipt = self.task_receipt(response).await?;
            self.wait_for_task(receipt.task_uid).await?;
        }

        let settings = json!({
            "embedders": {
                self.embedder_name.clone(): {
                    "source": "userProvided",
                    "dimensions": dimension,
                }
            }
        });
        let response = self
            .request(Method::PATCH, &format!("indexes/{}/settings", self.index_uid))
            .json(&settings)
            .send()
            .await?;
        let receipt = self.task_receipt(response).await?;
        self.wait_for_task(receipt.task_uid).await?;
        tracing::info!(
            index = %self.index_uid,
            embedder = %self.embedder_name,
            dimension,
            "Index ready"
        );
        Ok(())
    }

    async fn index_exists(&self) -> Result<bool, IndexError> {
        let response = self
            .request(Method::GET, &format!("indexes/{}", self.index_uid))
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => {
                let body = response.text().await.unwrap_or_default();
                let error = IndexError::UnexpectedStatus { status, body };
                tracing::error!(index = %self.index_uid, error = %error, "Index existence check failed");
                Err(error)
            }
        }
    }

    async fn wait_for_task(&self, task_uid: u64) -> Result<(), IndexError> {
        for _ in 0..TASK_POLL_ATTEMPTS {
            let response = self
                .request(Method::GET, &format!("tasks/{task_uid}"))
                .send()
                .await?;
            let response = self.ensure_success(response).await?;
            let task: TaskStatus = response.json().await?;
            match task.status.as_str() {
                "succeeded" => return Ok(()),
                "failed" | "canceled" => {
                    let reason = task
                        .error
                        .map(|failure| failure.message)
                        .unwrap_or_else(|| task.status.clone());
                    return Err(IndexError::TaskFailed { task_uid, reason });
                }
                _ => tokio::time::sleep(TASK_POLL_INTERVAL).await,
            }
        }
        Err(IndexError::TaskFailed {
            task_uid,
            reason: "timed out waiting for task".into(),
        })
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format_endpoint(&self.base_url, path);
        let req = self.client.request(method, url);
        match self.api_key.as_deref().filter(|key| !key.is_empty()) {
            Some(api_key) => req.bearer_auth(api_key),
            None => req,
        }
    }

    async fn ensure_success(
        &self,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, IndexError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = IndexError::UnexpectedStatus { status, body };
            tracing::error!(index = %self.index_uid, error = %error, "Meilisearch request failed");
            Err(error)
        }
    }

    async fn task_receipt(&self, response: reqwest::Response) -> Result<TaskReceipt, IndexError> {
        let response = self.ensure_success(response).await?;
        Ok(response.json().await?)
    }

    async fn search(&self, path: &str, body: Value) -> Result<SearchResult, IndexError> {
        let response = self
            .request(Method::POST, &format!("indexes/{}/{path}", self.index_uid))
            .json(&body)
            .send()
            .await?;
        let response = self.ensure_success(response).await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl VectorIndex for MeilisearchIndex {
    async fn add_records(&self, records: Vec<VectorRecord>) -> Result<(), IndexError> {
        let documents: Vec<Value> = records
            .into_iter()
            .map(|record| {
                json!({
                    "id": sanitize_record_id(&record.id),
                    "_vectors": { self.embedder_name.clone(): record.vector },
                    "chunk": record.chunk,
                    "url": record.url,
                })
            })
            .collect();

        let count = documents.len();
        let response = self
            .request(Method::POST, &format!("indexes/{}/documents", self.index_uid))
            .json(&documents)
            .send()
            .await?;
        let receipt = self.task_receipt(response).await?;
        tracing::debug!(
            index = %self.index_uid,
            documents = count,
            task_uid = receipt.task_uid,
            "Documents enqueued"
        );
        Ok(())
    }

    async fn hybrid_search(
        &self,
        query: &str,
        vector: Vec<f32>,
        limit: usize,
    ) -> Result<SearchResult, IndexError> {
        let body = json!({
            "q": query,
            "vector": vector,
            "limit": limit,
            "hybrid": {
                "embedder": self.embedder_name,
                "semanticRatio": SEMANTIC_RATIO,
            },
        });
        self.search("search", body).await
    }

    async fn similarity_search(
        &self,
        id: &RecordId,
        limit: usize,
    ) -> Result<SearchResult, IndexError> {
        let id = match id {
            RecordId::Number(value) => json!(value),
            RecordId::Text(value) => json!(sanitize_record_id(value)),
        };
        let body = json!({
            "id": id,
            "embedder": self.embedder_name,
            "limit": limit,
        });
        self.search("similar", body).await
    }
}

fn normalize_base_url(url: &str) -> Result<String, String> {
    let mut parsed = reqwest::Url::parse(url).map_err(|err| err.to_string())?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed.to_string())
}

fn format_endpoint(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}
