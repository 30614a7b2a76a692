use super::{CompletionClient, LlmClientError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// Completion client for the Ollama `/api/generate` endpoint.
pub struct OllamaCompletion {
    http: Client,
    base_url: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
    done: bool,
}

impl OllamaCompletion {
    /// Construct a client targeting the Ollama runtime at `base_url`.
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self, LlmClientError> {
        let http = Client::builder()
            .user_agent("ragsearch/llm")
            .timeout(timeout)
            .build()
            .map_err(|error| LlmClientError::ProviderUnavailable(error.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }
}

#[async_trait]
impl CompletionClient for OllamaCompletion {
    async fn complete(&self, prompt: String) -> Result<String, LlmClientError> {
        let payload = json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": {
                "temperature": 0.1,
            }
        });

        let response = self
            .http
            .post(self.endpoint())
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                LlmClientError::ProviderUnavailable(format!(
                    "failed to reach Ollama at {}: {error}",
                    self.base_url
                ))
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(LlmClientError::ProviderUnavailable(format!(
                "Ollama endpoint {} returned 404 (is model '{}' pulled?)",
                self.endpoint(),
                self.model
            )));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmClientError::GenerationFailed(format!(
                "Ollama returned {status}: {body}"
            )));
        }

        let body: GenerateResponse = response.json().await.map_err(|error| {
            LlmClientError::InvalidResponse(format!("failed to decode Ollama response: {error}"))
        })?;

        if !body.done {
            return Err(LlmClientError::InvalidResponse(
                "Ollama response incomplete (streaming not supported)".into(),
            ));
        }

        Ok(body.response.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};

    #[tokio::test]
    async fn sends_non_streaming_request() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate").json_body(json!({
                    "model": "llama3.1",
                    "prompt": "hello",
                    "stream": false,
                    "options": { "temperature": 0.1 }
                }));
                then.status(200).json_body(json!({
                    "model": "llama3.1",
                    "response": "  AI, technology \n",
                    "done": true
                }));
            })
            .await;

        let client =
            OllamaCompletion::new(&server.base_url(), "llama3.1", Duration::from_secs(5))
                .expect("client");
        let text = client.complete("hello".into()).await.expect("completion");

        mock.assert();
        assert_eq!(text, "AI, technology");
    }

    #[tokio::test]
    async fn incomplete_response_is_rejected() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(200)
                    .json_body(json!({ "response": "partial", "done": false }));
            })
            .await;

        let client =
            OllamaCompletion::new(&server.base_url(), "llama3.1", Duration::from_secs(5))
                .expect("client");
        let error = client.complete("hello".into()).await.unwrap_err();

        assert!(matches!(error, LlmClientError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn missing_model_reports_unavailable() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(404);
            })
            .await;

        let client =
            OllamaCompletion::new(&server.base_url(), "llama3.1", Duration::from_secs(5))
                .expect("client");
        let error = client.complete("hello".into()).await.unwrap_err();

        assert!(matches!(error, LlmClientError::ProviderUnavailable(_)));
    }
}
