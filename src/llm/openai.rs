use super::{CompletionClient, LlmClientError};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// Completion client for OpenAI-compatible `/chat/completions` endpoints.
pub struct OpenAiCompletion {
    http: Client,
    endpoint: String,
    model: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiCompletion {
    /// Construct a client authenticated with `api_key`.
    pub fn new(
        api_key: &str,
        base_url: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, LlmClientError> {
        if api_key.trim().is_empty() {
            return Err(LlmClientError::ProviderUnavailable(
                "missing OpenAI API key".into(),
            ));
        }
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
            .map_err(|_| LlmClientError::ProviderUnavailable("invalid OpenAI API key".into()))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let http = Client::builder()
            .user_agent("ragsearch/llm")
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|error| LlmClientError::ProviderUnavailable(error.to_string()))?;
        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompletion {
    async fn complete(&self, prompt: String) -> Result<String, LlmClientError> {
        let payload = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": 0.1,
        });

        let response = self
            .http
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                LlmClientError::ProviderUnavailable(format!(
                    "failed to reach {}: {error}",
                    self.endpoint
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmClientError::GenerationFailed(format!(
                "OpenAI chat request failed ({status}): {body}"
            )));
        }

        let parsed: ChatResponse = response.json().await.map_err(|error| {
            LlmClientError::InvalidResponse(format!("failed to parse OpenAI chat response: {error}"))
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| LlmClientError::InvalidResponse("response contained no choices".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};

    #[tokio::test]
    async fn returns_first_choice_content() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/chat/completions")
                    .header("authorization", "Bearer sk-test");
                then.status(200).json_body(json!({
                    "choices": [
                        { "index": 0, "message": { "role": "assistant", "content": " AI is a field. " } }
                    ]
                }));
            })
            .await;

        let client = OpenAiCompletion::new(
            "sk-test",
            &server.base_url(),
            "gpt-4o-mini",
            Duration::from_secs(5),
        )
        .expect("client");
        let text = client.complete("prompt".into()).await.expect("completion");

        mock.assert();
        assert_eq!(text, "AI is a field.");
    }

    #[tokio::test]
    async fn empty_choices_are_invalid() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200).json_body(json!({ "choices": [] }));
            })
            .await;

        let client = OpenAiCompletion::new(
            "sk-test",
            &server.base_url(),
            "gpt-4o-mini",
            Duration::from_secs(5),
        )
        .expect("client");
        let error = client.complete("prompt".into()).await.unwrap_err();

        assert!(matches!(error, LlmClientError::InvalidResponse(_)));
    }
}
