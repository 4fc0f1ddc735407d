use crate::config::advisory::LlmConfig;
use crate::domain::ports::LanguageModel;
use crate::utils::error::{ReportError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// OpenAI 相容的 chat completions 端點
pub struct ChatCompletionClient {
    client: Client,
    config: LlmConfig,
}

impl ChatCompletionClient {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl LanguageModel for ChatCompletionClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.config.temperature(),
            max_tokens: self.config.max_tokens(),
        };

        tracing::debug!(
            "Calling language model '{}' ({} prompt chars)",
            self.config.model,
            system.len() + user.len()
        );
        let mut request = self.client.post(&self.config.endpoint).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ReportError::UpstreamError {
                service: "Language model".to_string(),
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| ReportError::ValidationError {
                message: "Language model response contained no message content".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn config(endpoint: String) -> LlmConfig {
        LlmConfig {
            endpoint,
            model: "advisor-large".to_string(),
            api_key: Some("llm-key".to_string()),
            temperature: None,
            max_tokens: Some(256),
            timeout_seconds: Some(5),
        }
    }

    #[tokio::test]
    async fn test_complete_returns_first_choice() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .header("authorization", "Bearer llm-key")
                .json_body_partial(r#"{"model": "advisor-large", "max_tokens": 256}"#);
            then.status(200).json_body(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "Sell XYZ."}}]
            }));
        });

        let client = ChatCompletionClient::new(config(server.url("/v1/chat/completions"))).unwrap();
        let answer = client.complete("You are an advisor.", "Portfolio data").await.unwrap();

        api_mock.assert();
        assert_eq!(answer, "Sell XYZ.");
    }

    #[tokio::test]
    async fn test_complete_maps_http_errors() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(401).body("bad key");
        });

        let client = ChatCompletionClient::new(config(server.url("/v1/chat/completions"))).unwrap();
        let err = client.complete("s", "u").await.unwrap_err();
        assert!(matches!(err, ReportError::UpstreamError { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_complete_rejects_empty_choices() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200).json_body(serde_json::json!({"choices": []}));
        });

        let client = ChatCompletionClient::new(config(server.url("/v1/chat/completions"))).unwrap();
        let err = client.complete("s", "u").await.unwrap_err();
        assert!(matches!(err, ReportError::ValidationError { .. }));
    }
}
