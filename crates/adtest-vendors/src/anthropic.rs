//! Anthropic messages API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[cfg(test)]
use mockall::automock;

use crate::config::AnthropicConfig;
use crate::error::VendorResult;
use crate::http::{build_client, send_json};

const VENDOR: &str = "Anthropic";
const API_VERSION: &str = "2023-06-01";

/// Single-turn text completion.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Answer one user message. Returns an empty string when the model
    /// produced no text block.
    async fn complete(&self, prompt: &str) -> VendorResult<String>;
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Anthropic API client.
#[derive(Clone)]
pub struct AnthropicClient {
    http: Client,
    config: AnthropicConfig,
}

impl AnthropicClient {
    pub fn new(config: AnthropicConfig) -> VendorResult<Self> {
        Ok(Self {
            http: build_client(config.timeout)?,
            config,
        })
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn complete(&self, prompt: &str) -> VendorResult<String> {
        let request = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let response: MessagesResponse = send_json(
            VENDOR,
            "messages",
            self.http
                .post(format!("{}/v1/messages", self.config.base_url.trim_end_matches('/')))
                .header("x-api-key", &self.config.api_key)
                .header("anthropic-version", API_VERSION)
                .json(&request),
        )
        .await?;

        let text = response
            .content
            .into_iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text)
            .unwrap_or_default();

        debug!(model = %self.config.model, chars = text.len(), "Completion received");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> AnthropicClient {
        AnthropicClient::new(AnthropicConfig {
            base_url: server.uri(),
            ..AnthropicConfig::new("sk-test")
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_complete_sends_single_user_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "sk-test"))
            .and(header("anthropic-version", "2023-06-01"))
            .and(body_json(json!({
                "model": "claude-sonnet-4-20250514",
                "max_tokens": 1024,
                "messages": [{"role": "user", "content": "How does it make you feel?"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "msg_1",
                "content": [{"type": "text", "text": "Nostalgic."}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = client(&server).complete("How does it make you feel?").await.unwrap();
        assert_eq!(text, "Nostalgic.");
    }

    #[tokio::test]
    async fn test_complete_without_text_block_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": []})))
            .mount(&server)
            .await;

        assert_eq!(client(&server).complete("hi").await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_overloaded_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(529).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let err = client(&server).complete("hi").await.unwrap_err();
        assert_eq!(err.status_code(), Some(529));
    }
}
