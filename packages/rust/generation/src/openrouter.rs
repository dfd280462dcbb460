//! OpenRouter chat-completion client.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use researchpress_shared::{OpenRouterConfig, ResearchError, Result};

use crate::chat::{ChatBackend, ChatRequest};

/// User-Agent string for generation requests.
const USER_AGENT: &str = concat!("ResearchPress/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

/// Client for `POST {base_url}/chat/completions`.
pub struct OpenRouterClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl fmt::Debug for OpenRouterClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenRouterClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl OpenRouterClient {
    /// Build a client from the `[openrouter]` config section and a resolved key.
    pub fn new(api_key: impl Into<String>, config: &OpenRouterConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                ResearchError::generation(None, format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl ChatBackend for OpenRouterClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| ResearchError::generation(None, format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ResearchError::generation(Some(status.as_u16()), body));
        }

        let parsed: CompletionResponse = response.json().await.map_err(|e| {
            ResearchError::generation(Some(status.as_u16()), format!("invalid response body: {e}"))
        })?;

        if let Some(usage) = &parsed.usage {
            debug!(
                model = %request.model,
                tokens_in = usage.prompt_tokens,
                tokens_out = usage.completion_tokens,
                "chat completion finished"
            );
        }

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                ResearchError::generation(Some(status.as_u16()), "response contained no message content")
            })
    }

    fn name(&self) -> &str {
        "openrouter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ChatMessage;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> OpenRouterClient {
        let config = OpenRouterConfig {
            base_url: server.uri(),
            ..OpenRouterConfig::default()
        };
        OpenRouterClient::new("or-test-key", &config).unwrap()
    }

    fn request() -> ChatRequest {
        ChatRequest {
            model: "anthropic/claude-3.5-sonnet".into(),
            messages: vec![ChatMessage::system("sys"), ChatMessage::user("research")],
            temperature: 0.7,
            max_tokens: Some(5000),
        }
    }

    #[tokio::test]
    async fn returns_first_choice_content() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer or-test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "anthropic/claude-3.5-sonnet",
                "max_tokens": 5000,
                "messages": [
                    { "role": "system", "content": "sys" },
                    { "role": "user", "content": "research" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "gen-1",
                "choices": [{ "message": { "role": "assistant", "content": "Title: Hello" } }],
                "usage": { "prompt_tokens": 10, "completion_tokens": 3 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let content = client_for(&server).complete(&request()).await.unwrap();
        assert_eq!(content, "Title: Hello");
    }

    #[tokio::test]
    async fn http_failure_carries_status_and_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(402).set_body_string("insufficient credits"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server).complete(&request()).await.unwrap_err();
        match err {
            ResearchError::Generation { status, message } => {
                assert_eq!(status, Some(402));
                assert_eq!(message, "insufficient credits");
            }
            other => panic!("expected Generation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_choices_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })),
            )
            .mount(&server)
            .await;

        let err = client_for(&server).complete(&request()).await.unwrap_err();
        assert!(err.to_string().contains("no message content"));
    }
}
