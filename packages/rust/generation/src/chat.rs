//! Chat-completion backend contract and message types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use researchpress_shared::Result;

/// Speaker of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One message of a chat request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A chat-completion request in the OpenAI-compatible wire shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// A hosted chat-completion provider.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send one request and return the first choice's message content.
    ///
    /// Transport failures and non-success statuses are returned as
    /// `ResearchError::Generation`.
    async fn complete(&self, request: &ChatRequest) -> Result<String>;

    /// Human-readable backend name for tracing.
    fn name(&self) -> &str;
}
