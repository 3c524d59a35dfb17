//! Completion client abstraction.
//!
//! The handler only depends on [`CompletionClient`], so the HTTP-backed
//! client can be swapped for a scripted one in tests.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("API key not set (expected in ${0})")]
    MissingApiKey(String),

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Upstream returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Event stream error: {0}")]
    Stream(String),

    #[error("Malformed stream chunk: {0}")]
    Malformed(String),

    #[error("Upstream reported an error: {0}")]
    Provider(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
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

/// Streaming chat completion request body. No sampling parameters are sent,
/// so the model defaults apply.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    pub max_completion_tokens: u32,
}

impl ChatCompletionRequest {
    pub fn streaming(
        model: impl Into<String>,
        messages: Vec<ChatMessage>,
        max_completion_tokens: u32,
    ) -> Self {
        Self {
            model: model.into(),
            messages,
            stream: true,
            max_completion_tokens,
        }
    }
}

/// Text deltas in arrival order. An item may be an empty string when an
/// increment carries no content (role-only or finish chunks).
pub type DeltaStream = BoxStream<'static, Result<String, UpstreamError>>;

#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Open a streaming completion. Errors returned here happen before any
    /// increment was received.
    async fn stream_chat(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<DeltaStream, UpstreamError>;
}
