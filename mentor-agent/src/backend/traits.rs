//! Core traits for chat-completion backends.
//!
//! This module defines the `ChatBackend` trait - the abstraction over the
//! LLM providers the mentor service can talk to.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Error types for backend operations.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Backend is not configured or reachable
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// Request was rejected by the provider
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Rate limited by the provider (HTTP 429)
    #[error("Rate limited, retry after {retry_after_ms:?}ms")]
    RateLimited { retry_after_ms: Option<u64> },

    /// Network error
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Response could not be parsed
    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Core trait for chat-completion backends.
///
/// One implementation per provider wire format; the mentor service selects
/// among registered backends by provider name.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Backend identifier (the model name).
    fn id(&self) -> &str;

    /// Check whether the backend is currently reachable.
    async fn is_available(&self) -> bool;

    /// Run a chat completion.
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, BackendError>;
}

/// Request for a chat completion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    /// System prompt (optional)
    pub system_prompt: Option<String>,
    /// Conversation messages
    pub messages: Vec<Message>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Temperature (0.0-2.0)
    pub temperature: Option<f32>,
    /// Ask the provider for a JSON object response
    pub json_output: bool,
}

impl ChatRequest {
    /// Create a request with a single user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user(content)],
            ..Default::default()
        }
    }

    /// Add a system prompt.
    pub fn with_system(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Set max tokens.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Set temperature.
    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp.clamp(0.0, 2.0));
        self
    }

    /// Request a JSON object response.
    pub fn with_json_output(mut self) -> Self {
        self.json_output = true;
        self
    }
}

/// A message in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// Response from a chat completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Generated content
    pub content: String,
    /// Token usage, when the provider reports it
    pub usage: Usage,
}

/// Token usage information.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl Usage {
    pub fn total(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// Strip a markdown code fence from a model answer, if present.
///
/// Some providers wrap JSON answers in ```json fences even when asked for
/// bare JSON.
pub fn strip_json_fences(content: &str) -> &str {
    let trimmed = content.trim();
    for fence in ["```json", "```"] {
        if let Some(rest) = trimmed.strip_prefix(fence) {
            if let Some(end) = rest.find("```") {
                return rest[..end].trim();
            }
            return rest.trim();
        }
    }
    trimmed
}
