//! Agent engine for Synapse.
//!
//! Provides:
//! - An in-memory session store with title and preview bookkeeping
//! - An OpenAI-compatible chat client (OpenAI and AI Pipe/OpenRouter)
//! - A tool registry with web search and sandboxed Lua execution
//! - The single-flight agent loop that ties them together
//! - Token usage tracking

pub mod agent;
pub mod openai;
pub mod session;
pub mod token_tracker;
pub mod tools;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use synapse_config::ProviderConfig;
use tracing::warn;

pub use agent::{Agent, TurnOutcome, TurnReport, TurnState};
pub use openai::OpenAiClient;
pub use session::{Message, Session, SessionStore, SessionSummary};
pub use token_tracker::TokenTracker;
pub use tools::{Tool, ToolError, ToolRegistry, ToolResult};

/// Reply returned when no API key is configured.
pub const DEMO_REPLY: &str =
    "Demo mode - set an AI Pipe or OpenAI API key (provider.api_key in config.toml, \
     or SYNAPSE_API_KEY) to use real models.";

/// Sampling temperature sent with every request.
pub const TEMPERATURE: f64 = 0.7;

/// A chat backend.
///
/// Implementors provide [`AiClient::send_message`], which performs exactly
/// one request and may fail. Callers use [`AiClient::complete`], which
/// never fails: it short-circuits to demo mode when no key is configured
/// and turns any error into a readable reply.
#[async_trait]
pub trait AiClient: Send + Sync {
    async fn send_message(
        &self,
        messages: &[ChatMessage],
        config: &ProviderConfig,
    ) -> Result<Reply, AiError>;

    async fn complete(&self, messages: &[ChatMessage], config: &ProviderConfig) -> Reply {
        if !config.has_api_key() {
            return Reply::text(DEMO_REPLY);
        }
        match self.send_message(messages, config).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(provider = %config.provider, error = %e, "LLM call failed");
                Reply::text(format!("LLM call error: {e}"))
            }
        }
    }
}

/// Normalized message sent to a backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Message author. Unknown roles read from JSON become `System`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    #[serde(other)]
    System,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            arguments,
        }
    }
}

/// Normalized backend reply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reply {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
    pub usage: TokenUsage,
}

impl Reply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_tool_calls(mut self, tool_calls: Vec<ToolCall>) -> Self {
        self.tool_calls = tool_calls;
        self
    }

    /// True when there is neither text nor a tool request.
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty() && self.tool_calls.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Rate limited (HTTP 429)")]
    RateLimited,
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Timeout")]
    Timeout,
}
