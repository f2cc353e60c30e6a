//! Language-model provider configuration types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Default bound on generated tokens per reply.
pub const DEFAULT_MAX_TOKENS: u32 = 1500;

/// Which chat-completion backend to talk to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum ProviderKind {
    /// OpenAI chat completions.
    #[serde(rename = "openai")]
    OpenAi,
    /// AI Pipe, an OpenRouter-style proxy.
    #[default]
    #[serde(rename = "aipipe")]
    AiPipe,
}

impl ProviderKind {
    /// Chat-completion endpoint for this backend.
    pub fn endpoint(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "https://api.openai.com/v1/chat/completions",
            ProviderKind::AiPipe => "https://aipipe.org/openrouter/v1/chat/completions",
        }
    }

    /// Model used when none is configured.
    pub fn default_model(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "gpt-4o-mini",
            ProviderKind::AiPipe => "openai/gpt-4o-mini",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::AiPipe => "aipipe",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "aipipe" | "openrouter" => Ok(ProviderKind::AiPipe),
            other => Err(format!("unknown provider '{other}' (expected openai or aipipe)")),
        }
    }
}

/// Provider settings read by the chat client on every turn.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProviderConfig {
    pub provider: ProviderKind,
    /// Bearer token. Empty means demo mode.
    pub api_key: String,
    /// Model id; the provider default is used when unset.
    pub model: Option<String>,
    pub max_tokens: u32,
    /// Replaces the provider endpoint (self-hosted gateways, tests).
    pub base_url: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            api_key: String::new(),
            model: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            base_url: None,
        }
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ProviderConfig {
    pub fn new(provider: ProviderKind, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// True when a non-blank API key is configured.
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// The configured model, or the provider default.
    pub fn resolved_model(&self) -> &str {
        self.model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| self.provider.default_model())
    }

    /// The configured base URL, or the provider endpoint.
    pub fn endpoint(&self) -> &str {
        self.base_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| self.provider.endpoint())
    }
}
