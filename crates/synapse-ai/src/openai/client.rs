//! Client struct and request building.

use std::time::Duration;

use synapse_config::ProviderConfig;

use crate::{ChatMessage, TEMPERATURE};

/// Chat-completion client for OpenAI-style endpoints.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    pub(crate) http: reqwest::Client,
}

impl OpenAiClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .timeout(Duration::from_secs(120))
                .build()
                .expect("failed to build HTTP client"),
        }
    }

    /// Build the JSON request body for the chat-completions API.
    pub(crate) fn build_request_body(
        &self,
        messages: &[ChatMessage],
        config: &ProviderConfig,
    ) -> serde_json::Value {
        serde_json::json!({
            "model": config.resolved_model(),
            "messages": messages,
            "max_tokens": config.max_tokens,
            "temperature": TEMPERATURE,
        })
    }
}

impl Default for OpenAiClient {
    fn default() -> Self {
        Self::new()
    }
}
