//! AiClient trait implementation for OpenAiClient.

use async_trait::async_trait;
use synapse_config::ProviderConfig;
use tracing::debug;

use crate::{AiClient, AiError, ChatMessage, Reply};

use super::client::OpenAiClient;
use super::response::parse_response;

/// Longest slice of an error body kept in an `ApiError`.
const ERROR_BODY_CHARS: usize = 200;

#[async_trait]
impl AiClient for OpenAiClient {
    async fn send_message(
        &self,
        messages: &[ChatMessage],
        config: &ProviderConfig,
    ) -> Result<Reply, AiError> {
        let body = self.build_request_body(messages, config);

        debug!(
            provider = %config.provider,
            model = %config.resolved_model(),
            messages = messages.len(),
            "chat completion request"
        );

        let response = self
            .http
            .post(config.endpoint())
            .bearer_auth(config.api_key.trim())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AiError::Timeout
                } else {
                    AiError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AiError::RateLimited);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let text = text.chars().take(ERROR_BODY_CHARS).collect::<String>();
            return Err(AiError::ApiError(format!("HTTP {status}: {text}")));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AiError::ParseError(e.to_string()))?;

        let reply = parse_response(json);
        debug!(
            tool_calls = reply.tool_calls.len(),
            input_tokens = reply.usage.input_tokens,
            output_tokens = reply.usage.output_tokens,
            "chat completion reply"
        );
        Ok(reply)
    }
}
