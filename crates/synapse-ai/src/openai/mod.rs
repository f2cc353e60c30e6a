//! OpenAI-compatible chat-completion client.
//!
//! Serves both OpenAI (`https://api.openai.com/v1/chat/completions`) and
//! the AI Pipe OpenRouter proxy, which speak the same wire format. The
//! target is taken from the [`ProviderConfig`](synapse_config::ProviderConfig)
//! passed on each call, so a settings change applies to the next request.

mod api;
mod client;
mod response;

#[cfg(test)]
mod tests;

pub use client::OpenAiClient;
pub use response::ResponseShape;
