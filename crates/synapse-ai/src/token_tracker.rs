//! Token usage accounting.

use std::collections::BTreeMap;

use synapse_common::SessionId;

use crate::TokenUsage;

/// Cumulative token usage, broken down by provider and by session.
#[derive(Debug, Clone, Default)]
pub struct TokenTracker {
    total: TokenUsage,
    by_provider: BTreeMap<String, TokenUsage>,
    by_session: BTreeMap<SessionId, TokenUsage>,
    /// Provider replies recorded, including ones without usage data.
    call_count: u64,
}

impl TokenTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the usage reported with one provider reply.
    pub fn record(&mut self, provider: &str, session: &SessionId, usage: &TokenUsage) {
        add(&mut self.total, usage);
        add(self.by_provider.entry(provider.to_string()).or_default(), usage);
        add(self.by_session.entry(session.clone()).or_default(), usage);
        self.call_count += 1;
    }

    pub fn total(&self) -> &TokenUsage {
        &self.total
    }

    pub fn for_provider(&self, provider: &str) -> Option<&TokenUsage> {
        self.by_provider.get(provider)
    }

    pub fn for_session(&self, session: &SessionId) -> Option<&TokenUsage> {
        self.by_session.get(session)
    }

    /// Per-provider totals in provider-name order.
    pub fn providers(&self) -> impl Iterator<Item = (&str, &TokenUsage)> {
        self.by_provider.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn total_tokens(&self) -> u64 {
        self.total.total_tokens()
    }

    pub fn call_count(&self) -> u64 {
        self.call_count
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn add(acc: &mut TokenUsage, usage: &TokenUsage) {
    acc.input_tokens = acc.input_tokens.saturating_add(usage.input_tokens);
    acc.output_tokens = acc.output_tokens.saturating_add(usage.output_tokens);
}
