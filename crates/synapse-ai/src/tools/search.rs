//! Web search tool and its pluggable backend.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use super::{string_arg, Tool, ToolError, ToolResult};

/// One search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchItem {
    pub title: String,
    pub snippet: String,
}

/// Source of search results.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchItem>, ToolError>;
}

/// Offline backend returning one synthetic hit per query.
#[derive(Debug, Clone, Copy, Default)]
pub struct DemoSearch;

#[async_trait]
impl SearchBackend for DemoSearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchItem>, ToolError> {
        Ok(vec![SearchItem {
            title: format!("Result for \"{query}\" - demo snippet"),
            snippet: format!(
                "This is a simulated snippet for \"{query}\". Plug a real search \
                 backend in to get live results."
            ),
        }])
    }
}

/// `web_search` (alias `search`): takes `query` or `q`.
pub struct WebSearchTool {
    backend: Arc<dyn SearchBackend>,
}

impl WebSearchTool {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self { backend }
    }

    pub fn demo() -> Self {
        Self::new(Arc::new(DemoSearch))
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &'static str {
        "web_search"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["search"]
    }

    fn description(&self) -> &'static str {
        "Search the web for a query"
    }

    async fn call(&self, args: &Value) -> ToolResult {
        let Some(query) = string_arg(args, &["query", "q"]) else {
            return ToolResult::Success(json!({ "items": [] }));
        };

        debug!(query = %query, "web search");
        let result = self.backend.search(&query).await.and_then(|items| {
            serde_json::to_value(items)
                .map(|items| json!({ "query": query, "items": items }))
                .map_err(|e| ToolError::Search(e.to_string()))
        });
        result.into()
    }
}
