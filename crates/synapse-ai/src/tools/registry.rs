//! Name-to-handler registry.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::ToolCall;

use super::{ExecuteCodeTool, ProcessFileTool, Tool, ToolError, ToolResult, WebSearchTool};

/// Resolves tool names (case-insensitively) to handlers.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `web_search`, `execute_code` and `process_file`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(WebSearchTool::demo()));
        registry.register(Arc::new(ExecuteCodeTool::new()));
        registry.register(Arc::new(ProcessFileTool));
        registry
    }

    /// Register a tool under its name and aliases. Later registrations
    /// replace earlier ones with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        for alias in tool.aliases() {
            self.tools.insert(alias.to_ascii_lowercase(), tool.clone());
        }
        self.tools.insert(tool.name().to_ascii_lowercase(), tool);
    }

    pub fn resolve(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(&name.trim().to_ascii_lowercase())
    }

    /// Registered tools, sorted by canonical name.
    pub fn tools(&self) -> Vec<Arc<dyn Tool>> {
        let mut tools: Vec<_> = self
            .tools
            .iter()
            .filter(|(key, tool)| key.as_str() == tool.name())
            .map(|(_, tool)| tool.clone())
            .collect();
        tools.sort_by_key(|t| t.name());
        tools
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tools().iter().map(|t| t.name()).collect()
    }

    /// Run a tool call. Never fails; problems come back as
    /// [`ToolResult::Failure`].
    pub async fn dispatch(&self, call: &ToolCall) -> ToolResult {
        let Some(tool) = self.resolve(&call.name) else {
            warn!(tool = %call.name, "unknown tool requested");
            return ToolResult::Failure(ToolError::UnknownTool(call.name.clone()));
        };

        debug!(tool = tool.name(), requested = %call.name, "dispatching tool call");
        let result = tool.call(&call.arguments).await;
        if let ToolResult::Failure(ref err) = result {
            warn!(tool = tool.name(), error = %err, "tool call failed");
        }
        result
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}
