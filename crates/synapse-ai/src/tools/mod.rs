//! Built-in tools the model can request.
//!
//! A [`ToolRegistry`] maps lowercase tool names and aliases to [`Tool`]
//! handlers. Dispatch never fails: unknown names, missing features and
//! execution failures all come back as a [`ToolResult`] the agent writes
//! into the transcript.

mod registry;
mod sandbox;
mod search;

#[cfg(test)]
mod tests;

use async_trait::async_trait;
use serde_json::Value;

pub use registry::ToolRegistry;
pub use sandbox::{ExecuteCodeTool, LuaSandbox, EXECUTION_BUDGET};
pub use search::{DemoSearch, SearchBackend, SearchItem, WebSearchTool};

/// A handler for one tool.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Canonical lowercase name.
    fn name(&self) -> &'static str;

    /// Other lowercase names that resolve to this tool.
    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    /// One-line description for help output.
    fn description(&self) -> &'static str;

    async fn call(&self, args: &Value) -> ToolResult;
}

/// Outcome of a tool call.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolResult {
    Success(Value),
    Failure(ToolError),
}

impl ToolResult {
    pub fn text(s: impl Into<String>) -> Self {
        ToolResult::Success(Value::String(s.into()))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ToolResult::Success(_))
    }

    /// Transcript text: strings raw, other JSON pretty-printed, errors as
    /// their message.
    pub fn render(&self) -> String {
        match self {
            ToolResult::Success(Value::String(s)) => s.clone(),
            ToolResult::Success(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
            ToolResult::Failure(err) => err.to_string(),
        }
    }
}

impl From<Result<Value, ToolError>> for ToolResult {
    fn from(result: Result<Value, ToolError>) -> Self {
        match result {
            Ok(value) => ToolResult::Success(value),
            Err(err) => ToolResult::Failure(err),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
    #[error("{0} not implemented")]
    NotImplemented(String),
    #[error("Execution timed out (2s)")]
    Timeout,
    #[error("Execution error: {0}")]
    Execution(String),
    #[error("Search error: {0}")]
    Search(String),
}

/// First non-empty string argument under any of `keys`.
///
/// A bare JSON string is taken as the value itself.
pub(crate) fn string_arg(args: &Value, keys: &[&str]) -> Option<String> {
    if let Value::String(s) = args {
        return Some(s.clone()).filter(|s| !s.trim().is_empty());
    }
    keys.iter()
        .filter_map(|k| args.get(*k).and_then(Value::as_str))
        .find(|s| !s.trim().is_empty())
        .map(String::from)
}

/// Placeholder for file processing, which this build does not offer.
pub struct ProcessFileTool;

#[async_trait]
impl Tool for ProcessFileTool {
    fn name(&self) -> &'static str {
        "process_file"
    }

    fn description(&self) -> &'static str {
        "Process an uploaded file (not available)"
    }

    async fn call(&self, _args: &Value) -> ToolResult {
        ToolResult::Failure(ToolError::NotImplemented(self.name().to_string()))
    }
}
