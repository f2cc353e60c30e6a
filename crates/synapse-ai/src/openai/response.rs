//! Response classification and tool-call extraction.
//!
//! Chat-completion backends do not agree on a single reply shape. OpenAI
//! returns `choices[0].message`, some OpenRouter models return the legacy
//! `choices[0].text`, and simple gateways answer with a bare
//! `{content, tool_calls}` object. Everything else is kept verbatim so the
//! user still sees what came back.

use serde_json::Value;

use crate::{Reply, TokenUsage, ToolCall};

/// What a provider response body turned out to be.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseShape {
    /// A chat message with text and/or tool calls.
    Chat {
        content: String,
        tool_calls: Vec<ToolCall>,
    },
    /// A legacy completion text.
    Text(String),
    /// Anything else, serialized as-is.
    Unsupported(String),
}

impl ResponseShape {
    pub fn classify(json: &Value) -> Self {
        let choice = &json["choices"][0];

        if let Some(message) = choice.get("message").filter(|m| m.is_object()) {
            let shape = chat_shape(message);
            if !shape_is_empty(&shape) {
                return shape;
            }
        }

        if let Some(text) = choice["text"].as_str().filter(|t| !t.is_empty()) {
            return ResponseShape::Text(text.to_string());
        }

        if json.get("content").is_some() || json.get("tool_calls").is_some() {
            let shape = chat_shape(json);
            if !shape_is_empty(&shape) {
                return shape;
            }
        }

        ResponseShape::Unsupported(json.to_string())
    }

    pub fn into_reply(self) -> Reply {
        match self {
            ResponseShape::Chat {
                content,
                tool_calls,
            } => Reply::text(content).with_tool_calls(tool_calls),
            ResponseShape::Text(text) | ResponseShape::Unsupported(text) => Reply::text(text),
        }
    }
}

fn chat_shape(message: &Value) -> ResponseShape {
    let content = match &message["content"] {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    };
    let tool_calls = message["tool_calls"]
        .as_array()
        .map(|calls| calls.iter().map(ToolCall::from_value).collect())
        .unwrap_or_default();
    ResponseShape::Chat {
        content,
        tool_calls,
    }
}

fn shape_is_empty(shape: &ResponseShape) -> bool {
    matches!(shape, ResponseShape::Chat { content, tool_calls }
        if content.is_empty() && tool_calls.is_empty())
}

/// Turn a successful response body into a [`Reply`].
pub(crate) fn parse_response(json: Value) -> Reply {
    let usage = parse_usage(&json["usage"]);
    let mut reply = ResponseShape::classify(&json).into_reply();
    reply.usage = usage;
    reply
}

fn parse_usage(usage: &Value) -> TokenUsage {
    let count = |keys: [&str; 2]| {
        keys.iter()
            .find_map(|k| usage[*k].as_u64())
            .unwrap_or(0)
    };
    TokenUsage {
        input_tokens: count(["prompt_tokens", "input_tokens"]),
        output_tokens: count(["completion_tokens", "output_tokens"]),
    }
}

impl ToolCall {
    /// Read a tool call from any of the shapes models produce.
    ///
    /// The name may sit under `name`, `function`, `tool` or `func`, where
    /// `function` can also be the OpenAI `{name, arguments}` object.
    /// Arguments sit under `args` or `arguments`; JSON encoded as a string
    /// is decoded. A bare string entry is taken as the tool name.
    pub fn from_value(value: &Value) -> Self {
        if let Some(name) = value.as_str() {
            return ToolCall::new(name, Value::Object(Default::default()));
        }

        let function = &value["function"];
        let name = ["name", "function", "tool", "func"]
            .iter()
            .find_map(|k| value[*k].as_str())
            .or_else(|| function["name"].as_str())
            .unwrap_or_default();

        let arguments = ["args", "arguments"]
            .iter()
            .map(|k| &value[*k])
            .chain(std::iter::once(&function["arguments"]))
            .find(|v| !v.is_null())
            .map(decode_arguments)
            .unwrap_or_else(|| Value::Object(Default::default()));

        ToolCall {
            id: value["id"].as_str().unwrap_or_default().to_string(),
            name: name.to_string(),
            arguments,
        }
    }
}

fn decode_arguments(raw: &Value) -> Value {
    match raw {
        Value::String(s) => serde_json::from_str(s).unwrap_or_else(|_| raw.clone()),
        other => other.clone(),
    }
}
