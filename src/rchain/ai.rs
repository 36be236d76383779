use serde_json::Value;

use crate::rchain::tools::ToolCall;

/// One element of a multi-part content payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentPart {
    /// A part tagged `"type": "text"`.
    Text(String),
    /// Any other part (images, refusals, unknown tags).
    Other,
}

impl ContentPart {
    pub fn from_json(value: &Value) -> Self {
        match value.get("type").and_then(Value::as_str) {
            Some("text") => ContentPart::Text(
                value
                    .get("text")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            ),
            _ => ContentPart::Other,
        }
    }
}

/// Assistant content as returned by the completion endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageContent {
    /// `content` was null or missing.
    Absent,
    /// Bare string content.
    Text(String),
    /// List of typed parts.
    Parts(Vec<ContentPart>),
    /// Any other JSON shape.
    Unsupported,
}

impl MessageContent {
    pub fn from_json(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => MessageContent::Absent,
            Some(Value::String(text)) => MessageContent::Text(text.clone()),
            Some(Value::Array(parts)) => {
                MessageContent::Parts(parts.iter().map(ContentPart::from_json).collect())
            }
            Some(_) => MessageContent::Unsupported,
        }
    }

    /// Narrative text: the bare string, or the text parts concatenated in
    /// order. Every other shape yields an empty string.
    pub fn text(&self) -> String {
        match self {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    ContentPart::Text(text) => Some(text.as_str()),
                    ContentPart::Other => None,
                })
                .collect(),
            MessageContent::Absent | MessageContent::Unsupported => String::new(),
        }
    }
}

/// Assistant message returned by chat models.
#[derive(Debug, Clone, PartialEq)]
pub struct AIMessage {
    /// Natural language content.
    pub content: MessageContent,
    /// Optional tool call requests emitted by the model.
    pub tool_calls: Vec<ToolCall>,
}

impl AIMessage {
    /// Plain narrative reply without tool calls.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: MessageContent::Text(content.into()),
            tool_calls: Vec::new(),
        }
    }

    pub fn with_tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: MessageContent::Absent,
            tool_calls,
        }
    }

    pub fn requests_tools(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}
