use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::rchain::ai::{AIMessage, MessageContent};
use crate::rchain::chat_runtime::send_once;
use crate::rchain::provider::{ChatModel, ProviderError, endpoint};
use crate::rchain::tools::{ToolCall, ToolDefinition};

/// Chat message as replayed to the completion endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatMessage {
    System(String),
    User(String),
    /// Assistant turn; `tool_calls` is non-empty only when the model asked
    /// for tools.
    Assistant {
        content: Option<String>,
        tool_calls: Vec<ToolCall>,
    },
    /// Result of one tool call, keyed by the call id it answers.
    Tool {
        tool_call_id: String,
        content: String,
    },
}

impl ChatMessage {
    pub fn role(&self) -> &'static str {
        match self {
            ChatMessage::System(_) => "system",
            ChatMessage::User(_) => "user",
            ChatMessage::Assistant { .. } => "assistant",
            ChatMessage::Tool { .. } => "tool",
        }
    }

    /// Serializes this chat message to provider JSON format.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("role".to_string(), Value::String(self.role().to_string()));
        match self {
            ChatMessage::System(content) | ChatMessage::User(content) => {
                map.insert("content".to_string(), Value::String(content.clone()));
            }
            ChatMessage::Assistant {
                content,
                tool_calls,
            } => {
                map.insert(
                    "content".to_string(),
                    content.clone().map_or(Value::Null, Value::String),
                );
                if !tool_calls.is_empty() {
                    map.insert(
                        "tool_calls".to_string(),
                        Value::Array(tool_calls.iter().map(ToolCall::to_json).collect()),
                    );
                }
            }
            ChatMessage::Tool {
                tool_call_id,
                content,
            } => {
                map.insert(
                    "tool_call_id".to_string(),
                    Value::String(tool_call_id.clone()),
                );
                map.insert("content".to_string(), Value::String(content.clone()));
            }
        }
        Value::Object(map)
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantPayload,
}

#[derive(Debug, Deserialize)]
struct AssistantPayload {
    #[serde(default)]
    content: Option<Value>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCallPayload>>,
}

#[derive(Debug, Deserialize)]
struct ToolCallPayload {
    #[serde(default)]
    id: String,
    function: FunctionPayload,
}

#[derive(Debug, Deserialize)]
struct FunctionPayload {
    name: String,
    #[serde(default)]
    arguments: Value,
}

impl From<ToolCallPayload> for ToolCall {
    fn from(payload: ToolCallPayload) -> Self {
        let arguments = match payload.function.arguments {
            Value::String(raw) => raw,
            Value::Null => String::new(),
            other => other.to_string(),
        };
        ToolCall::new(payload.id, payload.function.name, arguments)
    }
}

/// OpenAI-compatible chat-completions client.
#[derive(Debug, Clone)]
pub struct ChatCompletions {
    model: String,
    temperature: f64,
    api_key: String,
    url: String,
    client: Client,
}

impl ChatCompletions {
    pub fn new(
        model: impl Into<String>,
        temperature: f64,
        api_key: impl Into<String>,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ProviderError::Client)?;
        Ok(Self {
            model: model.into(),
            temperature,
            api_key: api_key.into(),
            url: endpoint(base_url),
            client,
        })
    }

    fn payload(&self, messages: &[ChatMessage], tools: &[ToolDefinition]) -> Value {
        let mut payload = Map::new();
        payload.insert("model".to_string(), Value::String(self.model.clone()));
        payload.insert(
            "messages".to_string(),
            Value::Array(messages.iter().map(ChatMessage::to_json).collect()),
        );
        payload.insert("temperature".to_string(), json!(self.temperature));
        if !tools.is_empty() {
            payload.insert(
                "tools".to_string(),
                Value::Array(tools.iter().map(ToolDefinition::to_json).collect()),
            );
            payload.insert("tool_choice".to_string(), json!("auto"));
        }
        Value::Object(payload)
    }
}

impl ChatModel for ChatCompletions {
    fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<AIMessage, ProviderError> {
        debug!(model = %self.model, messages = messages.len(), "requesting completion");
        let response = send_once(
            self.client
                .post(&self.url)
                .bearer_auth(&self.api_key)
                .json(&self.payload(messages, tools)),
        )?;

        let body: ChatCompletionResponse = response.json().map_err(ProviderError::Decode)?;
        let message = body
            .choices
            .into_iter()
            .next()
            .ok_or(ProviderError::EmptyResponse)?
            .message;

        Ok(AIMessage {
            content: MessageContent::from_json(message.content.as_ref()),
            tool_calls: message
                .tool_calls
                .unwrap_or_default()
                .into_iter()
                .map(ToolCall::from)
                .collect(),
        })
    }
}
