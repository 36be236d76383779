use thiserror::Error;

use crate::rchain::chat_models::ChatMessage;
use crate::rchain::tools::ToolCall;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TranscriptError {
    #[error("tool result for '{0}' does not answer a pending tool call")]
    UnknownToolCall(String),
}

/// Ordered, append-only message history for one session.
///
/// The first entry is always the system message. Tool results can only be
/// appended for call ids issued by the latest assistant message and not yet
/// answered.
#[derive(Debug, Clone)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
    pending: Vec<String>,
}

impl Transcript {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::System(system_prompt.into())],
            pending: Vec::new(),
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Drops everything but the system message.
    pub fn reset(&mut self) {
        self.messages.truncate(1);
        self.pending.clear();
    }

    /// Restores the transcript to an earlier length. Used to discard a turn
    /// whose completion call failed.
    pub fn rollback(&mut self, len: usize) {
        self.messages.truncate(len.max(1));
        self.pending.clear();
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.pending.clear();
        self.messages.push(ChatMessage::User(content.into()));
    }

    /// Records an assistant turn that requested tools; its call ids become
    /// the pending set.
    pub fn push_tool_request(&mut self, content: Option<String>, tool_calls: Vec<ToolCall>) {
        self.pending = tool_calls.iter().map(|call| call.id().to_string()).collect();
        self.messages.push(ChatMessage::Assistant {
            content,
            tool_calls,
        });
    }

    pub fn push_tool_result(
        &mut self,
        tool_call_id: &str,
        content: impl Into<String>,
    ) -> Result<(), TranscriptError> {
        let position = self
            .pending
            .iter()
            .position(|id| id == tool_call_id)
            .ok_or_else(|| TranscriptError::UnknownToolCall(tool_call_id.to_string()))?;
        self.pending.remove(position);
        self.messages.push(ChatMessage::Tool {
            tool_call_id: tool_call_id.to_string(),
            content: content.into(),
        });
        Ok(())
    }

    pub fn push_assistant_text(&mut self, content: impl Into<String>) {
        self.pending.clear();
        self.messages.push(ChatMessage::Assistant {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        });
    }
}
