//! Lightweight LLM integration helpers.
//!
//! The module contains typed wrappers for chat messages, the completion
//! client, tool declarations, and the session transcript.

/// Assistant reply structures and content extraction.
pub mod ai;
/// Chat message types and the chat-completions client.
pub mod chat_models;
pub(crate) mod chat_runtime;
/// Provider errors and the `ChatModel` seam.
pub mod provider;
/// Tool schema and invocation payload helpers.
pub mod tools;
/// Ordered conversation history.
pub mod transcript;

pub use chat_runtime::RequestFailure;
