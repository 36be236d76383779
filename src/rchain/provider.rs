use thiserror::Error;

use crate::rchain::ai::AIMessage;
use crate::rchain::chat_models::ChatMessage;
use crate::rchain::chat_runtime::RequestFailure;
use crate::rchain::tools::ToolDefinition;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Chat-completions URL under an OpenAI-compatible base endpoint.
pub fn endpoint(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

/// Failure of a completion call. Never produced by tool execution.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("chat request failed: {0}")]
    Request(#[from] RequestFailure),
    #[error("chat response could not be decoded: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("chat response did not contain any choices")]
    EmptyResponse,
}

/// Anything that can answer a transcript with one assistant message.
pub trait ChatModel {
    fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<AIMessage, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::endpoint;

    #[test]
    fn endpoint_appends_path_once() {
        assert_eq!(
            endpoint("https://api.openai.com/v1"),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(
            endpoint("http://127.0.0.1:9000/v1/"),
            "http://127.0.0.1:9000/v1/chat/completions"
        );
    }
}
