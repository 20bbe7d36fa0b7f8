//! Language model access
//!
//! The assistant talks to the model through the `ChatModel` trait so the
//! HTTP client can be swapped for a scripted model in tests.

mod json;
mod openai;

pub use json::extract_json;
pub use openai::OpenAiClient;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::LlmConfig;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("language model request failed: {0}")]
    Request(String),

    #[error("language model returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("language model returned no content")]
    EmptyResponse,

    #[error("could not parse JSON from model output: {0}")]
    InvalidJson(String),

    #[error("API key not set; export {0}")]
    MissingApiKey(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Sampling parameters for free-form (non-JSON) replies
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sampling {
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
}

impl Default for Sampling {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1000,
            top_p: 0.95,
        }
    }
}

impl From<&LlmConfig> for Sampling {
    fn from(config: &LlmConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            top_p: config.top_p,
        }
    }
}

/// One chat completion call
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        let sampling = Sampling::default();
        Self {
            messages,
            temperature: sampling.temperature,
            max_tokens: sampling.max_tokens,
            top_p: sampling.top_p,
        }
    }

    pub fn sampling(self, sampling: Sampling) -> Self {
        self.temperature(sampling.temperature)
            .max_tokens(sampling.max_tokens)
            .top_p(sampling.top_p)
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn top_p(mut self, top_p: f32) -> Self {
        self.top_p = top_p;
        self
    }
}

/// A chat-completion capable language model
#[allow(async_fn_in_trait)]
pub trait ChatModel {
    /// Text of the first completion choice
    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError>;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_serializes_lowercase_role() {
        let json = serde_json::to_value(ChatMessage::system("hi")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "system", "content": "hi"}));
    }

    #[test]
    fn test_request_builder() {
        let request = ChatRequest::new(vec![ChatMessage::user("q")])
            .temperature(0.0)
            .max_tokens(600)
            .top_p(1.0);
        assert_eq!(request.temperature, 0.0);
        assert_eq!(request.max_tokens, 600);
        assert_eq!(request.top_p, 1.0);
    }

    #[test]
    fn test_sampling_from_config() {
        let config = LlmConfig {
            temperature: 0.2,
            max_tokens: 256,
            ..LlmConfig::default()
        };
        let request = ChatRequest::new(vec![]).sampling(Sampling::from(&config));
        assert_eq!(request.temperature, 0.2);
        assert_eq!(request.max_tokens, 256);
        assert_eq!(request.top_p, 0.95);
    }
}
