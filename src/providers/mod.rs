//! Providers module - language-model gateways
//!
//! This module defines the `LLMProvider` trait the agent loop talks to and
//! the OpenAI-compatible implementation used by the CLI.
//!
//! # Example
//!
//! ```rust,ignore
//! use chefbot::providers::{ChatOptions, LLMProvider, OpenAIProvider};
//! use chefbot::session::Message;
//!
//! async fn example() {
//!     let provider = OpenAIProvider::new("your-api-key");
//!     let messages = vec![Message::human("오늘 저녁 뭐 먹지?")];
//!     let options = ChatOptions::new().with_max_tokens(1000);
//!
//!     let response = provider.chat(messages, vec![], None, options).await.unwrap();
//!     println!("Response: {}", response.content);
//! }
//! ```

pub mod openai;
mod types;

use crate::error::ProviderError;

pub use openai::OpenAIProvider;
pub use types::{ChatOptions, LLMProvider, LLMResponse, LLMToolCall, ToolDefinition, Usage};

/// Parse an HTTP status code and response body into a structured [`ProviderError`].
pub fn parse_provider_error(status: u16, body: &str) -> ProviderError {
    match status {
        401 => ProviderError::Auth(body.to_string()),
        402 => ProviderError::Billing(body.to_string()),
        404 => ProviderError::ModelNotFound(body.to_string()),
        429 => ProviderError::RateLimit(body.to_string()),
        400 => ProviderError::InvalidRequest(body.to_string()),
        500..=599 => ProviderError::ServerError(body.to_string()),
        _ => ProviderError::Unknown(format!("HTTP {}: {}", status, body)),
    }
}
