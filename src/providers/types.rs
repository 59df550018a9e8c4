//! Provider types for chefbot
//!
//! This module defines the model gateway seam: the `LLMProvider` trait, the
//! options passed with each request and the response shape the agent loop
//! consumes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::session::{Message, ToolRequest};

/// Definition of a tool that the model may call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolDefinition {
    /// The name of the tool (unique within a registry)
    pub name: String,
    /// Human-readable description of what the tool does
    pub description: String,
    /// JSON Schema describing the tool's parameters
    pub parameters: Value,
}

impl ToolDefinition {
    /// Create a new tool definition.
    ///
    /// # Example
    /// ```
    /// use chefbot::providers::ToolDefinition;
    /// use serde_json::json;
    ///
    /// let tool = ToolDefinition::new(
    ///     "search_recipe",
    ///     "Search recipes",
    ///     json!({
    ///         "type": "object",
    ///         "properties": { "query": { "type": "string" } },
    ///         "required": ["query"]
    ///     }),
    /// );
    /// assert_eq!(tool.name, "search_recipe");
    /// ```
    pub fn new(name: &str, description: &str, parameters: Value) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            parameters,
        }
    }
}

/// The model gateway.
///
/// Given the conversation so far and the tool catalog, returns an assistant
/// reply that is either final text or a list of tool requests. Transport
/// failures surface as `Err` and are never retried by the agent loop.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Send a chat completion request.
    ///
    /// # Arguments
    /// * `messages` - The conversation history, system prompt first
    /// * `tools` - Tool catalog; empty for plain completions
    /// * `model` - Optional model override (uses default if None)
    /// * `options` - Sampling options
    async fn chat(
        &self,
        messages: Vec<Message>,
        tools: Vec<ToolDefinition>,
        model: Option<&str>,
        options: ChatOptions,
    ) -> Result<LLMResponse>;

    /// Model used when no override is given (e.g. "gpt-4o-mini").
    fn default_model(&self) -> &str;

    /// Provider name (e.g. "openai").
    fn name(&self) -> &str;
}

/// Options for chat completion requests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatOptions {
    /// Maximum number of tokens to generate
    pub max_tokens: Option<u32>,
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Ask the model for a single JSON object
    pub json_mode: bool,
}

impl ChatOptions {
    /// Create new default chat options.
    ///
    /// # Example
    /// ```
    /// use chefbot::providers::ChatOptions;
    ///
    /// let options = ChatOptions::new().with_max_tokens(1000).with_temperature(0.7);
    /// assert_eq!(options.max_tokens, Some(1000));
    /// assert_eq!(options.temperature, Some(0.7));
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Constrain the reply to a JSON object. The prompt must still mention JSON.
    pub fn with_json_mode(mut self) -> Self {
        self.json_mode = true;
        self
    }
}

/// Response from a chat completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMResponse {
    /// Text content of the response
    pub content: String,
    /// Tool calls requested by the model (if any)
    pub tool_calls: Vec<LLMToolCall>,
    /// Token usage information (if available)
    pub usage: Option<Usage>,
}

impl LLMResponse {
    /// A final text answer with no tool calls.
    ///
    /// # Example
    /// ```
    /// use chefbot::providers::LLMResponse;
    ///
    /// let response = LLMResponse::text("김치찌개를 추천해요");
    /// assert!(!response.has_tool_calls());
    /// ```
    pub fn text(content: &str) -> Self {
        Self {
            content: content.to_string(),
            tool_calls: vec![],
            usage: None,
        }
    }

    /// A response requesting tools.
    pub fn with_tools(content: &str, tool_calls: Vec<LLMToolCall>) -> Self {
        Self {
            content: content.to_string(),
            tool_calls,
            usage: None,
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Convert into the `Assistant` message recorded in the thread.
    pub fn into_message(self) -> Message {
        if self.tool_calls.is_empty() {
            return Message::assistant(&self.content);
        }
        let requests = self.tool_calls.iter().map(LLMToolCall::to_request).collect();
        Message::assistant_with_tools(&self.content, requests)
    }
}

/// A tool call made by the model, with arguments as the raw JSON text the
/// provider returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMToolCall {
    /// Unique identifier for this tool call
    pub id: String,
    /// Name of the tool to execute
    pub name: String,
    /// JSON-encoded arguments for the tool
    pub arguments: String,
}

impl LLMToolCall {
    /// Create a new tool call.
    ///
    /// # Example
    /// ```
    /// use chefbot::providers::LLMToolCall;
    ///
    /// let call = LLMToolCall::new("call_123", "search_google", r#"{"query": "제철 음식"}"#);
    /// assert_eq!(call.name, "search_google");
    /// ```
    pub fn new(id: &str, name: &str, arguments: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            arguments: arguments.to_string(),
        }
    }

    /// Parse the arguments as a specific type.
    pub fn parse_arguments<T: serde::de::DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.arguments)
    }

    /// Structured arguments. Empty text is `{}`; text that is not JSON is
    /// kept as a string so schema validation reports it to the model.
    pub fn arguments_value(&self) -> Value {
        let raw = self.arguments.trim();
        if raw.is_empty() {
            return Value::Object(Default::default());
        }
        serde_json::from_str(raw).unwrap_or_else(|_| Value::String(self.arguments.clone()))
    }

    /// Convert into the `ToolRequest` stored on the assistant message.
    pub fn to_request(&self) -> ToolRequest {
        ToolRequest::new(&self.id, &self.name, self.arguments_value())
    }
}

/// Token usage information from a completion request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl Usage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_llm_response_text() {
        let response = LLMResponse::text("Hello, world!");
        assert_eq!(response.content, "Hello, world!");
        assert!(!response.has_tool_calls());
        assert!(response.usage.is_none());
    }

    #[test]
    fn test_llm_response_with_usage() {
        let response = LLMResponse::text("Hello").with_usage(Usage::new(100, 50));
        assert_eq!(response.usage.unwrap().total_tokens, 150);
    }

    #[test]
    fn test_chat_options_default() {
        let options = ChatOptions::default();
        assert!(options.max_tokens.is_none());
        assert!(options.temperature.is_none());
    }

    #[test]
    fn test_arguments_value() {
        let call = LLMToolCall::new("c1", "search_recipe", r#"{"query": "국물"}"#);
        assert_eq!(call.arguments_value(), json!({"query": "국물"}));

        let empty = LLMToolCall::new("c2", "get_current_time", "  ");
        assert_eq!(empty.arguments_value(), json!({}));

        let broken = LLMToolCall::new("c3", "calculate", "{not json");
        assert_eq!(broken.arguments_value(), json!("{not json"));
    }

    #[test]
    fn test_into_message_text() {
        let msg = LLMResponse::text("done").into_message();
        assert_eq!(msg, Message::assistant("done"));
        assert!(!msg.has_tool_requests());
    }

    #[test]
    fn test_into_message_with_tools() {
        let response = LLMResponse::with_tools(
            "",
            vec![
                LLMToolCall::new("c1", "get_current_weather", "{}"),
                LLMToolCall::new("c2", "search_recipe", r#"{"query": "국물"}"#),
            ],
        );
        match response.into_message() {
            Message::Assistant { tool_requests, .. } => {
                assert_eq!(tool_requests.len(), 2);
                assert_eq!(tool_requests[0].id, "c1");
                assert_eq!(tool_requests[1].arguments, json!({"query": "국물"}));
            }
            other => panic!("expected assistant message, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_arguments() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct SearchArgs {
            query: String,
        }

        let call = LLMToolCall::new("call_1", "search_google", r#"{"query": "rust"}"#);
        let args: SearchArgs = call.parse_arguments().unwrap();
        assert_eq!(args.query, "rust");
    }

    #[test]
    fn test_tool_definition_serialization() {
        let tool = ToolDefinition::new("search", "Search the web", json!({"type": "object"}));
        let json = serde_json::to_string(&tool).unwrap();
        let parsed: ToolDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, tool);
    }
}
