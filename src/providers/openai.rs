//! OpenAI Provider Implementation
//!
//! Implements `LLMProvider` for the OpenAI Chat Completions API (and
//! compatible endpoints), translating the thread's `Message` history into
//! OpenAI roles and parsing tool calls back out.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ChefError, Result};
use crate::session::Message;

use super::{
    parse_provider_error, ChatOptions, LLMProvider, LLMResponse, LLMToolCall, ToolDefinition,
    Usage,
};

/// The OpenAI API endpoint URL.
const OPENAI_API_URL: &str = "https://api.openai.com/v1";

/// The default model.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

// ============================================================================
// OpenAI API Request Types
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAITool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    r#type: &'static str,
}

impl OpenAIRequest {
    fn new(
        model: &str,
        messages: Vec<Message>,
        tools: Vec<ToolDefinition>,
        options: &ChatOptions,
    ) -> Self {
        Self {
            model: model.to_string(),
            messages: convert_messages(messages),
            tools: (!tools.is_empty()).then(|| convert_tools(tools)),
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            response_format: options.json_mode.then_some(ResponseFormat {
                r#type: "json_object",
            }),
        }
    }
}

/// A message in OpenAI's format.
#[derive(Debug, Serialize)]
struct OpenAIMessage {
    /// "system", "user", "assistant" or "tool"
    role: &'static str,
    /// Null for an assistant turn that only carries tool calls
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAIToolCallRequest>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct OpenAIToolCallRequest {
    id: String,
    r#type: &'static str,
    function: OpenAIFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIFunctionCall {
    name: String,
    /// JSON-encoded arguments
    arguments: String,
}

#[derive(Debug, Serialize)]
struct OpenAITool {
    r#type: &'static str,
    function: OpenAIFunctionDef,
}

#[derive(Debug, Serialize)]
struct OpenAIFunctionDef {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

// ============================================================================
// OpenAI API Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAIToolCallResponse>>,
}

#[derive(Debug, Deserialize)]
struct OpenAIToolCallResponse {
    id: String,
    function: OpenAIFunctionCall,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorResponse {
    error: OpenAIError,
}

#[derive(Debug, Deserialize)]
struct OpenAIError {
    message: String,
}

// ============================================================================
// OpenAI Provider
// ============================================================================

/// OpenAI-compatible chat completions provider.
pub struct OpenAIProvider {
    api_key: String,
    api_base: String,
    model: String,
    client: Client,
}

impl OpenAIProvider {
    /// Create a provider for the default OpenAI endpoint.
    ///
    /// # Example
    /// ```
    /// use chefbot::providers::{LLMProvider, OpenAIProvider};
    ///
    /// let provider = OpenAIProvider::new("sk-xxx");
    /// assert_eq!(provider.name(), "openai");
    /// assert_eq!(provider.default_model(), "gpt-4o-mini");
    /// ```
    pub fn new(api_key: &str) -> Self {
        Self::with_base_url(api_key, OPENAI_API_URL)
    }

    /// Create a provider for an OpenAI-compatible endpoint. A trailing slash
    /// on `api_base` is removed.
    pub fn with_base_url(api_key: &str, api_base: &str) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self::with_client(api_key, api_base, client)
    }

    /// Create a provider with a custom HTTP client.
    pub fn with_client(api_key: &str, api_base: &str, client: Client) -> Self {
        Self {
            api_key: api_key.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
            model: DEFAULT_MODEL.to_string(),
            client,
        }
    }

    /// Override the model used when a request names none.
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }
}

// ============================================================================
// Conversion Functions
// ============================================================================

/// Convert thread messages to OpenAI API format.
fn convert_messages(messages: Vec<Message>) -> Vec<OpenAIMessage> {
    messages
        .into_iter()
        .map(|msg| match msg {
            Message::System { content } => OpenAIMessage {
                role: "system",
                content: Some(content),
                tool_calls: None,
                tool_call_id: None,
            },
            Message::Human { content } => OpenAIMessage {
                role: "user",
                content: Some(content),
                tool_calls: None,
                tool_call_id: None,
            },
            Message::Assistant {
                content,
                tool_requests,
            } => {
                let tool_calls: Vec<OpenAIToolCallRequest> = tool_requests
                    .into_iter()
                    .map(|req| OpenAIToolCallRequest {
                        id: req.id,
                        r#type: "function",
                        function: OpenAIFunctionCall {
                            name: req.name,
                            arguments: match req.arguments {
                                serde_json::Value::String(raw) => raw,
                                other => other.to_string(),
                            },
                        },
                    })
                    .collect();
                let tool_calls = (!tool_calls.is_empty()).then_some(tool_calls);
                OpenAIMessage {
                    role: "assistant",
                    content: if content.is_empty() && tool_calls.is_some() {
                        None
                    } else {
                        Some(content)
                    },
                    tool_calls,
                    tool_call_id: None,
                }
            }
            Message::ToolResult {
                tool_request_id,
                content,
                ..
            } => OpenAIMessage {
                role: "tool",
                content: Some(content),
                tool_calls: None,
                tool_call_id: Some(tool_request_id),
            },
        })
        .collect()
}

fn convert_tools(tools: Vec<ToolDefinition>) -> Vec<OpenAITool> {
    tools
        .into_iter()
        .map(|t| OpenAITool {
            r#type: "function",
            function: OpenAIFunctionDef {
                name: t.name,
                description: t.description,
                parameters: t.parameters,
            },
        })
        .collect()
}

fn convert_response(response: OpenAIResponse) -> LLMResponse {
    let (content, tool_calls) = match response.choices.into_iter().next() {
        Some(c) => {
            let tool_calls = c
                .message
                .tool_calls
                .unwrap_or_default()
                .into_iter()
                .map(|tc| LLMToolCall::new(&tc.id, &tc.function.name, &tc.function.arguments))
                .collect();
            (c.message.content.unwrap_or_default(), tool_calls)
        }
        None => (String::new(), Vec::new()),
    };

    let llm_response = LLMResponse::with_tools(&content, tool_calls);
    match response.usage {
        Some(usage) => {
            llm_response.with_usage(Usage::new(usage.prompt_tokens, usage.completion_tokens))
        }
        None => llm_response,
    }
}

// ============================================================================
// LLMProvider Implementation
// ============================================================================

#[async_trait]
impl LLMProvider for OpenAIProvider {
    async fn chat(
        &self,
        messages: Vec<Message>,
        tools: Vec<ToolDefinition>,
        model: Option<&str>,
        options: ChatOptions,
    ) -> Result<LLMResponse> {
        let model = model.unwrap_or(self.model.as_str());
        let request = OpenAIRequest::new(model, messages, tools, &options);

        debug!(model = %model, messages = request.messages.len(), "OpenAI request");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChefError::Provider(format!("OpenAI request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<OpenAIErrorResponse>(&error_text)
                .map(|e| e.error.message)
                .unwrap_or(error_text);
            return Err(parse_provider_error(status.as_u16(), &detail).into());
        }

        let openai_response: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| ChefError::Provider(format!("Failed to parse OpenAI response: {}", e)))?;

        let llm_response = convert_response(openai_response);
        info!(
            model = %model,
            tool_calls = llm_response.tool_calls.len(),
            "OpenAI response received"
        );
        Ok(llm_response)
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ToolRequest;
    use serde_json::json;

    #[test]
    fn test_openai_provider_with_base_url() {
        let provider = OpenAIProvider::with_base_url("test-key", "https://custom.api/v1/");
        assert_eq!(provider.api_base, "https://custom.api/v1");
        let provider = provider.with_model("gpt-4o");
        assert_eq!(provider.default_model(), "gpt-4o");
    }

    #[test]
    fn test_convert_messages_roles() {
        let converted = convert_messages(vec![
            Message::system("당신은 셰프봇입니다"),
            Message::human("안녕"),
            Message::assistant("안녕하세요!"),
        ]);

        let roles: Vec<&str> = converted.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec!["system", "user", "assistant"]);
        assert_eq!(converted[1].content.as_deref(), Some("안녕"));
        assert!(converted[2].tool_calls.is_none());
    }

    #[test]
    fn test_convert_messages_with_tool_requests() {
        let converted = convert_messages(vec![
            Message::assistant_with_tools(
                "",
                vec![ToolRequest::new("call_1", "search_recipe", json!({"query": "국물"}))],
            ),
            Message::tool_result("call_1", "search_recipe", "{\"results\":[]}"),
        ]);

        assert_eq!(converted[0].role, "assistant");
        assert!(converted[0].content.is_none());
        let calls = converted[0].tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].id, "call_1");
        assert_eq!(calls[0].function.name, "search_recipe");
        assert_eq!(calls[0].function.arguments, r#"{"query":"국물"}"#);

        assert_eq!(converted[1].role, "tool");
        assert_eq!(converted[1].tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn test_convert_messages_raw_string_arguments() {
        let converted = convert_messages(vec![Message::assistant_with_tools(
            "",
            vec![ToolRequest::new("c", "calculate", json!("{broken"))],
        )]);
        let calls = converted[0].tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].function.arguments, "{broken");
    }

    #[test]
    fn test_convert_tools() {
        let converted = convert_tools(vec![ToolDefinition::new(
            "search_google",
            "Search the web",
            json!({"type": "object"}),
        )]);
        assert_eq!(converted[0].r#type, "function");
        assert_eq!(converted[0].function.name, "search_google");
    }

    #[test]
    fn test_request_json_mode() {
        let plain = OpenAIRequest::new(
            "gpt-4o-mini",
            vec![Message::human("안녕")],
            vec![],
            &ChatOptions::new(),
        );
        let body = serde_json::to_value(&plain).unwrap();
        assert!(body.get("response_format").is_none());
        assert!(body.get("tools").is_none());

        let json_mode = OpenAIRequest::new(
            "gpt-4o-mini",
            vec![Message::human("JSON으로 답해줘")],
            vec![],
            &ChatOptions::new().with_temperature(0.0).with_json_mode(),
        );
        let body = serde_json::to_value(&json_mode).unwrap();
        assert_eq!(body["response_format"], json!({"type": "json_object"}));
        assert_eq!(body["temperature"], json!(0.0));
    }

    #[test]
    fn test_convert_response_with_tool_calls() {
        let response: OpenAIResponse = serde_json::from_value(json!({
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "call_9",
                        "type": "function",
                        "function": {"name": "get_current_weather", "arguments": "{}"}
                    }]
                }
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3}
        }))
        .unwrap();

        let converted = convert_response(response);
        assert_eq!(converted.content, "");
        assert_eq!(converted.tool_calls[0].name, "get_current_weather");
        assert_eq!(converted.usage.unwrap().total_tokens, 15);
    }

    #[test]
    fn test_convert_response_text_only() {
        let response: OpenAIResponse = serde_json::from_value(json!({
            "choices": [{"message": {"content": "김치찌개 어때요?"}}]
        }))
        .unwrap();
        let converted = convert_response(response);
        assert_eq!(converted.content, "김치찌개 어때요?");
        assert!(!converted.has_tool_calls());
        assert!(converted.usage.is_none());
    }

    #[test]
    fn test_convert_response_no_choices() {
        let converted = convert_response(OpenAIResponse {
            choices: vec![],
            usage: None,
        });
        assert!(converted.content.is_empty());
        assert!(converted.tool_calls.is_empty());
    }
}
