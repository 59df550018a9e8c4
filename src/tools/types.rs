//! Tool types for chefbot
//!
//! This module defines the `Tool` trait every tool implements, the
//! `ToolContext` handed to tools at execution time, and the `ToolOutcome`
//! the registry returns for every call.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::Result;

/// Trait that all tools must implement.
///
/// A tool is a name, a description for the model, a JSON schema for its
/// arguments and an async handler. The registry validates arguments against
/// `parameters()` before `execute` is called, so handlers may deserialize
/// their arguments without re-checking required fields.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use serde_json::{json, Value};
/// use chefbot::tools::{Tool, ToolContext};
/// use chefbot::error::Result;
///
/// struct PingTool;
///
/// #[async_trait]
/// impl Tool for PingTool {
///     fn name(&self) -> &str { "ping" }
///     fn description(&self) -> &str { "Answers pong" }
///     fn parameters(&self) -> Value {
///         json!({"type": "object", "properties": {}})
///     }
///     async fn execute(&self, _args: Value, _ctx: &ToolContext) -> Result<Value> {
///         Ok(json!("pong"))
///     }
/// }
/// ```
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique tool name the model uses to request it.
    fn name(&self) -> &str;

    /// Description advertised to the model.
    fn description(&self) -> &str;

    /// JSON schema of the tool's arguments.
    fn parameters(&self) -> Value;

    /// Execute the tool with already-validated arguments.
    ///
    /// Returned errors are folded into `ToolOutcome::ExecutionFailed` by the
    /// registry; they never abort the agent loop.
    async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<Value>;
}

/// Context provided to tools during execution.
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    /// Thread the calling turn belongs to
    pub thread_id: Option<String>,
}

impl ToolContext {
    /// Create a new empty tool context.
    ///
    /// # Example
    /// ```
    /// use chefbot::tools::ToolContext;
    ///
    /// let ctx = ToolContext::new().with_thread("default_thread");
    /// assert_eq!(ctx.thread_id.as_deref(), Some("default_thread"));
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the thread id.
    pub fn with_thread(mut self, thread_id: &str) -> Self {
        self.thread_id = Some(thread_id.to_string());
        self
    }
}

/// Result of a registry call. Never an `Err`: failures are values the model
/// gets to see.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolOutcome {
    /// Handler returned a structured result
    Success { result: Value },
    /// Arguments did not match the tool's input schema
    InvalidArguments { message: String },
    /// Handler ran and failed
    ExecutionFailed { message: String },
    /// No tool registered under that name
    UnknownTool { name: String },
}

impl ToolOutcome {
    /// Whether this outcome is an error of any kind.
    pub fn is_error(&self) -> bool {
        !matches!(self, ToolOutcome::Success { .. })
    }

    /// Short tag naming the outcome kind.
    pub fn tag(&self) -> &'static str {
        match self {
            ToolOutcome::Success { .. } => "ok",
            ToolOutcome::InvalidArguments { .. } => "invalid arguments",
            ToolOutcome::ExecutionFailed { .. } => "execution failed",
            ToolOutcome::UnknownTool { .. } => "unknown tool",
        }
    }

    /// Text placed in the `ToolResult` message for the model.
    ///
    /// String results pass through verbatim, other results are serialized as
    /// JSON, errors become `{"error": <tag>, "message": ...}`.
    pub fn to_content(&self) -> String {
        match self {
            ToolOutcome::Success {
                result: Value::String(s),
            } => s.clone(),
            ToolOutcome::Success { result } => result.to_string(),
            ToolOutcome::InvalidArguments { message } | ToolOutcome::ExecutionFailed { message } => {
                json!({"error": self.tag(), "message": message}).to_string()
            }
            ToolOutcome::UnknownTool { name } => json!({
                "error": self.tag(),
                "message": format!("Tool {} not found", name),
            })
            .to_string(),
        }
    }
}
