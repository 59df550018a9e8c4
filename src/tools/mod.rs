//! Tools module - Tool definitions and execution for model function calling
//!
//! Tools let the chef agent look things up (recipes, food knowledge, the web,
//! the weather) and remember facts about the user across threads.
//!
//! # Overview
//!
//! - `Tool` trait: The interface that all tools must implement
//! - `ToolContext`: Execution context (thread id)
//! - `ToolRegistry`: Registration-ordered catalog with schema validation
//! - `ToolOutcome`: Result of a dispatched call, rendered into a tool message
//!
//! # Built-in Tools
//!
//! - `search_recipe` / `search_food_knowledge`: local corpus search
//! - `search_google`: Google Custom Search
//! - `get_current_weather`: KMA observations
//! - `get_current_time`, `calculate`
//! - `write_memory` / `read_memory`: long-term memory
//! - `recommend_recipe`: mood and weather lookup
//!
//! # Example
//!
//! ```rust
//! use chefbot::tools::{EchoTool, ToolOutcome, ToolRegistry};
//! use chefbot::tools::calculator::CalculateTool;
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let mut registry = ToolRegistry::new();
//! registry.register(Box::new(EchoTool)).unwrap();
//! registry.register(Box::new(CalculateTool)).unwrap();
//!
//! let outcome = registry.call("calculate", json!({"expression": "2 * 21"})).await;
//! assert_eq!(outcome.to_content(), r#"{"result":42.0}"#);
//! assert_eq!(registry.schemas().len(), 2);
//! # });
//! ```

pub mod calculator;
pub mod memory;
pub mod recipe;
pub mod recommend;
mod registry;
pub mod time;
mod types;
pub mod weather;
pub mod web;

pub use registry::ToolRegistry;
pub use types::{Tool, ToolContext, ToolOutcome};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::Result;

/// A simple echo tool for testing purposes.
///
/// # Example
///
/// ```rust
/// use chefbot::tools::{Tool, ToolContext, EchoTool};
/// use serde_json::json;
///
/// # tokio_test::block_on(async {
/// let result = EchoTool.execute(json!({"message": "Hello"}), &ToolContext::new()).await;
/// assert_eq!(result.unwrap(), json!("Hello"));
/// # });
/// ```
pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echoes back the provided message"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "message": {
                    "type": "string",
                    "description": "The message to echo"
                }
            },
            "required": ["message"]
        })
    }

    async fn execute(&self, args: Value, _ctx: &ToolContext) -> Result<Value> {
        let message = args
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("(no message)");
        Ok(json!(message))
    }
}
