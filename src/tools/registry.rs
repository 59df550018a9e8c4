//! Tool registry for chefbot
//!
//! This module provides the `ToolRegistry` struct for registering tools,
//! advertising their schemas to the model and dispatching calls.

use std::time::Instant;

use indexmap::IndexMap;
use jsonschema::Validator;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::error::{ChefError, Result};
use crate::providers::ToolDefinition;

use super::{Tool, ToolContext, ToolOutcome};

struct RegisteredTool {
    tool: Box<dyn Tool>,
    validator: Validator,
}

/// A registry that holds tools in registration order.
///
/// Names are unique: registering a second tool under an existing name is
/// rejected and leaves the registry unchanged.
///
/// # Example
///
/// ```rust
/// use chefbot::tools::{ToolRegistry, EchoTool, ToolOutcome};
/// use serde_json::json;
///
/// # tokio_test::block_on(async {
/// let mut registry = ToolRegistry::new();
/// registry.register(Box::new(EchoTool)).unwrap();
///
/// let outcome = registry.call("echo", json!({"message": "hello"})).await;
/// assert_eq!(outcome, ToolOutcome::Success { result: json!("hello") });
/// # });
/// ```
pub struct ToolRegistry {
    tools: IndexMap<String, RegisteredTool>,
}

impl ToolRegistry {
    /// Create a new empty tool registry.
    pub fn new() -> Self {
        Self {
            tools: IndexMap::new(),
        }
    }

    /// Register a tool.
    ///
    /// # Errors
    ///
    /// Returns `ChefError::Tool` if the name is already taken or the tool's
    /// parameter schema is not a valid JSON schema.
    pub fn register(&mut self, tool: Box<dyn Tool>) -> Result<()> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(ChefError::Tool(format!("tool already registered: {}", name)));
        }

        let validator = jsonschema::validator_for(&tool.parameters())
            .map_err(|e| ChefError::Tool(format!("invalid schema for {}: {}", name, e)))?;

        info!(tool = %name, "Registering tool");
        self.tools.insert(name, RegisteredTool { tool, validator });
        Ok(())
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.tool.as_ref())
    }

    /// Call a tool with a default context.
    pub async fn call(&self, name: &str, args: Value) -> ToolOutcome {
        self.call_with_context(name, args, &ToolContext::default())
            .await
    }

    /// Validate `args` against the tool's schema and run it.
    ///
    /// Never fails: unknown names, schema violations and handler errors are
    /// all reported through the returned `ToolOutcome`.
    pub async fn call_with_context(
        &self,
        name: &str,
        args: Value,
        ctx: &ToolContext,
    ) -> ToolOutcome {
        let Some(entry) = self.tools.get(name) else {
            warn!(tool = name, "Unknown tool requested");
            return ToolOutcome::UnknownTool {
                name: name.to_string(),
            };
        };

        let violations: Vec<String> = entry
            .validator
            .iter_errors(&args)
            .map(|e| e.to_string())
            .collect();
        if !violations.is_empty() {
            let message = violations.join("; ");
            warn!(tool = name, error = %message, "Invalid tool arguments");
            return ToolOutcome::InvalidArguments { message };
        }

        let start = Instant::now();
        match entry.tool.execute(args, ctx).await {
            Ok(result) => {
                info!(
                    tool = name,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Tool executed successfully"
                );
                ToolOutcome::Success { result }
            }
            Err(e) => {
                error!(
                    tool = name,
                    error = %e,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Tool execution failed"
                );
                let message = match e {
                    ChefError::Tool(msg) => msg,
                    other => other.to_string(),
                };
                ToolOutcome::ExecutionFailed { message }
            }
        }
    }

    /// Schemas of all tools, in registration order, for the model.
    pub fn schemas(&self) -> Vec<ToolDefinition> {
        self.tools
            .values()
            .map(|t| ToolDefinition {
                name: t.tool.name().to_string(),
                description: t.tool.description().to_string(),
                parameters: t.tool.parameters(),
            })
            .collect()
    }

    /// Names of all registered tools, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|k| k.as_str()).collect()
    }

    /// Check whether a tool is registered.
    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether no tools are registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
