//! ChefBot - recipe chef bot built on a resumable tool-calling agent

pub mod agent;
pub mod config;
pub mod corpus;
pub mod error;
pub mod memory;
pub mod providers;
pub mod session;
pub mod tools;
pub mod utils;

pub use agent::{AgentEvent, AgentLoop, BudgetPolicy, TurnOutcome};
pub use config::Config;
pub use error::{ChefError, Result};
pub use providers::{
    ChatOptions, LLMProvider, LLMResponse, LLMToolCall, OpenAIProvider, ToolDefinition, Usage,
};
pub use session::{CheckpointStore, Interrupt, Message, SessionManager, SessionState};
