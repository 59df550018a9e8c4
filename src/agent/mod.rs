//! Agent module - Resumable tool-calling loop
//!
//! The agent takes one human message on a thread, calls the model, runs the
//! tools it asks for and repeats until the model answers in plain text. Web
//! search is metered: when it has been used more than the configured number
//! of times the turn is suspended, checkpointed, and resumed later with the
//! human's decision.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │     CLI     │────>│  AgentLoop  │────>│ LLMProvider │
//! │ (chat/ask)  │<────│             │     │  (OpenAI)   │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!    AgentEvent              │
//!                 ┌──────────┼──────────┐
//!                 ▼          ▼          ▼
//!          ┌──────────┐ ┌─────────┐ ┌───────────┐
//!          │Checkpoint│ │  Tools  │ │  Memory   │
//!          │  Store   │ │Registry │ │ Extractor │
//!          └──────────┘ └─────────┘ └───────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use chefbot::agent::{AgentLoop, TurnOutcome};
//! use chefbot::providers::OpenAIProvider;
//! use chefbot::session::SessionManager;
//! use chefbot::tools::ToolRegistry;
//!
//! async fn run() -> chefbot::Result<()> {
//!     let agent = AgentLoop::new(
//!         Arc::new(OpenAIProvider::new("sk-...")),
//!         Arc::new(ToolRegistry::new()),
//!         Arc::new(SessionManager::new_memory()),
//!     );
//!
//!     match agent.run_turn("default_thread", "비 오는 날 뭐 먹을까?", None).await? {
//!         TurnOutcome::Answer(text) => println!("{}", text),
//!         TurnOutcome::Interrupted(_) => {
//!             agent.resume("default_thread", "yes", None).await?;
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod budget;
mod context;
pub mod events;
mod r#loop;

pub use budget::{BudgetPolicy, ResetPolicy};
pub use context::{ContextBuilder, DEFAULT_SYSTEM_PROMPT};
pub use events::AgentEvent;
pub use r#loop::{AgentLoop, TurnOutcome, FALLBACK_ANSWER};
