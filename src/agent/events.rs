//! Progress events emitted while a turn runs.

use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;

use crate::session::Interrupt;

/// Ordered progress notifications for an observer (the CLI prints them).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// A tool is about to run
    ToolCall {
        id: String,
        name: String,
        arguments: Value,
    },
    /// A tool finished (or was refused)
    ToolResult {
        id: String,
        name: String,
        content: String,
        is_error: bool,
    },
    /// Final answer text
    AnswerChunk { text: String },
    /// The turn stopped to ask the human
    Interrupt(Interrupt),
}

/// Send to an optional observer. A dropped receiver is ignored.
pub(crate) fn emit(events: Option<&UnboundedSender<AgentEvent>>, event: AgentEvent) {
    if let Some(tx) = events {
        let _ = tx.send(event);
    }
}
