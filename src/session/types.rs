//! Thread state types for chefbot
//!
//! This module defines the persisted per-thread state: the typed message
//! history, the budget counters, and the interrupt awaiting a human decision.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Persisted state of one conversation thread.
///
/// Messages are append-only within a turn. Counters survive across turns
/// unless the configured reset policy clears them when a turn begins.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionState {
    /// Caller-supplied conversation identifier
    pub thread_id: String,
    /// Ordered conversation history
    pub messages: Vec<Message>,
    /// Invocation counts of budget-tracked tools, keyed by tool name
    #[serde(default)]
    pub resource_counters: BTreeMap<String, u64>,
    /// Interrupt waiting for a human decision, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_interrupt: Option<Interrupt>,
    /// Human decisions taken during the current turn, keyed by resource
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub budget_decisions: BTreeMap<String, BudgetDecision>,
    /// When this thread was created
    pub created_at: DateTime<Utc>,
    /// When this thread was last modified
    pub updated_at: DateTime<Utc>,
}

impl SessionState {
    /// Create an empty state for the given thread.
    ///
    /// # Example
    /// ```
    /// use chefbot::session::SessionState;
    ///
    /// let state = SessionState::new("default_thread");
    /// assert!(state.messages.is_empty());
    /// assert!(state.pending_interrupt.is_none());
    /// ```
    pub fn new(thread_id: &str) -> Self {
        let now = Utc::now();
        Self {
            thread_id: thread_id.to_string(),
            messages: Vec::new(),
            resource_counters: BTreeMap::new(),
            pending_interrupt: None,
            budget_decisions: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a message to the history.
    ///
    /// # Example
    /// ```
    /// use chefbot::session::{Message, SessionState};
    ///
    /// let mut state = SessionState::new("t1");
    /// state.push(Message::human("안녕"));
    /// assert_eq!(state.message_count(), 1);
    /// ```
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
        self.updated_at = Utc::now();
    }

    /// Current count for a tracked resource (zero if never used).
    pub fn counter(&self, resource: &str) -> u64 {
        self.resource_counters.get(resource).copied().unwrap_or(0)
    }

    /// Increment a resource counter and return the new value.
    pub fn increment(&mut self, resource: &str) -> u64 {
        let count = self
            .resource_counters
            .entry(resource.to_string())
            .or_insert(0);
        *count += 1;
        self.updated_at = Utc::now();
        *count
    }

    /// Prepare the state for a new human turn.
    ///
    /// Decisions from the previous turn are forgotten so an elevated counter
    /// is asked about again. Counters are cleared only when `reset_counters`
    /// is set.
    pub fn begin_turn(&mut self, reset_counters: bool) {
        self.budget_decisions.clear();
        if reset_counters {
            self.resource_counters.clear();
        }
        self.updated_at = Utc::now();
    }

    /// Text of the most recent human message, if any.
    pub fn last_human_text(&self) -> Option<&str> {
        self.messages.iter().rev().find_map(|m| match m {
            Message::Human { content } => Some(content.as_str()),
            _ => None,
        })
    }

    /// Get the last message, if any.
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Number of messages in the history.
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Whether the thread has no history.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// A single message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    /// Instructions for the model, including recorded budget decisions
    System { content: String },
    /// Text typed by the user
    Human { content: String },
    /// Model output; a non-empty `tool_requests` means the model wants tools run
    Assistant {
        content: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_requests: Vec<ToolRequest>,
    },
    /// Result of one tool request, correlated by id
    ToolResult {
        tool_request_id: String,
        tool_name: String,
        content: String,
    },
}

impl Message {
    /// Create a system message.
    pub fn system(content: &str) -> Self {
        Message::System {
            content: content.to_string(),
        }
    }

    /// Create a human message.
    ///
    /// # Example
    /// ```
    /// use chefbot::session::Message;
    ///
    /// let msg = Message::human("국물 요리 추천해줘");
    /// assert_eq!(msg.role(), "human");
    /// ```
    pub fn human(content: &str) -> Self {
        Message::Human {
            content: content.to_string(),
        }
    }

    /// Create an assistant message without tool requests.
    pub fn assistant(content: &str) -> Self {
        Message::Assistant {
            content: content.to_string(),
            tool_requests: Vec::new(),
        }
    }

    /// Create an assistant message carrying tool requests.
    pub fn assistant_with_tools(content: &str, tool_requests: Vec<ToolRequest>) -> Self {
        Message::Assistant {
            content: content.to_string(),
            tool_requests,
        }
    }

    /// Create a tool result message.
    pub fn tool_result(tool_request_id: &str, tool_name: &str, content: &str) -> Self {
        Message::ToolResult {
            tool_request_id: tool_request_id.to_string(),
            tool_name: tool_name.to_string(),
            content: content.to_string(),
        }
    }

    /// Text content of the message.
    pub fn content(&self) -> &str {
        match self {
            Message::System { content }
            | Message::Human { content }
            | Message::Assistant { content, .. }
            | Message::ToolResult { content, .. } => content,
        }
    }

    /// Role label used in logs and listings.
    pub fn role(&self) -> &'static str {
        match self {
            Message::System { .. } => "system",
            Message::Human { .. } => "human",
            Message::Assistant { .. } => "assistant",
            Message::ToolResult { .. } => "tool",
        }
    }

    /// Whether this is an assistant message that requests tools.
    pub fn has_tool_requests(&self) -> bool {
        matches!(self, Message::Assistant { tool_requests, .. } if !tool_requests.is_empty())
    }

    /// Whether this is a system message.
    pub fn is_system(&self) -> bool {
        matches!(self, Message::System { .. })
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolRequest {
    /// Opaque correlation token chosen by the model
    pub id: String,
    /// Name of the requested tool
    pub name: String,
    /// Structured arguments; non-object values fail schema validation
    pub arguments: Value,
}

impl ToolRequest {
    /// Create a new tool request.
    ///
    /// # Example
    /// ```
    /// use chefbot::session::ToolRequest;
    /// use serde_json::json;
    ///
    /// let req = ToolRequest::new("call_1", "search_recipe", json!({"query": "김치찌개"}));
    /// assert_eq!(req.name, "search_recipe");
    /// ```
    pub fn new(id: &str, name: &str, arguments: Value) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            arguments,
        }
    }
}

/// Suspension of a turn pending a human decision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Interrupt {
    /// Why the turn was suspended
    pub reason: String,
    /// Tracked resource whose budget was exceeded
    pub resource: String,
    /// Counter value when the interrupt fired
    pub count: u64,
    /// Configured threshold the counter exceeded
    pub threshold: u64,
    /// Question put to the human
    pub awaiting: String,
}

impl Interrupt {
    /// Build the interrupt raised when `resource` has been used more than `threshold` times.
    pub fn budget_exceeded(resource: &str, count: u64, threshold: u64) -> Self {
        Self {
            reason: format!(
                "{} has been called {} times in this conversation (limit {})",
                resource, count, threshold
            ),
            resource: resource.to_string(),
            count,
            threshold,
            awaiting: format!(
                "검색을 {}회 수행했습니다. 계속 검색할까요? (yes/no)",
                count
            ),
        }
    }
}

/// A human decision on an elevated counter, valid for the rest of the turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BudgetDecision {
    /// Counter value the decision was taken on
    pub count: u64,
    /// Whether the human approved further use
    pub approved: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_state_new() {
        let state = SessionState::new("thread-1");
        assert_eq!(state.thread_id, "thread-1");
        assert!(state.is_empty());
        assert!(state.resource_counters.is_empty());
        assert!(state.created_at <= state.updated_at);
    }

    #[test]
    fn test_counter_increment() {
        let mut state = SessionState::new("t");
        assert_eq!(state.counter("search_google"), 0);
        assert_eq!(state.increment("search_google"), 1);
        assert_eq!(state.increment("search_google"), 2);
        assert_eq!(state.counter("search_google"), 2);
        assert_eq!(state.counter("other"), 0);
    }

    #[test]
    fn test_begin_turn_keeps_counters_by_default() {
        let mut state = SessionState::new("t");
        state.increment("search_google");
        state.budget_decisions.insert(
            "search_google".into(),
            BudgetDecision {
                count: 1,
                approved: true,
            },
        );

        state.begin_turn(false);
        assert_eq!(state.counter("search_google"), 1);
        assert!(state.budget_decisions.is_empty());

        state.begin_turn(true);
        assert_eq!(state.counter("search_google"), 0);
    }

    #[test]
    fn test_last_human_text() {
        let mut state = SessionState::new("t");
        assert!(state.last_human_text().is_none());
        state.push(Message::human("first"));
        state.push(Message::assistant("ok"));
        state.push(Message::human("second"));
        state.push(Message::system("approved"));
        assert_eq!(state.last_human_text(), Some("second"));
    }

    #[test]
    fn test_message_serde_tagging() {
        let msg = Message::assistant_with_tools(
            "",
            vec![ToolRequest::new("c1", "calculate", json!({"expression": "1 + 1"}))],
        );
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["role"], "assistant");
        assert_eq!(value["tool_requests"][0]["name"], "calculate");

        let plain = serde_json::to_value(Message::assistant("hi")).unwrap();
        assert!(plain.get("tool_requests").is_none());

        let back: Message = serde_json::from_value(plain).unwrap();
        assert!(!back.has_tool_requests());
    }

    #[test]
    fn test_message_helpers() {
        let result = Message::tool_result("c1", "get_current_time", "{}");
        assert_eq!(result.role(), "tool");
        assert_eq!(result.content(), "{}");
        assert!(Message::system("x").is_system());
        assert!(!Message::human("x").has_tool_requests());
    }

    #[test]
    fn test_interrupt_budget_exceeded() {
        let interrupt = Interrupt::budget_exceeded("search_google", 4, 3);
        assert_eq!(interrupt.count, 4);
        assert_eq!(interrupt.threshold, 3);
        assert!(interrupt.reason.contains("search_google"));
        assert!(interrupt.awaiting.contains("4"));
    }
}
