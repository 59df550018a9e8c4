//! Agent loop implementation
//!
//! The loop is an explicit state machine over a thread's `SessionState`:
//!
//! ```text
//!             ┌──────────────────────────────┐
//!             ▼                              │
//!  Human ─> AWAIT_MODEL ──tools──> CHECK_BUDGET ──ok──> RUN_TOOLS
//!             │                      │    ▲                 │
//!           text                  over    └─────────────────┘
//!             ▼                      ▼
//!           DONE                INTERRUPTED ──resume──> AWAIT_MODEL
//! ```
//!
//! Checkpoints are written only at `DONE` and `INTERRUPTED`. A failed model
//! call leaves the stored thread exactly as it was, so the turn (or the
//! resume) can simply be retried.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Mutex;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::config::AgentConfig;
use crate::error::{ChefError, Result};
use crate::memory::MemoryExtractor;
use crate::providers::{ChatOptions, LLMProvider, ToolDefinition};
use crate::session::{CheckpointStore, Interrupt, Message, SessionState, ToolRequest};
use crate::tools::{ToolContext, ToolOutcome, ToolRegistry};

use super::budget::{self, BudgetPolicy};
use super::context::ContextBuilder;
use super::events::{emit, AgentEvent};

/// Answer returned when the model keeps requesting tools past the cap.
pub const FALLBACK_ANSWER: &str =
    "죄송해요, 정보를 찾는 데 너무 많은 단계가 필요했어요. 질문을 조금 더 구체적으로 말씀해 주시겠어요?";

/// Result of running (or resuming) a turn.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// The model produced a final answer
    Answer(String),
    /// The turn is suspended until `resume` is called
    Interrupted(Interrupt),
}

impl TurnOutcome {
    pub fn answer(&self) -> Option<&str> {
        match self {
            TurnOutcome::Answer(text) => Some(text),
            TurnOutcome::Interrupted(_) => None,
        }
    }

    pub fn interrupt(&self) -> Option<&Interrupt> {
        match self {
            TurnOutcome::Interrupted(interrupt) => Some(interrupt),
            TurnOutcome::Answer(_) => None,
        }
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self, TurnOutcome::Interrupted(_))
    }
}

enum LoopState {
    AwaitModel,
    CheckBudget(AfterCheck),
    RunTools(Vec<ToolRequest>),
    Interrupted(Interrupt),
    Done(String),
}

/// Where `CHECK_BUDGET` continues when nothing is over budget.
enum AfterCheck {
    /// Gate before running a fresh tool request; the assistant message is
    /// not yet part of the history.
    Execute {
        content: String,
        requests: Vec<ToolRequest>,
    },
    /// Tools just ran; ask the model again.
    Model,
}

/// Model settings used for every call in a turn.
#[derive(Debug, Clone)]
struct LoopSettings {
    model: Option<String>,
    options: ChatOptions,
    max_model_calls: u32,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self::from_config(&AgentConfig::default())
    }
}

impl LoopSettings {
    fn from_config(config: &AgentConfig) -> Self {
        Self {
            model: Some(config.model.clone()).filter(|m| !m.is_empty()),
            options: ChatOptions::new()
                .with_max_tokens(config.max_tokens)
                .with_temperature(config.temperature),
            max_model_calls: config.max_tool_iterations.max(1),
        }
    }
}

/// Resumable tool-calling agent.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use chefbot::agent::AgentLoop;
/// use chefbot::providers::OpenAIProvider;
/// use chefbot::session::SessionManager;
/// use chefbot::tools::ToolRegistry;
///
/// let agent = AgentLoop::new(
///     Arc::new(OpenAIProvider::new("sk-...")),
///     Arc::new(ToolRegistry::new()),
///     Arc::new(SessionManager::new_memory()),
/// );
/// let outcome = agent.run_turn("default_thread", "오늘 저녁 뭐 먹지?", None).await?;
/// ```
pub struct AgentLoop {
    provider: Arc<dyn LLMProvider>,
    tools: Arc<ToolRegistry>,
    store: Arc<dyn CheckpointStore>,
    extractor: Option<Arc<dyn MemoryExtractor>>,
    context_builder: ContextBuilder,
    budget: BudgetPolicy,
    settings: LoopSettings,
    /// Per-thread locks; one in-flight execution per thread id
    thread_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl AgentLoop {
    /// Create an agent with default settings and budget.
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        tools: Arc<ToolRegistry>,
        store: Arc<dyn CheckpointStore>,
    ) -> Self {
        Self {
            provider,
            tools,
            store,
            extractor: None,
            context_builder: ContextBuilder::new(),
            budget: BudgetPolicy::default(),
            settings: LoopSettings::default(),
            thread_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Apply model settings and, if set, the persona override.
    pub fn with_agent_config(mut self, config: &AgentConfig) -> Self {
        self.settings = LoopSettings::from_config(config);
        if let Some(prompt) = config.system_prompt.as_deref() {
            self.context_builder = self.context_builder.with_system_prompt(prompt);
        }
        self
    }

    pub fn with_budget(mut self, budget: BudgetPolicy) -> Self {
        self.budget = budget;
        self
    }

    /// Run `extractor` after every completed turn.
    pub fn with_extractor(mut self, extractor: Arc<dyn MemoryExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn with_context_builder(mut self, context_builder: ContextBuilder) -> Self {
        self.context_builder = context_builder;
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn store(&self) -> &Arc<dyn CheckpointStore> {
        &self.store
    }

    pub fn budget(&self) -> &BudgetPolicy {
        &self.budget
    }

    /// Process one human message on `thread_id`.
    ///
    /// # Errors
    ///
    /// - `ChefError::Session` if the thread is waiting on an interrupt
    /// - gateway errors, unretried; nothing is persisted
    /// - `ChefError::Checkpoint` if the final state cannot be saved
    pub async fn run_turn(
        &self,
        thread_id: &str,
        user_text: &str,
        events: Option<&UnboundedSender<AgentEvent>>,
    ) -> Result<TurnOutcome> {
        let lock = self.thread_lock(thread_id).await;
        let _guard = lock.lock().await;

        let span = info_span!("turn", thread_id = %thread_id);
        async {
            let mut state = self.store.load(thread_id).await?;
            if let Some(pending) = &state.pending_interrupt {
                return Err(ChefError::Session(format!(
                    "thread {} is waiting for a decision on {}; resume it first",
                    thread_id, pending.resource
                )));
            }

            state.begin_turn(self.budget.resets_per_turn());
            state.push(Message::human(user_text));
            info!(messages = state.message_count(), "Processing turn");
            self.drive(&mut state, events).await
        }
        .instrument(span)
        .await
    }

    /// Resolve the pending interrupt on `thread_id` with a human reply and
    /// continue the suspended turn.
    ///
    /// # Errors
    ///
    /// `ChefError::Session` if nothing is pending. A failed model call keeps
    /// the interrupt pending.
    pub async fn resume(
        &self,
        thread_id: &str,
        decision: &str,
        events: Option<&UnboundedSender<AgentEvent>>,
    ) -> Result<TurnOutcome> {
        let lock = self.thread_lock(thread_id).await;
        let _guard = lock.lock().await;

        let span = info_span!("resume", thread_id = %thread_id);
        async {
            let mut state = self.store.load(thread_id).await?;
            let interrupt = state.pending_interrupt.take().ok_or_else(|| {
                ChefError::Session(format!("thread {} has no pending interrupt", thread_id))
            })?;

            let decision = budget::classify_decision(&interrupt, decision);
            info!(
                resource = %interrupt.resource,
                count = interrupt.count,
                approved = decision.approved,
                "Resuming after budget decision"
            );
            state.push(Message::system(&budget::decision_note(
                &interrupt.resource,
                &decision,
            )));
            state
                .budget_decisions
                .insert(interrupt.resource.clone(), decision);

            self.drive(&mut state, events).await
        }
        .instrument(span)
        .await
    }

    async fn thread_lock(&self, thread_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.thread_locks.lock().await;
        locks
            .entry(thread_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn drive(
        &self,
        state: &mut SessionState,
        events: Option<&UnboundedSender<AgentEvent>>,
    ) -> Result<TurnOutcome> {
        let schemas = self.tools.schemas();
        let mut model_calls = 0u32;
        let mut current = LoopState::AwaitModel;

        loop {
            current = match current {
                LoopState::AwaitModel => {
                    if model_calls >= self.settings.max_model_calls {
                        warn!(model_calls, "Tool loop reached maximum iterations");
                        LoopState::Done(FALLBACK_ANSWER.to_string())
                    } else {
                        model_calls += 1;
                        self.await_model(state, &schemas).await?
                    }
                }
                LoopState::CheckBudget(after) => match self.budget.check(state) {
                    Some(interrupt) => LoopState::Interrupted(interrupt),
                    None => match after {
                        AfterCheck::Execute { content, requests } => {
                            state.push(Message::assistant_with_tools(&content, requests.clone()));
                            LoopState::RunTools(requests)
                        }
                        AfterCheck::Model => LoopState::AwaitModel,
                    },
                },
                LoopState::RunTools(requests) => {
                    self.run_tools(state, &requests, events).await;
                    LoopState::CheckBudget(AfterCheck::Model)
                }
                LoopState::Interrupted(interrupt) => {
                    return self.suspend(state, interrupt, events).await;
                }
                LoopState::Done(answer) => {
                    return self.finish(state, answer, events).await;
                }
            };
        }
    }

    async fn await_model(
        &self,
        state: &SessionState,
        schemas: &[ToolDefinition],
    ) -> Result<LoopState> {
        let messages = self.context_builder.build_messages(&state.messages);
        let response = self
            .provider
            .chat(
                messages,
                schemas.to_vec(),
                self.settings.model.as_deref(),
                self.settings.options.clone(),
            )
            .await?;

        if !response.has_tool_calls() {
            return Ok(LoopState::Done(response.content));
        }

        let requests: Vec<ToolRequest> = response.tool_calls.iter().map(|tc| tc.to_request()).collect();
        debug!(
            tools = ?requests.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
            "Model requested tools"
        );
        Ok(LoopState::CheckBudget(AfterCheck::Execute {
            content: response.content,
            requests,
        }))
    }

    async fn run_tools(
        &self,
        state: &mut SessionState,
        requests: &[ToolRequest],
        events: Option<&UnboundedSender<AgentEvent>>,
    ) {
        let ctx = ToolContext::new().with_thread(&state.thread_id);

        for request in requests {
            emit(
                events,
                AgentEvent::ToolCall {
                    id: request.id.clone(),
                    name: request.name.clone(),
                    arguments: request.arguments.clone(),
                },
            );

            let outcome = if self.budget.is_declined(state, &request.name) {
                info!(tool = %request.name, id = %request.id, "Skipping declined tool");
                ToolOutcome::ExecutionFailed {
                    message: format!(
                        "The user declined further {} calls for this request. Answer with the information already gathered.",
                        request.name
                    ),
                }
            } else {
                let started = Instant::now();
                let outcome = self
                    .tools
                    .call_with_context(&request.name, request.arguments.clone(), &ctx)
                    .await;
                debug!(
                    tool = %request.name,
                    id = %request.id,
                    outcome = outcome.tag(),
                    duration_ms = started.elapsed().as_millis() as u64,
                    "Tool finished"
                );
                if self.budget.is_tracked(&request.name) {
                    let count = state.increment(&request.name);
                    debug!(tool = %request.name, count, "Tracked tool used");
                }
                outcome
            };

            let content = outcome.to_content();
            state.push(Message::tool_result(&request.id, &request.name, &content));
            emit(
                events,
                AgentEvent::ToolResult {
                    id: request.id.clone(),
                    name: request.name.clone(),
                    content,
                    is_error: outcome.is_error(),
                },
            );
        }
    }

    async fn suspend(
        &self,
        state: &mut SessionState,
        interrupt: Interrupt,
        events: Option<&UnboundedSender<AgentEvent>>,
    ) -> Result<TurnOutcome> {
        state.pending_interrupt = Some(interrupt.clone());
        self.checkpoint(state).await?;

        info!(
            resource = %interrupt.resource,
            count = interrupt.count,
            threshold = interrupt.threshold,
            "Turn interrupted for confirmation"
        );
        emit(events, AgentEvent::Interrupt(interrupt.clone()));
        Ok(TurnOutcome::Interrupted(interrupt))
    }

    async fn finish(
        &self,
        state: &mut SessionState,
        answer: String,
        events: Option<&UnboundedSender<AgentEvent>>,
    ) -> Result<TurnOutcome> {
        state.push(Message::assistant(&answer));
        self.checkpoint(state).await?;
        emit(
            events,
            AgentEvent::AnswerChunk {
                text: answer.clone(),
            },
        );

        if let Some(extractor) = &self.extractor {
            let user_text = state.last_human_text().unwrap_or_default();
            match extractor.extract(user_text, &answer).await {
                Ok(Some(id)) => debug!(memory_id = %id, "Memory extracted"),
                Ok(None) => {}
                Err(e) => warn!(error = %e, "Memory extraction failed"),
            }
        }

        info!(answer_len = answer.len(), "Turn completed");
        Ok(TurnOutcome::Answer(answer))
    }

    async fn checkpoint(&self, state: &SessionState) -> Result<()> {
        self.store
            .save(&state.thread_id, state)
            .await
            .map_err(|e| match e {
                ChefError::Checkpoint(_) => e,
                other => ChefError::Checkpoint(other.to_string()),
            })
    }
}
