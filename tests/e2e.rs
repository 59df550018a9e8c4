//! End-to-end tests for ChefBot
//!
//! These tests wire the real tool set (local corpora, weather without an API
//! key, Google search without credentials, long-term memory on disk) to a
//! mock model that reacts to the conversation the way a tool-calling model
//! would. No network access is needed.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tempfile::{tempdir, TempDir};
use tokio::sync::Mutex;

use chefbot::agent::{AgentEvent, AgentLoop, BudgetPolicy, TurnOutcome};
use chefbot::corpus::{DocumentIndex, Ingredient, Recipe};
use chefbot::error::Result;
use chefbot::memory::{LlmMemoryExtractor, LongTermMemory, MemoryType};
use chefbot::providers::{ChatOptions, LLMProvider, LLMResponse, LLMToolCall, ToolDefinition};
use chefbot::session::{CheckpointStore, Message, SessionManager};
use chefbot::tools::calculator::CalculateTool;
use chefbot::tools::memory::{ReadMemoryTool, WriteMemoryTool};
use chefbot::tools::recipe::RecipeSearchTool;
use chefbot::tools::recommend::RecommendRecipeTool;
use chefbot::tools::weather::WeatherTool;
use chefbot::tools::web::GoogleSearchTool;
use chefbot::tools::ToolRegistry;

// ============================================================================
// Mock model
// ============================================================================

/// Behaves like a chef model: weather first, then recipe search, then an
/// answer naming the top recipe. Calls without tools are memory
/// extraction requests.
struct ChefModel {
    calls: AtomicUsize,
    extractions: AtomicUsize,
}

impl ChefModel {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            extractions: AtomicUsize::new(0),
        })
    }
}

fn tool_result<'a>(messages: &'a [Message], name: &str) -> Option<&'a str> {
    messages.iter().rev().find_map(|m| match m {
        Message::ToolResult {
            tool_name, content, ..
        } if tool_name == name => Some(content.as_str()),
        _ => None,
    })
}

fn since_last_human(messages: &[Message]) -> &[Message] {
    let start = messages
        .iter()
        .rposition(|m| matches!(m, Message::Human { .. }))
        .unwrap_or(0);
    &messages[start..]
}

#[async_trait]
impl LLMProvider for ChefModel {
    async fn chat(
        &self,
        messages: Vec<Message>,
        tools: Vec<ToolDefinition>,
        _model: Option<&str>,
        _options: ChatOptions,
    ) -> Result<LLMResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if tools.is_empty() {
            self.extractions.fetch_add(1, Ordering::SeqCst);
            return Ok(LLMResponse::text(
                r#"```json
{"should_write_memory": true, "memory_type": "profile", "importance": 4,
 "content": "비 오는 날 국물 요리를 좋아함", "tags": ["국물", "비"]}
```"#,
            ));
        }

        let turn = since_last_human(&messages);
        let question = turn.first().map(Message::content).unwrap_or_default();

        if question.contains("기억") {
            return Ok(match tool_result(turn, "read_memory") {
                None => LLMResponse::with_tools(
                    "",
                    vec![LLMToolCall::new("m1", "read_memory", r#"{"query": "국물"}"#)],
                ),
                Some(found) => LLMResponse::text(&format!("기억하고 있어요: {}", found)),
            });
        }

        if tool_result(turn, "get_current_weather").is_none() {
            return Ok(LLMResponse::with_tools(
                "날씨를 먼저 확인할게요.",
                vec![LLMToolCall::new(
                    "w1",
                    "get_current_weather",
                    r#"{"location": "서울"}"#,
                )],
            ));
        }

        match tool_result(turn, "search_recipe") {
            None => Ok(LLMResponse::with_tools(
                "",
                vec![LLMToolCall::new("r1", "search_recipe", r#"{"query": "국물"}"#)],
            )),
            Some(found) => {
                let found: Value = serde_json::from_str(found).unwrap_or(Value::Null);
                let name = found["results"][0]["metadata"]["name"]
                    .as_str()
                    .unwrap_or("라면");
                Ok(LLMResponse::text(&format!(
                    "비 오는 날에는 따뜻한 {}를 추천해요!",
                    name
                )))
            }
        }
    }

    fn default_model(&self) -> &str {
        "chef-mock"
    }

    fn name(&self) -> &str {
        "chef-mock"
    }
}

// ============================================================================
// Wiring
// ============================================================================

fn recipes() -> Vec<Recipe> {
    vec![
        Recipe {
            recipe_id: "r-001".into(),
            name: "김치찌개".into(),
            description: "칼칼한 국물이 일품인 찌개".into(),
            keywords: vec!["국물".into(), "비 오는 날".into(), "매운".into()],
            ingredients: vec![Ingredient {
                name: "김치".into(),
                amount: "1컵".into(),
            }],
            instructions: vec!["김치를 볶는다".into(), "물을 붓고 끓인다".into()],
            cook_time_minutes: 30,
            difficulty: "하".into(),
            views: 1200,
        },
        Recipe {
            recipe_id: "r-002".into(),
            name: "샐러드".into(),
            description: "가벼운 채소 요리".into(),
            keywords: vec!["다이어트".into()],
            ingredients: vec![],
            instructions: vec![],
            cook_time_minutes: 10,
            difficulty: "하".into(),
            views: 300,
        },
    ]
}

struct Bot {
    agent: AgentLoop,
    store: Arc<SessionManager>,
    memory: Arc<Mutex<LongTermMemory>>,
    _dir: TempDir,
}

fn bot(model: Arc<ChefModel>) -> Bot {
    let dir = tempdir().unwrap();
    let memory = Arc::new(Mutex::new(
        LongTermMemory::with_path(dir.path().join("memory.json")).unwrap(),
    ));
    let store = Arc::new(SessionManager::with_path(dir.path().join("threads")).unwrap());

    let mut registry = ToolRegistry::new();
    registry
        .register(Box::new(RecipeSearchTool::new(Some(Arc::new(
            DocumentIndex::from_recipes(recipes(), "test"),
        )))))
        .unwrap();
    registry.register(Box::new(WeatherTool::new(None))).unwrap();
    registry
        .register(Box::new(GoogleSearchTool::new(None, None)))
        .unwrap();
    registry.register(Box::new(CalculateTool)).unwrap();
    registry.register(Box::new(RecommendRecipeTool)).unwrap();
    registry
        .register(Box::new(WriteMemoryTool::new(memory.clone())))
        .unwrap();
    registry
        .register(Box::new(ReadMemoryTool::new(memory.clone())))
        .unwrap();

    let extractor = LlmMemoryExtractor::new(model.clone(), memory.clone());
    let agent = AgentLoop::new(model, Arc::new(registry), store.clone())
        .with_budget(BudgetPolicy::default())
        .with_extractor(Arc::new(extractor));

    Bot {
        agent,
        store,
        memory,
        _dir: dir,
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_rainy_day_soup_recommendation() {
    let model = ChefModel::new();
    let bot = bot(model.clone());
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    let outcome = bot
        .agent
        .run_turn("default_thread", "오늘 비 오는데 국물 요리 추천해줘", Some(&tx))
        .await
        .unwrap();
    drop(tx);

    assert_eq!(
        outcome,
        TurnOutcome::Answer("비 오는 날에는 따뜻한 김치찌개를 추천해요!".into())
    );

    let mut tool_calls = Vec::new();
    while let Some(event) = rx.recv().await {
        if let AgentEvent::ToolCall { name, .. } = event {
            tool_calls.push(name);
        }
    }
    assert_eq!(tool_calls, vec!["get_current_weather", "search_recipe"]);

    // Weather without a key is the mock report
    let state = bot.store.load("default_thread").await.unwrap();
    let weather: Value =
        serde_json::from_str(tool_result(&state.messages, "get_current_weather").unwrap())
            .unwrap();
    assert_eq!(weather["status"], "mock");
    assert_eq!(weather["location"], "서울");

    // 3 agent calls plus one extraction
    assert_eq!(model.calls.load(Ordering::SeqCst), 4);
    assert_eq!(model.extractions.load(Ordering::SeqCst), 1);

    let memory = bot.memory.lock().await;
    let profile = memory.list_by_type(MemoryType::Profile);
    assert_eq!(profile.len(), 1);
    assert_eq!(profile[0].content, "비 오는 날 국물 요리를 좋아함");
    assert_eq!(profile[0].importance, 4);
}

#[tokio::test]
async fn test_extracted_memory_is_readable_next_turn() {
    let model = ChefModel::new();
    let bot = bot(model);

    bot.agent
        .run_turn("default_thread", "오늘 비 오는데 국물 요리 추천해줘", None)
        .await
        .unwrap();
    let outcome = bot
        .agent
        .run_turn("default_thread", "내 취향 기억해?", None)
        .await
        .unwrap();

    let answer = outcome.answer().unwrap();
    assert!(answer.starts_with("기억하고 있어요"));
    assert!(answer.contains("국물"));
}

#[tokio::test]
async fn test_search_budget_without_credentials() {
    /// Keeps asking for web search until it sees a decision note.
    struct Searcher {
        searches: AtomicUsize,
    }

    #[async_trait]
    impl LLMProvider for Searcher {
        async fn chat(
            &self,
            messages: Vec<Message>,
            _tools: Vec<ToolDefinition>,
            _model: Option<&str>,
            _options: ChatOptions,
        ) -> Result<LLMResponse> {
            if messages.iter().skip(1).any(Message::is_system) {
                return Ok(LLMResponse::text("가진 정보로 답할게요."));
            }
            let n = self.searches.fetch_add(1, Ordering::SeqCst);
            Ok(LLMResponse::with_tools(
                "",
                vec![LLMToolCall::new(
                    &format!("g{}", n),
                    "search_google",
                    &json!({"query": format!("트렌드 레시피 {}", n)}).to_string(),
                )],
            ))
        }

        fn default_model(&self) -> &str {
            "searcher"
        }

        fn name(&self) -> &str {
            "searcher"
        }
    }

    let dir = tempdir().unwrap();
    let mut registry = ToolRegistry::new();
    registry
        .register(Box::new(GoogleSearchTool::new(None, None)))
        .unwrap();
    let store = Arc::new(SessionManager::with_path(dir.path().to_path_buf()).unwrap());
    let agent = AgentLoop::new(
        Arc::new(Searcher {
            searches: AtomicUsize::new(0),
        }),
        Arc::new(registry),
        store.clone(),
    );

    let outcome = agent.run_turn("t", "요즘 유행하는 요리 찾아줘", None).await.unwrap();
    let interrupt = outcome.interrupt().unwrap();
    assert_eq!(interrupt.resource, "search_google");
    assert_eq!(interrupt.count, 4);

    // A restarted process picks the pending interrupt up from disk
    let reopened = Arc::new(SessionManager::with_path(dir.path().to_path_buf()).unwrap());
    assert!(reopened.load("t").await.unwrap().pending_interrupt.is_some());

    let outcome = agent.resume("t", "no", None).await.unwrap();
    assert_eq!(outcome.answer(), Some("가진 정보로 답할게요."));
    let state = store.load("t").await.unwrap();
    assert!(state.pending_interrupt.is_none());
    assert_eq!(state.counter("search_google"), 4);
}

#[test]
fn test_bundled_corpora_load() {
    let data = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("data");

    let recipes = DocumentIndex::load_recipes(&data.join("recipes.json")).unwrap();
    assert_eq!(recipes.len(), 4);
    let hits = recipes.search("비오는날 국물", 3);
    assert!(!hits.is_empty());
    assert_ne!(hits[0].metadata["name"], "닭가슴살 샐러드");

    let knowledge = DocumentIndex::load_passages(&data.join("food_knowledge.json")).unwrap();
    assert_eq!(knowledge.len(), 4);
    assert!(knowledge.search("생강 효능", 1)[0].content.contains("생강"));
}
