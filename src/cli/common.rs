//! Shared CLI helpers used across multiple command handlers.

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::Mutex;
use tracing::{info, warn};

use chefbot::agent::{AgentLoop, BudgetPolicy};
use chefbot::config::Config;
use chefbot::corpus::DocumentIndex;
use chefbot::memory::{LlmMemoryExtractor, LongTermMemory};
use chefbot::providers::{LLMProvider, OpenAIProvider};
use chefbot::session::SessionManager;
use chefbot::tools::calculator::CalculateTool;
use chefbot::tools::memory::{ReadMemoryTool, WriteMemoryTool};
use chefbot::tools::recipe::{KnowledgeSearchTool, RecipeSearchTool};
use chefbot::tools::recommend::RecommendRecipeTool;
use chefbot::tools::time::CurrentTimeTool;
use chefbot::tools::weather::WeatherTool;
use chefbot::tools::web::GoogleSearchTool;
use chefbot::tools::ToolRegistry;

/// Thread used when `--thread` is not given.
pub(crate) const DEFAULT_THREAD: &str = "default_thread";

/// Read a line from stdin, trimming whitespace. `None` on EOF.
pub(crate) fn read_line() -> Result<Option<String>> {
    let mut input = String::new();
    let read = io::stdin()
        .lock()
        .read_line(&mut input)
        .with_context(|| "Failed to read input")?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim().to_string()))
}

/// Print `prompt` without a newline and flush.
pub(crate) fn prompt(prompt: &str) -> Result<()> {
    print!("{}", prompt);
    io::stdout().flush()?;
    Ok(())
}

/// Load configuration with context for the user.
pub(crate) fn load_config() -> Result<Config> {
    Config::load().with_context(|| format!("Failed to load configuration from {:?}", Config::path()))
}

pub(crate) fn open_store(config: &Config) -> Result<SessionManager> {
    let dir = config.checkpoint_dir();
    SessionManager::with_path(dir.clone())
        .with_context(|| format!("Failed to open checkpoint directory {}", dir.display()))
}

pub(crate) fn open_memory(config: &Config) -> Result<LongTermMemory> {
    let path = config.memory_path();
    LongTermMemory::with_path(path.clone())
        .with_context(|| format!("Failed to open memory file {}", path.display()))
}

/// Load an optional corpus. A broken file is logged and treated as absent
/// so the rest of the bot keeps working.
fn load_corpus(
    path: Option<&Path>,
    loader: fn(&Path) -> chefbot::Result<DocumentIndex>,
    label: &str,
) -> Option<Arc<DocumentIndex>> {
    let path = path?;
    let path = chefbot::config::expand_home(path);
    match loader(&path) {
        Ok(index) => {
            info!(corpus = label, documents = index.len(), path = %path.display(), "Corpus loaded");
            Some(Arc::new(index))
        }
        Err(e) => {
            warn!(corpus = label, path = %path.display(), error = %e, "Failed to load corpus");
            None
        }
    }
}

/// Register every built-in tool. Memory tools are added only when a store
/// is supplied.
pub(crate) fn build_registry(
    config: &Config,
    memory: Option<Arc<Mutex<LongTermMemory>>>,
) -> Result<ToolRegistry> {
    let recipes = load_corpus(
        config.tools.recipe_corpus.as_deref(),
        DocumentIndex::load_recipes,
        "recipes",
    );
    let knowledge = load_corpus(
        config.tools.knowledge_corpus.as_deref(),
        DocumentIndex::load_passages,
        "knowledge",
    );

    let mut registry = ToolRegistry::new();
    registry.register(Box::new(RecipeSearchTool::new(recipes)))?;
    registry.register(Box::new(KnowledgeSearchTool::new(knowledge)))?;
    registry.register(Box::new(GoogleSearchTool::new(
        config.tools.google_api_key.clone(),
        config.tools.google_cse_id.clone(),
    )))?;
    registry.register(Box::new(WeatherTool::new(
        config.tools.weather_api_key.clone(),
    )))?;
    registry.register(Box::new(CurrentTimeTool))?;
    registry.register(Box::new(CalculateTool))?;
    registry.register(Box::new(RecommendRecipeTool))?;
    if let Some(memory) = memory {
        registry.register(Box::new(WriteMemoryTool::new(memory.clone())))?;
        registry.register(Box::new(ReadMemoryTool::new(memory)))?;
    }

    info!(tools = registry.len(), "Tool registry ready");
    Ok(registry)
}

fn create_provider(config: &Config) -> Result<Arc<dyn LLMProvider>> {
    let openai = &config.providers.openai;
    let api_key = openai
        .api_key
        .as_deref()
        .filter(|k| !k.trim().is_empty())
        .with_context(|| {
            format!(
                "No OpenAI API key configured. Set OPENAI_API_KEY or providers.openai.api_key in {:?}",
                Config::path()
            )
        })?;

    let provider = match openai.api_base.as_deref() {
        Some(base) => OpenAIProvider::with_base_url(api_key, base),
        None => OpenAIProvider::new(api_key),
    };
    Ok(Arc::new(provider.with_model(&config.agent.model)))
}

/// Wire the agent from configuration: provider, tools, checkpoint store,
/// and the memory extractor when enabled.
pub(crate) fn create_agent(config: &Config) -> Result<AgentLoop> {
    let provider = create_provider(config)?;

    let memory = if config.memory.enabled {
        Some(Arc::new(Mutex::new(open_memory(config)?)))
    } else {
        None
    };

    let registry = build_registry(config, memory.clone())?;
    let store = open_store(config)?;

    let mut agent = AgentLoop::new(provider.clone(), Arc::new(registry), Arc::new(store))
        .with_agent_config(&config.agent)
        .with_budget(BudgetPolicy::from_config(&config.budget));

    if let Some(memory) = memory.filter(|_| config.memory.extraction) {
        let extractor = LlmMemoryExtractor::new(provider, memory).with_model(&config.agent.model);
        agent = agent.with_extractor(Arc::new(extractor));
    }

    Ok(agent)
}
