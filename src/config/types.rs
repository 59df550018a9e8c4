//! Configuration type definitions for chefbot
//!
//! All types implement serde traits for JSON serialization and have sensible
//! defaults, so a partial `config.json` fills in the rest.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Main configuration struct for chefbot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model and loop settings
    pub agent: AgentConfig,
    /// Search budget and human confirmation
    pub budget: BudgetConfig,
    /// Model gateway credentials
    pub providers: ProvidersConfig,
    /// Tool credentials and corpus locations
    pub tools: ToolsConfig,
    /// Long-term memory
    pub memory: MemoryConfig,
    /// Thread checkpoint storage
    pub checkpoint: CheckpointConfig,
    /// Log output
    pub logging: LoggingConfig,
}

// ============================================================================
// Agent Configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Model to use
    pub model: String,
    /// Maximum tokens per response
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum model calls per loop invocation
    pub max_tool_iterations: u32,
    /// Replaces the built-in chef persona when set
    pub system_prompt: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_tokens: 2048,
            temperature: 0.7,
            max_tool_iterations: 10,
            system_prompt: None,
        }
    }
}

// ============================================================================
// Budget Configuration
// ============================================================================

/// When tool-use counters are cleared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetPolicy {
    /// Counters live as long as the thread
    #[default]
    Persist,
    /// Counters are cleared at the start of every human turn
    PerTurn,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    /// Tools whose invocations are counted
    pub tracked_tools: Vec<String>,
    /// Ask the human once a counter goes above this value
    pub threshold: u64,
    pub reset_policy: ResetPolicy,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            tracked_tools: vec!["search_google".to_string()],
            threshold: 3,
            reset_policy: ResetPolicy::Persist,
        }
    }
}

// ============================================================================
// Provider Configuration
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub openai: ProviderConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    /// OpenAI-compatible base URL; the public endpoint when unset
    pub api_base: Option<String>,
}

// ============================================================================
// Tools Configuration
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub google_api_key: Option<String>,
    pub google_cse_id: Option<String>,
    /// data.go.kr service key for KMA observations
    pub weather_api_key: Option<String>,
    /// JSON array of recipes
    pub recipe_corpus: Option<PathBuf>,
    /// JSON array of `{content, source}` passages
    pub knowledge_corpus: Option<PathBuf>,
}

// ============================================================================
// Memory Configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Register the memory tools
    pub enabled: bool,
    /// Run the extractor after each completed turn
    pub extraction: bool,
    /// Store location; `~/.chefbot/memory/longterm.json` when unset
    pub path: Option<PathBuf>,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            extraction: true,
            path: None,
        }
    }
}

// ============================================================================
// Checkpoint Configuration
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckpointConfig {
    /// Directory of per-thread JSON files; `~/.chefbot/threads` when unset
    pub dir: Option<PathBuf>,
}

// ============================================================================
// Logging Configuration
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line human-readable output
    Pretty,
    /// Single-line text output
    #[default]
    Compact,
    /// JSON lines
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    pub format: LogFormat,
    /// Append to this file instead of stderr
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Compact,
            file: None,
        }
    }
}
