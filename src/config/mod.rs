//! Configuration management for chefbot
//!
//! Configuration is loaded from `~/.chefbot/config.json`, then overridden by
//! environment variables (`CHEFBOT_SECTION_KEY`, plus the conventional
//! `OPENAI_API_KEY`, `GOOGLE_API_KEY`, `GOOGLE_CSE_ID` and
//! `WEATHER_API_KEY`). A `.env` file in the working directory is honoured.

mod types;
pub mod validate;

pub use types::*;

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ChefError, Result};

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env_var(name).and_then(|v| v.trim().parse().ok())
}

impl Config {
    /// Returns the chefbot data directory (~/.chefbot)
    pub fn dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".chefbot")
    }

    /// Returns the path to the config file (~/.chefbot/config.json)
    pub fn path() -> PathBuf {
        Self::dir().join("config.json")
    }

    /// Load configuration from the default path with environment overrides.
    ///
    /// A missing config file yields the defaults.
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::path())
    }

    /// Load configuration from a specific path with environment overrides.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        // .env is optional
        let _ = dotenvy::dotenv();

        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str(&content).map_err(|e| {
                ChefError::Config(format!("invalid config {}: {}", path.display(), e))
            })?
        } else {
            debug!(path = %path.display(), "No config file, using defaults");
            Config::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    fn apply_env_overrides(&mut self) {
        // Agent
        if let Some(val) = env_var("CHEFBOT_AGENT_MODEL") {
            self.agent.model = val;
        }
        if let Some(v) = env_parse("CHEFBOT_AGENT_MAX_TOKENS") {
            self.agent.max_tokens = v;
        }
        if let Some(v) = env_parse("CHEFBOT_AGENT_TEMPERATURE") {
            self.agent.temperature = v;
        }
        if let Some(v) = env_parse("CHEFBOT_AGENT_MAX_TOOL_ITERATIONS") {
            self.agent.max_tool_iterations = v;
        }

        // Budget
        if let Some(v) = env_parse("CHEFBOT_BUDGET_THRESHOLD") {
            self.budget.threshold = v;
        }
        if let Some(val) = env_var("CHEFBOT_BUDGET_TRACKED_TOOLS") {
            self.budget.tracked_tools = val
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(val) = env_var("CHEFBOT_BUDGET_RESET_POLICY") {
            match val.trim() {
                "persist" => self.budget.reset_policy = ResetPolicy::Persist,
                "per_turn" => self.budget.reset_policy = ResetPolicy::PerTurn,
                other => tracing::warn!(value = other, "Ignoring unknown reset policy"),
            }
        }

        // Provider
        if let Some(val) = env_var("CHEFBOT_PROVIDERS_OPENAI_API_KEY").or_else(|| env_var("OPENAI_API_KEY")) {
            self.providers.openai.api_key = Some(val);
        }
        if let Some(val) = env_var("CHEFBOT_PROVIDERS_OPENAI_API_BASE") {
            self.providers.openai.api_base = Some(val);
        }

        // Tools
        if let Some(val) = env_var("GOOGLE_API_KEY") {
            self.tools.google_api_key = Some(val);
        }
        if let Some(val) = env_var("GOOGLE_CSE_ID") {
            self.tools.google_cse_id = Some(val);
        }
        if let Some(val) = env_var("WEATHER_API_KEY") {
            self.tools.weather_api_key = Some(val);
        }
        if let Some(val) = env_var("CHEFBOT_TOOLS_RECIPE_CORPUS") {
            self.tools.recipe_corpus = Some(PathBuf::from(val));
        }
        if let Some(val) = env_var("CHEFBOT_TOOLS_KNOWLEDGE_CORPUS") {
            self.tools.knowledge_corpus = Some(PathBuf::from(val));
        }

        // Memory
        if let Some(v) = env_parse("CHEFBOT_MEMORY_ENABLED") {
            self.memory.enabled = v;
        }
        if let Some(v) = env_parse("CHEFBOT_MEMORY_EXTRACTION") {
            self.memory.extraction = v;
        }

        // Checkpoints
        if let Some(val) = env_var("CHEFBOT_CHECKPOINT_DIR") {
            self.checkpoint.dir = Some(PathBuf::from(val));
        }

        // Logging
        if let Some(val) = env_var("CHEFBOT_LOG_LEVEL") {
            self.logging.level = val;
        }
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Directory holding per-thread checkpoints.
    pub fn checkpoint_dir(&self) -> PathBuf {
        self.checkpoint
            .dir
            .as_deref()
            .map(expand_home)
            .unwrap_or_else(|| Self::dir().join("threads"))
    }

    /// Long-term memory file.
    pub fn memory_path(&self) -> PathBuf {
        self.memory
            .path
            .as_deref()
            .map(expand_home)
            .unwrap_or_else(|| Self::dir().join("memory").join("longterm.json"))
    }
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.agent.model, "gpt-4o-mini");
        assert_eq!(config.agent.max_tool_iterations, 10);
        assert_eq!(config.budget.tracked_tools, vec!["search_google"]);
        assert_eq!(config.budget.threshold, 3);
        assert_eq!(config.budget.reset_policy, ResetPolicy::Persist);
        assert!(config.memory.enabled);
    }

    #[test]
    fn test_config_partial_json() {
        let config: Config =
            serde_json::from_str(r#"{"budget": {"threshold": 5, "reset_policy": "per_turn"}}"#)
                .unwrap();
        assert_eq!(config.budget.threshold, 5);
        assert_eq!(config.budget.reset_policy, ResetPolicy::PerTurn);
        assert_eq!(config.budget.tracked_tools, vec!["search_google"]);
        assert_eq!(config.agent.model, "gpt-4o-mini");
    }

    #[test]
    fn test_logging_config_parse() {
        let config: Config =
            serde_json::from_str(r#"{"logging": {"format": "json", "level": "debug"}}"#).unwrap();
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.file.is_none());
    }

    #[test]
    fn test_config_dir() {
        assert!(Config::dir().ends_with(".chefbot"));
        assert!(Config::path().ends_with(".chefbot/config.json"));
    }

    #[test]
    fn test_default_storage_paths() {
        let config = Config::default();
        assert!(config.checkpoint_dir().ends_with(".chefbot/threads"));
        assert!(config.memory_path().ends_with("memory/longterm.json"));
    }

    #[test]
    fn test_expand_home() {
        let expanded = expand_home(Path::new("~/recipes.json"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expanded, home.join("recipes.json"));
        }
        assert_eq!(expand_home(Path::new("/tmp/x")), PathBuf::from("/tmp/x"));
    }

    #[test]
    fn test_env_override() {
        env::set_var("CHEFBOT_AGENT_MAX_TOOL_ITERATIONS", "4");
        env::set_var("CHEFBOT_BUDGET_TRACKED_TOOLS", "search_google, search_recipe");

        let mut config = Config::default();
        config.apply_env_overrides();

        assert_eq!(config.agent.max_tool_iterations, 4);
        assert_eq!(
            config.budget.tracked_tools,
            vec!["search_google", "search_recipe"]
        );

        env::remove_var("CHEFBOT_AGENT_MAX_TOOL_ITERATIONS");
        env::remove_var("CHEFBOT_BUDGET_TRACKED_TOOLS");
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.budget.threshold = 7;
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.budget.threshold, 7);
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            Config::load_from_path(&path),
            Err(ChefError::Config(_))
        ));
    }

    #[test]
    fn test_load_nonexistent() {
        let config = Config::load_from_path(Path::new("/nonexistent/config.json")).unwrap();
        assert_eq!(config.budget.threshold, 3);
    }
}
