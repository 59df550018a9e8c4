//! Configuration validation with unknown field detection.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::Config;

static TOOL_NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").unwrap());

/// Known top-level config field names.
const KNOWN_TOP_LEVEL: &[&str] = &[
    "agent",
    "budget",
    "providers",
    "tools",
    "memory",
    "checkpoint",
    "logging",
];

/// Known fields per section.
const KNOWN_SECTIONS: &[(&str, &[&str])] = &[
    (
        "agent",
        &[
            "model",
            "max_tokens",
            "temperature",
            "max_tool_iterations",
            "system_prompt",
        ],
    ),
    ("budget", &["tracked_tools", "threshold", "reset_policy"]),
    ("providers", &["openai"]),
    (
        "tools",
        &[
            "google_api_key",
            "google_cse_id",
            "weather_api_key",
            "recipe_corpus",
            "knowledge_corpus",
        ],
    ),
    ("memory", &["enabled", "extraction", "path"]),
    ("checkpoint", &["dir"]),
    ("logging", &["level", "format", "file"]),
];

/// A validation diagnostic.
#[derive(Debug)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub path: String,
    pub message: String,
}

#[derive(Debug, PartialEq)]
pub enum DiagnosticLevel {
    Ok,
    Warn,
    Error,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.level {
            DiagnosticLevel::Ok => "[OK]",
            DiagnosticLevel::Warn => "[WARN]",
            DiagnosticLevel::Error => "[ERROR]",
        };
        if self.path.is_empty() {
            write!(f, "{} {}", prefix, self.message)
        } else {
            write!(f, "{} {}: {}", prefix, self.path, self.message)
        }
    }
}

impl Diagnostic {
    fn new(level: DiagnosticLevel, path: &str, message: impl Into<String>) -> Self {
        Self {
            level,
            path: path.to_string(),
            message: message.into(),
        }
    }
}

/// Levenshtein distance for "did you mean?" suggestions.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.iter().enumerate() {
        let mut row = vec![i + 1; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            row[j + 1] = (prev[j + 1] + 1).min(row[j] + 1).min(prev[j] + cost);
        }
        prev = row;
    }
    prev[b.len()]
}

/// Suggest the closest known field name (if distance <= 3).
pub fn suggest_field(unknown: &str, known: &[&str]) -> Option<String> {
    known
        .iter()
        .map(|k| (k, levenshtein(unknown, k)))
        .filter(|(_, d)| *d <= 3)
        .min_by_key(|(_, d)| *d)
        .map(|(k, _)| format!("did you mean '{}'?", k))
}

fn unknown_keys(
    obj: &serde_json::Map<String, Value>,
    known: &[&str],
    prefix: &str,
    out: &mut Vec<Diagnostic>,
) {
    let known_set: HashSet<&str> = known.iter().copied().collect();
    for key in obj.keys().filter(|k| !known_set.contains(k.as_str())) {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        let message = match suggest_field(key, known) {
            Some(hint) => format!("Unknown field '{}', {}", key, hint),
            None => format!("Unknown field '{}'", key),
        };
        out.push(Diagnostic::new(DiagnosticLevel::Error, &path, message));
    }
}

/// Validate a raw JSON config value against known field names.
pub fn validate_config(raw: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    let Some(obj) = raw.as_object() else {
        diagnostics.push(Diagnostic::new(
            DiagnosticLevel::Error,
            "",
            "Config must be a JSON object",
        ));
        return diagnostics;
    };
    diagnostics.push(Diagnostic::new(DiagnosticLevel::Ok, "", "Valid JSON"));

    let before = diagnostics.len();
    unknown_keys(obj, KNOWN_TOP_LEVEL, "", &mut diagnostics);
    for (section, known) in KNOWN_SECTIONS {
        if let Some(inner) = obj.get(*section).and_then(Value::as_object) {
            unknown_keys(inner, known, section, &mut diagnostics);
        }
    }
    if diagnostics.len() == before {
        diagnostics.push(Diagnostic::new(
            DiagnosticLevel::Ok,
            "",
            "All fields recognized",
        ));
    }
    diagnostics
}

/// Semantic checks on a loaded config.
pub fn validate_values(config: &Config) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    if config.agent.max_tool_iterations == 0 {
        diagnostics.push(Diagnostic::new(
            DiagnosticLevel::Error,
            "agent.max_tool_iterations",
            "must be at least 1",
        ));
    }
    if !(0.0..=2.0).contains(&config.agent.temperature) {
        diagnostics.push(Diagnostic::new(
            DiagnosticLevel::Warn,
            "agent.temperature",
            format!("{} is outside 0.0..=2.0", config.agent.temperature),
        ));
    }
    if config.budget.tracked_tools.is_empty() {
        diagnostics.push(Diagnostic::new(
            DiagnosticLevel::Warn,
            "budget.tracked_tools",
            "empty, the search budget will never ask for confirmation",
        ));
    }
    for name in &config.budget.tracked_tools {
        if !TOOL_NAME_RE.is_match(name) {
            diagnostics.push(Diagnostic::new(
                DiagnosticLevel::Error,
                "budget.tracked_tools",
                format!("'{}' is not a valid tool name", name),
            ));
        }
    }
    if config.providers.openai.api_key.as_deref().unwrap_or("").is_empty() {
        diagnostics.push(Diagnostic::new(
            DiagnosticLevel::Warn,
            "providers.openai.api_key",
            "not set (OPENAI_API_KEY)",
        ));
    }
    for (path, corpus) in [
        ("tools.recipe_corpus", &config.tools.recipe_corpus),
        ("tools.knowledge_corpus", &config.tools.knowledge_corpus),
    ] {
        if let Some(p) = corpus.as_ref().filter(|p| !p.exists()) {
            diagnostics.push(Diagnostic::new(
                DiagnosticLevel::Warn,
                path,
                format!("{} does not exist", p.display()),
            ));
        }
    }
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("budget", "budget"), 0);
        assert_eq!(levenshtein("budgte", "budget"), 2);
        assert_eq!(levenshtein("", "abc"), 3);
    }

    #[test]
    fn test_valid_config() {
        let diags = validate_config(&json!({"agent": {"model": "gpt-4o"}, "budget": {"threshold": 5}}));
        assert!(diags.iter().all(|d| d.level == DiagnosticLevel::Ok));
    }

    #[test]
    fn test_unknown_field_with_suggestion() {
        let diags = validate_config(&json!({"budjet": {}, "budget": {"treshold": 3}}));
        let errors: Vec<String> = diags
            .iter()
            .filter(|d| d.level == DiagnosticLevel::Error)
            .map(|d| d.to_string())
            .collect();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("did you mean 'budget'?"));
        assert!(errors[1].starts_with("[ERROR] budget.treshold"));
    }

    #[test]
    fn test_not_an_object() {
        let diags = validate_config(&json!([1, 2]));
        assert_eq!(diags[0].level, DiagnosticLevel::Error);
    }

    #[test]
    fn test_validate_values() {
        let mut config = Config::default();
        config.agent.max_tool_iterations = 0;
        config.budget.tracked_tools = vec!["Search Google".into()];
        let diags = validate_values(&config);
        let errors: Vec<&str> = diags
            .iter()
            .filter(|d| d.level == DiagnosticLevel::Error)
            .map(|d| d.path.as_str())
            .collect();
        assert_eq!(errors, vec!["agent.max_tool_iterations", "budget.tracked_tools"]);
    }
}
