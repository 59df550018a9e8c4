//! Error types for chefbot
//!
//! Every fallible operation in the crate returns [`Result`], whose error is
//! [`ChefError`]. Tool-level failures never reach the agent loop as `Err`; the
//! tool registry folds them into a [`crate::tools::ToolOutcome`] instead.

use std::fmt;
use thiserror::Error;

// ============================================================================
// Provider Error Classification
// ============================================================================

/// Structured classification of language-model gateway HTTP failures.
#[derive(Debug)]
pub enum ProviderError {
    /// 401: invalid API key or authentication failure
    Auth(String),
    /// 429: rate limit or quota exceeded
    RateLimit(String),
    /// 402: payment required
    Billing(String),
    /// 500/502/503/504
    ServerError(String),
    /// 400: malformed request or parameters
    InvalidRequest(String),
    /// 404: model or endpoint not available
    ModelNotFound(String),
    /// Connection or read timeout
    Timeout(String),
    /// Anything the classifier did not recognise
    Unknown(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Auth(msg) => write!(f, "Authentication error: {}", msg),
            ProviderError::RateLimit(msg) => write!(f, "Rate limit error: {}", msg),
            ProviderError::Billing(msg) => write!(f, "Billing error: {}", msg),
            ProviderError::ServerError(msg) => write!(f, "Server error: {}", msg),
            ProviderError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ProviderError::ModelNotFound(msg) => write!(f, "Model not found: {}", msg),
            ProviderError::Timeout(msg) => write!(f, "Timeout: {}", msg),
            ProviderError::Unknown(msg) => write!(f, "Unknown provider error: {}", msg),
        }
    }
}

impl ProviderError {
    /// Returns `true` for transient failures a caller may retry.
    ///
    /// The agent loop itself never retries; this is informational for the
    /// caller deciding whether to re-submit the turn.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimit(_) | ProviderError::ServerError(_) | ProviderError::Timeout(_)
        )
    }

    /// HTTP status code associated with this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ProviderError::Auth(_) => Some(401),
            ProviderError::RateLimit(_) => Some(429),
            ProviderError::Billing(_) => Some(402),
            ProviderError::ServerError(_) => Some(500),
            ProviderError::InvalidRequest(_) => Some(400),
            ProviderError::ModelNotFound(_) => Some(404),
            ProviderError::Timeout(_) | ProviderError::Unknown(_) => None,
        }
    }
}

impl From<ProviderError> for ChefError {
    fn from(err: ProviderError) -> Self {
        ChefError::ProviderTyped(err)
    }
}

// ============================================================================
// Primary Error Type
// ============================================================================

/// The primary error type for chefbot operations.
#[derive(Error, Debug)]
pub enum ChefError {
    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Language-model gateway failure without an HTTP classification
    #[error("Provider error: {0}")]
    Provider(String),

    /// Classified language-model gateway failure
    #[error("Provider error: {0}")]
    ProviderTyped(ProviderError),

    /// Tool registration or execution failure
    #[error("Tool error: {0}")]
    Tool(String),

    /// Thread state could not be persisted or restored
    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    /// Invalid use of a thread (e.g. resuming a thread with nothing pending)
    #[error("Session error: {0}")]
    Session(String),

    /// Long-term memory store failure
    #[error("Memory error: {0}")]
    Memory(String),

    /// Standard I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Resource not found (threads, memories, corpora)
    #[error("Not found: {0}")]
    NotFound(String),
}

impl ChefError {
    /// Whether this error came from the language-model gateway.
    pub fn is_provider(&self) -> bool {
        matches!(
            self,
            ChefError::Provider(_) | ChefError::ProviderTyped(_) | ChefError::Http(_)
        )
    }
}

/// A specialized `Result` type for chefbot operations.
pub type Result<T> = std::result::Result<T, ChefError>;
