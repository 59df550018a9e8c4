//! Session module - thread state and checkpointing
//!
//! This module provides the persisted state of each conversation thread and
//! the [`CheckpointStore`] seam the agent loop writes it through:
//! - In-memory storage with async access
//! - File-based persistence, one JSON document per thread
//! - Load-or-empty semantics so a new thread needs no setup
//!
//! # Example
//!
//! ```
//! use chefbot::session::{CheckpointStore, Message, SessionManager};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = SessionManager::new_memory();
//!
//!     let mut state = store.load("default_thread").await.unwrap();
//!     state.push(Message::human("비 오는 날 뭐 먹지?"));
//!     store.save("default_thread", &state).await.unwrap();
//!
//!     let loaded = store.load("default_thread").await.unwrap();
//!     assert_eq!(loaded.messages.len(), 1);
//! }
//! ```

pub mod types;

pub use types::{BudgetDecision, Interrupt, Message, SessionState, ToolRequest};

use crate::config::Config;
use crate::error::{ChefError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Durable storage for per-thread state.
///
/// `save` must not return `Ok` until a later `load` of the same thread id is
/// guaranteed to observe the saved state.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Persist the state of `thread_id`.
    async fn save(&self, thread_id: &str, state: &SessionState) -> Result<()>;

    /// Load the state of `thread_id`, or a fresh empty state if none exists.
    async fn load(&self, thread_id: &str) -> Result<SessionState>;

    /// Remove a thread. Removing an unknown thread is not an error.
    async fn delete(&self, thread_id: &str) -> Result<()>;

    /// All known thread ids, sorted.
    async fn list(&self) -> Result<Vec<String>>;
}

/// Checkpoint store with an in-memory cache and optional file persistence.
///
/// # Thread Safety
///
/// The manager uses `Arc<RwLock>` internally, so clones share one cache.
/// Serialising access to a single thread is the agent loop's job.
///
/// # Persistence
///
/// When created with `new()`, threads are persisted under
/// `~/.chefbot/threads/`. Use `new_memory()` for tests or one-off runs.
pub struct SessionManager {
    /// In-memory cache of thread states
    threads: Arc<RwLock<HashMap<String, SessionState>>>,
    /// Optional directory for file-based persistence
    storage_path: Option<PathBuf>,
}

impl SessionManager {
    /// Create a manager persisting to `~/.chefbot/threads/`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new() -> Result<Self> {
        Self::with_path(Config::dir().join("threads"))
    }

    /// Create an in-memory manager without persistence.
    ///
    /// # Example
    /// ```
    /// use chefbot::session::SessionManager;
    ///
    /// let manager = SessionManager::new_memory();
    /// ```
    pub fn new_memory() -> Self {
        Self {
            threads: Arc::new(RwLock::new(HashMap::new())),
            storage_path: None,
        }
    }

    /// Create a manager persisting to a custom directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn with_path(path: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&path).map_err(|e| {
            ChefError::Checkpoint(format!("cannot create {}: {}", path.display(), e))
        })?;
        Ok(Self {
            threads: Arc::new(RwLock::new(HashMap::new())),
            storage_path: Some(path),
        })
    }

    /// Whether a thread exists in memory or on disk.
    pub async fn exists(&self, thread_id: &str) -> bool {
        {
            let threads = self.threads.read().await;
            if threads.contains_key(thread_id) {
                return true;
            }
        }

        match self.file_path(thread_id) {
            Some(path) => path.exists(),
            None => false,
        }
    }

    /// Drop the in-memory cache (persisted threads are untouched).
    pub async fn clear_cache(&self) {
        let mut threads = self.threads.write().await;
        threads.clear();
    }

    /// Number of threads held in memory.
    pub async fn cache_size(&self) -> usize {
        let threads = self.threads.read().await;
        threads.len()
    }

    fn file_path(&self, thread_id: &str) -> Option<PathBuf> {
        self.storage_path
            .as_ref()
            .map(|dir| dir.join(format!("{}.json", Self::sanitize_key(thread_id))))
    }

    /// Sanitize a thread id for use as a filename.
    ///
    /// Percent-encoding keeps the mapping one-to-one, so
    /// "user:42" and "user/42" never share a file.
    fn sanitize_key(key: &str) -> String {
        let mut result = String::with_capacity(key.len() * 3);
        for c in key.chars() {
            match c {
                '/' => result.push_str("%2F"),
                '\\' => result.push_str("%5C"),
                ':' => result.push_str("%3A"),
                '*' => result.push_str("%2A"),
                '?' => result.push_str("%3F"),
                '"' => result.push_str("%22"),
                '<' => result.push_str("%3C"),
                '>' => result.push_str("%3E"),
                '|' => result.push_str("%7C"),
                '%' => result.push_str("%25"),
                c => result.push(c),
            }
        }
        result
    }

    /// Write through a uniquely named temp file in the same directory, then
    /// rename it over the checkpoint.
    fn write_file(path: &Path, content: &[u8]) -> Result<()> {
        let write_err =
            |e: std::io::Error| ChefError::Checkpoint(format!("write {}: {}", path.display(), e));
        let dir = path.parent().ok_or_else(|| {
            ChefError::Checkpoint(format!("no parent directory for {}", path.display()))
        })?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(content).map_err(write_err)?;
        tmp.persist(path).map_err(|e| write_err(e.error))?;
        Ok(())
    }

    async fn read_file(path: &PathBuf) -> Result<SessionState> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ChefError::Checkpoint(format!("read {}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| ChefError::Checkpoint(format!("corrupt {}: {}", path.display(), e)))
    }
}

#[async_trait]
impl CheckpointStore for SessionManager {
    async fn save(&self, thread_id: &str, state: &SessionState) -> Result<()> {
        if let Some(path) = self.file_path(thread_id) {
            let content = serde_json::to_string_pretty(state)?;
            tokio::task::spawn_blocking(move || Self::write_file(&path, content.as_bytes()))
                .await
                .map_err(|e| ChefError::Checkpoint(format!("checkpoint writer failed: {}", e)))??;
        }

        let mut threads = self.threads.write().await;
        threads.insert(thread_id.to_string(), state.clone());
        debug!(thread_id = %thread_id, messages = state.messages.len(), "Checkpoint saved");
        Ok(())
    }

    async fn load(&self, thread_id: &str) -> Result<SessionState> {
        {
            let threads = self.threads.read().await;
            if let Some(state) = threads.get(thread_id) {
                return Ok(state.clone());
            }
        }

        if let Some(path) = self.file_path(thread_id) {
            if path.exists() {
                let state = Self::read_file(&path).await?;
                let mut threads = self.threads.write().await;
                threads.insert(thread_id.to_string(), state.clone());
                return Ok(state);
            }
        }

        Ok(SessionState::new(thread_id))
    }

    async fn delete(&self, thread_id: &str) -> Result<()> {
        {
            let mut threads = self.threads.write().await;
            threads.remove(thread_id);
        }

        if let Some(path) = self.file_path(thread_id) {
            if path.exists() {
                tokio::fs::remove_file(&path).await?;
            }
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = {
            let threads = self.threads.read().await;
            threads.keys().cloned().collect()
        };

        // Read each file for the real thread id rather than decoding filenames
        if let Some(ref storage_path) = self.storage_path {
            let mut entries = tokio::fs::read_dir(storage_path).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if path.extension().map(|e| e == "json").unwrap_or(false) {
                    if let Ok(state) = Self::read_file(&path).await {
                        if !ids.contains(&state.thread_id) {
                            ids.push(state.thread_id);
                        }
                    }
                }
            }
        }

        ids.sort();
        Ok(ids)
    }
}

impl Clone for SessionManager {
    fn clone(&self) -> Self {
        Self {
            threads: Arc::clone(&self.threads),
            storage_path: self.storage_path.clone(),
        }
    }
}

impl Default for SessionManager {
    /// Creates an in-memory manager.
    fn default() -> Self {
        Self::new_memory()
    }
}
