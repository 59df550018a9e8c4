//! Long-term memory store for chefbot.
//!
//! Durable facts about the user (allergies, diets, favourite dishes) and
//! notable past exchanges, kept across threads. Stored as a single JSON file
//! at `~/.chefbot/memory/longterm.json`.

use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{ChefError, Result};

use super::bm25_searcher::Bm25Searcher;
use super::traits::MemorySearcher;

fn now_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Kind of memory, as chosen by the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryType {
    /// Stable user traits and preferences
    Profile,
    /// Something that happened in a conversation
    Episodic,
    /// General cooking knowledge worth keeping
    Knowledge,
}

impl fmt::Display for MemoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryType::Profile => write!(f, "profile"),
            MemoryType::Episodic => write!(f, "episodic"),
            MemoryType::Knowledge => write!(f, "knowledge"),
        }
    }
}

impl std::str::FromStr for MemoryType {
    type Err = ChefError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "profile" => Ok(MemoryType::Profile),
            "episodic" => Ok(MemoryType::Episodic),
            "knowledge" => Ok(MemoryType::Knowledge),
            other => Err(ChefError::Memory(format!("unknown memory type: {}", other))),
        }
    }
}

/// A single memory entry with metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemoryEntry {
    /// Generated identifier (UUID v4).
    pub id: String,
    /// The remembered text.
    pub content: String,
    pub memory_type: MemoryType,
    /// 1 (trivia) to 5 (critical, e.g. allergies).
    pub importance: u8,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Unix timestamp.
    pub created_at: u64,
    /// Unix timestamp.
    pub last_accessed: u64,
    pub access_count: u64,
}

impl MemoryEntry {
    fn search_text(&self) -> String {
        format!("{} {} {}", self.content, self.memory_type, self.tags.join(" "))
    }
}

/// Long-term memory store persisted as JSON.
pub struct LongTermMemory {
    entries: HashMap<String, MemoryEntry>,
    storage_path: PathBuf,
    searcher: Arc<dyn MemorySearcher>,
}

impl fmt::Debug for LongTermMemory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LongTermMemory")
            .field("entries", &self.entries.len())
            .field("storage_path", &self.storage_path)
            .field("searcher", &self.searcher.name())
            .finish()
    }
}

impl LongTermMemory {
    /// Open the store at `~/.chefbot/memory/longterm.json`.
    pub fn new() -> Result<Self> {
        Self::with_path(Config::dir().join("memory").join("longterm.json"))
    }

    /// Open the store at a custom path, using BM25 ranking.
    pub fn with_path(path: PathBuf) -> Result<Self> {
        Self::with_path_and_searcher(path, Arc::new(Bm25Searcher::new()))
    }

    /// Open the store with a custom searcher.
    pub fn with_path_and_searcher(
        path: PathBuf,
        searcher: Arc<dyn MemorySearcher>,
    ) -> Result<Self> {
        let entries = Self::load(&path)?;
        for entry in entries.values() {
            searcher.index(&entry.id, &entry.search_text());
        }
        Ok(Self {
            entries,
            storage_path: path,
            searcher,
        })
    }

    /// Store a new memory and persist immediately. Returns its id.
    ///
    /// # Errors
    ///
    /// `ChefError::Memory` for empty content or importance outside 1..=5.
    pub fn write(
        &mut self,
        content: &str,
        memory_type: MemoryType,
        importance: u8,
        tags: Vec<String>,
    ) -> Result<String> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ChefError::Memory("memory content is empty".to_string()));
        }
        if !(1..=5).contains(&importance) {
            return Err(ChefError::Memory(format!(
                "importance must be between 1 and 5, got {}",
                importance
            )));
        }

        let now = now_timestamp();
        let entry = MemoryEntry {
            id: Uuid::new_v4().to_string(),
            content: content.to_string(),
            memory_type,
            importance,
            tags,
            created_at: now,
            last_accessed: now,
            access_count: 0,
        };
        let id = entry.id.clone();
        self.searcher.index(&id, &entry.search_text());
        self.entries.insert(id.clone(), entry);
        self.save()?;
        Ok(id)
    }

    /// Retrieve an entry without touching access stats.
    pub fn get(&self, id: &str) -> Option<&MemoryEntry> {
        self.entries.get(id)
    }

    /// Up to `top_k` entries relevant to `query`, best first.
    ///
    /// Ties on score are broken by importance. Access stats of returned
    /// entries are updated in memory; call `save()` to persist them.
    pub fn search(&mut self, query: &str, top_k: usize) -> Vec<MemoryEntry> {
        let mut scored: Vec<(String, f32, u8)> = self
            .entries
            .values()
            .filter_map(|entry| {
                let score = self.searcher.score(&entry.search_text(), query);
                (score > 0.0).then(|| (entry.id.clone(), score, entry.importance))
            })
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.2.cmp(&a.2))
        });

        let now = now_timestamp();
        scored
            .into_iter()
            .take(top_k)
            .filter_map(|(id, _, _)| {
                let entry = self.entries.get_mut(&id)?;
                entry.last_accessed = now;
                entry.access_count += 1;
                Some(entry.clone())
            })
            .collect()
    }

    /// Delete an entry. Returns whether it existed.
    pub fn delete(&mut self, id: &str) -> Result<bool> {
        let existed = self.entries.remove(id).is_some();
        if existed {
            self.searcher.remove(id);
            self.save()?;
        }
        Ok(existed)
    }

    /// All entries, newest first.
    pub fn list_all(&self) -> Vec<&MemoryEntry> {
        let mut results: Vec<&MemoryEntry> = self.entries.values().collect();
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        results
    }

    /// Entries of one type, newest first.
    pub fn list_by_type(&self, memory_type: MemoryType) -> Vec<&MemoryEntry> {
        self.list_all()
            .into_iter()
            .filter(|e| e.memory_type == memory_type)
            .collect()
    }

    /// Number of stored entries.
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Persist the current state to disk as pretty-printed JSON.
    pub fn save(&self) -> Result<()> {
        let parent = self
            .storage_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent).map_err(|e| {
            ChefError::Memory(format!(
                "Failed to create memory directory {}: {}",
                parent.display(),
                e
            ))
        })?;

        let json = serde_json::to_string_pretty(&self.entries)?;
        let write_err = |e: std::io::Error| {
            ChefError::Memory(format!(
                "Failed to write long-term memory to {}: {}",
                self.storage_path.display(),
                e
            ))
        };
        let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(write_err)?;
        tmp.write_all(json.as_bytes()).map_err(write_err)?;
        tmp.persist(&self.storage_path)
            .map_err(|e| write_err(e.error))?;
        Ok(())
    }


    /// Load entries from disk. A missing or empty file is an empty store.
    fn load(path: &PathBuf) -> Result<HashMap<String, MemoryEntry>> {
        if !path.exists() {
            return Ok(HashMap::new());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            ChefError::Memory(format!(
                "Failed to read long-term memory from {}: {}",
                path.display(),
                e
            ))
        })?;

        if content.trim().is_empty() {
            return Ok(HashMap::new());
        }

        serde_json::from_str(&content)
            .map_err(|e| ChefError::Memory(format!("Failed to parse long-term memory JSON: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_memory() -> (LongTermMemory, TempDir) {
        let dir = TempDir::new().expect("failed to create temp dir");
        let path = dir.path().join("longterm.json");
        let mem = LongTermMemory::with_path(path).expect("failed to create memory");
        (mem, dir)
    }

    #[test]
    fn test_new_empty() {
        let (mem, _dir) = temp_memory();
        assert_eq!(mem.count(), 0);
    }

    #[test]
    fn test_write_and_get() {
        let (mut mem, _dir) = temp_memory();
        let id = mem
            .write(
                "땅콩 알레르기가 있음",
                MemoryType::Profile,
                5,
                vec!["allergy".into()],
            )
            .unwrap();

        let entry = mem.get(&id).unwrap();
        assert_eq!(entry.content, "땅콩 알레르기가 있음");
        assert_eq!(entry.memory_type, MemoryType::Profile);
        assert_eq!(entry.importance, 5);
        assert!(Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn test_write_validation() {
        let (mut mem, _dir) = temp_memory();
        assert!(mem.write("x", MemoryType::Episodic, 0, vec![]).is_err());
        assert!(mem.write("x", MemoryType::Episodic, 6, vec![]).is_err());
        assert!(mem.write("   ", MemoryType::Episodic, 3, vec![]).is_err());
        assert_eq!(mem.count(), 0);
    }

    #[test]
    fn test_search_ranks_relevant_first() {
        let (mut mem, _dir) = temp_memory();
        mem.write("요즘 다이어트 중이라 저녁은 샐러드", MemoryType::Profile, 4, vec!["diet".into()])
            .unwrap();
        mem.write("매운 음식을 좋아함", MemoryType::Profile, 3, vec![])
            .unwrap();
        mem.write("김치찌개 레시피를 물어봄", MemoryType::Episodic, 2, vec![])
            .unwrap();

        let results = mem.search("다이어트 샐러드", 3);
        assert!(!results.is_empty());
        assert!(results[0].content.contains("다이어트"));
        assert_eq!(results[0].access_count, 1);

        assert!(mem.search("우주선", 3).is_empty());
    }

    #[test]
    fn test_search_respects_top_k() {
        let (mut mem, _dir) = temp_memory();
        for i in 0..5 {
            mem.write(&format!("국물 요리 메모 {}", i), MemoryType::Knowledge, 2, vec![])
                .unwrap();
        }
        assert_eq!(mem.search("국물", 3).len(), 3);
    }

    #[test]
    fn test_persistence_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("longterm.json");

        let id = {
            let mut mem = LongTermMemory::with_path(path.clone()).unwrap();
            mem.write("채식주의자", MemoryType::Profile, 5, vec!["vegan".into()])
                .unwrap()
        };

        let mut mem = LongTermMemory::with_path(path).unwrap();
        assert_eq!(mem.count(), 1);
        assert_eq!(mem.get(&id).unwrap().tags, vec!["vegan"]);
        assert_eq!(mem.search("vegan", 1).len(), 1);
    }

    #[test]
    fn test_delete() {
        let (mut mem, _dir) = temp_memory();
        let id = mem.write("temp", MemoryType::Episodic, 1, vec![]).unwrap();
        assert!(mem.delete(&id).unwrap());
        assert!(!mem.delete(&id).unwrap());
        assert_eq!(mem.count(), 0);
    }

    #[test]
    fn test_list_by_type() {
        let (mut mem, _dir) = temp_memory();
        mem.write("a profile", MemoryType::Profile, 3, vec![]).unwrap();
        mem.write("some knowledge", MemoryType::Knowledge, 3, vec![])
            .unwrap();
        assert_eq!(mem.list_by_type(MemoryType::Profile).len(), 1);
        assert_eq!(mem.list_all().len(), 2);
    }

    #[test]
    fn test_memory_type_parse_and_display() {
        assert_eq!("Profile".parse::<MemoryType>().unwrap(), MemoryType::Profile);
        assert_eq!(MemoryType::Episodic.to_string(), "episodic");
        assert!("unknown".parse::<MemoryType>().is_err());
    }

    #[test]
    fn test_load_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("longterm.json");
        std::fs::write(&path, "  ").unwrap();
        assert_eq!(LongTermMemory::with_path(path).unwrap().count(), 0);
    }
}
