//! Long-term memory tools.
//!
//! `write_memory` and `read_memory` expose the shared `LongTermMemory` store
//! to the model, so it can note a user's allergies or preferences and
//! recall them in later threads.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::error::{ChefError, Result};
use crate::memory::{LongTermMemory, MemoryType};

use super::{Tool, ToolContext};

fn default_top_k() -> usize {
    3
}

#[derive(Debug, Deserialize)]
struct WriteArgs {
    content: String,
    memory_type: MemoryType,
    importance: u8,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ReadArgs {
    query: String,
    #[serde(default = "default_top_k")]
    top_k: usize,
}

/// Store a fact in long-term memory.
pub struct WriteMemoryTool {
    memory: Arc<Mutex<LongTermMemory>>,
}

impl WriteMemoryTool {
    pub fn new(memory: Arc<Mutex<LongTermMemory>>) -> Self {
        Self { memory }
    }
}

#[async_trait]
impl Tool for WriteMemoryTool {
    fn name(&self) -> &str {
        "write_memory"
    }

    fn description(&self) -> &str {
        "사용자의 선호, 알레르기, 식습관 등 오래 기억할 정보를 장기 메모리에 저장합니다."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "content": {
                    "type": "string",
                    "description": "저장할 내용 (한 문장 요약)"
                },
                "memory_type": {
                    "type": "string",
                    "enum": ["profile", "episodic", "knowledge"],
                    "description": "profile: 사용자 특성, episodic: 대화 사건, knowledge: 요리 지식"
                },
                "importance": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": 5,
                    "description": "중요도 (1~5)"
                },
                "tags": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "검색용 태그"
                }
            },
            "required": ["content", "memory_type", "importance"]
        })
    }

    async fn execute(&self, args: Value, _ctx: &ToolContext) -> Result<Value> {
        let args: WriteArgs = serde_json::from_value(args)?;
        let id = self
            .memory
            .lock()
            .await
            .write(&args.content, args.memory_type, args.importance, args.tags)
            .map_err(|e| ChefError::Tool(e.to_string()))?;
        Ok(json!(format!("Memory saved. (ID: {})", id)))
    }
}

/// Recall related entries from long-term memory.
pub struct ReadMemoryTool {
    memory: Arc<Mutex<LongTermMemory>>,
}

impl ReadMemoryTool {
    pub fn new(memory: Arc<Mutex<LongTermMemory>>) -> Self {
        Self { memory }
    }
}

#[async_trait]
impl Tool for ReadMemoryTool {
    fn name(&self) -> &str {
        "read_memory"
    }

    fn description(&self) -> &str {
        "장기 메모리에서 사용자와 관련된 정보를 검색합니다. 추천 전에 사용자의 선호나 제약을 확인할 때 사용하세요."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "검색어"},
                "top_k": {
                    "type": "integer",
                    "minimum": 1,
                    "description": "최대 결과 수 (기본 3)"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value, _ctx: &ToolContext) -> Result<Value> {
        let args: ReadArgs = serde_json::from_value(args)?;
        let mut memory = self.memory.lock().await;
        let hits = memory.search(&args.query, args.top_k);
        if hits.is_empty() {
            return Ok(json!("No related memories found."));
        }
        // Access stats only; a failed write does not invalidate the recall.
        if let Err(e) = memory.save() {
            tracing::warn!(error = %e, "Failed to persist memory access stats");
        }

        let items: Vec<Value> = hits
            .into_iter()
            .map(|e| {
                json!({
                    "content": e.content,
                    "type": e.memory_type,
                    "tags": e.tags,
                    "importance": e.importance,
                })
            })
            .collect();
        Ok(Value::Array(items))
    }
}
