//! Corpus search tools.
//!
//! Provides:
//! - `search_recipe`: top recipes for a situation, mood or ingredient list.
//! - `search_food_knowledge`: ingredient benefits, nutrition, cooking terms.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::corpus::DocumentIndex;
use crate::error::{ChefError, Result};

use super::{Tool, ToolContext};

const TOP_K: usize = 3;

#[derive(Debug, Deserialize)]
struct QueryArgs {
    query: String,
}

fn query_schema(description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "query": {"type": "string", "description": description}
        },
        "required": ["query"]
    })
}

/// Recipe search over the local recipe corpus.
pub struct RecipeSearchTool {
    index: Option<Arc<DocumentIndex>>,
}

impl RecipeSearchTool {
    /// Create the tool. With `None` every call fails with "not loaded".
    pub fn new(index: Option<Arc<DocumentIndex>>) -> Self {
        Self { index }
    }
}

#[async_trait]
impl Tool for RecipeSearchTool {
    fn name(&self) -> &str {
        "search_recipe"
    }

    fn description(&self) -> &str {
        "사용자의 상황, 기분, 재료 등을 고려하여 적절한 레시피를 검색합니다."
    }

    fn parameters(&self) -> Value {
        query_schema("레시피를 찾기 위한 자연어 질문 (예: '오늘 비오는데 얼큰한 국물 요리')")
    }

    async fn execute(&self, args: Value, _ctx: &ToolContext) -> Result<Value> {
        let args: QueryArgs = serde_json::from_value(args)?;
        let index = self
            .index
            .as_ref()
            .ok_or_else(|| ChefError::Tool("recipe corpus not loaded".to_string()))?;

        let results: Vec<Value> = index
            .search(&args.query, TOP_K)
            .into_iter()
            .map(|doc| json!({"content": doc.content, "metadata": doc.metadata}))
            .collect();
        Ok(json!({ "results": results }))
    }
}

/// Knowledge search over the local food-knowledge corpus.
pub struct KnowledgeSearchTool {
    index: Option<Arc<DocumentIndex>>,
}

impl KnowledgeSearchTool {
    /// Create the tool. With `None` every call fails with "not available".
    pub fn new(index: Option<Arc<DocumentIndex>>) -> Self {
        Self { index }
    }
}

#[async_trait]
impl Tool for KnowledgeSearchTool {
    fn name(&self) -> &str {
        "search_food_knowledge"
    }

    fn description(&self) -> &str {
        "요리 재료의 효능, 영양 성분, 요리 용어 등 '지식'적인 내용이 궁금할 때 문서를 검색합니다."
    }

    fn parameters(&self) -> Value {
        query_schema("요리 상식, 영양 정보, 식재료 효능 등에 대한 질문")
    }

    async fn execute(&self, args: Value, _ctx: &ToolContext) -> Result<Value> {
        let args: QueryArgs = serde_json::from_value(args)?;
        let index = self
            .index
            .as_ref()
            .ok_or_else(|| ChefError::Tool("knowledge corpus not available".to_string()))?;

        let results: Vec<Value> = index
            .search(&args.query, TOP_K)
            .into_iter()
            .map(|doc| json!({"content": doc.content, "source": doc.metadata["source"]}))
            .collect();
        Ok(json!({ "results": results }))
    }
}
