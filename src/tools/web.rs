//! Web search tool.
//!
//! Provides `search_google`: Google Custom Search for facts the local
//! corpora do not cover (ingredient prices, substitutes, cooking tips).
//! This is the budget-tracked tool by default.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{ChefError, Result};

use super::{Tool, ToolContext};

const GOOGLE_CSE_URL: &str = "https://www.googleapis.com/customsearch/v1";
const RESULT_COUNT: usize = 3;

/// Web search tool backed by the Google Custom Search JSON API.
pub struct GoogleSearchTool {
    api_key: Option<String>,
    cse_id: Option<String>,
    endpoint: String,
    client: Client,
}

impl GoogleSearchTool {
    /// Create a new search tool. Missing credentials are reported per call.
    pub fn new(api_key: Option<String>, cse_id: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            cse_id: cse_id.filter(|k| !k.trim().is_empty()),
            endpoint: GOOGLE_CSE_URL.to_string(),
            client,
        }
    }

    /// Point the tool at a different endpoint.
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
}

fn format_results(items: &[SearchItem]) -> String {
    if items.is_empty() {
        return "검색 결과가 없습니다.".to_string();
    }
    items
        .iter()
        .take(RESULT_COUNT)
        .map(|item| format!("- {}: {}", item.title.trim(), item.snippet.trim()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[async_trait]
impl Tool for GoogleSearchTool {
    fn name(&self) -> &str {
        "search_google"
    }

    fn description(&self) -> &str {
        "Google 검색을 통해 최신 정보, 재료 시세, 대체 재료, 요리 팁 등을 찾아줍니다. RAG에 없는 정보를 찾을 때 유용합니다."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "검색할 키워드 (예: '버터 대체 재료', '오늘 서울 날씨')"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value, _ctx: &ToolContext) -> Result<Value> {
        let query = args
            .get("query")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ChefError::Tool("Missing 'query' parameter".to_string()))?;

        let (Some(api_key), Some(cse_id)) = (self.api_key.as_deref(), self.cse_id.as_deref())
        else {
            return Err(ChefError::Tool(
                "Google API key or CSE id is not configured".to_string(),
            ));
        };

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("key", api_key),
                ("cx", cse_id),
                ("q", query),
                ("num", &RESULT_COUNT.to_string()),
            ])
            .send()
            .await
            .map_err(|e| ChefError::Tool(format!("Search request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            let detail = detail.trim();
            return Err(ChefError::Tool(if detail.is_empty() {
                format!("Google Search API error: {}", status)
            } else {
                format!("Google Search API error: {} ({})", status, detail)
            }));
        }

        let payload: SearchResponse = response
            .json()
            .await
            .map_err(|e| ChefError::Tool(format!("Failed to parse search response: {}", e)))?;

        Ok(Value::String(format_results(&payload.items)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_results() {
        let items = vec![
            SearchItem {
                title: "트러플 오일 대체".into(),
                snippet: "버섯 오일을 쓰세요".into(),
            },
            SearchItem {
                title: "Second".into(),
                snippet: " two ".into(),
            },
        ];
        assert_eq!(
            format_results(&items),
            "- 트러플 오일 대체: 버섯 오일을 쓰세요\n\n- Second: two"
        );
    }

    #[test]
    fn test_format_results_empty() {
        assert_eq!(format_results(&[]), "검색 결과가 없습니다.");
    }

    #[test]
    fn test_format_results_caps_at_three() {
        let items: Vec<SearchItem> = (0..5)
            .map(|i| SearchItem {
                title: format!("t{}", i),
                snippet: "s".into(),
            })
            .collect();
        assert_eq!(format_results(&items).matches("- t").count(), 3);
    }

    #[test]
    fn test_response_parses_without_items() {
        let payload: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(payload.items.is_empty());
    }

    #[tokio::test]
    async fn test_missing_credentials() {
        let tool = GoogleSearchTool::new(None, Some("cx".into()));
        let err = tool
            .execute(json!({"query": "버터"}), &ToolContext::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not configured"));

        let tool = GoogleSearchTool::new(Some("  ".into()), Some("cx".into()));
        assert!(tool
            .execute(json!({"query": "버터"}), &ToolContext::new())
            .await
            .is_err());
    }
}
