//! Post-turn memory extraction.
//!
//! After a turn completes, the exchange is shown to the model with a fixed
//! extraction prompt. If the model judges something worth keeping (an
//! allergy, a diet, a standing preference) it is written to long-term
//! memory. Extraction runs without tools.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{ChefError, Result};
use crate::providers::{ChatOptions, LLMProvider};
use crate::session::Message;

use super::longterm::{LongTermMemory, MemoryType};

const EXTRACTOR_SYSTEM_PROMPT: &str = "\
You are a memory extraction assistant.
Your task:
Read the given conversation between a user and an assistant.
Decide whether there is any information that should be stored as long-term memory.

Long-term memories include:
- User's stable preferences (e.g., likes spicy food, has peanut allergy).
- Long-term projects or goals (e.g., on a diet).
- Important facts that will likely be useful in future conversations.

Do NOT store:
- Short-lived or trivial facts (e.g., \"hello\", \"thank you\").
- Very detailed logs that are unlikely to be reused.

Output:
Return a JSON object with exactly these fields:
{\"should_write_memory\": bool, \"memory_type\": \"profile\" | \"episodic\" | \"knowledge\" | null,
 \"importance\": 1-5 | null, \"content\": string | null, \"tags\": [string] | null}";

/// Hook invoked once per completed turn.
#[async_trait]
pub trait MemoryExtractor: Send + Sync {
    /// Inspect one exchange. Returns the id of a written memory, if any.
    async fn extract(&self, user_text: &str, final_answer: &str) -> Result<Option<String>>;
}

/// The model's verdict on an exchange.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ExtractionResult {
    pub should_write_memory: bool,
    #[serde(default)]
    pub memory_type: Option<MemoryType>,
    #[serde(default)]
    pub importance: Option<u8>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// Parse the model reply, tolerating a surrounding markdown code fence.
pub fn parse_extraction(raw: &str) -> Result<ExtractionResult> {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        let rest = rest.strip_prefix("json").unwrap_or(rest);
        text = rest.trim_end().strip_suffix("```").unwrap_or(rest).trim();
    }
    serde_json::from_str(text)
        .map_err(|e| ChefError::Memory(format!("invalid extraction result: {}", e)))
}

/// Extractor backed by the model gateway and the long-term memory store.
pub struct LlmMemoryExtractor {
    provider: Arc<dyn LLMProvider>,
    memory: Arc<Mutex<LongTermMemory>>,
    model: Option<String>,
}

impl LlmMemoryExtractor {
    pub fn new(provider: Arc<dyn LLMProvider>, memory: Arc<Mutex<LongTermMemory>>) -> Self {
        Self {
            provider,
            memory,
            model: None,
        }
    }

    /// Use a specific model instead of the provider default.
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = Some(model.to_string());
        self
    }
}

#[async_trait]
impl MemoryExtractor for LlmMemoryExtractor {
    async fn extract(&self, user_text: &str, final_answer: &str) -> Result<Option<String>> {
        let conversation = format!(
            "[CONVERSATION]\nUser: {}\nAssistant: {}",
            user_text, final_answer
        );
        let messages = vec![
            Message::system(EXTRACTOR_SYSTEM_PROMPT),
            Message::human(&conversation),
        ];

        let response = self
            .provider
            .chat(
                messages,
                vec![],
                self.model.as_deref(),
                ChatOptions::new().with_temperature(0.0).with_json_mode(),
            )
            .await?;

        let result = parse_extraction(&response.content)?;
        if !result.should_write_memory {
            debug!("Nothing worth remembering in this turn");
            return Ok(None);
        }

        let content = result
            .content
            .ok_or_else(|| ChefError::Memory("extraction result has no content".to_string()))?;
        let id = self.memory.lock().await.write(
            &content,
            result.memory_type.unwrap_or(MemoryType::Episodic),
            result.importance.unwrap_or(3),
            result.tags.unwrap_or_default(),
        )?;
        info!(memory_id = %id, "Stored long-term memory from conversation");
        Ok(Some(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{LLMResponse, ToolDefinition};
    use std::sync::Mutex as StdMutex;
    use tempfile::TempDir;

    struct CannedProvider {
        reply: String,
        seen: StdMutex<Vec<Vec<Message>>>,
    }

    impl CannedProvider {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                seen: StdMutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LLMProvider for CannedProvider {
        async fn chat(
            &self,
            messages: Vec<Message>,
            tools: Vec<ToolDefinition>,
            _model: Option<&str>,
            options: ChatOptions,
        ) -> Result<LLMResponse> {
            assert!(tools.is_empty());
            assert!(options.json_mode);
            self.seen.lock().unwrap().push(messages);
            Ok(LLMResponse::text(&self.reply))
        }

        fn default_model(&self) -> &str {
            "canned"
        }

        fn name(&self) -> &str {
            "canned"
        }
    }

    fn memory() -> (Arc<Mutex<LongTermMemory>>, TempDir) {
        let dir = TempDir::new().unwrap();
        let mem = LongTermMemory::with_path(dir.path().join("longterm.json")).unwrap();
        (Arc::new(Mutex::new(mem)), dir)
    }

    #[test]
    fn test_parse_plain_and_fenced() {
        let plain = r#"{"should_write_memory": false}"#;
        assert!(!parse_extraction(plain).unwrap().should_write_memory);

        let fenced = "```json\n{\"should_write_memory\": true, \"memory_type\": \"profile\", \"importance\": 4, \"content\": \"다이어트 중\", \"tags\": [\"diet\"]}\n```";
        let parsed = parse_extraction(fenced).unwrap();
        assert!(parsed.should_write_memory);
        assert_eq!(parsed.memory_type, Some(MemoryType::Profile));
        assert_eq!(parsed.tags.unwrap(), vec!["diet"]);
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(
            parse_extraction("not json"),
            Err(ChefError::Memory(_))
        ));
    }

    #[tokio::test]
    async fn test_extract_writes_memory() {
        let (memory, _dir) = memory();
        let provider = Arc::new(CannedProvider::new(
            r#"{"should_write_memory": true, "memory_type": "profile", "importance": 4,
                "content": "요즘 다이어트 중이라 저녁은 샐러드", "tags": ["diet"]}"#,
        ));
        let extractor = LlmMemoryExtractor::new(provider.clone(), Arc::clone(&memory));

        let id = extractor
            .extract("나 요즘 다이어트 중이야", "저칼로리 샐러드를 찾아드릴게요.")
            .await
            .unwrap()
            .expect("memory should be written");

        let mem = memory.lock().await;
        assert_eq!(mem.get(&id).unwrap().importance, 4);

        let seen = provider.seen.lock().unwrap();
        assert!(seen[0][0].is_system());
        assert_eq!(
            seen[0][1].content(),
            "[CONVERSATION]\nUser: 나 요즘 다이어트 중이야\nAssistant: 저칼로리 샐러드를 찾아드릴게요."
        );
    }

    #[tokio::test]
    async fn test_extract_nothing_to_store() {
        let (memory, _dir) = memory();
        let provider = Arc::new(CannedProvider::new(r#"{"should_write_memory": false}"#));
        let extractor = LlmMemoryExtractor::new(provider, Arc::clone(&memory));

        assert!(extractor.extract("안녕", "안녕하세요").await.unwrap().is_none());
        assert_eq!(memory.lock().await.count(), 0);
    }
}
