//! Context builder for agent conversations
//!
//! Produces the message list sent to the model: the chef persona as a
//! leading system message, followed by the thread history.

use crate::session::Message;

/// Default chef persona.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
당신은 사용자의 상황과 기분에 맞춰 요리를 추천해주는 AI 셰프봇입니다.

- 날씨, 기분, 재료, 건강 상태를 고려해 레시피를 추천하세요.
- 레시피나 요리 지식이 필요하면 search_recipe, search_food_knowledge 도구를 먼저 사용하세요.
- 최신 정보가 꼭 필요할 때만 search_google을 사용하세요.
- 사용자의 알레르기나 식습관이 궁금하면 read_memory로 확인하세요.
- 답변은 친근한 한국어로, 재료와 조리 순서를 간단히 정리해 주세요.";

/// Builds the model input for a turn.
///
/// # Example
///
/// ```rust
/// use chefbot::agent::ContextBuilder;
/// use chefbot::session::Message;
///
/// let builder = ContextBuilder::new();
/// let messages = builder.build_messages(&[Message::human("배고파")]);
/// assert!(messages[0].is_system());
/// assert_eq!(messages.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    system_prompt: String,
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }

    /// Replace the persona.
    pub fn with_system_prompt(mut self, prompt: &str) -> Self {
        self.system_prompt = prompt.to_string();
        self
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// History prefixed with the system prompt, unless the history already
    /// starts with a system message.
    pub fn build_messages(&self, history: &[Message]) -> Vec<Message> {
        let needs_prompt = !history.first().is_some_and(Message::is_system);
        let mut messages = Vec::with_capacity(history.len() + 1);
        if needs_prompt {
            messages.push(Message::system(&self.system_prompt));
        }
        messages.extend_from_slice(history);
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompt_is_chef() {
        assert!(ContextBuilder::new()
            .system_prompt()
            .starts_with("당신은 사용자의 상황과 기분에 맞춰 요리를 추천해주는 AI 셰프봇입니다."));
    }

    #[test]
    fn test_prefix_added_once() {
        let builder = ContextBuilder::new().with_system_prompt("custom");
        let history = vec![Message::human("hi"), Message::assistant("hello")];
        let messages = builder.build_messages(&history);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0], Message::system("custom"));
        assert_eq!(&messages[1..], &history[..]);
    }

    #[test]
    fn test_existing_system_message_kept() {
        let history = vec![Message::system("already here"), Message::human("hi")];
        let messages = ContextBuilder::new().build_messages(&history);
        assert_eq!(messages, history);
    }

    #[test]
    fn test_empty_history() {
        let messages = ContextBuilder::new().build_messages(&[]);
        assert_eq!(messages.len(), 1);
        assert!(messages[0].is_system());
    }
}
