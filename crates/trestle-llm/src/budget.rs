//! Token counting and input truncation
//!
//! Counts are heuristic: 1 token ≈ 4 characters, plus a fixed
//! per-message overhead for the chat framing. The point is not exact
//! tokenizer parity but staying safely inside
//! `contextLength − reservedOutput` on every request.

use std::collections::VecDeque;
use tracing::info;
use trestle_domain::{ChatMessage, Role};

/// Characters per token-equivalent unit.
const CHARS_PER_TOKEN: usize = 4;

/// Fixed framing overhead per message (role/content structure).
const MESSAGE_OVERHEAD_TOKENS: usize = 4;

/// Fixed framing overhead per conversation (end-of-turn markers).
const CONVERSATION_OVERHEAD_TOKENS: usize = 2;

/// Marker inserted where a middle span was removed from a message.
pub const TRUNCATION_MARKER: &str = "\n...[content truncated]...\n";

/// Count token-equivalent units for a piece of text.
pub fn count_text_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

/// Count token-equivalent units for one message, framing included.
pub fn count_message_tokens(message: &ChatMessage) -> usize {
    MESSAGE_OVERHEAD_TOKENS
        + count_text_tokens(&message.content)
        + count_text_tokens(message.role.as_str())
}

/// Count token-equivalent units for a whole message list.
pub fn count_messages_tokens(messages: &[ChatMessage]) -> usize {
    messages.iter().map(count_message_tokens).sum::<usize>() + CONVERSATION_OVERHEAD_TOKENS
}

/// Input budget for one model: `max_input = context − reserved_output`.
#[derive(Debug, Clone, Copy)]
pub struct TokenBudget {
    context_length: usize,
    reserved_output: usize,
}

impl TokenBudget {
    /// Create a budget for a model with the given context window,
    /// reserving `reserved_output` tokens for the completion.
    pub fn new(context_length: usize, reserved_output: usize) -> Self {
        Self { context_length, reserved_output }
    }

    /// Maximum input tokens a request may carry.
    pub fn max_input_tokens(&self) -> usize {
        self.context_length.saturating_sub(self.reserved_output)
    }

    /// Fit a message list into the input budget.
    ///
    /// Returns the list unchanged when it already fits. Otherwise:
    /// any system-role message is retained verbatim; the remaining
    /// messages are included from most recent to oldest while the
    /// budget allows; if not even one non-system message fits, the most
    /// recent one is truncated by removing a middle span (head and tail
    /// kept around [`TRUNCATION_MARKER`]). Given a non-empty input the
    /// output is never empty.
    pub fn fit_messages(&self, messages: Vec<ChatMessage>) -> Vec<ChatMessage> {
        let max_input = self.max_input_tokens();
        let original_len = messages.len();
        if count_messages_tokens(&messages) <= max_input {
            return messages;
        }

        let mut system: Option<ChatMessage> = None;
        let mut rest: Vec<ChatMessage> = Vec::new();
        for message in messages {
            if message.role == Role::System && system.is_none() {
                system = Some(message);
            } else {
                rest.push(message);
            }
        }

        let mut budget = max_input.saturating_sub(CONVERSATION_OVERHEAD_TOKENS);
        if let Some(s) = &system {
            budget = budget.saturating_sub(count_message_tokens(s));
        }

        let mut kept: VecDeque<ChatMessage> = VecDeque::new();
        let mut used = 0usize;
        for message in rest.into_iter().rev() {
            let cost = count_message_tokens(&message);
            if used + cost <= budget {
                used += cost;
                kept.push_front(message);
            } else {
                if kept.is_empty() {
                    let available = budget.saturating_sub(
                        MESSAGE_OVERHEAD_TOKENS + count_text_tokens(message.role.as_str()),
                    );
                    kept.push_front(truncate_middle(message, available));
                }
                break;
            }
        }

        let mut fitted: Vec<ChatMessage> = Vec::with_capacity(kept.len() + 1);
        if let Some(s) = system {
            fitted.push(s);
        }
        fitted.extend(kept);

        info!(
            original = original_len,
            fitted = fitted.len(),
            max_input_tokens = max_input,
            "truncated message list to fit input budget"
        );
        fitted
    }
}

/// Remove a middle span from a message so it fits `available_tokens`,
/// keeping the head and tail thirds around the truncation marker.
fn truncate_middle(message: ChatMessage, available_tokens: usize) -> ChatMessage {
    let max_chars = available_tokens.saturating_mul(CHARS_PER_TOKEN);
    let chars: Vec<char> = message.content.chars().collect();
    if chars.len() <= max_chars {
        return message;
    }

    let keep = max_chars / 3;
    let head: String = chars[..keep].iter().collect();
    let tail: String = chars[chars.len() - keep..].iter().collect();
    ChatMessage {
        role: message.role,
        content: format!("{head}{TRUNCATION_MARKER}{tail}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_text_tokens_rounds_up() {
        assert_eq!(count_text_tokens(""), 0);
        assert_eq!(count_text_tokens("abc"), 1);
        assert_eq!(count_text_tokens("abcd"), 1);
        assert_eq!(count_text_tokens("abcde"), 2);
    }

    #[test]
    fn test_fitting_list_is_untouched() {
        let budget = TokenBudget::new(1000, 100);
        let messages = vec![ChatMessage::system("rules"), ChatMessage::user("short")];
        let fitted = budget.fit_messages(messages.clone());
        assert_eq!(fitted, messages);
    }

    #[test]
    fn test_system_message_retained_verbatim() {
        // Budget fits the system message plus barely anything else.
        let budget = TokenBudget::new(60, 0);
        let system = ChatMessage::system("always follow the schema");
        let messages = vec![
            system.clone(),
            ChatMessage::user("old ".repeat(200)),
            ChatMessage::user("new ".repeat(200)),
        ];
        let fitted = budget.fit_messages(messages);
        assert_eq!(fitted[0], system);
    }

    #[test]
    fn test_most_recent_messages_win() {
        let budget = TokenBudget::new(40, 0);
        let messages = vec![
            ChatMessage::user("a".repeat(200)),
            ChatMessage::user("latest"),
        ];
        let fitted = budget.fit_messages(messages);
        assert_eq!(fitted.len(), 1);
        assert_eq!(fitted[0].content, "latest");
    }

    #[test]
    fn test_single_oversized_message_truncated_with_marker() {
        let budget = TokenBudget::new(60, 0);
        let content = "H".repeat(400) + &"T".repeat(400);
        let messages = vec![ChatMessage::user(content)];
        let fitted = budget.fit_messages(messages);

        assert_eq!(fitted.len(), 1);
        assert!(fitted[0].content.contains(TRUNCATION_MARKER));
        assert!(fitted[0].content.starts_with('H'));
        assert!(fitted[0].content.ends_with('T'));
        assert!(count_messages_tokens(&fitted) <= budget.max_input_tokens());
    }

    #[test]
    fn test_output_never_empty() {
        let budget = TokenBudget::new(10, 0);
        let messages = vec![ChatMessage::user("x".repeat(10_000))];
        let fitted = budget.fit_messages(messages);
        assert!(!fitted.is_empty());
    }

    #[test]
    fn test_truncation_is_char_boundary_safe() {
        let budget = TokenBudget::new(30, 0);
        let messages = vec![ChatMessage::user("桥".repeat(1_000))];
        let fitted = budget.fit_messages(messages);
        assert!(!fitted.is_empty());
        assert!(fitted[0].content.contains(TRUNCATION_MARKER));
    }
}
