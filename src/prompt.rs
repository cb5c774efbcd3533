//! Prompt composition.
//!
//! [`build_conversation`] turns a stored [`UserRecord`] and a new message into
//! either a canned greeting (empty history, no model call) or the message list
//! sent to the inference endpoint: persona preamble, recent turns, new message.

use serde::{Deserialize, Serialize};

use crate::profile::types::{Role, UserRecord};

/// History entries forwarded to the model.
pub const DEFAULT_CONTEXT_TURNS: usize = 6;

/// System instruction sent ahead of every model conversation.
pub const PERSONA_PROMPT: &str = "You are Calm, a friendly and empathetic companion supporting emotional well-being. \
You give short, thoughtful replies the way a caring friend would. \
You remember the user's key details such as their name, age, college, friends and location, \
and key words from past conversations. \
Your only job is to talk with the user like a true friend: never help with unrelated tasks. \
If the user asks you to do a task or produce something, say that you cannot, because you are a mental health companion. \
If the user drifts to an unrelated topic, gently steer back to their feelings and well-being without making a point of it. \
If they keep asking the same off-topic question, tell them plainly that they are going off topic. \
Do not pry into the user's life or ask too many questions; your aim is for them to feel safe, comfortable and a little happier. \
Only if the user shows signs of serious distress, slowly guide them towards professional help, \
and share helpline numbers only when they are truly in danger.";

/// One `{role, content}` entry of a model conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: Role,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// What to do with a new message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conversation {
    /// No history yet: reply with this text, skip the model.
    Greeting(String),
    /// Send these messages to the model.
    Prompt(Vec<PromptMessage>),
}

/// Greeting for a user with no stored history.
pub fn greeting(record: &UserRecord) -> String {
    format!(
        "Hey {}! Great to see you again! How have you been?",
        record.display_name()
    )
}

/// Build the conversation for `new_message` using the last `context_turns` history entries.
pub fn build_conversation(
    record: &UserRecord,
    new_message: &str,
    context_turns: usize,
) -> Conversation {
    if record.chat_history.is_empty() {
        return Conversation::Greeting(greeting(record));
    }

    let history = &record.chat_history;
    let start = history.len().saturating_sub(context_turns);

    let mut messages = Vec::with_capacity(history.len() - start + 2);
    messages.push(PromptMessage::system(PERSONA_PROMPT));
    messages.extend(history[start..].iter().map(|m| PromptMessage {
        role: m.role,
        content: m.content.clone(),
    }));
    messages.push(PromptMessage::user(new_message));

    Conversation::Prompt(messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::types::ChatMessage;

    fn record(name: Option<&str>, turns: usize) -> UserRecord {
        let chat_history = (0..turns)
            .map(|i| {
                let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
                ChatMessage {
                    role,
                    content: format!("turn {i}"),
                    emotion: Some("neutral".into()),
                    created_at: None,
                }
            })
            .collect();
        UserRecord {
            user_id: "u1".into(),
            name: name.map(str::to_string),
            age: None,
            college: None,
            location: None,
            phone: None,
            friends: None,
            chat_history,
            important_info: Vec::new(),
            incognito_mode: false,
            created_at: "2026-01-01T00:00:00Z".into(),
            last_seen: None,
        }
    }

    #[test]
    fn empty_history_greets_by_name() {
        let conv = build_conversation(&record(Some("Asha"), 0), "hi", DEFAULT_CONTEXT_TURNS);
        assert_eq!(
            conv,
            Conversation::Greeting("Hey Asha! Great to see you again! How have you been?".into())
        );
    }

    #[test]
    fn empty_history_without_name_greets_friend() {
        let conv = build_conversation(&record(None, 0), "hi", DEFAULT_CONTEXT_TURNS);
        assert_eq!(
            conv,
            Conversation::Greeting("Hey friend! Great to see you again! How have you been?".into())
        );
    }

    #[test]
    fn three_turns_are_all_forwarded() {
        let conv = build_conversation(&record(Some("Asha"), 3), "Tell me a joke", DEFAULT_CONTEXT_TURNS);
        let Conversation::Prompt(messages) = conv else {
            panic!("expected a prompt");
        };

        assert_eq!(messages.len(), 5);
        assert_eq!(messages[0], PromptMessage::system(PERSONA_PROMPT));
        assert_eq!(messages[1], PromptMessage::user("turn 0"));
        assert_eq!(messages[2], PromptMessage::assistant("turn 1"));
        assert_eq!(messages[3], PromptMessage::user("turn 2"));
        assert_eq!(messages[4], PromptMessage::user("Tell me a joke"));
    }

    #[test]
    fn only_last_six_turns_are_forwarded() {
        let conv = build_conversation(&record(None, 10), "hello", DEFAULT_CONTEXT_TURNS);
        let Conversation::Prompt(messages) = conv else {
            panic!("expected a prompt");
        };

        assert_eq!(messages.len(), 1 + 6 + 1);
        let contents: Vec<&str> = messages[1..7].iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["turn 4", "turn 5", "turn 6", "turn 7", "turn 8", "turn 9"]);
        assert_eq!(messages.last().unwrap().content, "hello");
    }

    #[test]
    fn persona_covers_scope_rules() {
        assert!(PERSONA_PROMPT.contains("never help with unrelated tasks"));
        assert!(PERSONA_PROMPT.contains("professional help"));
    }

    #[test]
    fn prompt_message_serializes_lowercase_role() {
        let json = serde_json::to_string(&PromptMessage::system("x")).unwrap();
        assert_eq!(json, r#"{"role":"system","content":"x"}"#);
    }
}
