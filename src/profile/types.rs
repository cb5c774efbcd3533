//! User record type definitions.
//!
//! Defines [`Role`], [`ChatMessage`] (one stored history entry), [`UserRecord`]
//! (the per-user document) and [`ProfileUpdate`] (an explicit partial update).

use serde::{Deserialize, Serialize};

/// Speaker of a message.
///
/// Only `User` and `Assistant` are ever stored in history; `System` exists for
/// prompts sent to the inference endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a user's stored chat history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    /// Emotion label from the classifier. Metadata only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion: Option<String>,
    /// RFC 3339 time the message was stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            emotion: None,
            created_at: None,
        }
    }
}

/// The per-user document, matching one row of the `users` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: String,
    pub name: Option<String>,
    pub age: Option<u32>,
    pub college: Option<String>,
    pub location: Option<String>,
    pub phone: Option<String>,
    pub friends: Option<String>,
    /// Oldest first, at most `history_limit` entries.
    pub chat_history: Vec<ChatMessage>,
    /// Deduplicated keywords in first-seen order.
    pub important_info: Vec<String>,
    pub incognito_mode: bool,
    pub created_at: String,
    pub last_seen: Option<String>,
}

impl UserRecord {
    /// Stored name, or `"friend"` when unset.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("friend")
    }
}

/// Partial profile update. `None` and blank strings leave the stored value alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub college: Option<String>,
    pub location: Option<String>,
    pub phone: Option<String>,
    pub friends: Option<String>,
}

impl ProfileUpdate {
    /// Copy with blank strings dropped and the rest trimmed.
    pub fn normalized(&self) -> Self {
        fn clean(v: &Option<String>) -> Option<String> {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        }
        Self {
            name: clean(&self.name),
            age: self.age,
            college: clean(&self.college),
            location: clean(&self.location),
            phone: clean(&self.phone),
            friends: clean(&self.friends),
        }
    }

    pub fn is_empty(&self) -> bool {
        let n = self.normalized();
        n.name.is_none()
            && n.age.is_none()
            && n.college.is_none()
            && n.location.is_none()
            && n.phone.is_none()
            && n.friends.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_as_its_name() {
        for role in [Role::System, Role::User, Role::Assistant] {
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{}\"", role.as_str()));
            assert_eq!(serde_json::from_str::<Role>(&json).unwrap(), role);
        }
        assert!(serde_json::from_str::<Role>("\"narrator\"").is_err());
    }

    #[test]
    fn message_without_metadata_omits_optional_fields() {
        let json = serde_json::to_string(&ChatMessage::new(Role::User, "hi")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);
    }

    #[test]
    fn legacy_message_without_metadata_deserializes() {
        let msg: ChatMessage =
            serde_json::from_str(r#"{"role":"assistant","content":"hello"}"#).unwrap();
        assert_eq!(msg.role, Role::Assistant);
        assert!(msg.emotion.is_none());
        assert!(msg.created_at.is_none());
    }

    #[test]
    fn blank_fields_are_not_an_update() {
        let update = ProfileUpdate {
            name: Some("   ".into()),
            location: Some(String::new()),
            ..Default::default()
        };
        assert!(update.is_empty());

        let update = ProfileUpdate {
            name: Some("  Asha ".into()),
            ..Default::default()
        };
        assert!(!update.is_empty());
        assert_eq!(update.normalized().name.as_deref(), Some("Asha"));
    }
}
