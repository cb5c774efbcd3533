//! Profile store: lookup-or-create, partial updates, the incognito flag and the
//! history write path.
//!
//! Every public function runs in its own transaction, so each call is an
//! atomic read-modify-write of one user document. [`append_message`] and
//! [`append_exchange`] are the only writers of `chat_history` and
//! `important_info`.

use anyhow::{anyhow, bail, Context, Result};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

use super::keywords::{extract_keywords, merge_keywords};
use super::types::{ChatMessage, ProfileUpdate, Role, UserRecord};
use super::ValidationError;

const SELECT_USER: &str = "SELECT user_id, name, age, college, location, phone, friends, \
     chat_history, important_info, incognito_mode, created_at, last_seen \
     FROM users WHERE user_id = ?1";

/// Outcome of [`append_message`] and [`append_exchange`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AppendOutcome {
    /// The message was written.
    Stored {
        /// History length after truncation.
        history_len: usize,
        /// Keywords that were not in `important_info` before this message.
        new_keywords: Vec<String>,
    },
    /// Incognito mode is on; nothing was written.
    Suppressed,
}

/// Result of [`login`].
#[derive(Debug, Clone, Serialize)]
pub struct Login {
    pub record: UserRecord,
    /// `true` if the record was created by this call.
    pub is_new: bool,
}

/// Fetch the user's record, creating the default one if it does not exist.
pub fn get_or_create_user(conn: &mut Connection, user_id: &str) -> Result<UserRecord> {
    let tx = conn.transaction()?;
    let created = ensure_user(&tx, user_id)?;
    let record = require_user(&tx, user_id)?;
    tx.commit()?;

    if created {
        tracing::info!(user_id, "created user record");
    }
    Ok(record)
}

/// Fetch the user's record without creating it.
pub fn find_user(conn: &Connection, user_id: &str) -> Result<Option<UserRecord>> {
    Ok(conn
        .query_row(SELECT_USER, params![user_id], row_to_user)
        .optional()?)
}

/// Get-or-create plus a `last_seen` stamp.
pub fn login(conn: &mut Connection, user_id: &str) -> Result<Login> {
    let tx = conn.transaction()?;
    let is_new = ensure_user(&tx, user_id)?;
    tx.execute(
        "UPDATE users SET last_seen = ?2 WHERE user_id = ?1",
        params![user_id, now()],
    )?;
    let record = require_user(&tx, user_id)?;
    tx.commit()?;

    tracing::info!(user_id, is_new, "user logged in");
    Ok(Login { record, is_new })
}

/// Merge the non-empty fields of `update` into the record, creating it if absent.
pub fn update_profile(conn: &mut Connection, user_id: &str, update: &ProfileUpdate) -> Result<()> {
    let update = update.normalized();
    let tx = conn.transaction()?;
    ensure_user(&tx, user_id)?;

    if !update.is_empty() {
        tx.execute(
            "UPDATE users SET \
             name = COALESCE(?2, name), \
             age = COALESCE(?3, age), \
             college = COALESCE(?4, college), \
             location = COALESCE(?5, location), \
             phone = COALESCE(?6, phone), \
             friends = COALESCE(?7, friends), \
             updated_at = ?8 \
             WHERE user_id = ?1",
            params![
                user_id,
                update.name,
                update.age,
                update.college,
                update.location,
                update.phone,
                update.friends,
                now(),
            ],
        )?;
        tracing::debug!(user_id, "profile updated");
    }

    tx.commit()?;
    Ok(())
}

/// Flip the incognito flag and return the new value.
pub fn toggle_incognito(conn: &mut Connection, user_id: &str) -> Result<bool> {
    let tx = conn.transaction()?;
    ensure_user(&tx, user_id)?;
    tx.execute(
        "UPDATE users SET incognito_mode = 1 - incognito_mode, updated_at = ?2 WHERE user_id = ?1",
        params![user_id, now()],
    )?;
    let enabled: bool = tx.query_row(
        "SELECT incognito_mode FROM users WHERE user_id = ?1",
        params![user_id],
        |row| row.get(0),
    )?;
    tx.commit()?;

    tracing::info!(user_id, incognito = enabled, "incognito mode toggled");
    Ok(enabled)
}

/// Store one message: keyword merge → append → truncate to `history_limit`.
///
/// Does nothing (and reports [`AppendOutcome::Suppressed`]) while the user is
/// in incognito mode. Only user and assistant turns belong in history.
pub fn append_message(
    conn: &mut Connection,
    user_id: &str,
    role: Role,
    content: &str,
    emotion: Option<&str>,
    history_limit: usize,
) -> Result<AppendOutcome> {
    let message = ChatMessage {
        role,
        content: content.to_string(),
        emotion: emotion.map(str::to_string),
        created_at: None,
    };
    write_messages(conn, user_id, vec![message], history_limit)
}

/// Store a user turn and the assistant's reply as one write.
///
/// Either both messages land or neither does.
pub fn append_exchange(
    conn: &mut Connection,
    user_id: &str,
    message: &str,
    emotion: Option<&str>,
    reply: &str,
    history_limit: usize,
) -> Result<AppendOutcome> {
    let messages = vec![
        ChatMessage {
            role: Role::User,
            content: message.to_string(),
            emotion: emotion.map(str::to_string),
            created_at: None,
        },
        ChatMessage::new(Role::Assistant, reply),
    ];
    write_messages(conn, user_id, messages, history_limit)
}

fn write_messages(
    conn: &mut Connection,
    user_id: &str,
    messages: Vec<ChatMessage>,
    history_limit: usize,
) -> Result<AppendOutcome> {
    if messages.iter().any(|m| m.role == Role::System) {
        bail!(ValidationError(
            "system messages cannot be stored in chat history".into()
        ));
    }

    let tx = conn.transaction()?;
    ensure_user(&tx, user_id)?;

    let (incognito, history_json, info_json): (bool, String, String) = tx.query_row(
        "SELECT incognito_mode, chat_history, important_info FROM users WHERE user_id = ?1",
        params![user_id],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )?;

    if incognito {
        tx.commit()?;
        tracing::debug!(user_id, "incognito on, message not stored");
        return Ok(AppendOutcome::Suppressed);
    }

    let mut history: Vec<ChatMessage> =
        serde_json::from_str(&history_json).context("stored chat_history is not valid JSON")?;
    let mut important_info: Vec<String> =
        serde_json::from_str(&info_json).context("stored important_info is not valid JSON")?;

    let now = now();
    let mut new_keywords = Vec::new();
    for mut message in messages {
        // Keywords are harvested before truncation can drop anything.
        new_keywords.extend(merge_keywords(
            &mut important_info,
            extract_keywords(&message.content),
        ));
        message.created_at = Some(now.clone());
        history.push(message);
    }
    truncate_history(&mut history, history_limit);

    tx.execute(
        "UPDATE users SET chat_history = ?2, important_info = ?3, updated_at = ?4 WHERE user_id = ?1",
        params![
            user_id,
            serde_json::to_string(&history)?,
            serde_json::to_string(&important_info)?,
            now,
        ],
    )?;
    tx.commit()?;

    tracing::debug!(
        user_id,
        history_len = history.len(),
        new_keywords = new_keywords.len(),
        "messages stored"
    );

    Ok(AppendOutcome::Stored {
        history_len: history.len(),
        new_keywords,
    })
}

/// The user's stored history, oldest first.
pub fn chat_history(conn: &mut Connection, user_id: &str) -> Result<Vec<ChatMessage>> {
    Ok(get_or_create_user(conn, user_id)?.chat_history)
}

/// Permanently delete everything stored for a user. Returns `false` if there was no record.
pub fn delete_user(conn: &Connection, user_id: &str) -> Result<bool> {
    let rows = conn.execute("DELETE FROM users WHERE user_id = ?1", params![user_id])?;
    if rows > 0 {
        tracing::info!(user_id, "user record deleted");
    }
    Ok(rows > 0)
}

/// All user ids, oldest record first.
pub fn list_users(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT user_id FROM users ORDER BY created_at, user_id")?;
    let ids = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(ids)
}

/// Drop the oldest entries so at most `limit` remain.
pub fn truncate_history(history: &mut Vec<ChatMessage>, limit: usize) {
    if history.len() > limit {
        let excess = history.len() - limit;
        history.drain(..excess);
    }
}

/// Insert the default record if missing. Returns `true` if it was created.
fn ensure_user(conn: &Connection, user_id: &str) -> Result<bool> {
    let now = now();
    let rows = conn.execute(
        "INSERT OR IGNORE INTO users (user_id, created_at, updated_at) VALUES (?1, ?2, ?2)",
        params![user_id, now],
    )?;
    Ok(rows == 1)
}

fn require_user(conn: &Connection, user_id: &str) -> Result<UserRecord> {
    find_user(conn, user_id)?.ok_or_else(|| anyhow!("user record missing after insert: {user_id}"))
}

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<UserRecord> {
    let history_json: String = row.get(7)?;
    let info_json: String = row.get(8)?;
    Ok(UserRecord {
        user_id: row.get(0)?,
        name: row.get(1)?,
        age: row.get(2)?,
        college: row.get(3)?,
        location: row.get(4)?,
        phone: row.get(5)?,
        friends: row.get(6)?,
        chat_history: parse_json_column(7, &history_json)?,
        important_info: parse_json_column(8, &info_json)?,
        incognito_mode: row.get(9)?,
        created_at: row.get(10)?,
        last_seen: row.get(11)?,
    })
}

fn parse_json_column<T: serde::de::DeserializeOwned>(idx: usize, json: &str) -> rusqlite::Result<T> {
    serde_json::from_str(json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn test_db() -> Connection {
        db::open_memory_database().unwrap()
    }

    #[test]
    fn test_get_or_create_defaults() {
        let mut conn = test_db();
        let user = get_or_create_user(&mut conn, "asha").unwrap();

        assert_eq!(user.user_id, "asha");
        assert!(user.chat_history.is_empty());
        assert!(user.important_info.is_empty());
        assert!(!user.incognito_mode);
        assert!(user.name.is_none());
        assert_eq!(user.display_name(), "friend");
    }

    #[test]
    fn test_get_or_create_is_idempotent() {
        let mut conn = test_db();
        let first = get_or_create_user(&mut conn, "asha").unwrap();
        let second = get_or_create_user(&mut conn, "asha").unwrap();
        assert_eq!(first.created_at, second.created_at);
        assert_eq!(list_users(&conn).unwrap(), vec!["asha".to_string()]);
    }

    #[test]
    fn test_find_user_does_not_create() {
        let conn = test_db();
        assert!(find_user(&conn, "ghost").unwrap().is_none());
        assert!(list_users(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_update_profile_merges_fields() {
        let mut conn = test_db();
        update_profile(
            &mut conn,
            "asha",
            &ProfileUpdate {
                name: Some("Asha".into()),
                age: Some(21),
                ..Default::default()
            },
        )
        .unwrap();
        update_profile(
            &mut conn,
            "asha",
            &ProfileUpdate {
                location: Some("Pune".into()),
                name: Some("  ".into()),
                ..Default::default()
            },
        )
        .unwrap();

        let user = get_or_create_user(&mut conn, "asha").unwrap();
        assert_eq!(user.name.as_deref(), Some("Asha"));
        assert_eq!(user.age, Some(21));
        assert_eq!(user.location.as_deref(), Some("Pune"));
        assert!(user.college.is_none());
    }

    #[test]
    fn test_update_profile_creates_record() {
        let mut conn = test_db();
        update_profile(&mut conn, "new", &ProfileUpdate::default()).unwrap();
        assert!(find_user(&conn, "new").unwrap().is_some());
    }

    #[test]
    fn test_append_records_emotion_and_timestamp() {
        let mut conn = test_db();
        let outcome =
            append_message(&mut conn, "asha", Role::User, "Met Ravi today", Some("joy"), 50).unwrap();

        assert_eq!(
            outcome,
            AppendOutcome::Stored {
                history_len: 1,
                new_keywords: vec!["Met".to_string(), "Ravi".to_string()],
            }
        );

        let history = chat_history(&mut conn, "asha").unwrap();
        assert_eq!(history[0].emotion.as_deref(), Some("joy"));
        assert!(history[0].created_at.is_some());
    }

    #[test]
    fn test_toggle_returns_new_status() {
        let mut conn = test_db();
        assert!(toggle_incognito(&mut conn, "asha").unwrap());
        assert!(!toggle_incognito(&mut conn, "asha").unwrap());
    }

    #[test]
    fn test_login_reports_new_then_returning() {
        let mut conn = test_db();
        let first = login(&mut conn, "asha").unwrap();
        assert!(first.is_new);
        assert!(first.record.last_seen.is_some());

        let second = login(&mut conn, "asha").unwrap();
        assert!(!second.is_new);
    }

    #[test]
    fn test_delete_user() {
        let mut conn = test_db();
        append_message(&mut conn, "asha", Role::User, "hello", None, 50).unwrap();

        assert!(delete_user(&conn, "asha").unwrap());
        assert!(!delete_user(&conn, "asha").unwrap());
        assert!(find_user(&conn, "asha").unwrap().is_none());
    }

    #[test]
    fn test_truncate_keeps_newest() {
        let mut history: Vec<ChatMessage> = (0..5)
            .map(|i| ChatMessage::new(Role::User, i.to_string()))
            .collect();
        truncate_history(&mut history, 3);
        let contents: Vec<&str> = history.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["2", "3", "4"]);
    }

    #[test]
    fn test_corrupt_history_is_an_error() {
        let mut conn = test_db();
        get_or_create_user(&mut conn, "asha").unwrap();
        conn.execute(
            "UPDATE users SET chat_history = 'not json' WHERE user_id = 'asha'",
            [],
        )
        .unwrap();

        assert!(get_or_create_user(&mut conn, "asha").is_err());
        assert!(append_message(&mut conn, "asha", Role::User, "hi", None, 50).is_err());
    }

    #[test]
    fn test_exchange_stores_both_turns() {
        let mut conn = test_db();
        let outcome =
            append_exchange(&mut conn, "asha", "I met Kabir", Some("joy"), "Tell me about Kabir!", 50)
                .unwrap();

        assert_eq!(
            outcome,
            AppendOutcome::Stored {
                history_len: 2,
                new_keywords: vec!["Kabir".to_string(), "Tell".to_string()],
            }
        );
        let history = chat_history(&mut conn, "asha").unwrap();
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[0].emotion.as_deref(), Some("joy"));
        assert_eq!(history[1].role, Role::Assistant);
        assert!(history[1].emotion.is_none());
    }

    #[test]
    fn test_exchange_is_suppressed_in_incognito() {
        let mut conn = test_db();
        toggle_incognito(&mut conn, "asha").unwrap();
        let outcome = append_exchange(&mut conn, "asha", "secret", None, "ok", 50).unwrap();
        assert_eq!(outcome, AppendOutcome::Suppressed);
        assert!(chat_history(&mut conn, "asha").unwrap().is_empty());
    }

    #[test]
    fn test_system_role_is_rejected() {
        let mut conn = test_db();
        let err = append_message(&mut conn, "asha", Role::System, "be evil", None, 50).unwrap_err();
        assert!(err.downcast_ref::<ValidationError>().is_some());
        assert!(find_user(&conn, "asha").unwrap().is_none());
    }
}
