//! The per-message pipeline and the operations the user-facing surfaces call.
//!
//! [`ChatService`] owns the injected collaborators (database handle, inference
//! client, optional emotion classifier, config). One [`ChatService::respond`]
//! call runs: profile fetch → classify → compose → infer → persist. Store
//! operations run on the blocking pool while holding the connection lock.

use std::sync::{Arc, Mutex};

use anyhow::{anyhow, bail, Context, Result};
use rusqlite::Connection;
use serde::Serialize;

use crate::classifier::{self, EmotionClassifier};
use crate::config::CalmConfig;
use crate::db;
use crate::inference::{self, InferenceClient};
use crate::profile::stats::{conversation_stats, ConversationStats};
use crate::profile::store::{self, AppendOutcome, Login};
use crate::profile::types::{ChatMessage, ProfileUpdate, UserRecord};
use crate::profile::{normalize_user_id, ValidationError};
use crate::prompt::{build_conversation, Conversation};

/// Reply sent when the inference endpoint fails.
pub const FALLBACK_REPLY: &str = "Sorry, I ran into an issue. Let's try again!";

/// Where a reply came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplySource {
    /// First message of a user with no history; no model call.
    Greeting,
    Model,
    /// Inference failed; nothing was stored.
    Fallback,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub text: String,
    /// Classifier label for the user's message, if any.
    pub emotion: Option<String>,
    pub source: ReplySource,
    /// `false` when incognito mode or a failure kept the exchange out of history.
    pub stored: bool,
}

#[derive(Clone)]
pub struct ChatService {
    db: Arc<Mutex<Connection>>,
    inference: Arc<dyn InferenceClient>,
    classifier: Option<Arc<dyn EmotionClassifier>>,
    config: Arc<CalmConfig>,
}

impl ChatService {
    pub fn new(
        db: Arc<Mutex<Connection>>,
        inference: Arc<dyn InferenceClient>,
        classifier: Option<Arc<dyn EmotionClassifier>>,
        config: Arc<CalmConfig>,
    ) -> Self {
        Self {
            db,
            inference,
            classifier,
            config,
        }
    }

    /// Open the configured database and build the remote clients.
    pub fn from_config(config: CalmConfig) -> Result<Self> {
        let db_path = config.resolved_db_path();
        let conn = db::open_database(&db_path)?;
        tracing::info!(db = %db_path.display(), "database ready");

        let inference: Arc<dyn InferenceClient> =
            Arc::from(inference::create_client(&config.inference)?);
        let classifier: Option<Arc<dyn EmotionClassifier>> =
            classifier::create_classifier(&config.classifier, config.inference.api_key.as_deref())?
                .map(Arc::from);

        Ok(Self::new(
            Arc::new(Mutex::new(conn)),
            inference,
            classifier,
            Arc::new(config),
        ))
    }

    pub fn config(&self) -> &CalmConfig {
        &self.config
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_db<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let mut conn = db
                .lock()
                .map_err(|e| anyhow!("db lock poisoned: {e}"))?;
            f(&mut *conn)
        })
        .await
        .context("database task failed")?
    }

    pub async fn login(&self, user_id: &str) -> Result<Login> {
        let user_id = normalize_user_id(user_id)?.to_string();
        self.with_db(move |conn| store::login(conn, &user_id)).await
    }

    pub async fn profile(&self, user_id: &str) -> Result<UserRecord> {
        let user_id = normalize_user_id(user_id)?.to_string();
        self.with_db(move |conn| store::get_or_create_user(conn, &user_id))
            .await
    }

    /// Apply `update` and return the resulting record.
    pub async fn update_profile(&self, user_id: &str, update: ProfileUpdate) -> Result<UserRecord> {
        let user_id = normalize_user_id(user_id)?.to_string();
        self.with_db(move |conn| {
            store::update_profile(conn, &user_id, &update)?;
            store::get_or_create_user(conn, &user_id)
        })
        .await
    }

    pub async fn toggle_incognito(&self, user_id: &str) -> Result<bool> {
        let user_id = normalize_user_id(user_id)?.to_string();
        self.with_db(move |conn| store::toggle_incognito(conn, &user_id))
            .await
    }

    pub async fn history(&self, user_id: &str) -> Result<Vec<ChatMessage>> {
        let user_id = normalize_user_id(user_id)?.to_string();
        self.with_db(move |conn| store::chat_history(conn, &user_id))
            .await
    }

    pub async fn stats(&self, user_id: &str) -> Result<ConversationStats> {
        let user_id = normalize_user_id(user_id)?.to_string();
        let top_n = self.config.conversation.stats_top_words;
        let record = self
            .with_db(move |conn| store::get_or_create_user(conn, &user_id))
            .await?;
        Ok(conversation_stats(&record, top_n))
    }

    pub async fn delete_user(&self, user_id: &str) -> Result<bool> {
        let user_id = normalize_user_id(user_id)?.to_string();
        self.with_db(move |conn| store::delete_user(conn, &user_id))
            .await
    }

    /// Produce a reply to `message` and store the exchange.
    ///
    /// Storage errors propagate. Inference errors are answered with
    /// [`FALLBACK_REPLY`] and leave the history untouched.
    pub async fn respond(&self, user_id: &str, message: &str) -> Result<ChatReply> {
        let user_id = normalize_user_id(user_id)?.to_string();
        let message = message.trim();
        if message.is_empty() {
            bail!(ValidationError("message must not be empty".into()));
        }
        let message = message.to_string();

        let record = {
            let user_id = user_id.clone();
            self.with_db(move |conn| store::get_or_create_user(conn, &user_id))
                .await?
        };

        let emotion = self.classify(&message).await;

        let context_turns = self.config.conversation.context_turns;
        let (text, source) = match build_conversation(&record, &message, context_turns) {
            Conversation::Greeting(text) => (text, ReplySource::Greeting),
            Conversation::Prompt(messages) => match self.inference.complete(&messages).await {
                Ok(text) => (text, ReplySource::Model),
                Err(e) => {
                    tracing::warn!(user_id = %user_id, error = %e, "inference failed, sending fallback reply");
                    return Ok(ChatReply {
                        text: FALLBACK_REPLY.to_string(),
                        emotion,
                        source: ReplySource::Fallback,
                        stored: false,
                    });
                }
            },
        };

        let stored = self
            .store_exchange(&user_id, message, emotion.clone(), text.clone())
            .await?;

        tracing::info!(user_id = %user_id, source = ?source, stored, "reply sent");
        Ok(ChatReply {
            text,
            emotion,
            source,
            stored,
        })
    }

    /// Best-effort emotion label; failures are logged and dropped.
    async fn classify(&self, message: &str) -> Option<String> {
        let classifier = self.classifier.as_ref()?;
        match classifier.classify(message).await {
            Ok(label) => {
                tracing::debug!(emotion = %label, "message classified");
                Some(label)
            }
            Err(e) => {
                tracing::warn!(error = %e, "emotion classification failed");
                None
            }
        }
    }

    async fn store_exchange(
        &self,
        user_id: &str,
        message: String,
        emotion: Option<String>,
        reply: String,
    ) -> Result<bool> {
        let user_id = user_id.to_string();
        let limit = self.config.conversation.history_limit;
        self.with_db(move |conn| {
            let outcome = store::append_exchange(
                conn,
                &user_id,
                &message,
                emotion.as_deref(),
                &reply,
                limit,
            )?;
            Ok(matches!(outcome, AppendOutcome::Stored { .. }))
        })
        .await
    }
}
