#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use calm::chat::ChatService;
use calm::classifier::EmotionClassifier;
use calm::config::CalmConfig;
use calm::inference::{InferenceClient, InferenceError};
use calm::profile::store;
use calm::profile::types::Role;
use calm::prompt::PromptMessage;
use rusqlite::Connection;

/// Open a fresh in-memory database with schema and migrations applied.
pub fn test_db() -> Connection {
    calm::db::open_memory_database().unwrap()
}

/// Append `n` alternating user/assistant messages with content `"msg {i}"`.
pub fn seed_history(conn: &mut Connection, user_id: &str, n: usize) {
    for i in 0..n {
        let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
        store::append_message(conn, user_id, role, &format!("msg {i}"), None, 50).unwrap();
    }
}

/// Scripted inference client that records every conversation it receives.
pub struct FakeInference {
    reply: Option<String>,
    calls: AtomicUsize,
    seen: Mutex<Vec<Vec<PromptMessage>>>,
}

impl FakeInference {
    pub fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(text.to_string()),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    /// Every call fails with a 503.
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: None,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_conversation(&self) -> Option<Vec<PromptMessage>> {
        self.seen.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl InferenceClient for FakeInference {
    async fn complete(&self, conversation: &[PromptMessage]) -> Result<String, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(conversation.to_vec());
        match &self.reply {
            Some(text) => Ok(text.clone()),
            None => Err(InferenceError::Status {
                status: 503,
                body: "model overloaded".into(),
            }),
        }
    }
}

/// Classifier returning a fixed label, or failing when `label` is `None`.
pub struct FakeClassifier {
    pub label: Option<String>,
}

#[async_trait]
impl EmotionClassifier for FakeClassifier {
    async fn classify(&self, _text: &str) -> anyhow::Result<String> {
        self.label
            .clone()
            .ok_or_else(|| anyhow::anyhow!("classifier unavailable"))
    }
}

/// Build a service over `conn` with the given fakes and default config.
pub fn service(
    conn: Connection,
    inference: Arc<FakeInference>,
    classifier: Option<FakeClassifier>,
) -> (ChatService, Arc<Mutex<Connection>>) {
    let db = Arc::new(Mutex::new(conn));
    let classifier: Option<Arc<dyn EmotionClassifier>> =
        classifier.map(|c| Arc::new(c) as Arc<dyn EmotionClassifier>);
    let service = ChatService::new(
        Arc::clone(&db),
        inference,
        classifier,
        Arc::new(CalmConfig::default()),
    );
    (service, db)
}
