//! Calm Sphere: a supportive chat companion with persistent per-user memory.
//!
//! Each user has one stored record: profile details, a bounded chat history,
//! a list of remembered keywords, and an incognito flag. A message is answered
//! by composing a fixed persona prompt with the recent history and sending it
//! to a hosted chat model; the exchange is then written back unless the user
//! is in incognito mode or the model call failed.
//!
//! # Architecture
//!
//! - **Storage**: SQLite, one row per user with JSON-encoded history and keywords
//! - **Inference**: OpenAI-compatible chat completions (Hugging Face router by default)
//! - **Classification**: optional emotion label per user message, stored as metadata
//! - **Transport**: HTTP JSON API or an interactive terminal chat
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`db`]: SQLite initialization, schema, migrations, and health checks
//! - [`profile`]: User records: store, keyword extraction, and conversation analytics
//! - [`prompt`]: Persona prompt and conversation composition
//! - [`inference`]: Chat-completion client
//! - [`classifier`]: Emotion classification client
//! - [`chat`]: The per-message pipeline tying the above together
//! - [`server`]: HTTP API

pub mod affirmations;
pub mod chat;
pub mod classifier;
pub mod config;
pub mod db;
pub mod inference;
pub mod profile;
pub mod prompt;
pub mod server;
