use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CalmConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub inference: InferenceConfig,
    pub classifier: ClassifierConfig,
    pub conversation: ConversationConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct InferenceConfig {
    /// Base URL of an OpenAI-compatible endpoint; `/v1/chat/completions` is appended.
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    /// Bearer token. Usually supplied through `HUGGINGFACE_API_KEY` instead of the file.
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ClassifierConfig {
    /// `huggingface` or `none`.
    pub provider: String,
    pub endpoint: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ConversationConfig {
    pub history_limit: usize,
    pub context_turns: usize,
    pub stats_top_words: usize,
}

impl Default for CalmConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            inference: InferenceConfig::default(),
            classifier: ClassifierConfig::default(),
            conversation: ConversationConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8420,
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_calm_dir()
            .join("calm.db")
            .to_string_lossy()
            .into_owned();
        Self { db_path }
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://router.huggingface.co".into(),
            model: "meta-llama/Llama-3.2-3B-Instruct".into(),
            max_tokens: 200,
            timeout_secs: 60,
            api_key: None,
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            provider: "huggingface".into(),
            endpoint: "https://router.huggingface.co/hf-inference/models/bhadresh-savani/distilbert-base-uncased-emotion".into(),
            timeout_secs: 30,
        }
    }
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            history_limit: crate::profile::DEFAULT_HISTORY_LIMIT,
            context_turns: crate::prompt::DEFAULT_CONTEXT_TURNS,
            stats_top_words: 10,
        }
    }
}

/// Returns `~/.calm/`
pub fn default_calm_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".calm")
}

/// Returns the default config file path: `~/.calm/config.toml`
pub fn default_config_path() -> PathBuf {
    default_calm_dir().join("config.toml")
}

impl CalmConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            CalmConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load config at process start, before the configured subscriber exists.
    ///
    /// A temporary `info`-level stderr logger is installed for the duration of
    /// the load so notes about missing files and ignored overrides are shown.
    pub fn load_at_startup(path: Option<&Path>) -> Result<Self> {
        Self::load_logged(path, std::io::stderr)
    }

    fn load_logged<W>(path: Option<&Path>, writer: W) -> Result<Self>
    where
        W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        let bootstrap = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("info"))
            .with_writer(writer)
            .finish();
        tracing::subscriber::with_default(bootstrap, || match path {
            Some(path) => Self::load_from(path),
            None => Self::load(),
        })
    }

    /// Apply environment variable overrides.
    ///
    /// Recognized: `CALM_DB`, `CALM_LOG_LEVEL`, `CALM_HOST`, `CALM_PORT`,
    /// `CALM_INFERENCE_URL`, `CALM_MODEL`, `HUGGINGFACE_API_KEY`.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("CALM_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("CALM_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("CALM_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("CALM_PORT") {
            match val.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!(value = %val, "ignoring invalid CALM_PORT"),
            }
        }
        if let Ok(val) = std::env::var("CALM_INFERENCE_URL") {
            self.inference.base_url = val;
        }
        if let Ok(val) = std::env::var("CALM_MODEL") {
            self.inference.model = val;
        }
        if let Ok(val) = std::env::var("HUGGINGFACE_API_KEY") {
            if !val.trim().is_empty() {
                self.inference.api_key = Some(val);
            }
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
