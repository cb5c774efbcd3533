//! Chat-completion inference.
//!
//! Provides the [`InferenceClient`] trait and an OpenAI-compatible HTTP
//! implementation pointed at the Hugging Face router by default. The client
//! is created once via [`create_client`] and shared for the process lifetime.

pub mod huggingface;

use async_trait::async_trait;

use crate::prompt::PromptMessage;

/// Reasons a completion could not be produced.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("no API key configured (set HUGGINGFACE_API_KEY)")]
    MissingApiKey,
    #[error("request to inference endpoint failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("inference endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed inference response: {0}")]
    Malformed(String),
    #[error("inference response contained no text")]
    Empty,
}

/// A hosted chat model.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Complete `conversation` and return the assistant's reply.
    async fn complete(&self, conversation: &[PromptMessage]) -> Result<String, InferenceError>;
}

/// Create the inference client from config.
pub fn create_client(
    config: &crate::config::InferenceConfig,
) -> anyhow::Result<Box<dyn InferenceClient>> {
    let client = huggingface::HfInferenceClient::new(config)?;
    Ok(Box::new(client))
}
