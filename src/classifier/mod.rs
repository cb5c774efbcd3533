//! Emotion classification of user messages.
//!
//! The label is stored as message metadata only. [`create_classifier`] returns
//! `None` when classification is disabled (`provider = "none"`).

pub mod huggingface;

use anyhow::Result;
use async_trait::async_trait;

/// Single-label text classifier.
#[async_trait]
pub trait EmotionClassifier: Send + Sync {
    /// Best label for `text`, e.g. `"joy"` or `"sadness"`.
    async fn classify(&self, text: &str) -> Result<String>;
}

/// Create the classifier from config.
pub fn create_classifier(
    config: &crate::config::ClassifierConfig,
    api_key: Option<&str>,
) -> Result<Option<Box<dyn EmotionClassifier>>> {
    match config.provider.as_str() {
        "none" => {
            tracing::info!("emotion classification disabled");
            Ok(None)
        }
        "huggingface" => {
            let classifier = huggingface::HfEmotionClassifier::new(config, api_key)?;
            Ok(Some(Box::new(classifier)))
        }
        other => anyhow::bail!("unknown classifier provider: {other}. Supported: huggingface, none"),
    }
}
