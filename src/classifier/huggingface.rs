//! Hugging Face inference-API text classification.
//!
//! The endpoint answers `{"inputs": text}` with either `[[{label, score}, ...]]`
//! or `[{label, score}, ...]`; the highest-scoring label wins.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::EmotionClassifier;
use crate::config::ClassifierConfig;

pub struct HfEmotionClassifier {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClassificationResponse {
    Nested(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
}

impl HfEmotionClassifier {
    pub fn new(config: &ClassifierConfig, api_key: Option<&str>) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        tracing::info!(endpoint = %config.endpoint, "emotion classifier ready");

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: api_key.map(str::to_string),
        })
    }
}

/// Highest-scoring label in a classification response body.
fn best_label(body: &str) -> Result<String> {
    let response: ClassificationResponse =
        serde_json::from_str(body).context("unexpected classification response")?;

    let candidates = match response {
        ClassificationResponse::Nested(batches) => batches.into_iter().next().unwrap_or_default(),
        ClassificationResponse::Flat(scores) => scores,
    };

    candidates
        .into_iter()
        .max_by(|a, b| a.score.total_cmp(&b.score))
        .map(|ls| ls.label)
        .ok_or_else(|| anyhow!("classification response had no labels"))
}

#[async_trait]
impl EmotionClassifier for HfEmotionClassifier {
    async fn classify(&self, text: &str) -> Result<String> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "inputs": text }));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.context("classification request failed")?;
        let status = response.status();
        let body = response.text().await.context("error reading classification response")?;

        anyhow::ensure!(
            status.is_success(),
            "classifier returned HTTP {}: {}",
            status,
            body.chars().take(200).collect::<String>()
        );

        best_label(&body)
    }
}
