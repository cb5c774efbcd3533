//! OpenAI-compatible chat-completion client.
//!
//! Posts `{model, messages, max_tokens}` to `{base_url}/v1/chat/completions`
//! with bearer auth and returns `choices[0].message.content`.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{InferenceClient, InferenceError};
use crate::config::InferenceConfig;
use crate::prompt::PromptMessage;

pub struct HfInferenceClient {
    client: Client,
    endpoint: String,
    model: String,
    max_tokens: u32,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [PromptMessage],
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl HfInferenceClient {
    pub fn new(config: &InferenceConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let endpoint = chat_completions_url(&config.base_url);
        if config.api_key.is_none() {
            tracing::warn!("no inference API key configured; replies will fall back to the apology text");
        }
        tracing::info!(endpoint = %endpoint, model = %config.model, "inference client ready");

        Ok(Self {
            client,
            endpoint,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            api_key: config.api_key.clone(),
        })
    }
}

fn chat_completions_url(base_url: &str) -> String {
    format!("{}/v1/chat/completions", base_url.trim_end_matches('/'))
}

/// Pull the reply text out of a chat-completion response body.
fn parse_completion(body: &str) -> Result<String, InferenceError> {
    let response: ChatCompletionResponse = serde_json::from_str(body).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        InferenceError::Malformed(format!("{e}; body: {preview}"))
    })?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or(InferenceError::Empty)
}

#[async_trait]
impl InferenceClient for HfInferenceClient {
    async fn complete(&self, conversation: &[PromptMessage]) -> Result<String, InferenceError> {
        let api_key = self.api_key.as_deref().ok_or(InferenceError::MissingApiKey)?;

        let request = ChatCompletionRequest {
            model: &self.model,
            messages: conversation,
            max_tokens: self.max_tokens,
        };

        tracing::debug!(
            model = %self.model,
            messages = conversation.len(),
            max_tokens = self.max_tokens,
            "sending chat completion"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let preview: String = body.chars().take(300).collect();
            return Err(InferenceError::Status {
                status: status.as_u16(),
                body: preview,
            });
        }

        parse_completion(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_is_built_from_base() {
        assert_eq!(
            chat_completions_url("https://router.huggingface.co/"),
            "https://router.huggingface.co/v1/chat/completions"
        );
        assert_eq!(
            chat_completions_url("http://localhost:8080"),
            "http://localhost:8080/v1/chat/completions"
        );
    }

    #[test]
    fn request_serializes_openai_shape() {
        let messages = vec![PromptMessage::system("be kind"), PromptMessage::user("hi")];
        let request = ChatCompletionRequest {
            model: "m",
            messages: &messages,
            max_tokens: 200,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "model": "m",
                "messages": [
                    {"role": "system", "content": "be kind"},
                    {"role": "user", "content": "hi"}
                ],
                "max_tokens": 200
            })
        );
    }

    #[test]
    fn parses_first_choice() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"  I'm here for you. "}}]}"#;
        assert_eq!(parse_completion(body).unwrap(), "I'm here for you.");
    }

    #[test]
    fn no_choices_is_empty() {
        assert!(matches!(parse_completion(r#"{"choices":[]}"#), Err(InferenceError::Empty)));
        assert!(matches!(
            parse_completion(r#"{"choices":[{"message":{"content":null}}]}"#),
            Err(InferenceError::Empty)
        ));
    }

    #[test]
    fn html_body_is_malformed() {
        let err = parse_completion("<html>502 Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, InferenceError::Malformed(_)));
        assert!(err.to_string().contains("502"));
    }

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let config = InferenceConfig {
            base_url: "http://127.0.0.1:9".into(),
            api_key: None,
            ..InferenceConfig::default()
        };
        let client = HfInferenceClient::new(&config).unwrap();
        let err = client.complete(&[PromptMessage::user("hi")]).await.unwrap_err();
        assert!(matches!(err, InferenceError::MissingApiKey));
    }
}
