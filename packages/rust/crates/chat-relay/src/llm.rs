//! Completion client: OpenAI-compatible chat completions with a fixed request timeout.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::CompletionConfig;
use crate::session::{ChatMessage, ROLE_ASSISTANT};

/// Request body for chat completions (OpenAI format).
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

/// Response: choices[0].message.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

/// Result of one completion call.
#[derive(Debug, Clone)]
pub struct CompletionOutcome {
    /// First choice as a storable message.
    pub message: ChatMessage,
    /// Upstream response body, unchanged.
    pub payload: serde_json::Value,
}

/// HTTP client for chat completions.
pub struct CompletionClient {
    client: reqwest::Client,
    url: String,
    model: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl CompletionClient {
    pub fn new(config: &CompletionConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build completion http client")?;
        Ok(Self {
            client,
            url: config.url.clone(),
            model: config.model.clone(),
            api_key: config.resolve_api_key(),
            timeout,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send the full conversation; returns the first choice and the raw payload.
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<CompletionOutcome> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages,
        };
        // `.json()` sets `Content-Type: application/json`.
        let mut req = self.client.post(&self.url).json(&body);
        if let Some(ref key) = self.api_key {
            req = req.header("Authorization", format!("Bearer {key}"));
        }
        let res = req.send().await.with_context(|| {
            format!(
                "completion request to {} failed (timeout {}s)",
                self.url,
                self.timeout.as_secs()
            )
        })?;
        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read completion response body")?;
        if !status.is_success() {
            return Err(anyhow::anyhow!("completion API error {status}: {text}"));
        }
        parse_completion_payload(&text)
    }
}

/// Parse an OpenAI-compatible completion body into its first choice and the raw JSON.
pub fn parse_completion_payload(text: &str) -> Result<CompletionOutcome> {
    let payload: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| anyhow::anyhow!("completion response parse error: {e}; body: {text}"))?;
    let parsed: ChatCompletionResponse = serde_json::from_value(payload.clone())
        .map_err(|e| anyhow::anyhow!("completion response shape error: {e}; body: {text}"))?;
    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("completion response has no choices"))?;
    let role = choice
        .message
        .role
        .filter(|r| !r.trim().is_empty())
        .unwrap_or_else(|| ROLE_ASSISTANT.to_string());
    let message = ChatMessage::new(role, choice.message.content.unwrap_or_default());
    Ok(CompletionOutcome { message, payload })
}
