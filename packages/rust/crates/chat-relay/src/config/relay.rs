//! Relay configuration: completion endpoint, session backend, prompt/response shaping.

use std::net::IpAddr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::session::{DEFAULT_SESSION_KEY_PREFIX, DEFAULT_SESSION_TTL_SECS};

/// Default OpenAI chat completions endpoint.
pub const DEFAULT_COMPLETION_URL: &str = "https://api.openai.com/v1/chat/completions";
/// Default completion model id.
pub const DEFAULT_MODEL: &str = "gpt-5";
/// Default timeout for one outbound completion call.
pub const DEFAULT_COMPLETION_TIMEOUT_SECS: u64 = 15;

/// Outbound completion call settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Chat completions endpoint (OpenAI-compatible).
    pub url: String,
    /// Model id sent with every request.
    pub model: String,
    /// API key; if None, `OPENAI_API_KEY` is read unless the endpoint is local.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Whole-request timeout, in seconds.
    #[serde(default = "default_completion_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_completion_timeout_secs() -> u64 {
    DEFAULT_COMPLETION_TIMEOUT_SECS
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_COMPLETION_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            timeout_secs: DEFAULT_COMPLETION_TIMEOUT_SECS,
        }
    }
}

impl CompletionConfig {
    /// Resolve API key: config value, else `OPENAI_API_KEY`.
    /// Local endpoints (127.0.0.1 / localhost) get no key unless one is configured.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(ref k) = self.api_key {
            return Some(k.clone());
        }
        if is_local_endpoint(&self.url) {
            return None;
        }
        std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|v| !v.trim().is_empty())
    }
}

/// True when the endpoint host is `localhost` or a loopback address.
pub(crate) fn is_local_endpoint(url: &str) -> bool {
    let Ok(parsed) = reqwest::Url::parse(url) else {
        return false;
    };
    match parsed.host_str() {
        Some(host) if host.eq_ignore_ascii_case("localhost") => true,
        Some(host) => host
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<IpAddr>()
            .is_ok_and(|ip| ip.is_loopback()),
        None => false,
    }
}

/// Session backend settings. `valkey_url: None` selects the in-memory store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valkey_url: Option<String>,
    pub key_prefix: String,
    /// Expiry refreshed on each append; None disables expiry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl_secs: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            valkey_url: None,
            key_prefix: DEFAULT_SESSION_KEY_PREFIX.to_string(),
            ttl_secs: Some(DEFAULT_SESSION_TTL_SECS),
        }
    }
}

/// How the incoming prompt is normalized before it is stored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PromptCase {
    /// Store the prompt as sent.
    #[default]
    Preserve,
    /// Upper-case the first letter of every word, lower-case the rest.
    Title,
}

impl PromptCase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Preserve => "preserve",
            Self::Title => "title",
        }
    }

    pub fn apply(self, prompt: &str) -> String {
        match self {
            Self::Preserve => prompt.to_string(),
            Self::Title => title_case(prompt),
        }
    }
}

impl FromStr for PromptCase {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "preserve" => Ok(Self::Preserve),
            "title" => Ok(Self::Title),
            _ => Err(anyhow::anyhow!(
                "invalid prompt case '{raw}' (expected one of: preserve, title)"
            )),
        }
    }
}

fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for ch in text.chars() {
        if ch.is_alphanumeric() || ch == '\'' {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}

/// Shape of the `POST /chat` response body.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    /// Echo the upstream completion payload verbatim.
    #[default]
    Completion,
    /// Return only the reply as `{role, content}`.
    Message,
}

impl ResponseFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completion => "completion",
            Self::Message => "message",
        }
    }
}

impl FromStr for ResponseFormat {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "completion" => Ok(Self::Completion),
            "message" => Ok(Self::Message),
            _ => Err(anyhow::anyhow!(
                "invalid response format '{raw}' (expected one of: completion, message)"
            )),
        }
    }
}

/// Full relay config: what the binary resolves from CLI, env, and settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub session: SessionConfig,
    /// Seeded as the first message of an empty session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub prompt_case: PromptCase,
    #[serde(default)]
    pub response_format: ResponseFormat,
}
