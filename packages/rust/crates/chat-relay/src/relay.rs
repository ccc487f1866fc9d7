//! Relay pipeline: store prompt → read history → one completion call → store reply.

use anyhow::{Context, Result};

use crate::config::{PromptCase, RelayConfig, ResponseFormat};
use crate::llm::{CompletionClient, CompletionOutcome};
use crate::observability::SessionEvent;
use crate::session::{ChatMessage, SessionStore};

/// Reply of one relay turn.
#[derive(Debug, Clone)]
pub struct RelayReply {
    /// Reply as stored in the session.
    pub message: ChatMessage,
    /// Upstream completion payload.
    pub payload: serde_json::Value,
}

impl From<CompletionOutcome> for RelayReply {
    fn from(outcome: CompletionOutcome) -> Self {
        Self {
            message: outcome.message,
            payload: outcome.payload,
        }
    }
}

/// Session store + completion client + prompt/response shaping.
pub struct Relay {
    store: SessionStore,
    client: CompletionClient,
    system_prompt: Option<String>,
    prompt_case: PromptCase,
    response_format: ResponseFormat,
}

impl Relay {
    pub fn new(store: SessionStore, client: CompletionClient) -> Self {
        Self {
            store,
            client,
            system_prompt: None,
            prompt_case: PromptCase::default(),
            response_format: ResponseFormat::default(),
        }
    }

    /// Build store and client from config (Valkey when `session.valkey_url` is set).
    pub fn from_config(config: &RelayConfig) -> Result<Self> {
        let store = match config.session.valkey_url.as_deref() {
            Some(url) => SessionStore::new_with_redis(
                url,
                Some(config.session.key_prefix.clone()),
                config.session.ttl_secs,
            )?,
            None => SessionStore::in_memory_with_ttl(config.session.ttl_secs),
        };
        let client = CompletionClient::new(&config.completion)?;
        Ok(Self::new(store, client)
            .with_system_prompt(config.system_prompt.clone())
            .with_prompt_case(config.prompt_case)
            .with_response_format(config.response_format))
    }

    #[must_use]
    pub fn with_system_prompt(mut self, system_prompt: Option<String>) -> Self {
        self.system_prompt = system_prompt
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        self
    }

    #[must_use]
    pub fn with_prompt_case(mut self, prompt_case: PromptCase) -> Self {
        self.prompt_case = prompt_case;
        self
    }

    #[must_use]
    pub fn with_response_format(mut self, response_format: ResponseFormat) -> Self {
        self.response_format = response_format;
        self
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn client(&self) -> &CompletionClient {
        &self.client
    }

    pub fn response_format(&self) -> ResponseFormat {
        self.response_format
    }

    /// Run one turn for `session_id`. The user message stays stored even when the
    /// completion call fails; the reply is stored only on success.
    pub async fn run_turn(&self, session_id: &str, prompt: &str) -> Result<RelayReply> {
        tracing::debug!(
            event = SessionEvent::RelayTurnStarted.as_str(),
            session_id,
            prompt_chars = prompt.chars().count(),
            "relay turn started"
        );
        self.store_user_message(session_id, prompt).await?;

        let history = self
            .store
            .get(session_id)
            .await
            .context("failed to load session history")?;

        tracing::debug!(
            event = SessionEvent::RelayCompletionRequested.as_str(),
            session_id,
            history_messages = history.len(),
            model = %self.client.model(),
            "completion requested"
        );
        let outcome = match self.client.complete(&history).await {
            Ok(outcome) => outcome,
            Err(error) => {
                tracing::warn!(
                    event = SessionEvent::RelayCompletionFailed.as_str(),
                    session_id,
                    error = %error,
                    "completion call failed"
                );
                return Err(error);
            }
        };

        self.store
            .append(session_id, vec![outcome.message.clone()])
            .await
            .context("failed to store reply")?;
        tracing::info!(
            event = SessionEvent::RelayTurnCompleted.as_str(),
            session_id,
            history_messages = history.len() + 1,
            reply_chars = outcome.message.content.chars().count(),
            "relay turn completed"
        );
        Ok(outcome.into())
    }

    /// Full stored history for a session.
    pub async fn history(&self, session_id: &str) -> Result<Vec<ChatMessage>> {
        self.store.get(session_id).await
    }

    /// Drop the stored history for a session.
    pub async fn reset(&self, session_id: &str) -> Result<()> {
        self.store.clear(session_id).await
    }

    /// Store the user message. On a session's first turn the system prompt goes in
    /// the same write, so concurrent first turns seed it once.
    async fn store_user_message(&self, session_id: &str, prompt: &str) -> Result<()> {
        let user_message = ChatMessage::user(self.prompt_case.apply(prompt));
        let Some(ref system_prompt) = self.system_prompt else {
            return self
                .store
                .append(session_id, vec![user_message])
                .await
                .context("failed to store user message");
        };
        let seeded = self
            .store
            .append_seeded(
                session_id,
                ChatMessage::system(system_prompt.clone()),
                vec![user_message],
            )
            .await
            .context("failed to store user message")?;
        if seeded {
            tracing::debug!(
                event = SessionEvent::SessionSystemPromptSeeded.as_str(),
                session_id,
                "system prompt seeded"
            );
        }
        Ok(())
    }
}
