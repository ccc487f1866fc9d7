//! Chat relay: per-session history in Valkey, forwarded to an OpenAI-compatible completion API.
//!
//! - **session**: append/read/clear of `{role, content}` lists (Valkey or in-memory).
//! - **llm**: one outbound completion call with a fixed timeout.
//! - **relay**: store prompt → read history → complete → store reply.
//! - **gateway**: axum router (`POST /chat`, `GET|DELETE /chat/{session_id}`, `GET /health`).

#![allow(missing_docs)]

mod config;
mod error;
mod gateway;
mod llm;
mod observability;
mod relay;
mod session;

pub use config::{
    CompletionConfig, CompletionSettings, DEFAULT_COMPLETION_TIMEOUT_SECS, DEFAULT_COMPLETION_URL,
    DEFAULT_MODEL, GatewaySettings, PromptCase, RelayConfig, RelaySettings, ResponseFormat,
    RuntimeSettings, SessionConfig, SessionSettings, load_runtime_settings,
    load_runtime_settings_from_paths, runtime_settings_paths, set_config_home_override,
};
pub use error::RelayError;
pub use gateway::{
    ChatRequest, GatewayHealthResponse, GatewayState, HistoryResponse, router, run_http,
    validate_chat_request,
};
pub use llm::{CompletionClient, CompletionOutcome, parse_completion_payload};
pub use relay::{Relay, RelayReply};
pub use session::{
    ChatMessage, DEFAULT_SESSION_KEY_PREFIX, DEFAULT_SESSION_TTL_SECS, ROLE_ASSISTANT,
    ROLE_SYSTEM, ROLE_USER, SessionStore,
};
