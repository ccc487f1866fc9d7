//! Session namespace: message type and history store (Valkey or in-memory).

mod message;
mod redis_backend;
mod store;

pub use message::{ChatMessage, ROLE_ASSISTANT, ROLE_SYSTEM, ROLE_USER};
pub use store::{DEFAULT_SESSION_KEY_PREFIX, DEFAULT_SESSION_TTL_SECS, SessionStore};
