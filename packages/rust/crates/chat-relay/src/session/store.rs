//! Session store: session_id → ordered chat messages (Valkey list, or in-memory map).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use anyhow::{Context, Result};

use crate::observability::SessionEvent;

use super::message::ChatMessage;
use super::redis_backend::RedisSessionBackend;

/// Default key prefix for session lists in Valkey.
pub const DEFAULT_SESSION_KEY_PREFIX: &str = "chat-relay:session";
/// Default session expiry (24h), refreshed on every append.
pub const DEFAULT_SESSION_TTL_SECS: u64 = 24 * 60 * 60;

/// In-process session: messages plus the time of the last append.
struct MemorySession {
    messages: Vec<ChatMessage>,
    touched_at: Instant,
}

impl MemorySession {
    fn is_expired(&self, ttl: Option<Duration>, now: Instant) -> bool {
        ttl.is_some_and(|ttl| now.duration_since(self.touched_at) >= ttl)
    }
}

/// History store. Uses Valkey when constructed with a URL; otherwise keeps sessions in process.
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<String, MemorySession>>>,
    memory_ttl: Option<Duration>,
    redis: Option<Arc<RedisSessionBackend>>,
}

impl SessionStore {
    /// In-memory store with the default 24h expiry.
    pub fn in_memory() -> Self {
        Self::in_memory_with_ttl(Some(DEFAULT_SESSION_TTL_SECS))
    }

    /// In-memory store. Sessions expire `ttl_secs` after their last append;
    /// `None` or `0` disables expiry.
    pub fn in_memory_with_ttl(ttl_secs: Option<u64>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            memory_ttl: ttl_secs.filter(|v| *v > 0).map(Duration::from_secs),
            redis: None,
        }
    }

    /// Store backed by Valkey/Redis lists.
    pub fn new_with_redis(
        redis_url: &str,
        key_prefix: Option<String>,
        ttl_secs: Option<u64>,
    ) -> Result<Self> {
        let key_prefix = key_prefix
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_SESSION_KEY_PREFIX.to_string());
        let backend = RedisSessionBackend::new(redis_url, key_prefix, ttl_secs)
            .context("failed to initialize valkey session store")?;
        tracing::info!(
            event = SessionEvent::SessionBackendEnabled.as_str(),
            key_prefix = %backend.key_prefix(),
            ttl_secs = ?backend.ttl_secs(),
            "session store backend enabled: valkey"
        );
        Ok(Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            memory_ttl: None,
            redis: Some(Arc::new(backend)),
        })
    }

    /// `"valkey"` or `"memory"`.
    pub fn backend_name(&self) -> &'static str {
        if self.redis.is_some() {
            "valkey"
        } else {
            "memory"
        }
    }

    /// Append messages for a session, preserving order. Refreshes the expiry.
    pub async fn append(&self, session_id: &str, messages: Vec<ChatMessage>) -> Result<()> {
        if messages.is_empty() {
            return Ok(());
        }
        if let Some(ref redis) = self.redis {
            return redis
                .append_messages(session_id, &messages)
                .await
                .with_context(|| {
                    format!("valkey session append failed for session_id={session_id}")
                });
        }
        self.append_memory(session_id, None, messages).await;
        Ok(())
    }

    /// Append messages, putting `seed` first when the session is empty (or expired).
    /// The check and the write happen atomically. Returns whether `seed` was written.
    pub async fn append_seeded(
        &self,
        session_id: &str,
        seed: ChatMessage,
        messages: Vec<ChatMessage>,
    ) -> Result<bool> {
        if let Some(ref redis) = self.redis {
            return redis
                .append_messages_seeded(session_id, &seed, &messages)
                .await
                .with_context(|| {
                    format!("valkey session append failed for session_id={session_id}")
                });
        }
        Ok(self.append_memory(session_id, Some(seed), messages).await)
    }

    async fn append_memory(
        &self,
        session_id: &str,
        seed: Option<ChatMessage>,
        messages: Vec<ChatMessage>,
    ) -> bool {
        let now = Instant::now();
        let ttl = self.memory_ttl;
        let mut g = self.inner.write().await;
        if ttl.is_some() {
            g.retain(|_, session| !session.is_expired(ttl, now));
        }
        let session = g
            .entry(session_id.to_string())
            .or_insert_with(|| MemorySession {
                messages: Vec::new(),
                touched_at: now,
            });
        let seeded = match seed {
            Some(seed) if session.messages.is_empty() => {
                session.messages.push(seed);
                true
            }
            _ => false,
        };
        session.messages.extend(messages);
        session.touched_at = now;
        tracing::debug!(
            event = SessionEvent::SessionMessagesAppended.as_str(),
            session_id,
            total_messages = session.messages.len(),
            seeded,
            backend = "memory",
            "session messages appended"
        );
        seeded
    }

    /// Full history for a session (empty when unknown or expired).
    pub async fn get(&self, session_id: &str) -> Result<Vec<ChatMessage>> {
        let messages = if let Some(ref redis) = self.redis {
            redis.get_messages(session_id).await.with_context(|| {
                format!("valkey session read failed for session_id={session_id}")
            })?
        } else {
            let now = Instant::now();
            let g = self.inner.read().await;
            g.get(session_id)
                .filter(|session| !session.is_expired(self.memory_ttl, now))
                .map(|session| session.messages.clone())
                .unwrap_or_default()
        };
        tracing::debug!(
            event = SessionEvent::SessionMessagesLoaded.as_str(),
            session_id,
            loaded_messages = messages.len(),
            backend = self.backend_name(),
            "session messages loaded"
        );
        Ok(messages)
    }

    /// Message count without loading payloads.
    pub async fn len(&self, session_id: &str) -> Result<usize> {
        if let Some(ref redis) = self.redis {
            return redis.get_messages_len(session_id).await.with_context(|| {
                format!("valkey session length read failed for session_id={session_id}")
            });
        }
        let now = Instant::now();
        let g = self.inner.read().await;
        Ok(g.get(session_id)
            .filter(|session| !session.is_expired(self.memory_ttl, now))
            .map_or(0, |session| session.messages.len()))
    }

    /// Drop all history for a session.
    pub async fn clear(&self, session_id: &str) -> Result<()> {
        if let Some(ref redis) = self.redis {
            redis.clear_messages(session_id).await.with_context(|| {
                format!("valkey session clear failed for session_id={session_id}")
            })?;
        } else {
            let mut g = self.inner.write().await;
            g.remove(session_id);
        }
        tracing::debug!(
            event = SessionEvent::SessionMessagesCleared.as_str(),
            session_id,
            backend = self.backend_name(),
            "session messages cleared"
        );
        Ok(())
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::in_memory()
    }
}
