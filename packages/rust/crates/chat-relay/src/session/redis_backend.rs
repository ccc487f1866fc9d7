//! Valkey/Redis list backend: one list per session, JSON payload per entry.

use std::sync::Arc;

use anyhow::{Context, Result};
use redis::FromRedisValue;
use tokio::sync::Mutex;

use crate::observability::SessionEvent;

use super::message::ChatMessage;

#[derive(Debug)]
pub(crate) struct RedisSessionBackend {
    client: redis::Client,
    key_prefix: String,
    ttl_secs: Option<u64>,
    connection: Arc<Mutex<Option<redis::aio::MultiplexedConnection>>>,
}

impl RedisSessionBackend {
    pub(crate) fn new(url: &str, key_prefix: String, ttl_secs: Option<u64>) -> Result<Self> {
        let client = redis::Client::open(url)
            .with_context(|| format!("invalid redis url for session backend: {url}"))?;
        Ok(Self {
            client,
            key_prefix,
            ttl_secs: ttl_secs.filter(|value| *value > 0),
            connection: Arc::new(Mutex::new(None)),
        })
    }

    pub(crate) fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    pub(crate) fn ttl_secs(&self) -> Option<u64> {
        self.ttl_secs
    }

    fn messages_key(&self, session_id: &str) -> String {
        format!("{}:messages:{}", self.key_prefix, session_id)
    }

    /// Shared multiplexed connection, opened on first use. Callers get a clone so
    /// commands from different sessions do not queue behind one lock.
    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        let mut conn_guard = self.connection.lock().await;
        if let Some(ref conn) = *conn_guard {
            return Ok(conn.clone());
        }
        let conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .context("failed to open redis connection for session backend")?;
        tracing::debug!(
            event = SessionEvent::SessionValkeyConnected.as_str(),
            key_prefix = %self.key_prefix,
            "valkey session backend connected"
        );
        *conn_guard = Some(conn.clone());
        Ok(conn)
    }

    async fn drop_connection(&self, operation: &'static str, err: &redis::RedisError) {
        tracing::warn!(
            event = SessionEvent::SessionValkeyCommandFailed.as_str(),
            operation,
            error = %err,
            "valkey command failed; dropping connection"
        );
        *self.connection.lock().await = None;
    }

    /// Run one command. A failure drops the cached connection; the next call reconnects.
    async fn run_command<T>(&self, operation: &'static str, cmd: redis::Cmd) -> Result<T>
    where
        T: FromRedisValue + Send,
    {
        let mut conn = self.connection().await?;
        let result: redis::RedisResult<T> = cmd.query_async(&mut conn).await;
        match result {
            Ok(value) => Ok(value),
            Err(err) => {
                self.drop_connection(operation, &err).await;
                Err(anyhow::anyhow!(err).context("redis command failed for session backend"))
            }
        }
    }

    async fn run_pipeline<T>(&self, operation: &'static str, pipe: redis::Pipeline) -> Result<T>
    where
        T: FromRedisValue + Send,
    {
        let mut conn = self.connection().await?;
        let result: redis::RedisResult<T> = pipe.query_async(&mut conn).await;
        match result {
            Ok(value) => Ok(value),
            Err(err) => {
                self.drop_connection(operation, &err).await;
                Err(anyhow::anyhow!(err).context("redis pipeline failed for session backend"))
            }
        }
    }

    pub(crate) async fn append_messages(
        &self,
        session_id: &str,
        messages: &[ChatMessage],
    ) -> Result<()> {
        if messages.is_empty() {
            return Ok(());
        }
        let key = self.messages_key(session_id);
        let encoded: Vec<String> = messages
            .iter()
            .map(serde_json::to_string)
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to encode chat messages for redis")?;

        let mut pipe = redis::pipe();
        pipe.atomic();
        pipe.cmd("RPUSH").arg(&key);
        for payload in &encoded {
            pipe.arg(payload);
        }
        pipe.ignore();
        if let Some(ttl) = self.ttl_secs {
            pipe.cmd("EXPIRE").arg(&key).arg(ttl).ignore();
        }
        self.run_pipeline::<()>("append_messages", pipe).await?;
        tracing::debug!(
            event = SessionEvent::SessionMessagesAppended.as_str(),
            session_id,
            appended_messages = encoded.len(),
            ttl_secs = ?self.ttl_secs,
            "valkey session messages appended"
        );
        Ok(())
    }

    /// Append `messages`, putting `seed` first when the list is empty. Runs as one
    /// script so two first turns cannot both seed. Returns whether `seed` was written.
    pub(crate) async fn append_messages_seeded(
        &self,
        session_id: &str,
        seed: &ChatMessage,
        messages: &[ChatMessage],
    ) -> Result<bool> {
        let key = self.messages_key(session_id);
        let encoded_seed =
            serde_json::to_string(seed).context("failed to encode seed message for redis")?;
        let encoded: Vec<String> = messages
            .iter()
            .map(serde_json::to_string)
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to encode chat messages for redis")?;
        let script = r#"
local key = KEYS[1]
local ttl = tonumber(ARGV[1]) or 0
local seeded = 0
if redis.call("LLEN", key) == 0 then
  redis.call("RPUSH", key, ARGV[2])
  seeded = 1
end
for i = 3, #ARGV do
  redis.call("RPUSH", key, ARGV[i])
end
if ttl > 0 then
  redis.call("EXPIRE", key, ttl)
end
return seeded
"#;
        let mut cmd = redis::cmd("EVAL");
        cmd.arg(script)
            .arg(1)
            .arg(&key)
            .arg(self.ttl_secs.unwrap_or(0))
            .arg(&encoded_seed);
        for payload in &encoded {
            cmd.arg(payload);
        }
        let seeded = self
            .run_command::<i64>("append_messages_seeded", cmd)
            .await?
            == 1;
        tracing::debug!(
            event = SessionEvent::SessionMessagesAppended.as_str(),
            session_id,
            appended_messages = encoded.len() + usize::from(seeded),
            seeded,
            ttl_secs = ?self.ttl_secs,
            "valkey session messages appended"
        );
        Ok(seeded)
    }

    pub(crate) async fn get_messages(&self, session_id: &str) -> Result<Vec<ChatMessage>> {
        let mut cmd = redis::cmd("LRANGE");
        cmd.arg(self.messages_key(session_id)).arg(0).arg(-1);
        let payloads = self.run_command::<Vec<String>>("get_messages", cmd).await?;
        Ok(decode_chat_message_payloads(session_id, payloads))
    }

    pub(crate) async fn get_messages_len(&self, session_id: &str) -> Result<usize> {
        let mut cmd = redis::cmd("LLEN");
        cmd.arg(self.messages_key(session_id));
        self.run_command::<usize>("get_messages_len", cmd).await
    }

    pub(crate) async fn clear_messages(&self, session_id: &str) -> Result<()> {
        let mut cmd = redis::cmd("DEL");
        cmd.arg(self.messages_key(session_id));
        let _ = self.run_command::<i64>("clear_messages", cmd).await?;
        Ok(())
    }
}

/// Decode stored payloads in order; entries that are not a valid message are skipped.
pub(crate) fn decode_chat_message_payloads(
    session_id: &str,
    payloads: Vec<String>,
) -> Vec<ChatMessage> {
    let mut out = Vec::with_capacity(payloads.len());
    for payload in payloads {
        match serde_json::from_str::<ChatMessage>(&payload) {
            Ok(message) => out.push(message),
            Err(error) => {
                tracing::warn!(
                    event = SessionEvent::SessionPayloadInvalid.as_str(),
                    session_id,
                    error = %error,
                    "invalid chat message payload in redis session store"
                );
            }
        }
    }
    out
}
