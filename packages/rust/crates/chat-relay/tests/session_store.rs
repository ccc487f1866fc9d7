#![allow(missing_docs)]

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::Result;
use chat_relay::{ChatMessage, Relay, RelayConfig, SessionConfig, SessionStore};

fn live_redis_url() -> Option<String> {
    if let Ok(url) = std::env::var("VALKEY_URL")
        && !url.trim().is_empty()
    {
        return Some(url);
    }
    None
}

fn unique_prefix() -> Result<String> {
    let suffix = SystemTime::now().duration_since(UNIX_EPOCH)?.as_micros();
    Ok(format!("chat-relay:test:session:{suffix}"))
}

async fn key_ttl(redis_url: &str, key: &str) -> Result<i64> {
    let client = redis::Client::open(redis_url)?;
    let mut conn = client.get_multiplexed_async_connection().await?;
    let ttl: i64 = redis::cmd("TTL").arg(key).query_async(&mut conn).await?;
    Ok(ttl)
}

async fn set_key_expiry(redis_url: &str, key: &str, secs: u64) -> Result<()> {
    let client = redis::Client::open(redis_url)?;
    let mut conn = client.get_multiplexed_async_connection().await?;
    let _: i64 = redis::cmd("EXPIRE")
        .arg(key)
        .arg(secs)
        .query_async(&mut conn)
        .await?;
    Ok(())
}

#[tokio::test]
async fn memory_store_appends_in_order_and_clears() -> Result<()> {
    let store = SessionStore::in_memory();
    assert_eq!(store.backend_name(), "memory");
    store.append("s1", vec![ChatMessage::user("hi")]).await?;
    store
        .append("s1", vec![ChatMessage::assistant("hello")])
        .await?;
    store.append("s1", Vec::new()).await?;

    assert_eq!(
        store.get("s1").await?,
        vec![ChatMessage::user("hi"), ChatMessage::assistant("hello")]
    );
    assert_eq!(store.len("s1").await?, 2);
    assert!(store.get("other").await?.is_empty());

    store.clear("s1").await?;
    assert_eq!(store.len("s1").await?, 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn memory_store_expires_sessions_after_last_append() -> Result<()> {
    let store = SessionStore::in_memory_with_ttl(Some(60));
    store.append("s1", vec![ChatMessage::user("hi")]).await?;

    tokio::time::advance(Duration::from_secs(40)).await;
    store
        .append("s1", vec![ChatMessage::assistant("hello")])
        .await?;

    // Past the first deadline, but the second append refreshed it.
    tokio::time::advance(Duration::from_secs(40)).await;
    assert_eq!(store.len("s1").await?, 2);

    tokio::time::advance(Duration::from_secs(21)).await;
    assert!(store.get("s1").await?.is_empty());
    assert_eq!(store.len("s1").await?, 0);

    // An append after expiry starts a fresh session.
    store.append("s1", vec![ChatMessage::user("again")]).await?;
    assert_eq!(store.get("s1").await?, vec![ChatMessage::user("again")]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn memory_store_without_ttl_keeps_sessions() -> Result<()> {
    for store in [
        SessionStore::in_memory_with_ttl(None),
        SessionStore::in_memory_with_ttl(Some(0)),
    ] {
        store.append("s1", vec![ChatMessage::user("hi")]).await?;
        tokio::time::advance(Duration::from_secs(365 * 24 * 60 * 60)).await;
        assert_eq!(store.len("s1").await?, 1);
    }
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn memory_store_default_ttl_is_one_day() -> Result<()> {
    let store = SessionStore::in_memory();
    store.append("s1", vec![ChatMessage::user("hi")]).await?;
    tokio::time::advance(Duration::from_secs(24 * 60 * 60 - 1)).await;
    assert_eq!(store.len("s1").await?, 1);
    tokio::time::advance(Duration::from_secs(1)).await;
    assert_eq!(store.len("s1").await?, 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn relay_memory_store_uses_configured_ttl() -> Result<()> {
    let config = RelayConfig {
        session: SessionConfig {
            valkey_url: None,
            ttl_secs: Some(30),
            ..SessionConfig::default()
        },
        ..RelayConfig::default()
    };
    let relay = Relay::from_config(&config)?;
    assert_eq!(relay.store().backend_name(), "memory");
    relay
        .store()
        .append("s1", vec![ChatMessage::user("hi")])
        .await?;
    tokio::time::advance(Duration::from_secs(30)).await;
    assert!(relay.history("s1").await?.is_empty());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn append_seeded_writes_seed_once_under_concurrency() -> Result<()> {
    let store = Arc::new(SessionStore::in_memory());
    let mut tasks = Vec::new();
    for i in 0..16 {
        let store = Arc::clone(&store);
        tasks.push(tokio::spawn(async move {
            store
                .append_seeded(
                    "s1",
                    ChatMessage::system("seed"),
                    vec![ChatMessage::user(format!("m{i}"))],
                )
                .await
        }));
    }
    let mut seeded = 0;
    for task in tasks {
        if task.await?? {
            seeded += 1;
        }
    }
    assert_eq!(seeded, 1);

    let messages = store.get("s1").await?;
    assert_eq!(messages.len(), 17);
    assert_eq!(messages[0], ChatMessage::system("seed"));
    assert_eq!(
        messages.iter().filter(|m| m.role == "system").count(),
        1
    );

    assert!(
        !store
            .append_seeded("s1", ChatMessage::system("seed"), Vec::new())
            .await?
    );
    assert_eq!(store.len("s1").await?, 17);
    Ok(())
}

#[tokio::test]
async fn store_with_unreachable_valkey_fails_on_use_not_on_construction() -> Result<()> {
    let store = SessionStore::new_with_redis("redis://127.0.0.1:1/0", None, Some(60))?;
    assert_eq!(store.backend_name(), "valkey");
    let err = store
        .append("s1", vec![ChatMessage::user("hi")])
        .await
        .expect_err("no server listening on port 1");
    assert!(err.to_string().contains("session_id=s1"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_calls_on_unreachable_valkey_all_fail() -> Result<()> {
    let store = Arc::new(SessionStore::new_with_redis(
        "redis://127.0.0.1:1/0",
        None,
        Some(60),
    )?);
    let mut tasks = Vec::new();
    for i in 0..8 {
        let store = Arc::clone(&store);
        tasks.push(tokio::spawn(async move {
            store.get(&format!("s{i}")).await
        }));
    }
    for task in tasks {
        assert!(task.await?.is_err());
    }
    Ok(())
}

#[tokio::test]
#[ignore = "requires live valkey server"]
async fn redis_session_store_roundtrip_across_instances() -> Result<()> {
    let Some(redis_url) = live_redis_url() else {
        eprintln!("skip: set VALKEY_URL");
        return Ok(());
    };
    let prefix = unique_prefix()?;
    let session_id = "s-live-roundtrip";

    let store_a = SessionStore::new_with_redis(&redis_url, Some(prefix.clone()), Some(120))?;
    store_a
        .append(
            session_id,
            vec![ChatMessage::user("hello"), ChatMessage::assistant("world")],
        )
        .await?;

    let key = format!("{prefix}:messages:{session_id}");
    let ttl = key_ttl(&redis_url, &key).await?;
    assert!(ttl > 0 && ttl <= 120, "ttl after append: {ttl}");

    // A later append pushes the expiry back out.
    set_key_expiry(&redis_url, &key, 5).await?;
    store_a
        .append(session_id, vec![ChatMessage::user("again")])
        .await?;
    let ttl = key_ttl(&redis_url, &key).await?;
    assert!(ttl > 5 && ttl <= 120, "ttl after refresh: {ttl}");

    let store_b = SessionStore::new_with_redis(&redis_url, Some(prefix), Some(120))?;
    let messages = store_b.get(session_id).await?;
    assert_eq!(
        messages,
        vec![
            ChatMessage::user("hello"),
            ChatMessage::assistant("world"),
            ChatMessage::user("again"),
        ]
    );
    assert_eq!(store_b.len(session_id).await?, 3);
    store_b.clear(session_id).await?;
    assert!(store_a.get(session_id).await?.is_empty());
    Ok(())
}

#[tokio::test]
#[ignore = "requires live valkey server"]
async fn redis_session_store_without_ttl_leaves_key_persistent() -> Result<()> {
    let Some(redis_url) = live_redis_url() else {
        eprintln!("skip: set VALKEY_URL");
        return Ok(());
    };
    let prefix = unique_prefix()?;
    let session_id = "s-live-no-ttl";
    let store = SessionStore::new_with_redis(&redis_url, Some(prefix.clone()), Some(0))?;
    store
        .append(session_id, vec![ChatMessage::user("hello")])
        .await?;

    let key = format!("{prefix}:messages:{session_id}");
    assert_eq!(key_ttl(&redis_url, &key).await?, -1);
    store.clear(session_id).await?;
    Ok(())
}

#[tokio::test]
#[ignore = "requires live valkey server"]
async fn redis_append_seeded_seeds_only_empty_sessions() -> Result<()> {
    let Some(redis_url) = live_redis_url() else {
        eprintln!("skip: set VALKEY_URL");
        return Ok(());
    };
    let prefix = unique_prefix()?;
    let session_id = "s-live-seeded";
    let store = SessionStore::new_with_redis(&redis_url, Some(prefix.clone()), Some(120))?;

    let first = store
        .append_seeded(session_id, ChatMessage::system("seed"), vec![ChatMessage::user("a")])
        .await?;
    let second = store
        .append_seeded(session_id, ChatMessage::system("seed"), vec![ChatMessage::user("b")])
        .await?;
    assert!(first);
    assert!(!second);
    assert_eq!(
        store.get(session_id).await?,
        vec![
            ChatMessage::system("seed"),
            ChatMessage::user("a"),
            ChatMessage::user("b"),
        ]
    );
    let ttl = key_ttl(&redis_url, &format!("{prefix}:messages:{session_id}")).await?;
    assert!(ttl > 0 && ttl <= 120, "ttl after seeded append: {ttl}");
    store.clear(session_id).await?;
    Ok(())
}
