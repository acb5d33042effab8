use crate::models::SessionSnapshot;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur with session storage
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Per-session conversation state between turns
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// `None` for a fresh or expired session
    async fn load(&self, session_id: &str) -> Result<Option<SessionSnapshot>, SessionError>;

    async fn save(&self, session_id: &str, snapshot: &SessionSnapshot) -> Result<(), SessionError>;

    async fn discard(&self, session_id: &str) -> Result<(), SessionError>;
}

/// Cache key builder
pub struct SessionKey;

impl SessionKey {
    pub fn session(session_id: &str) -> String {
        format!("session:{}", urlencoding::encode(session_id))
    }
}

/// Two-tier session cache
///
/// L1 is an in-process moka cache, L2 is Redis shared across instances.
/// Both tiers expire entries after the configured TTL.
pub struct SessionCache {
    redis: Arc<tokio::sync::Mutex<ConnectionManager>>,
    l1_cache: moka::future::Cache<String, Vec<u8>>,
    ttl_secs: u64,
}

impl SessionCache {
    pub async fn new(redis_url: &str, l1_size: u64, ttl_secs: u64) -> Result<Self, SessionError> {
        let client = redis::Client::open(redis_url)?;
        let redis = ConnectionManager::new(client).await?;

        let l1_cache = moka::future::CacheBuilder::new(l1_size)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Ok(Self {
            redis: Arc::new(tokio::sync::Mutex::new(redis)),
            l1_cache,
            ttl_secs,
        })
    }

    /// Round-trip a PING to Redis
    pub async fn ping(&self) -> Result<(), SessionError> {
        let mut conn = self.redis.lock().await;
        let _: String = redis::cmd("PING").query_async(&mut *conn).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for SessionCache {
    async fn load(&self, session_id: &str) -> Result<Option<SessionSnapshot>, SessionError> {
        let key = SessionKey::session(session_id);

        if let Some(bytes) = self.l1_cache.get(&key).await {
            tracing::trace!("L1 session hit: {}", key);
            return Ok(Some(serde_json::from_slice(&bytes)?));
        }

        let mut conn = self.redis.lock().await;
        let value: Option<String> = redis::cmd("GET").arg(&key).query_async(&mut *conn).await?;
        drop(conn);

        match value {
            Some(json) => {
                tracing::trace!("L2 session hit: {}", key);
                self.l1_cache.insert(key, json.as_bytes().to_vec()).await;
                Ok(Some(serde_json::from_str(&json)?))
            }
            None => {
                tracing::trace!("Session miss: {}", key);
                Ok(None)
            }
        }
    }

    async fn save(&self, session_id: &str, snapshot: &SessionSnapshot) -> Result<(), SessionError> {
        let key = SessionKey::session(session_id);
        let json = serde_json::to_string(snapshot)?;

        self.l1_cache.insert(key.clone(), json.as_bytes().to_vec()).await;

        let mut conn = self.redis.lock().await;
        let _: () = redis::cmd("SETEX")
            .arg(&key)
            .arg(self.ttl_secs)
            .arg(json)
            .query_async(&mut *conn)
            .await?;
        drop(conn);

        tracing::trace!("Session saved: {}", key);
        Ok(())
    }

    async fn discard(&self, session_id: &str) -> Result<(), SessionError> {
        let key = SessionKey::session(session_id);
        self.l1_cache.invalidate(&key).await;

        let mut conn = self.redis.lock().await;
        let _: () = redis::cmd("DEL").arg(&key).query_async(&mut *conn).await?;
        Ok(())
    }
}

/// Session store kept only in process memory, used when Redis is unreachable
#[derive(Clone)]
pub struct InMemorySessionStore {
    sessions: moka::future::Cache<String, SessionSnapshot>,
}

impl InMemorySessionStore {
    pub fn new(capacity: u64, ttl_secs: u64) -> Self {
        Self {
            sessions: moka::future::CacheBuilder::new(capacity)
                .time_to_live(Duration::from_secs(ttl_secs))
                .build(),
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(10_000, 3600)
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, session_id: &str) -> Result<Option<SessionSnapshot>, SessionError> {
        Ok(self.sessions.get(&SessionKey::session(session_id)).await)
    }

    async fn save(&self, session_id: &str, snapshot: &SessionSnapshot) -> Result<(), SessionError> {
        self.sessions
            .insert(SessionKey::session(session_id), snapshot.clone())
            .await;
        Ok(())
    }

    async fn discard(&self, session_id: &str) -> Result<(), SessionError> {
        self.sessions.invalidate(&SessionKey::session(session_id)).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConversationState, PreferenceRecord};

    fn snapshot() -> SessionSnapshot {
        SessionSnapshot {
            state: ConversationState::ReadyToMatch,
            record: PreferenceRecord {
                service_type: Some("nails".to_string()),
                ..Default::default()
            },
            turns: 2,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_in_memory_round_trip() {
        let store = InMemorySessionStore::default();
        assert!(store.load("abc").await.unwrap().is_none());

        let saved = snapshot();
        store.save("abc", &saved).await.unwrap();
        assert_eq!(store.load("abc").await.unwrap(), Some(saved));

        store.discard("abc").await.unwrap();
        assert!(store.load("abc").await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore = "Requires Redis"]
    async fn test_session_cache_round_trip() {
        let cache = SessionCache::new("redis://127.0.0.1:6379", 1000, 60)
            .await
            .expect("Failed to create cache");

        let saved = snapshot();
        cache.save("redis-test", &saved).await.unwrap();
        assert_eq!(cache.load("redis-test").await.unwrap(), Some(saved));

        cache.discard("redis-test").await.unwrap();
        assert!(cache.load("redis-test").await.unwrap().is_none());
    }

    #[test]
    fn test_session_key_is_escaped() {
        assert_eq!(SessionKey::session("user 1"), "session:user%201");
        assert_eq!(SessionKey::session("abc"), "session:abc");
    }
}
