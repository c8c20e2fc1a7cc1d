//! Cache store backends.
//!
//! [`CacheStore`] is a cheap-to-clone handle over one shared backend,
//! constructed once at the composition root and injected into every aspect.
//!
//! Two backends exist:
//!
//! - [`RedisStore`] — deadpool-redis pool; construction fails fast when the
//!   backend is unreachable, every later operation degrades into
//!   [`StoreError::Unavailable`] instead of raising.
//! - [`MemoryStore`] — in-process dashmap store with TTL expiry and a tag
//!   index, for single-instance deployments and tests.
//!
//! Values are opaque strings (canonical JSON written by the aspects). Tags
//! are member sets of key names under `bilet:tag:<tag>`; deleting a tag
//! deletes its members and then the set itself.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use deadpool_redis::Pool;
use redis::AsyncCommands;

use crate::error::{ConfigError, StoreError};
use crate::key::tag_key;

/// Largest finite TTL the store accepts, in seconds (the backend stores
/// expiries as a signed 32-bit integer).
pub const STORE_TTL_LIMIT: i64 = 2_147_483_647;

/// Entry lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// The entry never expires; it leaves the store only via invalidation.
    Never,
    /// Expire after this many seconds (1..=[`STORE_TTL_LIMIT`]).
    Seconds(u32),
}

impl Ttl {
    /// Parse the wire sentinel form: `-1` means never, positive values are
    /// seconds.
    pub fn from_secs(secs: i64) -> Result<Self, ConfigError> {
        match secs {
            -1 => Ok(Self::Never),
            s if (1..=STORE_TTL_LIMIT).contains(&s) => Ok(Self::Seconds(s as u32)),
            other => Err(ConfigError::TtlOutOfRange {
                got: other,
                limit: STORE_TTL_LIMIT,
            }),
        }
    }

    pub(crate) fn validate(self) -> Result<(), ConfigError> {
        match self {
            Self::Never => Ok(()),
            Self::Seconds(secs) if secs >= 1 && (secs as i64) <= STORE_TTL_LIMIT => Ok(()),
            Self::Seconds(secs) => Err(ConfigError::TtlOutOfRange {
                got: secs as i64,
                limit: STORE_TTL_LIMIT,
            }),
        }
    }
}

/// Storage contract consumed by the aspects.
///
/// Implementations surface connectivity problems as
/// [`StoreError::Unavailable`]; absence of a key is `Ok(None)`, never an
/// error.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(
        &self,
        key: &str,
        value: &str,
        tags: &[String],
        ttl: Ttl,
    ) -> Result<(), StoreError>;

    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Delete every member key of each tag, then the tag record itself.
    /// Unknown or empty tags are a no-op.
    async fn delete_tags(&self, tags: &[String]) -> Result<(), StoreError>;

    /// Number of keys currently indexed under a tag.
    async fn tag_size(&self, tag: &str) -> Result<u64, StoreError>;
}

/// Shared handle over one store backend.
#[derive(Clone)]
pub struct CacheStore {
    backend: Arc<dyn StoreBackend>,
}

impl CacheStore {
    /// Wrap an already-constructed backend (used by tests to inject fakes).
    pub fn from_backend(backend: Arc<dyn StoreBackend>) -> Self {
        Self { backend }
    }

    /// In-process store with no external dependencies.
    pub fn in_memory() -> Self {
        Self::from_backend(Arc::new(MemoryStore::new()))
    }

    /// Connect to Redis, failing fast when the backend is unreachable.
    pub async fn connect_redis(
        url: &str,
        pool_size: usize,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let store = RedisStore::connect(url, pool_size, timeout).await?;
        Ok(Self::from_backend(Arc::new(store)))
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.backend.get(key).await
    }

    pub async fn set(
        &self,
        key: &str,
        value: &str,
        tags: &[String],
        ttl: Ttl,
    ) -> Result<(), StoreError> {
        self.backend.set(key, value, tags, ttl).await
    }

    pub async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.backend.delete(key).await
    }

    pub async fn delete_tags(&self, tags: &[String]) -> Result<(), StoreError> {
        self.backend.delete_tags(tags).await
    }

    pub async fn tag_size(&self, tag: &str) -> Result<u64, StoreError> {
        self.backend.tag_size(tag).await
    }
}

// ============================================================================
// Redis backend
// ============================================================================

/// Redis-backed store over a deadpool connection pool.
pub struct RedisStore {
    pool: Pool,
}

impl RedisStore {
    /// Build the pool and check out one connection to prove the backend is
    /// reachable. A dead backend fails startup here, not on first request.
    pub async fn connect(
        url: &str,
        pool_size: usize,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let mut config = deadpool_redis::Config::from_url(url);
        let mut pool_config = config.pool.take().unwrap_or_default();
        pool_config.max_size = pool_size;
        pool_config.timeouts.wait = Some(timeout);
        pool_config.timeouts.create = Some(timeout);
        pool_config.timeouts.recycle = Some(timeout);
        config.pool = Some(pool_config);

        let pool = config
            .create_pool(Some(deadpool_redis::Runtime::Tokio1))
            .map_err(StoreError::unavailable)?;

        pool.get().await.map_err(StoreError::unavailable)?;
        tracing::info!(url = %url, "connected to cache store");

        Ok(Self { pool })
    }

    async fn conn(&self) -> Result<deadpool_redis::Connection, StoreError> {
        self.pool.get().await.map_err(StoreError::unavailable)
    }
}

#[async_trait]
impl StoreBackend for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn().await?;
        conn.get::<_, Option<String>>(key)
            .await
            .map_err(StoreError::unavailable)
    }

    async fn set(
        &self,
        key: &str,
        value: &str,
        tags: &[String],
        ttl: Ttl,
    ) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;

        match ttl {
            Ttl::Seconds(secs) => conn
                .set_ex::<_, _, ()>(key, value, secs as u64)
                .await
                .map_err(StoreError::unavailable)?,
            Ttl::Never => conn
                .set::<_, _, ()>(key, value)
                .await
                .map_err(StoreError::unavailable)?,
        }

        for tag in tags {
            conn.sadd::<_, _, ()>(tag_key(tag), key)
                .await
                .map_err(StoreError::unavailable)?;
        }

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        conn.del::<_, ()>(key)
            .await
            .map_err(StoreError::unavailable)
    }

    async fn delete_tags(&self, tags: &[String]) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;

        for tag in tags {
            let index = tag_key(tag);
            let members: Vec<String> = conn
                .smembers(&index)
                .await
                .map_err(StoreError::unavailable)?;

            if !members.is_empty() {
                conn.del::<_, ()>(members)
                    .await
                    .map_err(StoreError::unavailable)?;
            }

            conn.del::<_, ()>(&index)
                .await
                .map_err(StoreError::unavailable)?;
        }

        Ok(())
    }

    async fn tag_size(&self, tag: &str) -> Result<u64, StoreError> {
        let mut conn = self.conn().await?;
        conn.scard::<_, u64>(tag_key(tag))
            .await
            .map_err(StoreError::unavailable)
    }
}

// ============================================================================
// In-memory backend
// ============================================================================

struct MemoryEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl MemoryEntry {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// In-process store: a value map with lazy TTL expiry plus a tag index.
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, MemoryEntry>,
    tags: DashMap<String, HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StoreBackend for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired() {
                return Ok(Some(entry.value.clone()));
            }
            drop(entry);
            self.entries.remove(key);
        }
        Ok(None)
    }

    async fn set(
        &self,
        key: &str,
        value: &str,
        tags: &[String],
        ttl: Ttl,
    ) -> Result<(), StoreError> {
        let expires_at = match ttl {
            Ttl::Never => None,
            Ttl::Seconds(secs) => Some(Instant::now() + Duration::from_secs(secs as u64)),
        };

        self.entries.insert(
            key.to_string(),
            MemoryEntry {
                value: value.to_string(),
                expires_at,
            },
        );

        for tag in tags {
            self.tags
                .entry(tag.clone())
                .or_default()
                .insert(key.to_string());
        }

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }

    async fn delete_tags(&self, tags: &[String]) -> Result<(), StoreError> {
        for tag in tags {
            if let Some((_, members)) = self.tags.remove(tag) {
                for member in members {
                    self.entries.remove(&member);
                }
            }
        }
        Ok(())
    }

    async fn tag_size(&self, tag: &str) -> Result<u64, StoreError> {
        Ok(self.tags.get(tag).map(|s| s.len() as u64).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_sentinel_parsing() {
        assert_eq!(Ttl::from_secs(-1).unwrap(), Ttl::Never);
        assert_eq!(Ttl::from_secs(60).unwrap(), Ttl::Seconds(60));
        assert!(Ttl::from_secs(0).is_err());
        assert!(Ttl::from_secs(-2).is_err());
        assert!(Ttl::from_secs(STORE_TTL_LIMIT + 1).is_err());
    }

    #[tokio::test]
    async fn memory_get_set_delete() {
        let store = CacheStore::in_memory();

        store
            .set("k1", "\"value\"", &["t".to_string()], Ttl::Never)
            .await
            .unwrap();
        assert_eq!(store.get("k1").await.unwrap(), Some("\"value\"".to_string()));

        store.delete("k1").await.unwrap();
        assert_eq!(store.get("k1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn memory_entries_expire() {
        let store = MemoryStore::new();
        store
            .set("short", "1", &[], Ttl::Seconds(1))
            .await
            .unwrap();

        // simulate the clock running past the deadline
        store.entries.get_mut("short").unwrap().expires_at =
            Some(Instant::now() - Duration::from_secs(1));

        assert_eq!(store.get("short").await.unwrap(), None);
        // expired entry was dropped, not just hidden
        assert!(!store.entries.contains_key("short"));
    }

    #[tokio::test]
    async fn tag_deletion_purges_members_and_record() {
        let store = CacheStore::in_memory();
        let tags = vec!["event-cache".to_string()];

        store.set("a", "1", &tags, Ttl::Never).await.unwrap();
        store.set("b", "2", &tags, Ttl::Never).await.unwrap();
        store.set("c", "3", &[], Ttl::Never).await.unwrap();
        assert_eq!(store.tag_size("event-cache").await.unwrap(), 2);

        store.delete_tags(&tags).await.unwrap();

        assert_eq!(store.get("a").await.unwrap(), None);
        assert_eq!(store.get("b").await.unwrap(), None);
        // untagged entries survive
        assert_eq!(store.get("c").await.unwrap(), Some("3".to_string()));
        assert_eq!(store.tag_size("event-cache").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn deleting_unknown_tags_is_a_noop() {
        let store = CacheStore::in_memory();
        store
            .delete_tags(&["missing".to_string()])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn one_entry_under_many_tags() {
        let store = CacheStore::in_memory();
        let tags = vec!["a".to_string(), "b".to_string()];
        store.set("k", "1", &tags, Ttl::Never).await.unwrap();

        store.delete_tags(&["a".to_string()]).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
        // second tag still indexes the (now deleted) key; deleting it is harmless
        store.delete_tags(&["b".to_string()]).await.unwrap();
    }
}
