//! The read-through/write-through cache aspect.
//!
//! `Cached` wraps an operation the way the route layer's decorators did in
//! earlier revisions of this backend: derive a key from the operation's
//! bound arguments plus resolver output, consult the store, and either
//! return the decoded hit or run the operation and store its result.
//!
//! Wrapped-operation errors pass through untouched. Store trouble is logged
//! and degraded to "no cache this call". Configuration problems fail at
//! build time.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::args;
use crate::bridge;
use crate::error::{BindError, ConfigError};
use crate::key;
use crate::resolve::{self, Resolver};
use crate::store::{CacheStore, Ttl};

/// Immutable per-aspect settings, validated at construction.
pub struct CacheConfig<E> {
    pub(crate) unique_name: String,
    pub(crate) tags: Vec<String>,
    pub(crate) resolvers: Vec<Resolver<E>>,
    pub(crate) data: Vec<Value>,
    pub(crate) ttl: Ttl,
}

impl<E> CacheConfig<E> {
    pub fn builder(unique_name: impl Into<String>) -> CacheConfigBuilder<E> {
        CacheConfigBuilder {
            unique_name: unique_name.into(),
            tags: Vec::new(),
            resolvers: Vec::new(),
            data: Vec::new(),
            ttl: Ttl::Never,
        }
    }
}

impl<E> Clone for CacheConfig<E> {
    fn clone(&self) -> Self {
        Self {
            unique_name: self.unique_name.clone(),
            tags: self.tags.clone(),
            resolvers: self.resolvers.clone(),
            data: self.data.clone(),
            ttl: self.ttl,
        }
    }
}

pub struct CacheConfigBuilder<E> {
    unique_name: String,
    tags: Vec<String>,
    resolvers: Vec<Resolver<E>>,
    data: Vec<Value>,
    ttl: Ttl,
}

impl<E> CacheConfigBuilder<E> {
    /// Add a tag this aspect's entries are indexed under. Without any, the
    /// namespace-wide [`KEY_NAMESPACE`](crate::KEY_NAMESPACE) tag is used.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn resolver(mut self, resolver: Resolver<E>) -> Self {
        self.resolvers.push(resolver);
        self
    }

    /// Add a literal data template. String templates naming a runtime
    /// argument are substituted by that argument's value at call time.
    pub fn data(mut self, template: impl Into<Value>) -> Self {
        self.data.push(template.into());
        self
    }

    pub fn ttl(mut self, ttl: Ttl) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn build(self) -> Result<CacheConfig<E>, ConfigError> {
        if self.unique_name.is_empty() {
            return Err(ConfigError::EmptyUniqueName);
        }
        if self.tags.iter().any(String::is_empty) {
            return Err(ConfigError::EmptyTag);
        }
        self.ttl.validate()?;

        let tags = if self.tags.is_empty() {
            vec![key::KEY_NAMESPACE.to_string()]
        } else {
            self.tags
        };

        Ok(CacheConfig {
            unique_name: self.unique_name,
            tags,
            resolvers: self.resolvers,
            data: self.data,
            ttl: self.ttl,
        })
    }
}

/// Read-through/write-through wrapper around one logical operation.
pub struct Cached<E> {
    store: CacheStore,
    config: CacheConfig<E>,
}

impl<E> Cached<E>
where
    E: From<BindError>,
{
    pub fn new(store: CacheStore, config: CacheConfig<E>) -> Self {
        Self { store, config }
    }

    /// Invoke the wrapped operation through the cache.
    ///
    /// `args` is the operation's full named-argument set; `op` is the
    /// operation body, run only on a miss. Concurrent misses on one key each
    /// run `op` — the last write wins, an accepted trade for lock-free reads.
    pub async fn invoke<A, T, F, Fut>(&self, args: &A, op: F) -> Result<T, E>
    where
        A: Serialize + ?Sized,
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let runtime_args = args::bind(args).map_err(E::from)?;
        let material =
            resolve::build_key_material(&self.config.resolvers, &self.config.data, &runtime_args)
                .await?;
        let key = key::make_key(&self.config.unique_name, &material);

        match self.store.get(&key).await {
            Ok(Some(raw)) => match serde_json::from_str::<T>(&raw) {
                Ok(value) => {
                    tracing::debug!(key = %key, "cache hit");
                    return Ok(value);
                }
                Err(e) => {
                    // corrupted or foreign entry: self-heal and recompute
                    tracing::warn!(key = %key, error = %e, "corrupt cache entry, deleting");
                    if let Err(e) = self.store.delete(&key).await {
                        tracing::warn!(key = %key, error = %e, "failed to delete corrupt entry");
                    }
                }
            },
            Ok(None) => tracing::debug!(key = %key, "cache miss"),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "cache store unavailable, falling through")
            }
        }

        let result = op().await?;

        match serde_json::to_string(&result) {
            Ok(serialized) => {
                if let Err(e) = self
                    .store
                    .set(&key, &serialized, &self.config.tags, self.config.ttl)
                    .await
                {
                    tracing::warn!(key = %key, error = %e, "failed to store cache entry");
                } else {
                    tracing::debug!(key = %key, ttl = ?self.config.ttl, "cache entry stored");
                }
            }
            Err(e) => tracing::warn!(key = %key, error = %e, "result not cacheable"),
        }

        Ok(result)
    }

    /// Synchronous entry point for callers outside any async context.
    ///
    /// Runs the same cache logic on the [`bridge`](crate::bridge); the
    /// caller blocks until the result is ready.
    pub fn invoke_blocking<A, T, F>(&self, args: &A, op: F) -> Result<T, E>
    where
        A: Serialize + Sync + ?Sized,
        T: Serialize + DeserializeOwned + Send,
        F: FnOnce() -> Result<T, E> + Send,
        E: Send,
    {
        bridge::run_blocking(self.invoke(args, || async move { op() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::STORE_TTL_LIMIT;

    #[derive(Debug)]
    struct TestError;

    impl From<BindError> for TestError {
        fn from(_: BindError) -> Self {
            TestError
        }
    }

    #[test]
    fn builder_rejects_empty_name() {
        let result = CacheConfig::<TestError>::builder("").build();
        assert!(matches!(result, Err(ConfigError::EmptyUniqueName)));
    }

    #[test]
    fn builder_rejects_bad_ttl() {
        let result = CacheConfig::<TestError>::builder("x")
            .ttl(Ttl::Seconds(0))
            .build();
        assert!(matches!(result, Err(ConfigError::TtlOutOfRange { .. })));

        let result = CacheConfig::<TestError>::builder("x")
            .ttl(Ttl::Seconds(u32::MAX))
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::TtlOutOfRange { limit, .. }) if limit == STORE_TTL_LIMIT
        ));
    }

    #[test]
    fn builder_defaults_to_namespace_tag() {
        let config = CacheConfig::<TestError>::builder("x").build().unwrap();
        assert_eq!(config.tags, vec![key::KEY_NAMESPACE.to_string()]);

        let config = CacheConfig::<TestError>::builder("x")
            .tag("event-cache")
            .build()
            .unwrap();
        assert_eq!(config.tags, vec!["event-cache".to_string()]);
    }

    #[test]
    fn builder_rejects_empty_tags() {
        let result = CacheConfig::<TestError>::builder("x").tag("").build();
        assert!(matches!(result, Err(ConfigError::EmptyTag)));
    }
}
