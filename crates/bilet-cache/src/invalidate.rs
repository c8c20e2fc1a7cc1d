//! The invalidation aspect.
//!
//! `ClearCache` purges stale entries before running a mutating operation:
//! every configured tag is deleted wholesale, and the key derived from this
//! call's arguments is deleted if present. Purging is fire-and-forget — the
//! wrapped operation always runs and its result is always returned, store
//! health notwithstanding.

use serde::Serialize;
use serde_json::Value;

use crate::args;
use crate::bridge;
use crate::error::{BindError, ConfigError};
use crate::key;
use crate::resolve::{self, Resolver};
use crate::store::CacheStore;

/// Immutable settings for one invalidation aspect.
pub struct ClearConfig<E> {
    pub(crate) unique_name: String,
    pub(crate) tags_delete: Vec<String>,
    pub(crate) resolvers: Vec<Resolver<E>>,
    pub(crate) data: Vec<Value>,
}

impl<E> ClearConfig<E> {
    pub fn builder(unique_name: impl Into<String>) -> ClearConfigBuilder<E> {
        ClearConfigBuilder {
            unique_name: unique_name.into(),
            tags_delete: Vec::new(),
            resolvers: Vec::new(),
            data: Vec::new(),
        }
    }
}

impl<E> Clone for ClearConfig<E> {
    fn clone(&self) -> Self {
        Self {
            unique_name: self.unique_name.clone(),
            tags_delete: self.tags_delete.clone(),
            resolvers: self.resolvers.clone(),
            data: self.data.clone(),
        }
    }
}

pub struct ClearConfigBuilder<E> {
    unique_name: String,
    tags_delete: Vec<String>,
    resolvers: Vec<Resolver<E>>,
    data: Vec<Value>,
}

impl<E> ClearConfigBuilder<E> {
    /// Add a tag whose entire member set is purged on every invocation.
    pub fn delete_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags_delete.push(tag.into());
        self
    }

    pub fn resolver(mut self, resolver: Resolver<E>) -> Self {
        self.resolvers.push(resolver);
        self
    }

    pub fn data(mut self, template: impl Into<Value>) -> Self {
        self.data.push(template.into());
        self
    }

    pub fn build(self) -> Result<ClearConfig<E>, ConfigError> {
        if self.unique_name.is_empty() {
            return Err(ConfigError::EmptyUniqueName);
        }
        if self.tags_delete.iter().any(String::is_empty) {
            return Err(ConfigError::EmptyTag);
        }
        Ok(ClearConfig {
            unique_name: self.unique_name,
            tags_delete: self.tags_delete,
            resolvers: self.resolvers,
            data: self.data,
        })
    }
}

/// Invalidating wrapper around one mutating operation.
pub struct ClearCache<E> {
    store: CacheStore,
    config: ClearConfig<E>,
}

impl<E> ClearCache<E>
where
    E: From<BindError>,
{
    pub fn new(store: CacheStore, config: ClearConfig<E>) -> Self {
        Self { store, config }
    }

    /// Purge configured tags and this call's derived key, then run the
    /// wrapped operation. Binding and resolver errors propagate; store
    /// errors are logged and swallowed.
    pub async fn invoke<A, T, F, Fut>(&self, args: &A, op: F) -> Result<T, E>
    where
        A: Serialize + ?Sized,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let runtime_args = args::bind(args).map_err(E::from)?;
        let material =
            resolve::build_key_material(&self.config.resolvers, &self.config.data, &runtime_args)
                .await?;
        let key = key::make_key(&self.config.unique_name, &material);

        if !self.config.tags_delete.is_empty() {
            match self.store.delete_tags(&self.config.tags_delete).await {
                Ok(()) => {
                    tracing::debug!(tags = ?self.config.tags_delete, "cache tags purged")
                }
                Err(e) => tracing::warn!(error = %e, "failed to purge cache tags"),
            }
        }

        match self.store.get(&key).await {
            Ok(Some(_)) => {
                if let Err(e) = self.store.delete(&key).await {
                    tracing::warn!(key = %key, error = %e, "failed to delete cache key");
                } else {
                    tracing::debug!(key = %key, "cache key purged");
                }
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "cache store unavailable, skipping key purge")
            }
        }

        op().await
    }

    /// Synchronous entry point, mirroring [`Cached::invoke_blocking`](crate::Cached::invoke_blocking).
    pub fn invoke_blocking<A, T, F>(&self, args: &A, op: F) -> Result<T, E>
    where
        A: Serialize + Sync + ?Sized,
        T: Send,
        F: FnOnce() -> Result<T, E> + Send,
        E: Send,
    {
        bridge::run_blocking(self.invoke(args, || async move { op() }))
    }
}
