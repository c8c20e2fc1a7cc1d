pub mod config;
pub mod db;
pub mod error;
pub mod messaging;
pub mod observability;
pub mod routes;
pub mod security;
pub mod server;
pub mod services;

pub use config::{AppConfig, CacheSettings, RedisConfig, ServerConfig, load_config};
pub use error::ApiError;
pub use observability::init_tracing;
pub use server::{AppState, BiletServer, ServerBuilder, build_app};

use std::time::Duration;

use bilet_cache::CacheStore;

/// Create the process-wide cache store from configuration.
///
/// The `redis` backend fails fast when the store is unreachable — a dead
/// cache backend is a deployment error, not something to discover one
/// request at a time. The `memory` backend needs no external service and is
/// the default for single-instance and test deployments.
pub async fn create_cache_store(config: &AppConfig) -> Result<CacheStore, bilet_cache::StoreError> {
    match config.cache.backend {
        config::CacheBackendKind::Memory => {
            tracing::info!("using in-memory cache store");
            Ok(CacheStore::in_memory())
        }
        config::CacheBackendKind::Redis => {
            tracing::info!(url = %config.redis.url, "connecting to redis cache store");
            CacheStore::connect_redis(
                &config.redis.url,
                config.redis.pool_size,
                Duration::from_millis(config.redis.timeout_ms),
            )
            .await
        }
    }
}
