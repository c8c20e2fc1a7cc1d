//! Application configuration.
//!
//! Loaded from a TOML file (default `bilet.toml`, overridable with
//! `BILET_CONFIG`), with environment variables taking precedence for the
//! secrets and connection URLs that differ per deployment. Every section has
//! serde field defaults so a missing file yields a runnable dev config.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use bilet_cache::Ttl;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub messaging: MessagingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        if self.storage.postgres.url.is_empty() {
            return Err("storage.postgres.url must be set (or DATABASE_URL)".into());
        }
        if self.storage.postgres.pool_size == 0 {
            return Err("storage.postgres.pool_size must be > 0".into());
        }
        if self.redis.pool_size == 0 {
            return Err("redis.pool_size must be > 0".into());
        }
        if self.auth.jwt_secret.is_empty() {
            return Err("auth.jwt_secret must not be empty".into());
        }
        if self.auth.token_lifetime_minutes == 0 {
            return Err("auth.token_lifetime_minutes must be > 0".into());
        }
        if self.messaging.queue_name.is_empty() {
            return Err("messaging.queue_name must not be empty".into());
        }
        // -1 is the "never expire" sentinel
        Ttl::from_secs(self.cache.default_ttl_secs)
            .map_err(|e| format!("cache.default_ttl_secs: {e}"))?;

        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }

    /// Entry lifetime for the caching aspects; validated by [`validate`](Self::validate).
    pub fn cache_ttl(&self) -> Ttl {
        Ttl::from_secs(self.cache.default_ttl_secs).unwrap_or(Ttl::Never)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub postgres: PostgresConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresConfig {
    /// Connection URL; `DATABASE_URL` overrides this.
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_pg_pool_size")]
    pub pool_size: u32,
}

fn default_pg_pool_size() -> u32 {
    10
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            pool_size: default_pg_pool_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Connection URL (e.g. "redis://localhost:6379"); `REDIS_URL` overrides.
    #[serde(default = "default_redis_url")]
    pub url: String,
    #[serde(default = "default_redis_pool_size")]
    pub pool_size: usize,
    #[serde(default = "default_redis_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_redis_pool_size() -> usize {
    10
}

fn default_redis_timeout_ms() -> u64 {
    5000
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            pool_size: default_redis_pool_size(),
            timeout_ms: default_redis_timeout_ms(),
        }
    }
}

/// Which store the caching layer runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendKind {
    /// In-process store; no external service required.
    #[default]
    Memory,
    /// Shared redis store; startup fails if it is unreachable.
    Redis,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default)]
    pub backend: CacheBackendKind,
    /// Entry lifetime in seconds; -1 means entries never expire.
    #[serde(default = "default_cache_ttl_secs")]
    pub default_ttl_secs: i64,
}

fn default_cache_ttl_secs() -> i64 {
    300
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            backend: CacheBackendKind::default(),
            default_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 signing secret; `BILET_JWT_SECRET` overrides.
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    #[serde(default = "default_token_lifetime_minutes")]
    pub token_lifetime_minutes: u64,
    /// Set the cookie's Secure attribute (enable behind HTTPS).
    #[serde(default)]
    pub cookie_secure: bool,
    /// HMAC secret for ticket QR codes; `BILET_TICKET_SECRET` overrides.
    #[serde(default = "default_ticket_secret")]
    pub ticket_secret: String,
}

fn default_jwt_secret() -> String {
    // dev-only fallback; deployments override via BILET_JWT_SECRET
    "change-me-in-production".to_string()
}

fn default_token_lifetime_minutes() -> u64 {
    10080 // 7 days
}

fn default_ticket_secret() -> String {
    "change-me-too".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            token_lifetime_minutes: default_token_lifetime_minutes(),
            cookie_secure: false,
            ticket_secret: default_ticket_secret(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagingConfig {
    #[serde(default = "default_queue_name")]
    pub queue_name: String,
}

fn default_queue_name() -> String {
    "notifications".to_string()
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            queue_name: default_queue_name(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Load configuration from an optional TOML file, then apply environment
/// overrides.
pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
    let mut config: AppConfig = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .map_err(|e| format!("failed to read {path}: {e}"))?;
            toml::from_str(&raw).map_err(|e| format!("failed to parse {path}: {e}"))?
        }
        None => AppConfig::default(),
    };

    if let Ok(url) = std::env::var("DATABASE_URL") {
        config.storage.postgres.url = url;
    }
    if let Ok(url) = std::env::var("REDIS_URL") {
        config.redis.url = url;
    }
    if let Ok(secret) = std::env::var("BILET_JWT_SECRET") {
        config.auth.jwt_secret = secret;
    }
    if let Ok(secret) = std::env::var("BILET_TICKET_SECRET") {
        config.auth.ticket_secret = secret;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_runnable_except_database() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_err()); // no database URL

        config.storage.postgres.url = "postgres://localhost/bilet".into();
        config.validate().unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.cache.backend, CacheBackendKind::Memory);
    }

    #[test]
    fn validate_rejects_bad_ttl() {
        let mut config = AppConfig::default();
        config.storage.postgres.url = "postgres://localhost/bilet".into();
        config.cache.default_ttl_secs = -2;
        assert!(config.validate().is_err());

        config.cache.default_ttl_secs = -1;
        config.validate().unwrap();
        assert_eq!(config.cache_ttl(), Ttl::Never);
    }

    #[test]
    fn parses_partial_toml() {
        let config: AppConfig = toml::from_str(
            r#"
            [server]
            port = 9000

            [cache]
            backend = "redis"
            default_ttl_secs = -1
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.cache.backend, CacheBackendKind::Redis);
        assert_eq!(config.cache.default_ttl_secs, -1);
        // untouched sections come from defaults
        assert_eq!(config.redis.pool_size, 10);
    }
}
