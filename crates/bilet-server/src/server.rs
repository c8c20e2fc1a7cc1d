//! Server assembly and lifecycle.

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::db;
use crate::messaging::NotificationProducer;
use crate::routes;
use crate::services::Services;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    pub cookie_secure: bool,
}

/// Build the complete application router.
pub fn build_app(state: AppState) -> Router {
    routes::api_router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub struct BiletServer {
    config: AppConfig,
    app: Router,
}

#[derive(Default)]
pub struct ServerBuilder {
    config: Option<AppConfig>,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Connect every backing service and assemble the router.
    ///
    /// Order matters: the database and the cache store fail fast here so a
    /// misconfigured deployment dies at startup, not on the first request.
    pub async fn build(self) -> anyhow::Result<BiletServer> {
        let config = self.config.unwrap_or_default();
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("configuration error: {e}"))?;

        let pool = db::create_pool(&config.storage.postgres).await?;
        db::run_migrations(&pool).await?;

        let store = crate::create_cache_store(&config).await?;

        let producer = NotificationProducer::connect(
            &config.redis.url,
            config.messaging.queue_name.clone(),
        )
        .await?;

        let services = Services::new(&config, pool, store, producer)?;

        let state = AppState {
            services,
            cookie_secure: config.auth.cookie_secure,
        };

        Ok(BiletServer {
            app: build_app(state),
            config,
        })
    }
}

impl BiletServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let addr = self.config.addr();
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(%addr, "bilet server listening");

        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("bilet server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to install shutdown handler");
    }
}
