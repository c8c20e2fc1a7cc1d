//! Business logic services.
//!
//! Each service owns its database operations and its caching aspects; the
//! HTTP layer stays thin. Read paths are wrapped in `Cached`, mutating
//! paths in `ClearCache`, with resolvers from [`Authenticator`] folding the
//! authenticated identity into the cache keys.

pub mod auth;
pub mod events;
pub mod ticket_types;
pub mod tickets;
pub mod users;

pub use auth::Authenticator;
pub use events::EventService;
pub use ticket_types::TicketTypeService;
pub use tickets::TicketService;
pub use users::UserService;

use std::sync::Arc;

use bilet_cache::{CacheStore, ConfigError};

use crate::config::AppConfig;
use crate::db::PgPool;
use crate::messaging::NotificationProducer;
use crate::security::JwtKeys;

/// All services, built once at startup.
#[derive(Clone)]
pub struct Services {
    pub users: Arc<UserService>,
    pub events: Arc<EventService>,
    pub ticket_types: Arc<TicketTypeService>,
    pub tickets: Arc<TicketService>,
}

impl Services {
    pub fn new(
        config: &AppConfig,
        pool: PgPool,
        store: CacheStore,
        producer: NotificationProducer,
    ) -> Result<Self, ConfigError> {
        let keys = JwtKeys::new(&config.auth.jwt_secret, config.auth.token_lifetime_minutes);
        let auth = Authenticator::new(keys, pool.clone());
        let ttl = config.cache_ttl();

        Ok(Self {
            users: Arc::new(UserService::new(
                pool.clone(),
                store.clone(),
                auth.clone(),
                producer.clone(),
                ttl,
            )?),
            events: Arc::new(EventService::new(
                pool.clone(),
                store.clone(),
                auth.clone(),
                ttl,
            )?),
            ticket_types: Arc::new(TicketTypeService::new(
                pool.clone(),
                store.clone(),
                auth.clone(),
                ttl,
            )?),
            tickets: Arc::new(TicketService::new(
                pool,
                store,
                auth,
                producer,
                config.auth.ticket_secret.clone(),
                ttl,
            )?),
        })
    }
}
