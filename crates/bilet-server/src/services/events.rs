//! Event management.
//!
//! The event list is read-heavy and cached under the `event-cache` tag;
//! every mutation purges that tag so the next list call sees fresh data.

use serde::{Deserialize, Serialize};

use bilet_cache::{
    CacheConfig, CacheStore, Cached, ClearCache, ClearConfig, ConfigError, Ttl,
};
use bilet_core::{CoreError, EventId, EventStatus};

use crate::db::events::{EventPatch, EventRow};
use crate::db::{self, PgPool};
use crate::error::ApiError;

use super::Authenticator;

const CACHE_NAME: &str = "event-cache";
const CACHE_TAG: &str = "event-cache";

#[derive(Debug, Deserialize)]
pub struct CreateEvent {
    pub status: EventStatus,
    pub category: String,
    pub title: String,
    pub description: String,
    pub address: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct EditEvent {
    pub status: Option<EventStatus>,
    pub category: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
}

pub struct EventService {
    pool: PgPool,
    auth: Authenticator,
    list_cache: Cached<ApiError>,
    mutate_clear: ClearCache<ApiError>,
}

impl EventService {
    pub fn new(
        pool: PgPool,
        store: CacheStore,
        auth: Authenticator,
        ttl: Ttl,
    ) -> Result<Self, ConfigError> {
        let list_cache = Cached::new(
            store.clone(),
            CacheConfig::builder(CACHE_NAME)
                .tag(CACHE_TAG)
                .resolver(auth.token_check_resolver("auth_token"))
                .ttl(ttl)
                .build()?,
        );

        let mutate_clear = ClearCache::new(
            store,
            ClearConfig::builder(CACHE_NAME)
                .delete_tag(CACHE_TAG)
                .build()?,
        );

        Ok(Self {
            pool,
            auth,
            list_cache,
            mutate_clear,
        })
    }

    /// Every event, cached. One entry serves all authenticated users.
    pub async fn list(&self, token: &str) -> Result<Vec<EventRow>, ApiError> {
        #[derive(Serialize)]
        struct Args<'a> {
            auth_token: &'a str,
        }

        self.list_cache
            .invoke(&Args { auth_token: token }, || async {
                self.auth.verify(token)?;
                Ok(db::events::list_events(&self.pool).await?)
            })
            .await
    }

    pub async fn create(&self, token: &str, payload: CreateEvent) -> Result<EventRow, ApiError> {
        #[derive(Serialize)]
        struct Args<'a> {
            auth_token: &'a str,
        }

        self.mutate_clear
            .invoke(&Args { auth_token: token }, || async {
                let creator_id = self.auth.require_user(token).await?;
                Ok(db::events::insert_event(
                    &self.pool,
                    creator_id,
                    payload.status.as_str(),
                    &payload.category,
                    &payload.title,
                    &payload.description,
                    &payload.address,
                )
                .await?)
            })
            .await
    }

    pub async fn edit(
        &self,
        token: &str,
        event_id: EventId,
        payload: EditEvent,
    ) -> Result<EventRow, ApiError> {
        #[derive(Serialize)]
        struct Args<'a> {
            auth_token: &'a str,
            event_id: EventId,
        }

        self.mutate_clear
            .invoke(
                &Args {
                    auth_token: token,
                    event_id,
                },
                || async {
                    self.auth.verify(token)?;
                    let patch = EventPatch {
                        status: payload.status.map(|s| s.as_str().to_string()),
                        category: payload.category,
                        title: payload.title,
                        description: payload.description,
                        address: payload.address,
                    };
                    db::events::update_event(&self.pool, event_id, &patch)
                        .await?
                        .ok_or_else(|| CoreError::not_found("Event").into())
                },
            )
            .await
    }

    pub async fn delete(&self, token: &str, event_id: EventId) -> Result<(), ApiError> {
        #[derive(Serialize)]
        struct Args<'a> {
            auth_token: &'a str,
            event_id: EventId,
        }

        self.mutate_clear
            .invoke(
                &Args {
                    auth_token: token,
                    event_id,
                },
                || async {
                    self.auth.verify(token)?;
                    if !db::events::delete_event(&self.pool, event_id).await? {
                        return Err(CoreError::not_found("Event").into());
                    }
                    Ok(())
                },
            )
            .await
    }
}
