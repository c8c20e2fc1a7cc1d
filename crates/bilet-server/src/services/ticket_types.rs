//! Ticket type management.
//!
//! Per-event listings are cached, keyed by the event id data template; the
//! token resolver gates access without contributing to the key.

use serde::{Deserialize, Serialize};

use bilet_cache::{
    CacheConfig, CacheStore, Cached, ClearCache, ClearConfig, ConfigError, Ttl,
};
use bilet_core::{CoreError, EventId, TicketTypeId};

use crate::db::ticket_types::{TicketTypePatch, TicketTypeRow};
use crate::db::{self, PgPool, is_unique_violation};
use crate::error::ApiError;

use super::Authenticator;

const CACHE_NAME: &str = "ticket-types";
const CACHE_TAG: &str = "ticket-type-cache";

/// The ticket kinds an event may offer.
pub const TICKET_KINDS: &[&str] = &["Vip", "Standard", "Econom"];

#[derive(Debug, Deserialize)]
pub struct CreateTicketType {
    pub event_id: EventId,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: Option<String>,
    pub price: i64,
    pub total_count: i64,
}

#[derive(Debug, Deserialize, Default)]
pub struct EditTicketType {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub total_count: Option<i64>,
}

pub struct TicketTypeService {
    pool: PgPool,
    auth: Authenticator,
    list_cache: Cached<ApiError>,
    mutate_clear: ClearCache<ApiError>,
}

impl TicketTypeService {
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
                .data("event_id")
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

    fn validate_kind(kind: &str) -> Result<(), ApiError> {
        if TICKET_KINDS.contains(&kind) {
            Ok(())
        } else {
            Err(CoreError::validation(format!(
                "ticket type must be one of {TICKET_KINDS:?}"
            ))
            .into())
        }
    }

    /// Ticket types of one event, cached per event id.
    pub async fn list_for_event(
        &self,
        token: &str,
        event_id: EventId,
    ) -> Result<Vec<TicketTypeRow>, ApiError> {
        #[derive(Serialize)]
        struct Args<'a> {
            auth_token: &'a str,
            event_id: EventId,
        }

        self.list_cache
            .invoke(
                &Args {
                    auth_token: token,
                    event_id,
                },
                || async {
                    self.auth.verify(token)?;
                    Ok(db::ticket_types::list_for_event(&self.pool, event_id).await?)
                },
            )
            .await
    }

    pub async fn create(
        &self,
        token: &str,
        payload: CreateTicketType,
    ) -> Result<TicketTypeRow, ApiError> {
        #[derive(Serialize)]
        struct Args<'a> {
            auth_token: &'a str,
        }

        self.mutate_clear
            .invoke(&Args { auth_token: token }, || async {
                self.auth.require_user(token).await?;
                Self::validate_kind(&payload.kind)?;

                if db::events::find_event(&self.pool, payload.event_id)
                    .await?
                    .is_none()
                {
                    return Err(CoreError::not_found("Event").into());
                }

                match db::ticket_types::insert_ticket_type(
                    &self.pool,
                    payload.event_id,
                    &payload.kind,
                    payload.description.as_deref(),
                    payload.price,
                    payload.total_count,
                )
                .await
                {
                    Ok(row) => Ok(row),
                    Err(e) if is_unique_violation(&e) => Err(CoreError::TicketTypeExists.into()),
                    Err(e) => Err(e.into()),
                }
            })
            .await
    }

    pub async fn edit(
        &self,
        token: &str,
        ticket_type_id: TicketTypeId,
        payload: EditTicketType,
    ) -> Result<TicketTypeRow, ApiError> {
        #[derive(Serialize)]
        struct Args<'a> {
            auth_token: &'a str,
            ticket_type_id: TicketTypeId,
        }

        self.mutate_clear
            .invoke(
                &Args {
                    auth_token: token,
                    ticket_type_id,
                },
                || async {
                    self.auth.verify(token)?;
                    if let Some(ref kind) = payload.kind {
                        Self::validate_kind(kind)?;
                    }

                    let patch = TicketTypePatch {
                        kind: payload.kind,
                        description: payload.description,
                        price: payload.price,
                        total_count: payload.total_count,
                    };
                    db::ticket_types::update_ticket_type(&self.pool, ticket_type_id, &patch)
                        .await?
                        .ok_or_else(|| CoreError::not_found("Ticket type").into())
                },
            )
            .await
    }

    pub async fn delete(&self, token: &str, ticket_type_id: TicketTypeId) -> Result<(), ApiError> {
        #[derive(Serialize)]
        struct Args<'a> {
            auth_token: &'a str,
            ticket_type_id: TicketTypeId,
        }

        self.mutate_clear
            .invoke(
                &Args {
                    auth_token: token,
                    ticket_type_id,
                },
                || async {
                    self.auth.verify(token)?;
                    if !db::ticket_types::delete_ticket_type(&self.pool, ticket_type_id).await? {
                        return Err(CoreError::not_found("Ticket type").into());
                    }
                    Ok(())
                },
            )
            .await
    }
}
