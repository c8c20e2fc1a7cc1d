//! Ticket purchase, deletion, QR activation, and the per-user ticket list.
//!
//! Purchases and activations enqueue email notifications. The "my tickets"
//! listing is cached per resolved user id via the Writer resolver, so two
//! users with identical request shapes still get distinct cache entries.

use serde::{Deserialize, Serialize};

use bilet_cache::{
    CacheConfig, CacheStore, Cached, ClearCache, ClearConfig, ConfigError, Ttl,
};
use bilet_core::{CoreError, EmailNotification, EventId, QueueMessage, TicketId, TicketTypeId};

use crate::db::tickets::{TicketRow, UserTicketRow};
use crate::db::{self, PgPool};
use crate::error::ApiError;
use crate::messaging::NotificationProducer;
use crate::security::generate_ticket_code;

use super::Authenticator;

const CACHE_NAME: &str = "user-tickets";
const CACHE_TAG: &str = "ticket-cache";

#[derive(Debug, Deserialize)]
pub struct CreateTicket {
    pub event_id: EventId,
    pub ticket_type_id: TicketTypeId,
}

#[derive(Debug, Deserialize)]
pub struct ActivateQr {
    pub code: String,
}

pub struct TicketService {
    pool: PgPool,
    auth: Authenticator,
    producer: NotificationProducer,
    ticket_secret: String,
    my_tickets_cache: Cached<ApiError>,
    mutate_clear: ClearCache<ApiError>,
}

impl TicketService {
    pub fn new(
        pool: PgPool,
        store: CacheStore,
        auth: Authenticator,
        producer: NotificationProducer,
        ticket_secret: String,
        ttl: Ttl,
    ) -> Result<Self, ConfigError> {
        let my_tickets_cache = Cached::new(
            store.clone(),
            CacheConfig::builder(CACHE_NAME)
                .tag(CACHE_TAG)
                .resolver(auth.user_key_resolver("auth_token"))
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
            producer,
            ticket_secret,
            my_tickets_cache,
            mutate_clear,
        })
    }

    /// Buy a ticket: mint the QR code, store the row, email the buyer.
    pub async fn create(&self, token: &str, payload: CreateTicket) -> Result<TicketRow, ApiError> {
        #[derive(Serialize)]
        struct Args<'a> {
            auth_token: &'a str,
        }

        self.mutate_clear
            .invoke(&Args { auth_token: token }, || async {
                let user_id = self.auth.require_user(token).await?;

                if db::events::find_event(&self.pool, payload.event_id)
                    .await?
                    .is_none()
                {
                    return Err(CoreError::not_found("Event").into());
                }

                let unique_code = generate_ticket_code(
                    &self.ticket_secret,
                    payload.event_id,
                    user_id,
                    payload.ticket_type_id,
                );

                let ticket = db::tickets::insert_ticket(
                    &self.pool,
                    payload.event_id,
                    user_id,
                    payload.ticket_type_id,
                    &unique_code,
                )
                .await?;

                if let Some(details) = db::tickets::purchase_details(&self.pool, ticket.id).await? {
                    self.producer
                        .enqueue(&QueueMessage::email(EmailNotification {
                            to: details.user_login.clone(),
                            title: "Ticket purchase".to_string(),
                            text: format!(
                                "{}, thanks for buying a ticket to '{}'. You bought a '{}' ticket for {}.",
                                details.user_name, details.event_title, details.kind, details.price
                            ),
                        }))
                        .await
                        .map_err(ApiError::queue)?;
                }

                Ok(ticket)
            })
            .await
    }

    /// Remove one of the caller's own tickets.
    pub async fn delete(&self, token: &str, ticket_id: TicketId) -> Result<(), ApiError> {
        #[derive(Serialize)]
        struct Args<'a> {
            auth_token: &'a str,
            ticket_id: TicketId,
        }

        self.mutate_clear
            .invoke(
                &Args {
                    auth_token: token,
                    ticket_id,
                },
                || async {
                    let user_id = self.auth.require_user(token).await?;
                    if !db::tickets::delete_ticket(&self.pool, ticket_id, user_id).await? {
                        return Err(CoreError::not_found("Ticket").into());
                    }
                    Ok(())
                },
            )
            .await
    }

    /// Activate a ticket by its QR code. Each code activates exactly once;
    /// the second scan is rejected.
    pub async fn activate_qr_code(
        &self,
        token: &str,
        payload: ActivateQr,
    ) -> Result<TicketRow, ApiError> {
        #[derive(Serialize)]
        struct Args<'a> {
            auth_token: &'a str,
        }

        self.mutate_clear
            .invoke(&Args { auth_token: token }, || async {
                self.auth.require_user(token).await?;

                let ticket = match db::tickets::activate_by_code(&self.pool, &payload.code).await? {
                    Some(ticket) => ticket,
                    None => {
                        // distinguish "already used" from "unknown code"
                        return match db::tickets::find_by_code(&self.pool, &payload.code).await? {
                            Some(_) => {
                                Err(CoreError::validation("ticket is already activated").into())
                            }
                            None => Err(CoreError::not_found("Ticket").into()),
                        };
                    }
                };

                if let Some(details) = db::tickets::purchase_details(&self.pool, ticket.id).await? {
                    self.producer
                        .enqueue(&QueueMessage::email(EmailNotification {
                            to: details.user_login.clone(),
                            title: "Ticket activated".to_string(),
                            text: format!(
                                "{}, your '{}' ticket to '{}' has been activated.",
                                details.user_name, details.kind, details.event_title
                            ),
                        }))
                        .await
                        .map_err(ApiError::queue)?;
                }

                Ok(ticket)
            })
            .await
    }

    /// The caller's tickets with event/type context, cached per user.
    pub async fn my_tickets(&self, token: &str) -> Result<Vec<UserTicketRow>, ApiError> {
        #[derive(Serialize)]
        struct Args<'a> {
            auth_token: &'a str,
        }

        self.my_tickets_cache
            .invoke(&Args { auth_token: token }, || async {
                let user_id = self.auth.require_user(token).await?;
                Ok(db::tickets::list_for_user(&self.pool, user_id).await?)
            })
            .await
    }
}
