//! Ticket storage operations (the concrete purchased QR codes).

use serde::{Deserialize, Serialize};
use sqlx_core::query::query;
use sqlx_core::query_as::query_as;

use bilet_core::{EventId, TicketId, TicketTypeId, UserId};

use super::{DbResult, PgPool};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketRow {
    pub id: TicketId,
    pub event_id: EventId,
    pub user_id: UserId,
    pub ticket_type_id: TicketTypeId,
    pub unique_code: String,
    pub is_used: bool,
}

/// One of a user's tickets with the joined event/type context the UI shows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserTicketRow {
    pub ticket_id: TicketId,
    pub event_id: EventId,
    pub event_title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub price: i64,
    pub unique_code: String,
    pub is_used: bool,
}

/// Joined context used to compose the purchase notification.
#[derive(Debug, Clone)]
pub struct PurchaseDetails {
    pub user_name: String,
    pub user_login: String,
    pub event_title: String,
    pub kind: String,
    pub price: i64,
}

type TicketTuple = (i64, i64, i64, i64, String, bool);

fn from_tuple(row: TicketTuple) -> TicketRow {
    TicketRow {
        id: TicketId(row.0),
        event_id: EventId(row.1),
        user_id: UserId(row.2),
        ticket_type_id: TicketTypeId(row.3),
        unique_code: row.4,
        is_used: row.5,
    }
}

const TICKET_COLUMNS: &str = "id, event_id, user_id, ticket_type_id, unique_code, is_used";

pub async fn insert_ticket(
    pool: &PgPool,
    event_id: EventId,
    user_id: UserId,
    ticket_type_id: TicketTypeId,
    unique_code: &str,
) -> DbResult<TicketRow> {
    let row: TicketTuple = query_as(&format!(
        r#"
        INSERT INTO tickets (event_id, user_id, ticket_type_id, unique_code)
        VALUES ($1, $2, $3, $4)
        RETURNING {TICKET_COLUMNS}
        "#
    ))
    .bind(event_id.as_i64())
    .bind(user_id.as_i64())
    .bind(ticket_type_id.as_i64())
    .bind(unique_code)
    .fetch_one(pool)
    .await?;

    Ok(from_tuple(row))
}

/// Delete a ticket, owner-scoped: only the buying user can remove it.
pub async fn delete_ticket(pool: &PgPool, id: TicketId, user_id: UserId) -> DbResult<bool> {
    let result = query("DELETE FROM tickets WHERE id = $1 AND user_id = $2")
        .bind(id.as_i64())
        .bind(user_id.as_i64())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn find_by_code(pool: &PgPool, code: &str) -> DbResult<Option<TicketRow>> {
    let row: Option<TicketTuple> = query_as(&format!(
        "SELECT {TICKET_COLUMNS} FROM tickets WHERE unique_code = $1"
    ))
    .bind(code)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(from_tuple))
}

/// Flip a ticket to used; returns `None` when the code is unknown or the
/// ticket was already activated (one scan only).
pub async fn activate_by_code(pool: &PgPool, code: &str) -> DbResult<Option<TicketRow>> {
    let row: Option<TicketTuple> = query_as(&format!(
        r#"
        UPDATE tickets SET is_used = TRUE
        WHERE unique_code = $1 AND is_used = FALSE
        RETURNING {TICKET_COLUMNS}
        "#
    ))
    .bind(code)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(from_tuple))
}

pub async fn list_for_user(pool: &PgPool, user_id: UserId) -> DbResult<Vec<UserTicketRow>> {
    let rows: Vec<(i64, i64, String, String, i64, String, bool)> = query_as(
        r#"
        SELECT t.id, t.event_id, e.title, tt.type, tt.price, t.unique_code, t.is_used
        FROM tickets t
        JOIN events e ON e.id = t.event_id
        JOIN ticket_types tt ON tt.id = t.ticket_type_id
        WHERE t.user_id = $1
        ORDER BY t.id
        "#,
    )
    .bind(user_id.as_i64())
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| UserTicketRow {
            ticket_id: TicketId(r.0),
            event_id: EventId(r.1),
            event_title: r.2,
            kind: r.3,
            price: r.4,
            unique_code: r.5,
            is_used: r.6,
        })
        .collect())
}

/// Context for the purchase/activation notification of one ticket.
pub async fn purchase_details(pool: &PgPool, id: TicketId) -> DbResult<Option<PurchaseDetails>> {
    let row: Option<(String, String, String, String, i64)> = query_as(
        r#"
        SELECT u.name, u.login, e.title, tt.type, tt.price
        FROM tickets t
        JOIN users u ON u.id = t.user_id
        JOIN events e ON e.id = t.event_id
        JOIN ticket_types tt ON tt.id = t.ticket_type_id
        WHERE t.id = $1
        "#,
    )
    .bind(id.as_i64())
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| PurchaseDetails {
        user_name: r.0,
        user_login: r.1,
        event_title: r.2,
        kind: r.3,
        price: r.4,
    }))
}
