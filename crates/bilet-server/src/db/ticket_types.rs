//! Ticket type storage operations (the "Vip"/"Standard" parents of
//! concrete tickets).

use serde::{Deserialize, Serialize};
use sqlx_core::query::query;
use sqlx_core::query_as::query_as;

use bilet_core::{EventId, TicketTypeId};

use super::{DbResult, PgPool};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketTypeRow {
    pub id: TicketTypeId,
    pub event_id: EventId,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: Option<String>,
    pub price: i64,
    pub total_count: i64,
}

#[derive(Debug, Clone, Default)]
pub struct TicketTypePatch {
    pub kind: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub total_count: Option<i64>,
}

type TicketTypeTuple = (i64, i64, String, Option<String>, i64, i64);

fn from_tuple(row: TicketTypeTuple) -> TicketTypeRow {
    TicketTypeRow {
        id: TicketTypeId(row.0),
        event_id: EventId(row.1),
        kind: row.2,
        description: row.3,
        price: row.4,
        total_count: row.5,
    }
}

const TYPE_COLUMNS: &str = "id, event_id, type, description, price, total_count";

/// Insert a ticket type. The `(event_id, type)` unique constraint rejects
/// duplicates; the caller maps that violation to its domain error.
pub async fn insert_ticket_type(
    pool: &PgPool,
    event_id: EventId,
    kind: &str,
    description: Option<&str>,
    price: i64,
    total_count: i64,
) -> DbResult<TicketTypeRow> {
    let row: TicketTypeTuple = query_as(&format!(
        r#"
        INSERT INTO ticket_types (event_id, type, description, price, total_count)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {TYPE_COLUMNS}
        "#
    ))
    .bind(event_id.as_i64())
    .bind(kind)
    .bind(description)
    .bind(price)
    .bind(total_count)
    .fetch_one(pool)
    .await?;

    Ok(from_tuple(row))
}

pub async fn list_for_event(pool: &PgPool, event_id: EventId) -> DbResult<Vec<TicketTypeRow>> {
    let rows: Vec<TicketTypeTuple> = query_as(&format!(
        "SELECT {TYPE_COLUMNS} FROM ticket_types WHERE event_id = $1 ORDER BY id"
    ))
    .bind(event_id.as_i64())
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(from_tuple).collect())
}

pub async fn update_ticket_type(
    pool: &PgPool,
    id: TicketTypeId,
    patch: &TicketTypePatch,
) -> DbResult<Option<TicketTypeRow>> {
    let row: Option<TicketTypeTuple> = query_as(&format!(
        r#"
        UPDATE ticket_types SET
            type        = COALESCE($2, type),
            description = COALESCE($3, description),
            price       = COALESCE($4, price),
            total_count = COALESCE($5, total_count)
        WHERE id = $1
        RETURNING {TYPE_COLUMNS}
        "#
    ))
    .bind(id.as_i64())
    .bind(patch.kind.as_deref())
    .bind(patch.description.as_deref())
    .bind(patch.price)
    .bind(patch.total_count)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(from_tuple))
}

pub async fn delete_ticket_type(pool: &PgPool, id: TicketTypeId) -> DbResult<bool> {
    let result = query("DELETE FROM ticket_types WHERE id = $1")
        .bind(id.as_i64())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
