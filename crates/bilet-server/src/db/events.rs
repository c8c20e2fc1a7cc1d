//! Event storage operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx_core::query::query;
use sqlx_core::query_as::query_as;

use bilet_core::{EventId, UserId};

use super::{DbResult, PgPool};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRow {
    pub id: EventId,
    pub creator_id: UserId,
    pub status: String,
    pub category: String,
    pub title: String,
    pub description: String,
    pub address: String,
    pub datetime: DateTime<Utc>,
}

/// Optional field updates; `None` leaves the column unchanged.
#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    pub status: Option<String>,
    pub category: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
}

type EventTuple = (
    i64,
    i64,
    String,
    String,
    String,
    String,
    String,
    DateTime<Utc>,
);

fn from_tuple(row: EventTuple) -> EventRow {
    EventRow {
        id: EventId(row.0),
        creator_id: UserId(row.1),
        status: row.2,
        category: row.3,
        title: row.4,
        description: row.5,
        address: row.6,
        datetime: row.7,
    }
}

const EVENT_COLUMNS: &str = "id, creator_id, status, category, title, description, address, datetime";

pub async fn insert_event(
    pool: &PgPool,
    creator_id: UserId,
    status: &str,
    category: &str,
    title: &str,
    description: &str,
    address: &str,
) -> DbResult<EventRow> {
    let row: EventTuple = query_as(&format!(
        r#"
        INSERT INTO events (creator_id, status, category, title, description, address)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {EVENT_COLUMNS}
        "#
    ))
    .bind(creator_id.as_i64())
    .bind(status)
    .bind(category)
    .bind(title)
    .bind(description)
    .bind(address)
    .fetch_one(pool)
    .await?;

    Ok(from_tuple(row))
}

pub async fn list_events(pool: &PgPool) -> DbResult<Vec<EventRow>> {
    let rows: Vec<EventTuple> =
        query_as(&format!("SELECT {EVENT_COLUMNS} FROM events ORDER BY id"))
            .fetch_all(pool)
            .await?;

    Ok(rows.into_iter().map(from_tuple).collect())
}

pub async fn find_event(pool: &PgPool, id: EventId) -> DbResult<Option<EventRow>> {
    let row: Option<EventTuple> =
        query_as(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"))
            .bind(id.as_i64())
            .fetch_optional(pool)
            .await?;

    Ok(row.map(from_tuple))
}

/// Apply a partial update; returns the updated row, or `None` when the
/// event does not exist.
pub async fn update_event(
    pool: &PgPool,
    id: EventId,
    patch: &EventPatch,
) -> DbResult<Option<EventRow>> {
    let row: Option<EventTuple> = query_as(&format!(
        r#"
        UPDATE events SET
            status      = COALESCE($2, status),
            category    = COALESCE($3, category),
            title       = COALESCE($4, title),
            description = COALESCE($5, description),
            address     = COALESCE($6, address)
        WHERE id = $1
        RETURNING {EVENT_COLUMNS}
        "#
    ))
    .bind(id.as_i64())
    .bind(patch.status.as_deref())
    .bind(patch.category.as_deref())
    .bind(patch.title.as_deref())
    .bind(patch.description.as_deref())
    .bind(patch.address.as_deref())
    .fetch_optional(pool)
    .await?;

    Ok(row.map(from_tuple))
}

pub async fn delete_event(pool: &PgPool, id: EventId) -> DbResult<bool> {
    let result = query("DELETE FROM events WHERE id = $1")
        .bind(id.as_i64())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
