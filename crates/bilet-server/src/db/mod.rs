//! PostgreSQL access layer.
//!
//! Runtime-bound queries over a shared pool; each submodule owns one
//! table's operations and maps tuple rows into its row struct. The schema
//! is applied idempotently at startup.

pub mod events;
pub mod ticket_types;
pub mod tickets;
pub mod users;

use std::time::Duration;

use sqlx_core::pool::{Pool, PoolOptions};
use sqlx_core::query::query;
use sqlx_postgres::Postgres;

use crate::config::PostgresConfig;

/// PostgreSQL connection pool type alias.
pub type PgPool = Pool<Postgres>;

pub type DbResult<T> = Result<T, sqlx_core::error::Error>;

/// Create the connection pool from configuration.
pub async fn create_pool(config: &PostgresConfig) -> DbResult<PgPool> {
    tracing::info!(pool_size = config.pool_size, "creating PostgreSQL connection pool");

    PoolOptions::<Postgres>::new()
        .max_connections(config.pool_size)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.url)
        .await
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id            BIGSERIAL PRIMARY KEY,
        name          TEXT NOT NULL UNIQUE,
        login         TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS events (
        id          BIGSERIAL PRIMARY KEY,
        creator_id  BIGINT NOT NULL REFERENCES users(id),
        status      TEXT NOT NULL,
        category    TEXT NOT NULL,
        title       TEXT NOT NULL,
        description TEXT NOT NULL,
        address     TEXT NOT NULL,
        datetime    TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS ticket_types (
        id          BIGSERIAL PRIMARY KEY,
        event_id    BIGINT NOT NULL REFERENCES events(id),
        type        TEXT NOT NULL,
        description TEXT,
        price       BIGINT NOT NULL,
        total_count BIGINT NOT NULL,
        UNIQUE (event_id, type)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tickets (
        id             BIGSERIAL PRIMARY KEY,
        event_id       BIGINT NOT NULL REFERENCES events(id),
        user_id        BIGINT NOT NULL REFERENCES users(id),
        ticket_type_id BIGINT NOT NULL REFERENCES ticket_types(id),
        unique_code    TEXT NOT NULL UNIQUE,
        is_used        BOOLEAN NOT NULL DEFAULT FALSE
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_tickets_user ON tickets(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_tickets_event ON tickets(event_id)",
    "CREATE INDEX IF NOT EXISTS idx_ticket_types_event ON ticket_types(event_id)",
];

/// Apply the schema. Safe to run on every startup.
pub async fn run_migrations(pool: &PgPool) -> DbResult<()> {
    for statement in SCHEMA {
        query(statement).execute(pool).await?;
    }
    tracing::debug!("database schema is up to date");
    Ok(())
}

/// Whether a database error is a unique-constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx_core::error::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}
