//! Account storage operations.

use serde::{Deserialize, Serialize};
use sqlx_core::query_as::query_as;

use bilet_core::UserId;

use super::{DbResult, PgPool};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRow {
    pub id: UserId,
    pub name: String,
    pub login: String,
    #[serde(skip_serializing)]
    #[serde(default)]
    pub password_hash: String,
}

type UserTuple = (i64, String, String, String);

fn from_tuple(row: UserTuple) -> UserRow {
    UserRow {
        id: UserId(row.0),
        name: row.1,
        login: row.2,
        password_hash: row.3,
    }
}

/// Insert a new account. A unique violation means the name or login is
/// taken; the caller maps that to its domain error.
pub async fn insert_user(
    pool: &PgPool,
    name: &str,
    login: &str,
    password_hash: &str,
) -> DbResult<UserRow> {
    let row: UserTuple = query_as(
        r#"
        INSERT INTO users (name, login, password_hash)
        VALUES ($1, $2, $3)
        RETURNING id, name, login, password_hash
        "#,
    )
    .bind(name)
    .bind(login)
    .bind(password_hash)
    .fetch_one(pool)
    .await?;

    Ok(from_tuple(row))
}

pub async fn find_by_login(pool: &PgPool, login: &str) -> DbResult<Option<UserRow>> {
    let row: Option<UserTuple> = query_as(
        "SELECT id, name, login, password_hash FROM users WHERE login = $1",
    )
    .bind(login)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(from_tuple))
}

pub async fn find_by_id(pool: &PgPool, id: UserId) -> DbResult<Option<UserRow>> {
    let row: Option<UserTuple> = query_as(
        "SELECT id, name, login, password_hash FROM users WHERE id = $1",
    )
    .bind(id.as_i64())
    .fetch_optional(pool)
    .await?;

    Ok(row.map(from_tuple))
}
