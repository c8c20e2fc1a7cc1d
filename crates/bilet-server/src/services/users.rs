//! Account management: registration, login, cached profile lookup.

use serde::{Deserialize, Serialize};

use bilet_cache::{CacheConfig, CacheStore, Cached, ConfigError, Ttl};
use bilet_core::{CoreError, EmailNotification, QueueMessage};

use crate::db::users::{UserRow, find_by_login, insert_user};
use crate::db::{self, PgPool, is_unique_violation};
use crate::error::ApiError;
use crate::messaging::NotificationProducer;
use crate::security::{hash_password, verify_password};

use super::Authenticator;

#[derive(Debug, Deserialize)]
pub struct RegisterUser {
    pub name: String,
    pub login: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginUser {
    pub login: String,
    pub password: String,
}

pub struct UserService {
    pool: PgPool,
    auth: Authenticator,
    producer: NotificationProducer,
    profile_cache: Cached<ApiError>,
}

impl UserService {
    pub fn new(
        pool: PgPool,
        store: CacheStore,
        auth: Authenticator,
        producer: NotificationProducer,
        ttl: Ttl,
    ) -> Result<Self, ConfigError> {
        // keyed purely by the resolved user id: same user, same key,
        // whatever the token string looks like
        let profile_cache = Cached::new(
            store,
            CacheConfig::builder("user-cache")
                .tag("user-cache")
                .resolver(auth.user_key_resolver("auth_token"))
                .ttl(ttl)
                .build()?,
        );

        Ok(Self {
            pool,
            auth,
            producer,
            profile_cache,
        })
    }

    /// Create an account and issue its first token.
    pub async fn register(&self, payload: RegisterUser) -> Result<(UserRow, String), ApiError> {
        if payload.name.is_empty() || payload.login.is_empty() || payload.password.is_empty() {
            return Err(CoreError::validation("name, login and password are required").into());
        }

        let password_hash = hash_password(&payload.password)
            .map_err(|e| CoreError::internal(format!("password hashing failed: {e}")))?;

        let user = match insert_user(&self.pool, &payload.name, &payload.login, &password_hash)
            .await
        {
            Ok(user) => user,
            Err(e) if is_unique_violation(&e) => return Err(CoreError::LoginTaken.into()),
            Err(e) => return Err(e.into()),
        };

        let token = self.auth.keys().issue(user.id)?;

        self.producer
            .enqueue(&QueueMessage::email(EmailNotification {
                to: user.login.clone(),
                title: "Welcome to bilet".to_string(),
                text: format!("{}, your account has been created.", user.name),
            }))
            .await
            .map_err(ApiError::queue)?;

        Ok((user, token))
    }

    /// Check credentials and issue a fresh token.
    pub async fn login(&self, payload: LoginUser) -> Result<(UserRow, String), ApiError> {
        let user = find_by_login(&self.pool, &payload.login)
            .await?
            .ok_or(CoreError::InvalidLogin)?;

        let matches = verify_password(&payload.password, &user.password_hash)
            .map_err(|e| CoreError::internal(format!("stored hash is invalid: {e}")))?;
        if !matches {
            return Err(CoreError::InvalidPassword.into());
        }

        let token = self.auth.keys().issue(user.id)?;
        Ok((user, token))
    }

    /// The calling user's profile, cached per resolved user id.
    pub async fn profile(&self, token: &str) -> Result<UserRow, ApiError> {
        #[derive(Serialize)]
        struct Args<'a> {
            auth_token: &'a str,
        }

        self.profile_cache
            .invoke(&Args { auth_token: token }, || async {
                let user_id = self.auth.require_user(token).await?;
                db::users::find_by_id(&self.pool, user_id)
                    .await?
                    .ok_or_else(|| CoreError::not_found("User").into())
            })
            .await
    }
}
