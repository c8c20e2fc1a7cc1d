//! Token verification and the cache resolvers built on it.
//!
//! The cache layer does not understand authentication; it only runs the
//! resolvers configured here. A Param resolver rejects requests with bad
//! tokens before any cache traffic, and a Writer resolver folds the
//! resolved user id into the cache key so users never see each other's
//! entries.

use serde_json::{Value, json};

use bilet_cache::{ParamResolver, Resolver, WriterResolver};
use bilet_core::{CoreError, UserId};

use crate::db::{self, PgPool};
use crate::error::ApiError;
use crate::security::JwtKeys;

/// Cheap-to-clone verification handle; resolver closures each hold one.
#[derive(Clone)]
pub struct Authenticator {
    inner: std::sync::Arc<Inner>,
}

struct Inner {
    keys: JwtKeys,
    pool: PgPool,
}

impl Authenticator {
    pub fn new(keys: JwtKeys, pool: PgPool) -> Self {
        Self {
            inner: std::sync::Arc::new(Inner { keys, pool }),
        }
    }

    pub fn keys(&self) -> &JwtKeys {
        &self.inner.keys
    }

    /// Resolve a token to a user id.
    ///
    /// Absent and forged tokens get the same error, so a forger learns
    /// nothing from the response.
    pub fn verify(&self, token: &str) -> Result<UserId, ApiError> {
        self.inner
            .keys
            .verify(token)
            .ok_or_else(|| CoreError::TokenMissing.into())
    }

    /// Verify the token and confirm the account still exists.
    pub async fn require_user(&self, token: &str) -> Result<UserId, ApiError> {
        let user_id = self.verify(token)?;
        match db::users::find_by_id(&self.inner.pool, user_id).await? {
            Some(_) => Ok(user_id),
            None => Err(CoreError::InvalidToken.into()),
        }
    }

    /// Param resolver: verify the token found under `arg_name` in the
    /// wrapped operation's arguments. Invalid tokens fail the request
    /// before the store is consulted.
    pub fn token_check_resolver(&self, arg_name: &str) -> Resolver<ApiError> {
        let auth = self.clone();
        Resolver::param(
            ParamResolver::new(move |args, _kwargs| {
                let auth = auth.clone();
                Box::pin(async move {
                    let token = template_token(&args);
                    auth.verify(&token)?;
                    Ok(Value::Null)
                })
            })
            .arg(arg_name),
        )
    }

    /// Writer resolver: resolve the token under `arg_name` to a user id
    /// and make it part of the cache key.
    pub fn user_key_resolver(&self, arg_name: &str) -> Resolver<ApiError> {
        let auth = self.clone();
        Resolver::writer(WriterResolver::from_param(
            ParamResolver::new(move |args, _kwargs| {
                let auth = auth.clone();
                Box::pin(async move {
                    let token = template_token(&args);
                    let user_id = auth.require_user(&token).await?;
                    Ok(json!(user_id))
                })
            })
            .arg(arg_name),
        ))
    }
}

/// The substituted token value; a template left unsubstituted (argument not
/// present at the call site) reads as an empty token and fails verification.
fn template_token(args: &[Value]) -> String {
    args.first()
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
