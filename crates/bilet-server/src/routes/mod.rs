//! HTTP route handlers.
//!
//! Handlers stay thin: pull the token cookie, hand the payload to the
//! service, map the result to JSON. All caching happens inside the
//! services.

pub mod auth;
pub mod events;
pub mod ticket_types;
pub mod tickets;

use axum::Router;
use axum_extra::extract::cookie::CookieJar;

use crate::security::JWT_COOKIE;
use crate::server::AppState;

/// Assemble every versioned API route.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1/auth", auth::router())
        .nest("/api/v1/events", events::router())
        .nest("/api/v1/ticket-types", ticket_types::router())
        .nest("/api/v1/tickets", tickets::router())
}

/// The token cookie's value; empty when absent, which the services treat
/// as a missing token.
pub(crate) fn token_from(jar: &CookieJar) -> String {
    jar.get(JWT_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .unwrap_or_default()
}
