//! Account routes: register, login, profile.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::error::ApiError;
use crate::security::JWT_COOKIE;
use crate::server::AppState;
use crate::services::users::{LoginUser, RegisterUser};

use super::token_from;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(profile))
        .route("/register", post(register))
        .route("/login", post(login))
}

fn auth_cookie(token: String, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(JWT_COOKIE, token);
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_path("/");
    cookie.set_secure(secure);
    cookie.set_max_age(time::Duration::days(30));
    cookie
}

/// GET / - the calling user's profile (id taken from the token).
async fn profile(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let token = token_from(&jar);
    let user = state.services.users.profile(&token).await?;
    Ok(Json(user))
}

/// POST /register - create an account and set the auth cookie.
async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<RegisterUser>,
) -> Result<impl IntoResponse, ApiError> {
    let (user, token) = state.services.users.register(payload).await?;
    let jar = jar.add(auth_cookie(token, state.cookie_secure));
    Ok((StatusCode::CREATED, jar, Json(user)))
}

/// POST /login - check credentials and set a fresh auth cookie.
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginUser>,
) -> Result<impl IntoResponse, ApiError> {
    let (user, token) = state.services.users.login(payload).await?;
    let jar = jar.add(auth_cookie(token, state.cookie_secure));
    Ok((jar, Json(user)))
}
