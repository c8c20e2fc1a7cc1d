//! Event routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_extra::extract::cookie::CookieJar;

use bilet_core::EventId;

use crate::error::ApiError;
use crate::server::AppState;
use crate::services::events::{CreateEvent, EditEvent};

use super::token_from;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_events).post(create_event))
        .route("/{event_id}", axum::routing::patch(edit_event).delete(delete_event))
}

/// GET / - every event (cached).
async fn list_events(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let token = token_from(&jar);
    let events = state.services.events.list(&token).await?;
    Ok(Json(events))
}

/// POST / - create an event.
async fn create_event(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<CreateEvent>,
) -> Result<impl IntoResponse, ApiError> {
    let token = token_from(&jar);
    let event = state.services.events.create(&token, payload).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// PATCH /{event_id} - partial update.
async fn edit_event(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(event_id): Path<i64>,
    Json(payload): Json<EditEvent>,
) -> Result<impl IntoResponse, ApiError> {
    let token = token_from(&jar);
    let event = state
        .services
        .events
        .edit(&token, EventId(event_id), payload)
        .await?;
    Ok(Json(event))
}

/// DELETE /{event_id}.
async fn delete_event(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(event_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let token = token_from(&jar);
    state
        .services
        .events
        .delete(&token, EventId(event_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
