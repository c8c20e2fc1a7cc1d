//! Ticket type routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::cookie::CookieJar;

use bilet_core::{EventId, TicketTypeId};

use crate::error::ApiError;
use crate::server::AppState;
use crate::services::ticket_types::{CreateTicketType, EditTicketType};

use super::token_from;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_ticket_type))
        .route("/event/{event_id}", get(list_for_event))
        .route(
            "/{ticket_type_id}",
            axum::routing::patch(edit_ticket_type).delete(delete_ticket_type),
        )
}

/// GET /event/{event_id} - ticket types of one event (cached per event).
async fn list_for_event(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(event_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let token = token_from(&jar);
    let types = state
        .services
        .ticket_types
        .list_for_event(&token, EventId(event_id))
        .await?;
    Ok(Json(types))
}

/// POST / - add a ticket type to an event.
async fn create_ticket_type(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<CreateTicketType>,
) -> Result<impl IntoResponse, ApiError> {
    let token = token_from(&jar);
    let ticket_type = state.services.ticket_types.create(&token, payload).await?;
    Ok((StatusCode::CREATED, Json(ticket_type)))
}

/// PATCH /{ticket_type_id} - partial update.
async fn edit_ticket_type(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(ticket_type_id): Path<i64>,
    Json(payload): Json<EditTicketType>,
) -> Result<impl IntoResponse, ApiError> {
    let token = token_from(&jar);
    let ticket_type = state
        .services
        .ticket_types
        .edit(&token, TicketTypeId(ticket_type_id), payload)
        .await?;
    Ok(Json(ticket_type))
}

/// DELETE /{ticket_type_id}.
async fn delete_ticket_type(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(ticket_type_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let token = token_from(&jar);
    state
        .services
        .ticket_types
        .delete(&token, TicketTypeId(ticket_type_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
