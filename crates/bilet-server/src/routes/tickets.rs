//! Ticket routes: purchase, deletion, QR activation, own-ticket listing.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::cookie::CookieJar;

use bilet_core::TicketId;

use crate::error::ApiError;
use crate::server::AppState;
use crate::services::tickets::{ActivateQr, CreateTicket};

use super::token_from;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_ticket))
        .route("/my", get(my_tickets))
        .route("/activate", post(activate_qr_code))
        .route("/{ticket_id}", axum::routing::delete(delete_ticket))
}

/// POST / - buy a ticket for an event.
async fn create_ticket(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<CreateTicket>,
) -> Result<impl IntoResponse, ApiError> {
    let token = token_from(&jar);
    let ticket = state.services.tickets.create(&token, payload).await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

/// GET /my - the calling user's tickets (cached per user).
async fn my_tickets(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let token = token_from(&jar);
    let tickets = state.services.tickets.my_tickets(&token).await?;
    Ok(Json(tickets))
}

/// POST /activate - activate a ticket by its QR code.
async fn activate_qr_code(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<ActivateQr>,
) -> Result<impl IntoResponse, ApiError> {
    let token = token_from(&jar);
    let ticket = state
        .services
        .tickets
        .activate_qr_code(&token, payload)
        .await?;
    Ok(Json(ticket))
}

/// DELETE /{ticket_id}.
async fn delete_ticket(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(ticket_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let token = token_from(&jar);
    state
        .services
        .tickets
        .delete(&token, TicketId(ticket_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
