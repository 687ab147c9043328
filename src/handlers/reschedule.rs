use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::reschedule_log;
use crate::entities::ticket::CabinClass;
use crate::error::AppResult;
use crate::handlers::flight::FlightResponse;
use crate::handlers::order::TicketInfo;
use crate::handlers::ticket::find_owned_ticket;
use crate::services::reschedule;
use crate::utils::jwt::Claims;
use crate::AppState;

/// Flights a ticket can be rescheduled onto
pub async fn reschedule_options(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(ticket_id): Path<Uuid>,
) -> AppResult<Json<Vec<FlightResponse>>> {
    find_owned_ticket(&state, &claims, ticket_id).await?;

    let flights = reschedule::available_flights(&state.db, ticket_id).await?;
    Ok(Json(flights.into_iter().map(FlightResponse::from).collect()))
}

#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    pub target_flight_id: Uuid,
    pub target_cabin: Option<CabinClass>,
}

/// Quote the monetary delta without side effects
pub async fn preview_reschedule(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(ticket_id): Path<Uuid>,
    Json(payload): Json<PreviewRequest>,
) -> AppResult<Json<reschedule::FeeBreakdown>> {
    find_owned_ticket(&state, &claims, ticket_id).await?;

    let fees = reschedule::preview(
        &state.db,
        ticket_id,
        payload.target_flight_id,
        payload.target_cabin,
    )
    .await?;
    Ok(Json(fees))
}

#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    pub target_flight_id: Uuid,
    pub target_seat: String,
    pub target_cabin: Option<CabinClass>,
}

#[derive(Debug, Serialize)]
pub struct ExecuteResponse {
    pub new_ticket: TicketInfo,
    pub log: reschedule_log::Model,
}

/// Swap the ticket onto the target flight
pub async fn execute_reschedule(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(ticket_id): Path<Uuid>,
    Json(payload): Json<ExecuteRequest>,
) -> AppResult<Json<ExecuteResponse>> {
    find_owned_ticket(&state, &claims, ticket_id).await?;

    let (new_ticket, log) = reschedule::execute(
        &state.db,
        ticket_id,
        payload.target_flight_id,
        &payload.target_seat,
        payload.target_cabin,
    )
    .await?;
    state.notifier.ticket_event(&new_ticket, "rescheduled");

    Ok(Json(ExecuteResponse {
        new_ticket: new_ticket.into(),
        log,
    }))
}
