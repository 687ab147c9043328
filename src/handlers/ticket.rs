use axum::{
    extract::{Path, State},
    Extension, Json,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use serde::Deserialize;
use uuid::Uuid;

use crate::entities::user::UserRole;
use crate::entities::{order, ticket};
use crate::error::{AppError, AppResult};
use crate::handlers::order::TicketInfo;
use crate::services::ticket as ticket_service;
use crate::utils::jwt::Claims;
use crate::AppState;

/// List the caller's tickets; admins see every ticket
pub async fn my_tickets(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<TicketInfo>>> {
    let mut query = ticket::Entity::find();
    if claims.role != UserRole::Admin {
        let order_ids: Vec<Uuid> = order::Entity::find()
            .select_only()
            .column(order::Column::Id)
            .filter(order::Column::UserId.eq(claims.sub))
            .into_tuple()
            .all(&state.db)
            .await?;
        query = query.filter(ticket::Column::OrderId.is_in(order_ids));
    }

    let tickets = query
        .order_by_desc(ticket::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(tickets.into_iter().map(TicketInfo::from).collect()))
}

/// Get one ticket
pub async fn get_ticket(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(ticket_id): Path<Uuid>,
) -> AppResult<Json<TicketInfo>> {
    let ticket = find_owned_ticket(&state, &claims, ticket_id).await?;
    Ok(Json(ticket.into()))
}

/// Refund a valid ticket and release its seat
pub async fn refund_ticket(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(ticket_id): Path<Uuid>,
) -> AppResult<Json<TicketInfo>> {
    find_owned_ticket(&state, &claims, ticket_id).await?;

    let updated = ticket_service::refund_ticket(&state.db, ticket_id).await?;
    state.notifier.ticket_event(&updated, "refunded");

    Ok(Json(updated.into()))
}

#[derive(Debug, Deserialize)]
pub struct CheckInRequest {
    pub seat_number: Option<String>,
    pub gate: Option<String>,
}

/// Issue a boarding pass, optionally moving to a different free seat
pub async fn check_in(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(ticket_id): Path<Uuid>,
    Json(payload): Json<CheckInRequest>,
) -> AppResult<Json<TicketInfo>> {
    find_owned_ticket(&state, &claims, ticket_id).await?;

    let updated = ticket_service::check_in_ticket(
        &state.db,
        ticket_id,
        ticket_service::CheckInInput {
            seat_number: payload.seat_number,
            gate: payload.gate,
        },
    )
    .await?;
    state.notifier.ticket_event(&updated, "checked_in");

    Ok(Json(updated.into()))
}

/// Load a ticket and verify the caller owns its order (admins bypass)
pub(crate) async fn find_owned_ticket(
    state: &AppState,
    claims: &Claims,
    ticket_id: Uuid,
) -> AppResult<ticket::Model> {
    let ticket = ticket::Entity::find_by_id(ticket_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Ticket not found".to_string()))?;

    if claims.role != UserRole::Admin {
        let order = order::Entity::find_by_id(ticket.order_id)
            .one(&state.db)
            .await?
            .ok_or_else(|| AppError::Internal("Ticket order missing".to_string()))?;
        if order.user_id != claims.sub {
            return Err(AppError::Forbidden(
                "You can only access your own tickets".to_string(),
            ));
        }
    }
    Ok(ticket)
}
