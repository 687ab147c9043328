use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::entities::ticket::{self, TicketStatus};
use crate::error::{AppError, AppResult};
use crate::services::inventory;
use crate::utils::numbers;

/// Refund a single valid ticket and give its seat back.
pub async fn refund_ticket(db: &DatabaseConnection, ticket_id: Uuid) -> AppResult<ticket::Model> {
    let txn = db.begin().await?;

    let ticket = ticket::Entity::find_by_id(ticket_id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Ticket not found".to_string()))?;

    if ticket.status != TicketStatus::Valid {
        return Err(AppError::InvalidState(
            "Only valid tickets can be refunded".to_string(),
        ));
    }
    if ticket.checked_in {
        return Err(AppError::InvalidState(
            "Checked-in tickets cannot be refunded".to_string(),
        ));
    }

    let flight_id = ticket.flight_id;
    let mut active: ticket::ActiveModel = ticket.into();
    active.status = Set(TicketStatus::Refunded);
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&txn).await?;

    inventory::release_seats(&txn, flight_id, 1).await?;

    txn.commit().await?;
    Ok(updated)
}

#[derive(Debug, Clone, Default)]
pub struct CheckInInput {
    pub seat_number: Option<String>,
    pub gate: Option<String>,
}

/// Issue a boarding pass. A seat change re-checks seat exclusivity
/// under the flight row lock before taking effect.
pub async fn check_in_ticket(
    db: &DatabaseConnection,
    ticket_id: Uuid,
    input: CheckInInput,
) -> AppResult<ticket::Model> {
    let txn = db.begin().await?;

    let ticket = ticket::Entity::find_by_id(ticket_id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Ticket not found".to_string()))?;

    if ticket.status != TicketStatus::Valid {
        return Err(AppError::InvalidState(
            "Only valid tickets can check in".to_string(),
        ));
    }
    if ticket.checked_in {
        return Err(AppError::InvalidState(
            "Ticket is already checked in".to_string(),
        ));
    }

    let now = Utc::now();
    let mut active: ticket::ActiveModel = ticket.clone().into();

    if let Some(new_seat) = input.seat_number.as_deref() {
        if new_seat != ticket.seat_number {
            inventory::lock_flight(&txn, ticket.flight_id).await?;
            if inventory::seat_occupied(&txn, ticket.flight_id, new_seat).await? {
                return Err(AppError::SeatTaken(new_seat.to_string()));
            }
            active.seat_number = Set(new_seat.to_string());
        }
    }

    active.checked_in = Set(true);
    active.checked_in_at = Set(Some(now.into()));
    active.boarding_pass_number = Set(Some(numbers::boarding_pass_number()));
    active.gate = Set(input.gate.clone());
    active.updated_at = Set(now.into());
    let updated = active.update(&txn).await?;

    txn.commit().await?;
    Ok(updated)
}

pub(crate) async fn unique_ticket_number<C: ConnectionTrait>(conn: &C) -> AppResult<String> {
    for _ in 0..5 {
        let candidate = numbers::ticket_number();
        let exists = ticket::Entity::find()
            .filter(ticket::Column::TicketNumber.eq(&candidate))
            .one(conn)
            .await?
            .is_some();
        if !exists {
            return Ok(candidate);
        }
    }
    Err(AppError::Internal(
        "Could not allocate a unique ticket number".to_string(),
    ))
}
