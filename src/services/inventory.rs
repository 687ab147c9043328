use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, QueryFilter,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::entities::flight::{self, FlightStatus};
use crate::entities::ticket::{self, TicketStatus};
use crate::error::{AppError, AppResult};

/// Load a flight row under an exclusive lock. Every seat-count mutation
/// goes through this lock, so committed inventory changes on a single
/// flight form a total order.
pub async fn lock_flight(txn: &DatabaseTransaction, flight_id: Uuid) -> AppResult<flight::Model> {
    flight::Entity::find_by_id(flight_id)
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Flight not found".to_string()))
}

/// Decrement `available_seats` by `count` if enough seats remain.
/// Returns `false` (and mutates nothing) when the flight is short.
pub async fn reserve_seats(
    txn: &DatabaseTransaction,
    flight_id: Uuid,
    count: i32,
) -> AppResult<bool> {
    if count <= 0 {
        return Err(AppError::InvalidArgument(
            "Seat count must be positive".to_string(),
        ));
    }

    let flight = lock_flight(txn, flight_id).await?;
    if flight.available_seats < count {
        return Ok(false);
    }

    let remaining = flight.available_seats - count;
    apply_seat_change(txn, flight, remaining).await?;
    Ok(true)
}

/// Increment `available_seats` by `count`, clamped at capacity. The
/// clamp keeps the upper-bound invariant even under a double release.
pub async fn release_seats(
    txn: &DatabaseTransaction,
    flight_id: Uuid,
    count: i32,
) -> AppResult<bool> {
    if count <= 0 {
        return Err(AppError::InvalidArgument(
            "Seat count must be positive".to_string(),
        ));
    }

    let flight = lock_flight(txn, flight_id).await?;
    let remaining = (flight.available_seats + count).min(flight.capacity);
    apply_seat_change(txn, flight, remaining).await?;
    Ok(true)
}

async fn apply_seat_change(
    txn: &DatabaseTransaction,
    flight: flight::Model,
    remaining: i32,
) -> AppResult<()> {
    let status = derive_status(remaining, flight.status);
    let mut active: flight::ActiveModel = flight.into();
    active.available_seats = Set(remaining);
    active.status = Set(status);
    active.updated_at = Set(Utc::now().into());
    active.update(txn).await?;
    Ok(())
}

/// Seat movements only toggle a flight between `scheduled` and `full`;
/// `departed` and `canceled` are terminal for inventory purposes.
pub fn derive_status(available_seats: i32, current: FlightStatus) -> FlightStatus {
    match current {
        FlightStatus::Scheduled if available_seats == 0 => FlightStatus::Full,
        FlightStatus::Full if available_seats > 0 => FlightStatus::Scheduled,
        other => other,
    }
}

/// True when a ticket in `valid` or `used` status holds this seat.
pub async fn seat_occupied<C: ConnectionTrait>(
    conn: &C,
    flight_id: Uuid,
    seat_number: &str,
) -> AppResult<bool> {
    let existing = ticket::Entity::find()
        .filter(ticket::Column::FlightId.eq(flight_id))
        .filter(ticket::Column::SeatNumber.eq(seat_number))
        .filter(ticket::Column::Status.is_in([TicketStatus::Valid, TicketStatus::Used]))
        .one(conn)
        .await?;
    Ok(existing.is_some())
}

/// Advisory seat check. Consumers that go on to allocate the seat must
/// re-check inside their own transaction.
pub async fn check_seat_available<C: ConnectionTrait>(
    conn: &C,
    flight: &flight::Model,
    seat_number: &str,
) -> AppResult<bool> {
    if flight.available_seats <= 0 {
        return Ok(false);
    }
    Ok(!seat_occupied(conn, flight.id, seat_number).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduled_flight_fills_at_zero() {
        assert_eq!(derive_status(0, FlightStatus::Scheduled), FlightStatus::Full);
        assert_eq!(derive_status(1, FlightStatus::Scheduled), FlightStatus::Scheduled);
    }

    #[test]
    fn test_full_flight_reopens_above_zero() {
        assert_eq!(derive_status(1, FlightStatus::Full), FlightStatus::Scheduled);
        assert_eq!(derive_status(0, FlightStatus::Full), FlightStatus::Full);
    }

    #[test]
    fn test_terminal_statuses_unchanged_by_seat_movement() {
        assert_eq!(derive_status(0, FlightStatus::Departed), FlightStatus::Departed);
        assert_eq!(derive_status(5, FlightStatus::Departed), FlightStatus::Departed);
        assert_eq!(derive_status(0, FlightStatus::Canceled), FlightStatus::Canceled);
        assert_eq!(derive_status(5, FlightStatus::Canceled), FlightStatus::Canceled);
    }
}
