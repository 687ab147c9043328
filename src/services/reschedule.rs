use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::flight::{self, FlightStatus};
use crate::entities::reschedule_log;
use crate::entities::ticket::{self, CabinClass, TicketStatus};
use crate::error::{AppError, AppResult};
use crate::services::inventory;
use crate::services::order::ticket_fare;
use crate::services::settings::BusinessSettings;
use crate::services::ticket::unique_ticket_number;

/// Monetary breakdown of a reschedule, snapshotted before execution.
/// When the new fare drops by more than the fee, the fee stays visible
/// in `total_to_pay` and `refund_amount` carries the remainder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeeBreakdown {
    pub original_price: Decimal,
    pub new_price: Decimal,
    pub price_difference: Decimal,
    pub reschedule_fee: Decimal,
    pub total_to_pay: Decimal,
    pub refund_amount: Decimal,
}

/// Pure fee computation; safe to call repeatedly. All outputs carry two
/// decimals (banker's rounding).
pub fn calculate_fee(
    original_price: Decimal,
    target_base_price: Decimal,
    target_discount: Decimal,
    target_cabin: CabinClass,
    fee_rate: Decimal,
) -> FeeBreakdown {
    let new_price = ticket_fare(target_base_price, target_discount, target_cabin);
    let price_difference = (new_price - original_price).round_dp(2);
    let reschedule_fee = (original_price * fee_rate).round_dp(2);

    let (total_to_pay, refund_amount) = if price_difference >= Decimal::ZERO {
        (price_difference + reschedule_fee, Decimal::ZERO)
    } else {
        let refund = price_difference.abs() - reschedule_fee;
        if refund >= Decimal::ZERO {
            (reschedule_fee, refund)
        } else {
            // Fee exceeds the drop: charge only the uncovered remainder.
            let pay = (reschedule_fee + price_difference).max(Decimal::ZERO);
            (pay, Decimal::ZERO)
        }
    };

    FeeBreakdown {
        original_price,
        new_price,
        price_difference,
        reschedule_fee,
        total_to_pay: total_to_pay.round_dp(2),
        refund_amount: refund_amount.round_dp(2),
    }
}

fn ensure_reschedulable(
    ticket: &ticket::Model,
    original_flight: &flight::Model,
    now: DateTime<Utc>,
    min_hours: i64,
) -> AppResult<()> {
    if ticket.status != TicketStatus::Valid {
        return Err(AppError::InvalidState(
            "Only valid tickets can be rescheduled".to_string(),
        ));
    }
    if ticket.checked_in {
        return Err(AppError::InvalidState(
            "Checked-in tickets cannot be rescheduled".to_string(),
        ));
    }

    let departure = original_flight.departure_time.with_timezone(&Utc);
    if departure <= now {
        return Err(AppError::FlightDeparted(
            "Original flight has already departed".to_string(),
        ));
    }
    if departure <= now + Duration::hours(min_hours) {
        return Err(AppError::RescheduleTimeLimit(format!(
            "No rescheduling within {} hours of departure",
            min_hours
        )));
    }
    Ok(())
}

/// Flights the ticket can move to: same route, still open, departing
/// after the cutoff, seats available, ordered by departure time.
pub async fn available_flights(
    db: &DatabaseConnection,
    ticket_id: Uuid,
) -> AppResult<Vec<flight::Model>> {
    let ticket = find_ticket(db, ticket_id).await?;
    let original = find_flight(db, ticket.flight_id).await?;

    let business = BusinessSettings::load(db).await?;
    let now = Utc::now();
    ensure_reschedulable(&ticket, &original, now, business.min_reschedule_hours)?;

    let min_departure = now + Duration::hours(business.min_reschedule_hours);
    flight::Entity::find()
        .filter(flight::Column::DepartureCity.eq(&original.departure_city))
        .filter(flight::Column::ArrivalCity.eq(&original.arrival_city))
        .filter(flight::Column::DepartureTime.gt(min_departure))
        .filter(flight::Column::Status.eq(FlightStatus::Scheduled))
        .filter(flight::Column::AvailableSeats.gt(0))
        .filter(flight::Column::Id.ne(original.id))
        .order_by_asc(flight::Column::DepartureTime)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Quote the fee for moving a ticket to `target_flight_id`. Read-only.
pub async fn preview(
    db: &DatabaseConnection,
    ticket_id: Uuid,
    target_flight_id: Uuid,
    target_cabin: Option<CabinClass>,
) -> AppResult<FeeBreakdown> {
    let ticket = find_ticket(db, ticket_id).await?;
    let original = find_flight(db, ticket.flight_id).await?;
    let target = find_flight(db, target_flight_id).await?;

    let business = BusinessSettings::load(db).await?;
    let now = Utc::now();
    ensure_reschedulable(&ticket, &original, now, business.min_reschedule_hours)?;

    if target.departure_time.with_timezone(&Utc) <= now {
        return Err(AppError::FlightDeparted(
            "Target flight has already departed".to_string(),
        ));
    }

    let cabin = target_cabin.unwrap_or(ticket.cabin_class);
    Ok(calculate_fee(
        ticket.price,
        target.price,
        target.discount,
        cabin,
        business.reschedule_fee_rate,
    ))
}

/// Swap a ticket onto the target flight in one transaction. Lock order
/// is deterministic: the ticket row first, then both flight rows by
/// ascending id, which rules out lock cycles between concurrent swaps.
pub async fn execute(
    db: &DatabaseConnection,
    ticket_id: Uuid,
    target_flight_id: Uuid,
    target_seat: &str,
    target_cabin: Option<CabinClass>,
) -> AppResult<(ticket::Model, reschedule_log::Model)> {
    let txn = db.begin().await?;

    let ticket = ticket::Entity::find_by_id(ticket_id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Ticket not found".to_string()))?;

    if ticket.flight_id == target_flight_id {
        return Err(AppError::InvalidArgument(
            "Target flight must differ from the original".to_string(),
        ));
    }

    let (first_id, second_id) = if ticket.flight_id < target_flight_id {
        (ticket.flight_id, target_flight_id)
    } else {
        (target_flight_id, ticket.flight_id)
    };
    let first = inventory::lock_flight(&txn, first_id).await?;
    let second = inventory::lock_flight(&txn, second_id).await?;
    let (original_flight, target_flight) = if first.id == ticket.flight_id {
        (first, second)
    } else {
        (second, first)
    };

    let business = BusinessSettings::load(&txn).await?;
    let now = Utc::now();
    ensure_reschedulable(&ticket, &original_flight, now, business.min_reschedule_hours)?;

    if target_flight.departure_time.with_timezone(&Utc) <= now
        || target_flight.status == FlightStatus::Departed
    {
        return Err(AppError::FlightDeparted(
            "Target flight has already departed".to_string(),
        ));
    }
    if target_flight.status == FlightStatus::Canceled {
        return Err(AppError::InvalidState(
            "Target flight has been canceled".to_string(),
        ));
    }

    if inventory::seat_occupied(&txn, target_flight.id, target_seat).await? {
        return Err(AppError::SeatTaken(target_seat.to_string()));
    }
    if target_flight.available_seats <= 0 {
        return Err(AppError::InsufficientSeats(
            "Target flight has no seats left".to_string(),
        ));
    }

    let cabin = target_cabin.unwrap_or(ticket.cabin_class);
    let fees = calculate_fee(
        ticket.price,
        target_flight.price,
        target_flight.discount,
        cabin,
        business.reschedule_fee_rate,
    );

    inventory::release_seats(&txn, original_flight.id, 1).await?;
    if !inventory::reserve_seats(&txn, target_flight.id, 1).await? {
        // Rolls the release back with the rest of the transaction.
        return Err(AppError::InsufficientSeats(
            "Target flight has no seats left".to_string(),
        ));
    }

    let mut original_active: ticket::ActiveModel = ticket.clone().into();
    original_active.status = Set(TicketStatus::Rescheduled);
    original_active.updated_at = Set(now.into());
    original_active.update(&txn).await?;

    let new_ticket = ticket::ActiveModel {
        id: Set(Uuid::new_v4()),
        ticket_number: Set(unique_ticket_number(&txn).await?),
        order_id: Set(ticket.order_id),
        flight_id: Set(target_flight.id),
        passenger_name: Set(ticket.passenger_name.clone()),
        passenger_id_type: Set(ticket.passenger_id_type.clone()),
        passenger_id_number: Set(ticket.passenger_id_number.clone()),
        seat_number: Set(target_seat.to_string()),
        cabin_class: Set(cabin),
        price: Set(fees.new_price),
        status: Set(TicketStatus::Valid),
        checked_in: Set(false),
        checked_in_at: Set(None),
        boarding_pass_number: Set(None),
        gate: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    let log = reschedule_log::ActiveModel {
        id: Set(Uuid::new_v4()),
        original_ticket_id: Set(ticket.id),
        new_ticket_id: Set(new_ticket.id),
        original_flight_id: Set(original_flight.id),
        new_flight_id: Set(target_flight.id),
        price_difference: Set(fees.price_difference),
        reschedule_fee: Set(fees.reschedule_fee),
        created_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    Ok((new_ticket, log))
}

async fn find_ticket(db: &DatabaseConnection, ticket_id: Uuid) -> AppResult<ticket::Model> {
    ticket::Entity::find_by_id(ticket_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Ticket not found".to_string()))
}

async fn find_flight(db: &DatabaseConnection, flight_id: Uuid) -> AppResult<flight::Model> {
    flight::Entity::find_by_id(flight_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Flight not found".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEE_RATE: Decimal = Decimal::from_parts(5, 0, 0, false, 2); // 0.05

    fn dec(value: i64, scale: u32) -> Decimal {
        Decimal::new(value, scale)
    }

    fn flight_departing_at(departure: DateTime<Utc>) -> flight::Model {
        flight::Model {
            id: Uuid::new_v4(),
            flight_number: "IF1234".to_string(),
            airline_name: "iFly Air".to_string(),
            departure_city: "Beijing".to_string(),
            arrival_city: "Shanghai".to_string(),
            departure_time: departure.into(),
            arrival_time: (departure + Duration::hours(2)).into(),
            price: dec(800, 0),
            discount: dec(9, 1),
            capacity: 100,
            available_seats: 50,
            status: FlightStatus::Scheduled,
            aircraft_type: "Boeing 737".to_string(),
            seat_rows: 30,
            seats_per_row: 6,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    fn valid_ticket(flight: &flight::Model) -> ticket::Model {
        ticket::Model {
            id: Uuid::new_v4(),
            ticket_number: "TK0000000001".to_string(),
            order_id: Uuid::new_v4(),
            flight_id: flight.id,
            passenger_name: "Zhang San".to_string(),
            passenger_id_type: "id_card".to_string(),
            passenger_id_number: "110101199001011234".to_string(),
            seat_number: "10A".to_string(),
            cabin_class: CabinClass::Economy,
            price: dec(72000, 2),
            status: TicketStatus::Valid,
            checked_in: false,
            checked_in_at: None,
            boarding_pass_number: None,
            gate: None,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_fee_with_upcharge() {
        // 720.00 economy ticket moving to a 1000 x 1.0 flight
        let fees = calculate_fee(dec(72000, 2), dec(1000, 0), dec(10, 1), CabinClass::Economy, FEE_RATE);
        assert_eq!(fees.new_price, dec(100000, 2));
        assert_eq!(fees.price_difference, dec(28000, 2));
        assert_eq!(fees.reschedule_fee, dec(3600, 2));
        assert_eq!(fees.total_to_pay, dec(31600, 2));
        assert_eq!(fees.refund_amount, Decimal::ZERO);
    }

    #[test]
    fn test_fee_with_partial_refund() {
        // 2000.00 ticket moving to a 1500.00 fare; fee 100.00
        let fees = calculate_fee(dec(200000, 2), dec(1500, 0), dec(10, 1), CabinClass::Economy, FEE_RATE);
        assert_eq!(fees.price_difference, dec(-50000, 2));
        assert_eq!(fees.reschedule_fee, dec(10000, 2));
        assert_eq!(fees.refund_amount, dec(40000, 2));
        assert_eq!(fees.total_to_pay, dec(10000, 2));
    }

    #[test]
    fn test_fee_absorbs_small_price_drop() {
        // Drop (20.00) smaller than the fee (50.00): pay the remainder
        let fees = calculate_fee(dec(100000, 2), dec(980, 0), dec(10, 1), CabinClass::Economy, FEE_RATE);
        assert_eq!(fees.price_difference, dec(-2000, 2));
        assert_eq!(fees.reschedule_fee, dec(5000, 2));
        assert_eq!(fees.refund_amount, Decimal::ZERO);
        assert_eq!(fees.total_to_pay, dec(3000, 2));
    }

    #[test]
    fn test_fee_on_equal_fares() {
        let fees = calculate_fee(dec(50000, 2), dec(500, 0), dec(10, 1), CabinClass::Economy, FEE_RATE);
        assert_eq!(fees.price_difference, Decimal::ZERO);
        assert_eq!(fees.total_to_pay, fees.reschedule_fee);
        assert_eq!(fees.refund_amount, Decimal::ZERO);
    }

    #[test]
    fn test_fee_respects_target_cabin() {
        // Business multiplier 2.5 on a 400 x 1.0 base
        let fees = calculate_fee(dec(72000, 2), dec(400, 0), dec(10, 1), CabinClass::Business, FEE_RATE);
        assert_eq!(fees.new_price, dec(100000, 2));
    }

    #[test]
    fn test_cutoff_boundary() {
        let now = Utc::now();

        // Exactly two hours out: rejected
        let flight = flight_departing_at(now + Duration::hours(2));
        let ticket = valid_ticket(&flight);
        assert!(matches!(
            ensure_reschedulable(&ticket, &flight, now, 2),
            Err(AppError::RescheduleTimeLimit(_))
        ));

        // One second past the cutoff: allowed
        let flight = flight_departing_at(now + Duration::hours(2) + Duration::seconds(1));
        let ticket = valid_ticket(&flight);
        assert!(ensure_reschedulable(&ticket, &flight, now, 2).is_ok());
    }

    #[test]
    fn test_departed_flight_rejected() {
        let now = Utc::now();
        let flight = flight_departing_at(now - Duration::minutes(5));
        let ticket = valid_ticket(&flight);
        assert!(matches!(
            ensure_reschedulable(&ticket, &flight, now, 2),
            Err(AppError::FlightDeparted(_))
        ));
    }

    #[test]
    fn test_non_valid_or_checked_in_tickets_rejected() {
        let now = Utc::now();
        let flight = flight_departing_at(now + Duration::days(1));

        let mut ticket = valid_ticket(&flight);
        ticket.status = TicketStatus::Refunded;
        assert!(matches!(
            ensure_reschedulable(&ticket, &flight, now, 2),
            Err(AppError::InvalidState(_))
        ));

        let mut ticket = valid_ticket(&flight);
        ticket.checked_in = true;
        assert!(matches!(
            ensure_reschedulable(&ticket, &flight, now, 2),
            Err(AppError::InvalidState(_))
        ));
    }
}
