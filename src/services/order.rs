use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::entities::flight::FlightStatus;
use crate::entities::order::{self, OrderStatus};
use crate::entities::ticket::{self, CabinClass, TicketStatus};
use crate::error::{AppError, AppResult};
use crate::services::inventory;
use crate::services::settings::BusinessSettings;
use crate::services::ticket::unique_ticket_number;
use crate::utils::numbers;

pub fn cabin_multiplier(cabin: CabinClass) -> Decimal {
    match cabin {
        CabinClass::Economy => Decimal::ONE,
        CabinClass::Business => Decimal::new(25, 1),
        CabinClass::First => Decimal::new(40, 1),
    }
}

/// Fare for one seat: base price x cabin multiplier x discount, rounded
/// to two decimals (banker's rounding).
pub fn ticket_fare(base_price: Decimal, discount: Decimal, cabin: CabinClass) -> Decimal {
    (base_price * cabin_multiplier(cabin) * discount).round_dp(2)
}

#[derive(Debug, Clone)]
pub struct PassengerInput {
    pub name: String,
    pub id_type: String,
    pub id_number: String,
}

#[derive(Debug, Clone)]
pub struct ContactInput {
    pub name: String,
    pub phone: String,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct CreateOrderInput {
    pub user_id: Uuid,
    pub flight_id: Uuid,
    pub cabin_class: CabinClass,
    pub seat_numbers: Vec<String>,
    pub passengers: Vec<PassengerInput>,
    pub contact: ContactInput,
    pub payment_method: Option<String>,
    pub total_price: Decimal,
}

/// Create a pending order with one valid ticket per passenger. Seat
/// uniqueness and the inventory decrement happen under the flight row
/// lock in a single transaction.
pub async fn create_order(
    db: &DatabaseConnection,
    input: CreateOrderInput,
) -> AppResult<(order::Model, Vec<ticket::Model>)> {
    if input.passengers.is_empty() {
        return Err(AppError::InvalidArgument(
            "At least one passenger is required".to_string(),
        ));
    }
    if input.seat_numbers.len() != input.passengers.len() {
        return Err(AppError::InvalidArgument(
            "Seat count must match passenger count".to_string(),
        ));
    }

    let txn = db.begin().await?;

    let flight = inventory::lock_flight(&txn, input.flight_id).await?;

    let now = Utc::now();
    match flight.status {
        FlightStatus::Canceled => {
            return Err(AppError::InvalidState(
                "Flight has been canceled".to_string(),
            ));
        }
        FlightStatus::Departed => {
            return Err(AppError::FlightDeparted(
                "Flight has already departed".to_string(),
            ));
        }
        _ => {}
    }
    if flight.departure_time.with_timezone(&Utc) <= now {
        return Err(AppError::FlightDeparted(
            "Flight is past its departure time".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for seat in &input.seat_numbers {
        if !seen.insert(seat.as_str()) {
            return Err(AppError::SeatTaken(seat.clone()));
        }
        if inventory::seat_occupied(&txn, flight.id, seat).await? {
            return Err(AppError::SeatTaken(seat.clone()));
        }
    }

    let count = input.seat_numbers.len() as i32;
    if !inventory::reserve_seats(&txn, flight.id, count).await? {
        return Err(AppError::InsufficientSeats(format!(
            "Flight {} does not have {} seats available",
            flight.flight_number, count
        )));
    }

    let fare = ticket_fare(flight.price, flight.discount, input.cabin_class);
    let expected_total = (fare * Decimal::from(count)).round_dp(2);
    if expected_total != input.total_price {
        return Err(AppError::InvalidArgument(format!(
            "Total price mismatch: expected {}",
            expected_total
        )));
    }

    let business = BusinessSettings::load(&txn).await?;
    let expires_at = now + Duration::minutes(business.payment_timeout_minutes);

    let order = order::ActiveModel {
        id: Set(Uuid::new_v4()),
        order_number: Set(unique_order_number(&txn).await?),
        user_id: Set(input.user_id),
        total_price: Set(expected_total),
        status: Set(OrderStatus::Pending),
        payment_method: Set(input.payment_method.clone()),
        contact_name: Set(Some(input.contact.name.clone())),
        contact_phone: Set(Some(input.contact.phone.clone())),
        contact_email: Set(Some(input.contact.email.clone())),
        created_at: Set(now.into()),
        paid_at: Set(None),
        expires_at: Set(Some(expires_at.into())),
    }
    .insert(&txn)
    .await?;

    let mut tickets = Vec::with_capacity(input.passengers.len());
    for (passenger, seat) in input.passengers.iter().zip(&input.seat_numbers) {
        let ticket = ticket::ActiveModel {
            id: Set(Uuid::new_v4()),
            ticket_number: Set(unique_ticket_number(&txn).await?),
            order_id: Set(order.id),
            flight_id: Set(flight.id),
            passenger_name: Set(passenger.name.clone()),
            passenger_id_type: Set(passenger.id_type.clone()),
            passenger_id_number: Set(passenger.id_number.clone()),
            seat_number: Set(seat.clone()),
            cabin_class: Set(input.cabin_class),
            price: Set(fare),
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
        tickets.push(ticket);
    }

    txn.commit().await?;
    Ok((order, tickets))
}

/// Transition `pending -> paid` under the order row lock.
pub async fn pay_order(db: &DatabaseConnection, order_id: Uuid) -> AppResult<order::Model> {
    let txn = db.begin().await?;

    let order = lock_order(&txn, order_id).await?;
    if order.status != OrderStatus::Pending {
        return Err(AppError::InvalidState(
            "Only pending orders can be paid".to_string(),
        ));
    }

    let mut active: order::ActiveModel = order.into();
    active.status = Set(OrderStatus::Paid);
    active.paid_at = Set(Some(Utc::now().into()));
    let updated = active.update(&txn).await?;

    txn.commit().await?;
    Ok(updated)
}

/// User- or admin-initiated cancel: allowed from `pending` or `paid`.
/// Still-valid tickets become `refunded` and their seats are released.
pub async fn cancel_order(db: &DatabaseConnection, order_id: Uuid) -> AppResult<order::Model> {
    let txn = db.begin().await?;

    let order = lock_order(&txn, order_id).await?;
    if !matches!(order.status, OrderStatus::Pending | OrderStatus::Paid) {
        return Err(AppError::InvalidState(format!(
            "Order {} cannot be canceled from its current status",
            order.order_number
        )));
    }

    release_order_tickets(&txn, order.id, TicketStatus::Refunded).await?;

    let mut active: order::ActiveModel = order.into();
    active.status = Set(OrderStatus::Canceled);
    let updated = active.update(&txn).await?;

    txn.commit().await?;
    Ok(updated)
}

/// Admin settlement: `paid -> completed`.
pub async fn settle_order(db: &DatabaseConnection, order_id: Uuid) -> AppResult<order::Model> {
    let txn = db.begin().await?;

    let order = lock_order(&txn, order_id).await?;
    if order.status != OrderStatus::Paid {
        return Err(AppError::InvalidState(
            "Only paid orders can be completed".to_string(),
        ));
    }

    let mut active: order::ActiveModel = order.into();
    active.status = Set(OrderStatus::Completed);
    let updated = active.update(&txn).await?;

    txn.commit().await?;
    Ok(updated)
}

/// Seconds until the payment deadline; zero for anything that is not a
/// pending order with a deadline still ahead.
pub fn remaining_seconds(order: &order::Model, now: DateTime<Utc>) -> i64 {
    if order.status != OrderStatus::Pending {
        return 0;
    }
    let Some(expires_at) = order.expires_at else {
        return 0;
    };
    (expires_at.with_timezone(&Utc) - now).num_seconds().max(0)
}

pub async fn lock_order(txn: &DatabaseTransaction, order_id: Uuid) -> AppResult<order::Model> {
    order::Entity::find_by_id(order_id)
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))
}

/// Move the order's still-valid tickets to `terminal_status` and give
/// their seats back, grouped per flight. Used by both the user cancel
/// path (`refunded`) and the expiry sweeper (`canceled`).
pub(crate) async fn release_order_tickets(
    txn: &DatabaseTransaction,
    order_id: Uuid,
    terminal_status: TicketStatus,
) -> AppResult<()> {
    let tickets = ticket::Entity::find()
        .filter(ticket::Column::OrderId.eq(order_id))
        .filter(ticket::Column::Status.eq(TicketStatus::Valid))
        .all(txn)
        .await?;

    let mut seats_by_flight: HashMap<Uuid, i32> = HashMap::new();
    for t in &tickets {
        *seats_by_flight.entry(t.flight_id).or_insert(0) += 1;
    }
    for (flight_id, count) in seats_by_flight {
        inventory::release_seats(txn, flight_id, count).await?;
    }

    let now = Utc::now();
    for t in tickets {
        let mut active: ticket::ActiveModel = t.into();
        active.status = Set(terminal_status);
        active.updated_at = Set(now.into());
        active.update(txn).await?;
    }
    Ok(())
}

pub(crate) async fn unique_order_number<C: ConnectionTrait>(conn: &C) -> AppResult<String> {
    for _ in 0..5 {
        let candidate = numbers::order_number();
        let exists = order::Entity::find()
            .filter(order::Column::OrderNumber.eq(&candidate))
            .one(conn)
            .await?
            .is_some();
        if !exists {
            return Ok(candidate);
        }
    }
    Err(AppError::Internal(
        "Could not allocate a unique order number".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending_order(expires_at: Option<DateTime<Utc>>) -> order::Model {
        order::Model {
            id: Uuid::new_v4(),
            order_number: "ORD00000001".to_string(),
            user_id: Uuid::new_v4(),
            total_price: Decimal::new(72000, 2),
            status: OrderStatus::Pending,
            payment_method: None,
            contact_name: None,
            contact_phone: None,
            contact_email: None,
            created_at: Utc::now().into(),
            paid_at: None,
            expires_at: expires_at.map(Into::into),
        }
    }

    #[test]
    fn test_cabin_multipliers() {
        assert_eq!(cabin_multiplier(CabinClass::Economy), Decimal::ONE);
        assert_eq!(cabin_multiplier(CabinClass::Business), Decimal::new(25, 1));
        assert_eq!(cabin_multiplier(CabinClass::First), Decimal::new(40, 1));
    }

    #[test]
    fn test_ticket_fare_applies_discount_and_cabin() {
        let base = Decimal::new(800, 0);
        let discount = Decimal::new(9, 1); // 0.9
        assert_eq!(
            ticket_fare(base, discount, CabinClass::Economy),
            Decimal::new(72000, 2)
        );
        assert_eq!(
            ticket_fare(base, discount, CabinClass::Business),
            Decimal::new(180000, 2)
        );
        assert_eq!(
            ticket_fare(base, discount, CabinClass::First),
            Decimal::new(288000, 2)
        );
    }

    #[test]
    fn test_remaining_seconds_counts_down() {
        let now = Utc::now();
        let order = pending_order(Some(now + Duration::minutes(30)));
        assert_eq!(remaining_seconds(&order, now), 30 * 60);
    }

    #[test]
    fn test_remaining_seconds_zero_at_and_after_expiry() {
        let now = Utc::now();
        let order = pending_order(Some(now));
        assert_eq!(remaining_seconds(&order, now), 0);

        let order = pending_order(Some(now - Duration::seconds(1)));
        assert_eq!(remaining_seconds(&order, now), 0);
    }

    #[test]
    fn test_remaining_seconds_zero_for_non_pending() {
        let now = Utc::now();
        let mut order = pending_order(Some(now + Duration::minutes(30)));
        order.status = OrderStatus::Paid;
        assert_eq!(remaining_seconds(&order, now), 0);

        let order = pending_order(None);
        assert_eq!(remaining_seconds(&order, now), 0);
    }
}
