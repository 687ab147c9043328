use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::flight::{self, FlightStatus};
use crate::entities::order;
use crate::entities::system_setting;
use crate::entities::ticket;
use crate::entities::user::{self, UserRole};
use crate::error::{AppError, AppResult};
use crate::handlers::flight::FlightResponse;
use crate::handlers::order::TicketInfo;
use crate::services::flight_status::{self, StatusUpdateOutcome};
use crate::services::order as order_service;
use crate::services::settings::{BusinessSettings, BUSINESS_CATEGORY};
use crate::services::timeout::{self, SweepOutcome};
use crate::AppState;

// ============ Flight Management ============

#[derive(Debug, Deserialize)]
pub struct CreateFlightRequest {
    pub flight_number: String,
    pub airline_name: String,
    pub departure_city: String,
    pub arrival_city: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub price: Decimal,
    pub discount: Decimal,
    pub capacity: i32,
    pub aircraft_type: String,
    pub seat_rows: i32,
    pub seats_per_row: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateFlightRequest {
    pub departure_time: Option<DateTime<Utc>>,
    pub arrival_time: Option<DateTime<Utc>>,
    pub price: Option<Decimal>,
    pub discount: Option<Decimal>,
    pub aircraft_type: Option<String>,
}

fn validate_schedule(departure: DateTime<Utc>, arrival: DateTime<Utc>) -> AppResult<()> {
    if arrival <= departure {
        return Err(AppError::InvalidArgument(
            "Arrival time must be after departure time".to_string(),
        ));
    }
    Ok(())
}

fn validate_discount(discount: Decimal) -> AppResult<()> {
    if discount < Decimal::ZERO || discount > Decimal::ONE {
        return Err(AppError::InvalidArgument(
            "Discount must be between 0 and 1".to_string(),
        ));
    }
    Ok(())
}

/// List every flight (admin)
pub async fn list_flights(State(state): State<AppState>) -> AppResult<Json<Vec<FlightResponse>>> {
    let flights = flight::Entity::find()
        .order_by_asc(flight::Column::DepartureTime)
        .all(&state.db)
        .await?;
    Ok(Json(flights.into_iter().map(FlightResponse::from).collect()))
}

/// Create a flight with a full seat inventory (admin)
pub async fn create_flight(
    State(state): State<AppState>,
    Json(payload): Json<CreateFlightRequest>,
) -> AppResult<Json<FlightResponse>> {
    validate_schedule(payload.departure_time, payload.arrival_time)?;
    validate_discount(payload.discount)?;
    if payload.capacity < 0 {
        return Err(AppError::InvalidArgument(
            "Capacity cannot be negative".to_string(),
        ));
    }
    if payload.seat_rows < 0 || payload.seats_per_row < 0 {
        return Err(AppError::InvalidArgument(
            "Seat layout cannot be negative".to_string(),
        ));
    }

    let existing = flight::Entity::find()
        .filter(flight::Column::FlightNumber.eq(&payload.flight_number))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(format!(
            "Flight number {} already exists",
            payload.flight_number
        )));
    }

    let now = Utc::now();
    let created = flight::ActiveModel {
        id: Set(Uuid::new_v4()),
        flight_number: Set(payload.flight_number),
        airline_name: Set(payload.airline_name),
        departure_city: Set(payload.departure_city),
        arrival_city: Set(payload.arrival_city),
        departure_time: Set(payload.departure_time.into()),
        arrival_time: Set(payload.arrival_time.into()),
        price: Set(payload.price.round_dp(2)),
        discount: Set(payload.discount),
        capacity: Set(payload.capacity),
        available_seats: Set(payload.capacity),
        status: Set(FlightStatus::Scheduled),
        aircraft_type: Set(payload.aircraft_type),
        seat_rows: Set(payload.seat_rows),
        seats_per_row: Set(payload.seats_per_row),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.db)
    .await?;

    Ok(Json(created.into()))
}

/// Update flight schedule or pricing (admin)
pub async fn update_flight(
    State(state): State<AppState>,
    Path(flight_id): Path<Uuid>,
    Json(payload): Json<UpdateFlightRequest>,
) -> AppResult<Json<FlightResponse>> {
    let flight = flight::Entity::find_by_id(flight_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Flight not found".to_string()))?;

    let departure = payload
        .departure_time
        .unwrap_or_else(|| flight.departure_time.with_timezone(&Utc));
    let arrival = payload
        .arrival_time
        .unwrap_or_else(|| flight.arrival_time.with_timezone(&Utc));
    validate_schedule(departure, arrival)?;
    if let Some(discount) = payload.discount {
        validate_discount(discount)?;
    }

    let mut active: flight::ActiveModel = flight.into();
    if let Some(time) = payload.departure_time {
        active.departure_time = Set(time.into());
    }
    if let Some(time) = payload.arrival_time {
        active.arrival_time = Set(time.into());
    }
    if let Some(price) = payload.price {
        active.price = Set(price.round_dp(2));
    }
    if let Some(discount) = payload.discount {
        active.discount = Set(discount);
    }
    if let Some(aircraft_type) = payload.aircraft_type {
        active.aircraft_type = Set(aircraft_type);
    }
    active.updated_at = Set(Utc::now().into());

    let updated = active.update(&state.db).await?;
    Ok(Json(updated.into()))
}

/// Delete a flight and, via cascade, its tickets (admin)
pub async fn delete_flight(
    State(state): State<AppState>,
    Path(flight_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let result = flight::Entity::delete_by_id(flight_id)
        .exec(&state.db)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Flight not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "message": "Flight deleted" })))
}

/// Mark a flight as departed (admin)
pub async fn depart_flight(
    State(state): State<AppState>,
    Path(flight_id): Path<Uuid>,
) -> AppResult<Json<FlightResponse>> {
    set_flight_status(
        &state,
        flight_id,
        FlightStatus::Departed,
        &[FlightStatus::Scheduled, FlightStatus::Full],
    )
    .await
}

/// Cancel a flight (admin)
pub async fn cancel_flight(
    State(state): State<AppState>,
    Path(flight_id): Path<Uuid>,
) -> AppResult<Json<FlightResponse>> {
    set_flight_status(
        &state,
        flight_id,
        FlightStatus::Canceled,
        &[FlightStatus::Scheduled, FlightStatus::Full],
    )
    .await
}

async fn set_flight_status(
    state: &AppState,
    flight_id: Uuid,
    target: FlightStatus,
    allowed_from: &[FlightStatus],
) -> AppResult<Json<FlightResponse>> {
    let flight = flight::Entity::find_by_id(flight_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Flight not found".to_string()))?;

    if !allowed_from.contains(&flight.status) {
        return Err(AppError::InvalidState(format!(
            "Flight {} cannot transition from its current status",
            flight.flight_number
        )));
    }

    let mut active: flight::ActiveModel = flight.into();
    active.status = Set(target);
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.db).await?;

    Ok(Json(updated.into()))
}

/// Run the flight-status maintenance passes now (admin)
pub async fn update_flight_statuses(
    State(state): State<AppState>,
) -> AppResult<Json<StatusUpdateOutcome>> {
    let outcome = flight_status::run_all_updates(&state.db).await?;
    Ok(Json(outcome))
}

// ============ Order Management ============

#[derive(Debug, Serialize)]
pub struct AdminOrderInfo {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Uuid,
    pub user_email: String,
    pub status: order::OrderStatus,
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub tickets: Vec<TicketInfo>,
}

/// List every order with its tickets (admin)
pub async fn list_all_orders(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<AdminOrderInfo>>> {
    let orders = order::Entity::find()
        .order_by_desc(order::Column::CreatedAt)
        .all(&state.db)
        .await?;
    let users = user::Entity::find().all(&state.db).await?;

    let mut responses = Vec::with_capacity(orders.len());
    for o in orders {
        let tickets = ticket::Entity::find()
            .filter(ticket::Column::OrderId.eq(o.id))
            .all(&state.db)
            .await?;
        let user_email = users
            .iter()
            .find(|u| u.id == o.user_id)
            .map(|u| u.email.clone())
            .unwrap_or_default();

        responses.push(AdminOrderInfo {
            id: o.id,
            order_number: o.order_number,
            user_id: o.user_id,
            user_email,
            status: o.status,
            total_price: o.total_price,
            created_at: o.created_at.with_timezone(&Utc),
            expires_at: o.expires_at.map(|t| t.with_timezone(&Utc)),
            tickets: tickets.into_iter().map(TicketInfo::from).collect(),
        });
    }

    Ok(Json(responses))
}

/// Settle a paid order (admin)
pub async fn settle_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<order::Model>> {
    let updated = order_service::settle_order(&state.db, order_id).await?;
    state.notifier.order_event(&updated, "completed");
    Ok(Json(updated))
}

/// Cancel every expired unpaid order now (admin)
pub async fn process_expired_orders(
    State(state): State<AppState>,
) -> AppResult<Json<SweepOutcome>> {
    let outcome = timeout::process_all_expired_orders(&state.db).await;
    Ok(Json(outcome))
}

// ============ User Management ============

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

/// List all users (admin)
pub async fn list_all_users(State(state): State<AppState>) -> AppResult<Json<Vec<UserResponse>>> {
    let users = user::Entity::find().all(&state.db).await?;

    let responses: Vec<UserResponse> = users
        .into_iter()
        .map(|u| UserResponse {
            id: u.id,
            email: u.email,
            name: u.name,
            role: u.role,
            created_at: u.created_at.with_timezone(&Utc),
        })
        .collect();

    Ok(Json(responses))
}

// ============ Business Settings ============

const SETTABLE_KEYS: &[&str] = &[
    "payment_timeout",
    "reschedule_fee_rate",
    "refund_fee_rate",
    "min_reschedule_hours",
];

#[derive(Debug, Serialize)]
pub struct BusinessSettingsResponse {
    pub payment_timeout_minutes: i64,
    pub reschedule_fee_rate: Decimal,
    pub refund_fee_rate: Decimal,
    pub min_reschedule_hours: i64,
}

/// Current business rules (admin)
pub async fn get_business_settings(
    State(state): State<AppState>,
) -> AppResult<Json<BusinessSettingsResponse>> {
    let settings = BusinessSettings::load(&state.db).await?;
    Ok(Json(BusinessSettingsResponse {
        payment_timeout_minutes: settings.payment_timeout_minutes,
        reschedule_fee_rate: settings.reschedule_fee_rate,
        refund_fee_rate: settings.refund_fee_rate,
        min_reschedule_hours: settings.min_reschedule_hours,
    }))
}

/// Update business rules; values take effect on the next read (admin)
pub async fn update_business_settings(
    State(state): State<AppState>,
    Json(payload): Json<HashMap<String, String>>,
) -> AppResult<Json<BusinessSettingsResponse>> {
    for (key, value) in &payload {
        if !SETTABLE_KEYS.contains(&key.as_str()) {
            return Err(AppError::InvalidArgument(format!(
                "Unknown setting key: {}",
                key
            )));
        }

        let existing = system_setting::Entity::find()
            .filter(system_setting::Column::Category.eq(BUSINESS_CATEGORY))
            .filter(system_setting::Column::Key.eq(key))
            .one(&state.db)
            .await?;

        match existing {
            Some(row) => {
                let mut active: system_setting::ActiveModel = row.into();
                active.value = Set(value.clone());
                active.updated_at = Set(Utc::now().into());
                active.update(&state.db).await?;
            }
            None => {
                system_setting::ActiveModel {
                    category: Set(BUSINESS_CATEGORY.to_string()),
                    key: Set(key.clone()),
                    value: Set(value.clone()),
                    ..Default::default()
                }
                .insert(&state.db)
                .await?;
            }
        }
    }

    get_business_settings(State(state)).await
}
