use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::order::{self, OrderStatus};
use crate::entities::ticket::{self, CabinClass, TicketStatus};
use crate::entities::user::UserRole;
use crate::error::{AppError, AppResult};
use crate::services::order as order_service;
use crate::utils::jwt::Claims;
use crate::AppState;

fn default_id_type() -> String {
    "id_card".to_string()
}

#[derive(Debug, Deserialize)]
pub struct PassengerPayload {
    pub name: String,
    #[serde(default = "default_id_type")]
    pub id_type: String,
    pub id_number: String,
}

#[derive(Debug, Deserialize)]
pub struct ContactPayload {
    pub name: String,
    pub phone: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub flight_id: Uuid,
    pub cabin_class: CabinClass,
    pub seat_numbers: Vec<String>,
    pub passengers: Vec<PassengerPayload>,
    pub contact_info: ContactPayload,
    pub payment_method: Option<String>,
    pub total_price: Decimal,
}

#[derive(Debug, Serialize)]
pub struct TicketInfo {
    pub id: Uuid,
    pub ticket_number: String,
    pub flight_id: Uuid,
    pub passenger_name: String,
    pub seat_number: String,
    pub cabin_class: CabinClass,
    pub price: Decimal,
    pub status: TicketStatus,
    pub checked_in: bool,
    pub boarding_pass_number: Option<String>,
    pub gate: Option<String>,
}

impl From<ticket::Model> for TicketInfo {
    fn from(t: ticket::Model) -> Self {
        Self {
            id: t.id,
            ticket_number: t.ticket_number,
            flight_id: t.flight_id,
            passenger_name: t.passenger_name,
            seat_number: t.seat_number,
            cabin_class: t.cabin_class,
            price: t.price,
            status: t.status,
            checked_in: t.checked_in,
            boarding_pass_number: t.boarding_pass_number,
            gate: t.gate,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_number: String,
    pub status: OrderStatus,
    pub total_price: Decimal,
    pub payment_method: Option<String>,
    pub contact_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub remaining_seconds: i64,
    pub tickets: Vec<TicketInfo>,
}

fn order_response(order: order::Model, tickets: Vec<ticket::Model>) -> OrderResponse {
    let remaining_seconds = order_service::remaining_seconds(&order, Utc::now());
    OrderResponse {
        id: order.id,
        order_number: order.order_number,
        status: order.status,
        total_price: order.total_price,
        payment_method: order.payment_method,
        contact_name: order.contact_name,
        created_at: order.created_at.with_timezone(&Utc),
        paid_at: order.paid_at.map(|t| t.with_timezone(&Utc)),
        expires_at: order.expires_at.map(|t| t.with_timezone(&Utc)),
        remaining_seconds,
        tickets: tickets.into_iter().map(TicketInfo::from).collect(),
    }
}

/// Create an order with one ticket per passenger
pub async fn create_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<Json<OrderResponse>> {
    let input = order_service::CreateOrderInput {
        user_id: claims.sub,
        flight_id: payload.flight_id,
        cabin_class: payload.cabin_class,
        seat_numbers: payload.seat_numbers,
        passengers: payload
            .passengers
            .into_iter()
            .map(|p| order_service::PassengerInput {
                name: p.name,
                id_type: p.id_type,
                id_number: p.id_number,
            })
            .collect(),
        contact: order_service::ContactInput {
            name: payload.contact_info.name,
            phone: payload.contact_info.phone,
            email: payload.contact_info.email,
        },
        payment_method: payload.payment_method,
        total_price: payload.total_price,
    };

    let (order, tickets) = order_service::create_order(&state.db, input).await?;
    state.notifier.order_event(&order, "created");

    Ok(Json(order_response(order, tickets)))
}

/// List own orders; admins see every order
pub async fn my_orders(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<OrderResponse>>> {
    let mut query = order::Entity::find();
    if claims.role != UserRole::Admin {
        query = query.filter(order::Column::UserId.eq(claims.sub));
    }
    let orders = query
        .order_by_desc(order::Column::CreatedAt)
        .all(&state.db)
        .await?;

    let mut responses = Vec::with_capacity(orders.len());
    for order in orders {
        let tickets = ticket::Entity::find()
            .filter(ticket::Column::OrderId.eq(order.id))
            .all(&state.db)
            .await?;
        responses.push(order_response(order, tickets));
    }

    Ok(Json(responses))
}

/// Get one order by id or by order number (ORD-prefixed)
pub async fn get_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(order_ref): Path<String>,
) -> AppResult<Json<OrderResponse>> {
    let order = find_order(&state, &claims, &order_ref).await?;
    let tickets = ticket::Entity::find()
        .filter(ticket::Column::OrderId.eq(order.id))
        .all(&state.db)
        .await?;

    Ok(Json(order_response(order, tickets)))
}

/// Confirm payment for a pending order
pub async fn pay_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(order_ref): Path<String>,
) -> AppResult<Json<OrderResponse>> {
    let order = find_order(&state, &claims, &order_ref).await?;

    let updated = order_service::pay_order(&state.db, order.id).await?;
    state.notifier.order_event(&updated, "paid");

    let tickets = ticket::Entity::find()
        .filter(ticket::Column::OrderId.eq(updated.id))
        .all(&state.db)
        .await?;
    Ok(Json(order_response(updated, tickets)))
}

/// Cancel a pending or paid order, refunding its tickets
pub async fn cancel_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(order_ref): Path<String>,
) -> AppResult<Json<OrderResponse>> {
    let order = find_order(&state, &claims, &order_ref).await?;

    let updated = order_service::cancel_order(&state.db, order.id).await?;
    state.notifier.order_event(&updated, "canceled");

    let tickets = ticket::Entity::find()
        .filter(ticket::Column::OrderId.eq(updated.id))
        .all(&state.db)
        .await?;
    Ok(Json(order_response(updated, tickets)))
}

#[derive(Debug, Serialize)]
pub struct RemainingTimeResponse {
    pub order_number: String,
    pub remaining_seconds: i64,
}

/// Seconds left before an unpaid order expires
pub async fn remaining_time(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(order_ref): Path<String>,
) -> AppResult<Json<RemainingTimeResponse>> {
    let order = find_order(&state, &claims, &order_ref).await?;
    Ok(Json(RemainingTimeResponse {
        remaining_seconds: order_service::remaining_seconds(&order, Utc::now()),
        order_number: order.order_number,
    }))
}

/// Look an order up by id or order number and enforce ownership
async fn find_order(
    state: &AppState,
    claims: &Claims,
    order_ref: &str,
) -> AppResult<order::Model> {
    let order = if order_ref.starts_with("ORD") {
        order::Entity::find()
            .filter(order::Column::OrderNumber.eq(order_ref))
            .one(&state.db)
            .await?
    } else {
        let id: Uuid = order_ref
            .parse()
            .map_err(|_| AppError::InvalidArgument("Invalid order reference".to_string()))?;
        order::Entity::find_by_id(id).one(&state.db).await?
    };

    let order = order.ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

    if claims.role != UserRole::Admin && order.user_id != claims.sub {
        return Err(AppError::Forbidden(
            "You can only access your own orders".to_string(),
        ));
    }
    Ok(order)
}
