use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::flight::{self, FlightStatus};
use crate::entities::ticket::{self, CabinClass, TicketStatus};
use crate::error::{AppError, AppResult};
use crate::services::order::ticket_fare;
use crate::utils::seatmap;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct FlightSearchQuery {
    pub departure_city: Option<String>,
    pub arrival_city: Option<String>,
    pub date: Option<NaiveDate>,
    pub status: Option<FlightStatus>,
}

#[derive(Debug, Serialize)]
pub struct FlightResponse {
    pub id: Uuid,
    pub flight_number: String,
    pub airline_name: String,
    pub departure_city: String,
    pub arrival_city: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub price: Decimal,
    pub discount: Decimal,
    pub capacity: i32,
    pub available_seats: i32,
    pub status: FlightStatus,
    pub aircraft_type: String,
    pub seat_rows: i32,
    pub seats_per_row: i32,
}

impl From<flight::Model> for FlightResponse {
    fn from(f: flight::Model) -> Self {
        Self {
            id: f.id,
            flight_number: f.flight_number,
            airline_name: f.airline_name,
            departure_city: f.departure_city,
            arrival_city: f.arrival_city,
            departure_time: f.departure_time.with_timezone(&Utc),
            arrival_time: f.arrival_time.with_timezone(&Utc),
            price: f.price,
            discount: f.discount,
            capacity: f.capacity,
            available_seats: f.available_seats,
            status: f.status,
            aircraft_type: f.aircraft_type,
            seat_rows: f.seat_rows,
            seats_per_row: f.seats_per_row,
        }
    }
}

/// Search flights by route, date and status
pub async fn list_flights(
    State(state): State<AppState>,
    Query(params): Query<FlightSearchQuery>,
) -> AppResult<Json<Vec<FlightResponse>>> {
    let mut query = flight::Entity::find();

    if let Some(city) = &params.departure_city {
        query = query.filter(flight::Column::DepartureCity.eq(city));
    }
    if let Some(city) = &params.arrival_city {
        query = query.filter(flight::Column::ArrivalCity.eq(city));
    }
    if let Some(date) = params.date {
        let start = date.and_time(NaiveTime::MIN).and_utc();
        let end = start + Duration::days(1);
        query = query
            .filter(flight::Column::DepartureTime.gte(start))
            .filter(flight::Column::DepartureTime.lt(end));
    }
    if let Some(status) = params.status {
        query = query.filter(flight::Column::Status.eq(status));
    }

    let flights = query
        .order_by_asc(flight::Column::DepartureTime)
        .all(&state.db)
        .await?;

    Ok(Json(flights.into_iter().map(FlightResponse::from).collect()))
}

/// Get flight details
pub async fn get_flight(
    State(state): State<AppState>,
    Path(flight_id): Path<Uuid>,
) -> AppResult<Json<FlightResponse>> {
    let flight = find_flight(&state, flight_id).await?;
    Ok(Json(flight.into()))
}

#[derive(Debug, Deserialize)]
pub struct CabinQuery {
    pub cabin_class: Option<CabinClass>,
}

#[derive(Debug, Serialize)]
pub struct SeatCell {
    pub seat: String,
    pub taken: bool,
}

#[derive(Debug, Serialize)]
pub struct SeatMapResponse {
    pub flight_id: Uuid,
    pub cabin_class: CabinClass,
    pub seat_map: Vec<Vec<SeatCell>>,
    pub occupied_seats: Vec<String>,
    pub rows: i32,
    pub columns: i32,
    pub start_row: i32,
    pub end_row: i32,
}

/// Seat layout for one cabin, with occupancy from valid tickets
pub async fn seat_map(
    State(state): State<AppState>,
    Path(flight_id): Path<Uuid>,
    Query(params): Query<CabinQuery>,
) -> AppResult<Json<SeatMapResponse>> {
    let flight = find_flight(&state, flight_id).await?;

    let rows = if flight.seat_rows > 0 { flight.seat_rows } else { 30 };
    let per_row = if flight.seats_per_row > 0 { flight.seats_per_row } else { 6 };
    let cabin = params.cabin_class.unwrap_or(CabinClass::Economy);
    let (start_row, end_row) = seatmap::cabin_row_range(cabin, rows);

    let occupied: Vec<String> = ticket::Entity::find()
        .filter(ticket::Column::FlightId.eq(flight.id))
        .filter(ticket::Column::Status.is_in([TicketStatus::Valid, TicketStatus::Used]))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|t| t.seat_number)
        .collect();

    let mut grid = Vec::new();
    for row in start_row..=end_row {
        let mut cells = Vec::with_capacity(per_row as usize);
        for column in 0..per_row {
            let seat = seatmap::seat_label(row, column);
            let taken = occupied.contains(&seat);
            cells.push(SeatCell { seat, taken });
        }
        grid.push(cells);
    }

    let cabin_occupied: Vec<String> = occupied
        .into_iter()
        .filter(|seat| {
            seatmap::seat_row(seat)
                .map(|row| row >= start_row && row <= end_row)
                .unwrap_or(false)
        })
        .collect();

    Ok(Json(SeatMapResponse {
        flight_id: flight.id,
        cabin_class: cabin,
        rows: (end_row - start_row + 1).max(0),
        columns: per_row,
        start_row,
        end_row,
        seat_map: grid,
        occupied_seats: cabin_occupied,
    }))
}

#[derive(Debug, Serialize)]
pub struct FareQuoteResponse {
    pub flight_id: Uuid,
    pub cabin_class: CabinClass,
    pub base_price: Decimal,
    pub discount: Decimal,
    pub fare: Decimal,
}

/// Fare for one seat in the requested cabin
pub async fn fare_quote(
    State(state): State<AppState>,
    Path(flight_id): Path<Uuid>,
    Query(params): Query<CabinQuery>,
) -> AppResult<Json<FareQuoteResponse>> {
    let flight = find_flight(&state, flight_id).await?;
    let cabin = params.cabin_class.unwrap_or(CabinClass::Economy);

    Ok(Json(FareQuoteResponse {
        flight_id: flight.id,
        cabin_class: cabin,
        base_price: flight.price,
        discount: flight.discount,
        fare: ticket_fare(flight.price, flight.discount, cabin),
    }))
}

async fn find_flight(state: &AppState, flight_id: Uuid) -> AppResult<flight::Model> {
    flight::Entity::find_by_id(flight_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Flight not found".to_string()))
}
