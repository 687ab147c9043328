use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

pub type AppResult<T> = Result<T, AppError>;

/// Application error taxonomy. Each variant maps to a machine code and
/// an HTTP status at the response boundary; services raise these and
/// the request layer formats them.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidArgument(String),

    /// Operation disallowed from the entity's current status.
    #[error("{0}")]
    InvalidState(String),

    #[error("seat {0} is already taken")]
    SeatTaken(String),

    /// Flight has no seats left for the requested count.
    #[error("{0}")]
    InsufficientSeats(String),

    #[error("{0}")]
    FlightDeparted(String),

    /// Reschedule attempted inside the minimum-hours cutoff.
    #[error("{0}")]
    RescheduleTimeLimit(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    /// Lock timeout or serialization failure; the caller may retry with
    /// fresh reads.
    #[error("{0}")]
    ConcurrencyAbort(String),

    #[error("{0}")]
    Internal(String),

    #[error("database error: {0}")]
    Database(sea_orm::DbErr),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::InvalidArgument(_) => (StatusCode::BAD_REQUEST, "invalid_argument"),
            AppError::InvalidState(_) => (StatusCode::CONFLICT, "invalid_state"),
            AppError::SeatTaken(_) => (StatusCode::CONFLICT, "seat_taken"),
            AppError::InsufficientSeats(_) => (StatusCode::CONFLICT, "no_seats"),
            AppError::FlightDeparted(_) => (StatusCode::CONFLICT, "flight_departed"),
            AppError::RescheduleTimeLimit(_) => (StatusCode::CONFLICT, "time_limit"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            AppError::ConcurrencyAbort(_) => (StatusCode::CONFLICT, "concurrency_abort"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        let message = err.to_string();
        // Postgres 40001 (serialization_failure) and 55P03 (lock_not_available)
        if message.contains("40001")
            || message.contains("55P03")
            || message.contains("could not serialize")
            || message.contains("lock timeout")
        {
            AppError::ConcurrencyAbort(message)
        } else {
            AppError::Database(err)
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        if status.is_server_error() {
            tracing::error!(code, error = %self, "request failed");
        }

        let body = Json(json!({
            "code": code,
            "detail": self.to_string(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let (status, code) = AppError::SeatTaken("12A".to_string()).status_and_code();
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(code, "seat_taken");

        let (status, code) = AppError::NotFound("flight".to_string()).status_and_code();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(code, "not_found");
    }

    #[test]
    fn test_serialization_failures_become_concurrency_aborts() {
        let err = sea_orm::DbErr::Custom(
            "ERROR: could not serialize access due to concurrent update (40001)".to_string(),
        );
        assert!(matches!(AppError::from(err), AppError::ConcurrencyAbort(_)));

        let err = sea_orm::DbErr::Custom("connection closed".to_string());
        assert!(matches!(AppError::from(err), AppError::Database(_)));
    }
}
