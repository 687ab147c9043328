use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use serde::Serialize;

use crate::entities::flight::{self, FlightStatus};
use crate::error::AppResult;

/// Mark scheduled flights past their departure instant as departed.
pub async fn update_departed_flights(db: &DatabaseConnection) -> AppResult<u64> {
    let now = Utc::now();
    let flights = flight::Entity::find()
        .filter(flight::Column::Status.eq(FlightStatus::Scheduled))
        .filter(flight::Column::DepartureTime.lte(now))
        .all(db)
        .await?;

    let count = flights.len() as u64;
    for f in flights {
        let mut active: flight::ActiveModel = f.into();
        active.status = Set(FlightStatus::Departed);
        active.updated_at = Set(now.into());
        active.update(db).await?;
    }

    if count > 0 {
        tracing::info!(count, "marked flights as departed");
    }
    Ok(count)
}

/// Reconcile scheduled flights that have sold out to `full`.
pub async fn update_full_flights(db: &DatabaseConnection) -> AppResult<u64> {
    let now = Utc::now();
    let flights = flight::Entity::find()
        .filter(flight::Column::Status.eq(FlightStatus::Scheduled))
        .filter(flight::Column::AvailableSeats.eq(0))
        .all(db)
        .await?;

    let count = flights.len() as u64;
    for f in flights {
        let mut active: flight::ActiveModel = f.into();
        active.status = Set(FlightStatus::Full);
        active.updated_at = Set(now.into());
        active.update(db).await?;
    }

    if count > 0 {
        tracing::info!(count, "marked flights as full");
    }
    Ok(count)
}

/// Reconcile full flights that have seats again back to `scheduled`.
pub async fn restore_available_flights(db: &DatabaseConnection) -> AppResult<u64> {
    let now = Utc::now();
    let flights = flight::Entity::find()
        .filter(flight::Column::Status.eq(FlightStatus::Full))
        .filter(flight::Column::AvailableSeats.gt(0))
        .all(db)
        .await?;

    let count = flights.len() as u64;
    for f in flights {
        let mut active: flight::ActiveModel = f.into();
        active.status = Set(FlightStatus::Scheduled);
        active.updated_at = Set(now.into());
        active.update(db).await?;
    }

    if count > 0 {
        tracing::info!(count, "restored full flights to scheduled");
    }
    Ok(count)
}

#[derive(Debug, Default, Serialize)]
pub struct StatusUpdateOutcome {
    pub departed: u64,
    pub full: u64,
    pub restored: u64,
}

/// Run every maintenance pass. The per-flight derivation in the
/// inventory service stays the source of truth; this periodic pass
/// catches time-driven transitions and heals any drift.
pub async fn run_all_updates(db: &DatabaseConnection) -> AppResult<StatusUpdateOutcome> {
    let outcome = StatusUpdateOutcome {
        departed: update_departed_flights(db).await?,
        full: update_full_flights(db).await?,
        restored: restore_available_flights(db).await?,
    };

    if outcome.departed + outcome.full + outcome.restored > 0 {
        tracing::info!(
            departed = outcome.departed,
            full = outcome.full,
            restored = outcome.restored,
            "flight status maintenance complete"
        );
    }
    Ok(outcome)
}
