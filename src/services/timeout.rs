use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::order::{self, OrderStatus};
use crate::entities::ticket::TicketStatus;
use crate::error::AppResult;
use crate::services::order::{lock_order, release_order_tickets};

/// Pending orders whose payment deadline has passed.
pub async fn expired_orders(db: &DatabaseConnection) -> AppResult<Vec<order::Model>> {
    let now = Utc::now();
    order::Entity::find()
        .filter(order::Column::Status.eq(OrderStatus::Pending))
        .filter(order::Column::ExpiresAt.is_not_null())
        .filter(order::Column::ExpiresAt.lt(now))
        .all(db)
        .await
        .map_err(Into::into)
}

/// Cancel one expired order. Status and deadline are rechecked under
/// the order row lock, so a concurrent payment or user cancel wins and
/// this returns `Ok(false)`. Sweeper-canceled tickets become
/// `canceled` (user cancels produce `refunded`).
pub async fn cancel_expired_order(db: &DatabaseConnection, order_id: Uuid) -> AppResult<bool> {
    let txn = db.begin().await?;

    let order = lock_order(&txn, order_id).await?;
    if order.status != OrderStatus::Pending {
        return Ok(false);
    }
    let Some(expires_at) = order.expires_at else {
        return Ok(false);
    };
    if expires_at.with_timezone(&Utc) > Utc::now() {
        return Ok(false);
    }

    release_order_tickets(&txn, order.id, TicketStatus::Canceled).await?;

    let mut active: order::ActiveModel = order.into();
    active.status = Set(OrderStatus::Canceled);
    active.update(&txn).await?;

    txn.commit().await?;
    Ok(true)
}

#[derive(Debug, Default, Serialize)]
pub struct SweepOutcome {
    pub processed: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

/// Cancel every expired pending order. Per-order failures are collected
/// rather than aborting the sweep; an order lost to a concurrent
/// transition is skipped silently.
pub async fn process_all_expired_orders(db: &DatabaseConnection) -> SweepOutcome {
    let mut outcome = SweepOutcome::default();

    let expired = match expired_orders(db).await {
        Ok(orders) => orders,
        Err(e) => {
            outcome.failed += 1;
            outcome.errors.push(format!("expired-order scan failed: {}", e));
            return outcome;
        }
    };

    for order in expired {
        match cancel_expired_order(db, order.id).await {
            Ok(true) => outcome.processed += 1,
            Ok(false) => {
                tracing::debug!(order_number = %order.order_number, "order no longer expired-pending, skipped");
            }
            Err(e) => {
                outcome.failed += 1;
                outcome
                    .errors
                    .push(format!("order {}: {}", order.order_number, e));
            }
        }
    }

    outcome
}
