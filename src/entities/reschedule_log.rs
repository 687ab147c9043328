use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Append-only record of a ticket swap, with the monetary delta
/// snapshotted at execution time.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reschedule_log")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub original_ticket_id: Uuid,
    pub new_ticket_id: Uuid,
    pub original_flight_id: Uuid,
    pub new_flight_id: Uuid,
    pub price_difference: Decimal,
    pub reschedule_fee: Decimal,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::ticket::Entity",
        from = "Column::OriginalTicketId",
        to = "super::ticket::Column::Id"
    )]
    OriginalTicket,
    #[sea_orm(
        belongs_to = "super::ticket::Entity",
        from = "Column::NewTicketId",
        to = "super::ticket::Column::Id"
    )]
    NewTicket,
    #[sea_orm(
        belongs_to = "super::flight::Entity",
        from = "Column::OriginalFlightId",
        to = "super::flight::Column::Id"
    )]
    OriginalFlight,
    #[sea_orm(
        belongs_to = "super::flight::Entity",
        from = "Column::NewFlightId",
        to = "super::flight::Column::Id"
    )]
    NewFlight,
}

impl ActiveModelBehavior for ActiveModel {}
