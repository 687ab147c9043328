use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "ticket_status")]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    #[sea_orm(string_value = "valid")]
    Valid,
    #[sea_orm(string_value = "refunded")]
    Refunded,
    #[sea_orm(string_value = "used")]
    Used,
    #[sea_orm(string_value = "rescheduled")]
    Rescheduled,
    #[sea_orm(string_value = "canceled")]
    Canceled,
}

impl TicketStatus {
    /// Statuses that hold a seat on their flight.
    pub fn occupies_seat(self) -> bool {
        matches!(self, TicketStatus::Valid | TicketStatus::Used)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "cabin_class")]
#[serde(rename_all = "lowercase")]
pub enum CabinClass {
    #[sea_orm(string_value = "economy")]
    Economy,
    #[sea_orm(string_value = "business")]
    Business,
    #[sea_orm(string_value = "first")]
    First,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ticket")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub ticket_number: String,
    pub order_id: Uuid,
    pub flight_id: Uuid,
    pub passenger_name: String,
    pub passenger_id_type: String,
    pub passenger_id_number: String,
    pub seat_number: String,
    pub cabin_class: CabinClass,
    /// Fare at issue or latest reschedule.
    pub price: Decimal,
    pub status: TicketStatus,
    pub checked_in: bool,
    pub checked_in_at: Option<DateTimeWithTimeZone>,
    pub boarding_pass_number: Option<String>,
    pub gate: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
    #[sea_orm(
        belongs_to = "super::flight::Entity",
        from = "Column::FlightId",
        to = "super::flight::Column::Id"
    )]
    Flight,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl Related<super::flight::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Flight.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
