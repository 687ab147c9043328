use sea_orm_migration::{prelude::*, schema::*, sea_orm::sea_query::extension::postgres::Type};

use super::m20240612_000002_create_flights::Flight;
use super::m20240612_000003_create_orders::Order;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(TicketStatus::Enum)
                    .values([
                        TicketStatus::Valid,
                        TicketStatus::Refunded,
                        TicketStatus::Used,
                        TicketStatus::Rescheduled,
                        TicketStatus::Canceled,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_type(
                Type::create()
                    .as_enum(CabinClass::Enum)
                    .values([CabinClass::Economy, CabinClass::Business, CabinClass::First])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Ticket::Table)
                    .if_not_exists()
                    .col(uuid(Ticket::Id).primary_key())
                    .col(string_len(Ticket::TicketNumber, 15).not_null().unique_key())
                    .col(uuid(Ticket::OrderId).not_null())
                    .col(uuid(Ticket::FlightId).not_null())
                    .col(string_len(Ticket::PassengerName, 100).not_null())
                    .col(string_len(Ticket::PassengerIdType, 20).not_null())
                    .col(string_len(Ticket::PassengerIdNumber, 30).not_null())
                    .col(string_len(Ticket::SeatNumber, 10).not_null())
                    .col(
                        ColumnDef::new(Ticket::CabinClass)
                            .custom(CabinClass::Enum)
                            .not_null(),
                    )
                    .col(decimal_len(Ticket::Price, 10, 2).not_null())
                    .col(
                        ColumnDef::new(Ticket::Status)
                            .custom(TicketStatus::Enum)
                            .not_null(),
                    )
                    .col(boolean(Ticket::CheckedIn).not_null().default(false))
                    .col(timestamp_with_time_zone_null(Ticket::CheckedInAt))
                    .col(string_len_null(Ticket::BoardingPassNumber, 20))
                    .col(string_len_null(Ticket::Gate, 10))
                    .col(
                        timestamp_with_time_zone(Ticket::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Ticket::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ticket_order")
                            .from(Ticket::Table, Ticket::OrderId)
                            .to(Order::Table, Order::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ticket_flight")
                            .from(Ticket::Table, Ticket::FlightId)
                            .to(Flight::Table, Flight::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Seat-occupancy lookup: (flight, seat, status)
        manager
            .create_index(
                Index::create()
                    .name("idx_ticket_flight_seat_status")
                    .table(Ticket::Table)
                    .col(Ticket::FlightId)
                    .col(Ticket::SeatNumber)
                    .col(Ticket::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ticket_flight_status")
                    .table(Ticket::Table)
                    .col(Ticket::FlightId)
                    .col(Ticket::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ticket_order_status")
                    .table(Ticket::Table)
                    .col(Ticket::OrderId)
                    .col(Ticket::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Ticket::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(TicketStatus::Enum).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(CabinClass::Enum).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Ticket {
    Table,
    Id,
    TicketNumber,
    OrderId,
    FlightId,
    PassengerName,
    PassengerIdType,
    PassengerIdNumber,
    SeatNumber,
    CabinClass,
    Price,
    Status,
    CheckedIn,
    CheckedInAt,
    BoardingPassNumber,
    Gate,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum TicketStatus {
    #[sea_orm(iden = "ticket_status")]
    Enum,
    #[sea_orm(iden = "valid")]
    Valid,
    #[sea_orm(iden = "refunded")]
    Refunded,
    #[sea_orm(iden = "used")]
    Used,
    #[sea_orm(iden = "rescheduled")]
    Rescheduled,
    #[sea_orm(iden = "canceled")]
    Canceled,
}

#[derive(DeriveIden)]
pub enum CabinClass {
    #[sea_orm(iden = "cabin_class")]
    Enum,
    #[sea_orm(iden = "economy")]
    Economy,
    #[sea_orm(iden = "business")]
    Business,
    #[sea_orm(iden = "first")]
    First,
}
