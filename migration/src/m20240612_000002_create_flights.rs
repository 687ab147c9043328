use sea_orm_migration::{prelude::*, schema::*, sea_orm::sea_query::extension::postgres::Type};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create flight status enum
        manager
            .create_type(
                Type::create()
                    .as_enum(FlightStatus::Enum)
                    .values([
                        FlightStatus::Scheduled,
                        FlightStatus::Full,
                        FlightStatus::Departed,
                        FlightStatus::Canceled,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Flight::Table)
                    .if_not_exists()
                    .col(uuid(Flight::Id).primary_key())
                    .col(string_len(Flight::FlightNumber, 16).not_null().unique_key())
                    .col(string_len(Flight::AirlineName, 50).not_null())
                    .col(string_len(Flight::DepartureCity, 50).not_null())
                    .col(string_len(Flight::ArrivalCity, 50).not_null())
                    .col(timestamp_with_time_zone(Flight::DepartureTime).not_null())
                    .col(timestamp_with_time_zone(Flight::ArrivalTime).not_null())
                    .col(decimal_len(Flight::Price, 10, 2).not_null())
                    .col(decimal_len(Flight::Discount, 3, 2).not_null())
                    .col(integer(Flight::Capacity).not_null())
                    .col(integer(Flight::AvailableSeats).not_null())
                    .col(
                        ColumnDef::new(Flight::Status)
                            .custom(FlightStatus::Enum)
                            .not_null(),
                    )
                    .col(string_len(Flight::AircraftType, 50).not_null())
                    .col(integer(Flight::SeatRows).not_null())
                    .col(integer(Flight::SeatsPerRow).not_null())
                    .col(
                        timestamp_with_time_zone(Flight::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Flight::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_flight_route_departure")
                    .table(Flight::Table)
                    .col(Flight::DepartureCity)
                    .col(Flight::ArrivalCity)
                    .col(Flight::DepartureTime)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_flight_status_departure")
                    .table(Flight::Table)
                    .col(Flight::Status)
                    .col(Flight::DepartureTime)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Flight::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(FlightStatus::Enum).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Flight {
    Table,
    Id,
    FlightNumber,
    AirlineName,
    DepartureCity,
    ArrivalCity,
    DepartureTime,
    ArrivalTime,
    Price,
    Discount,
    Capacity,
    AvailableSeats,
    Status,
    AircraftType,
    SeatRows,
    SeatsPerRow,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum FlightStatus {
    #[sea_orm(iden = "flight_status")]
    Enum,
    #[sea_orm(iden = "scheduled")]
    Scheduled,
    #[sea_orm(iden = "full")]
    Full,
    #[sea_orm(iden = "departed")]
    Departed,
    #[sea_orm(iden = "canceled")]
    Canceled,
}
