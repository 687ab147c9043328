use sea_orm_migration::{prelude::*, schema::*};

use super::m20240612_000002_create_flights::Flight;
use super::m20240612_000004_create_tickets::Ticket;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RescheduleLog::Table)
                    .if_not_exists()
                    .col(uuid(RescheduleLog::Id).primary_key())
                    .col(uuid(RescheduleLog::OriginalTicketId).not_null())
                    .col(uuid(RescheduleLog::NewTicketId).not_null())
                    .col(uuid(RescheduleLog::OriginalFlightId).not_null())
                    .col(uuid(RescheduleLog::NewFlightId).not_null())
                    .col(decimal_len(RescheduleLog::PriceDifference, 10, 2).not_null())
                    .col(decimal_len(RescheduleLog::RescheduleFee, 10, 2).not_null())
                    .col(
                        timestamp_with_time_zone(RescheduleLog::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reschedule_log_original_ticket")
                            .from(RescheduleLog::Table, RescheduleLog::OriginalTicketId)
                            .to(Ticket::Table, Ticket::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reschedule_log_new_ticket")
                            .from(RescheduleLog::Table, RescheduleLog::NewTicketId)
                            .to(Ticket::Table, Ticket::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reschedule_log_original_flight")
                            .from(RescheduleLog::Table, RescheduleLog::OriginalFlightId)
                            .to(Flight::Table, Flight::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reschedule_log_new_flight")
                            .from(RescheduleLog::Table, RescheduleLog::NewFlightId)
                            .to(Flight::Table, Flight::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reschedule_log_original_ticket")
                    .table(RescheduleLog::Table)
                    .col(RescheduleLog::OriginalTicketId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reschedule_log_new_ticket")
                    .table(RescheduleLog::Table)
                    .col(RescheduleLog::NewTicketId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reschedule_log_created")
                    .table(RescheduleLog::Table)
                    .col(RescheduleLog::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RescheduleLog::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum RescheduleLog {
    Table,
    Id,
    OriginalTicketId,
    NewTicketId,
    OriginalFlightId,
    NewFlightId,
    PriceDifference,
    RescheduleFee,
    CreatedAt,
}
