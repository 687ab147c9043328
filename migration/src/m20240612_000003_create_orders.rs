use sea_orm_migration::{prelude::*, schema::*, sea_orm::sea_query::extension::postgres::Type};

use super::m20240612_000001_create_users::User;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create order status enum
        manager
            .create_type(
                Type::create()
                    .as_enum(OrderStatus::Enum)
                    .values([
                        OrderStatus::Pending,
                        OrderStatus::Paid,
                        OrderStatus::Completed,
                        OrderStatus::Canceled,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Order::Table)
                    .if_not_exists()
                    .col(uuid(Order::Id).primary_key())
                    .col(string_len(Order::OrderNumber, 20).not_null().unique_key())
                    .col(uuid(Order::UserId).not_null())
                    .col(decimal_len(Order::TotalPrice, 10, 2).not_null())
                    .col(
                        ColumnDef::new(Order::Status)
                            .custom(OrderStatus::Enum)
                            .not_null(),
                    )
                    .col(string_len_null(Order::PaymentMethod, 20))
                    .col(string_len_null(Order::ContactName, 100))
                    .col(string_len_null(Order::ContactPhone, 20))
                    .col(string_len_null(Order::ContactEmail, 255))
                    .col(
                        timestamp_with_time_zone(Order::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(timestamp_with_time_zone_null(Order::PaidAt))
                    .col(timestamp_with_time_zone_null(Order::ExpiresAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_user")
                            .from(Order::Table, Order::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_order_user_status")
                    .table(Order::Table)
                    .col(Order::UserId)
                    .col(Order::Status)
                    .to_owned(),
            )
            .await?;

        // Sweeper selection: pending orders past their payment deadline
        manager
            .create_index(
                Index::create()
                    .name("idx_order_status_expires")
                    .table(Order::Table)
                    .col(Order::Status)
                    .col(Order::ExpiresAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_order_created")
                    .table(Order::Table)
                    .col(Order::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Order::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(OrderStatus::Enum).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Order {
    Table,
    Id,
    OrderNumber,
    UserId,
    TotalPrice,
    Status,
    PaymentMethod,
    ContactName,
    ContactPhone,
    ContactEmail,
    CreatedAt,
    PaidAt,
    ExpiresAt,
}

#[derive(DeriveIden)]
pub enum OrderStatus {
    #[sea_orm(iden = "order_status")]
    Enum,
    #[sea_orm(iden = "pending")]
    Pending,
    #[sea_orm(iden = "paid")]
    Paid,
    #[sea_orm(iden = "completed")]
    Completed,
    #[sea_orm(iden = "canceled")]
    Canceled,
}
