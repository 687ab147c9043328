use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SystemSetting::Table)
                    .if_not_exists()
                    .col(pk_auto(SystemSetting::Id))
                    .col(string_len(SystemSetting::Category, 20).not_null())
                    .col(string_len(SystemSetting::Key, 100).not_null())
                    .col(text(SystemSetting::Value).not_null())
                    .col(string_len_null(SystemSetting::Description, 200))
                    .col(
                        timestamp_with_time_zone(SystemSetting::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_system_setting_category_key")
                    .table(SystemSetting::Table)
                    .col(SystemSetting::Category)
                    .col(SystemSetting::Key)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SystemSetting::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum SystemSetting {
    Table,
    Id,
    Category,
    Key,
    Value,
    Description,
    UpdatedAt,
}
