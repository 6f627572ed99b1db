//! Create certificate table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Certificate::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Certificate::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Certificate::EventId).string_len(32).not_null())
                    .col(ColumnDef::new(Certificate::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Certificate::Serial).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Certificate::IssuedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Certificate::Emailed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: one certificate per (event, user)
        manager
            .create_index(
                Index::create()
                    .name("idx_certificate_event_user")
                    .table(Certificate::Table)
                    .col(Certificate::EventId)
                    .col(Certificate::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Unique index: serial
        manager
            .create_index(
                Index::create()
                    .name("idx_certificate_serial")
                    .table(Certificate::Table)
                    .col(Certificate::Serial)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Certificate::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Certificate {
    Table,
    Id,
    EventId,
    UserId,
    Serial,
    IssuedAt,
    Emailed,
}
