//! Create excuse letter table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ExcuseLetter::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ExcuseLetter::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ExcuseLetter::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(ExcuseLetter::EventId).string_len(32).not_null())
                    .col(ColumnDef::new(ExcuseLetter::Reason).text().not_null())
                    .col(ColumnDef::new(ExcuseLetter::AttachmentUrl).string_len(1024))
                    .col(
                        ColumnDef::new(ExcuseLetter::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(ExcuseLetter::SubmittedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(ExcuseLetter::ReviewedBy).string_len(32))
                    .col(ColumnDef::new(ExcuseLetter::ReviewedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(ExcuseLetter::ReviewNote).text())
                    .to_owned(),
            )
            .await?;

        // Index: (status, submitted_at) for filtered listings
        manager
            .create_index(
                Index::create()
                    .name("idx_excuse_letter_status_submitted_at")
                    .table(ExcuseLetter::Table)
                    .col(ExcuseLetter::Status)
                    .col(ExcuseLetter::SubmittedAt)
                    .to_owned(),
            )
            .await?;

        // Index: (event_id, user_id)
        manager
            .create_index(
                Index::create()
                    .name("idx_excuse_letter_event_user")
                    .table(ExcuseLetter::Table)
                    .col(ExcuseLetter::EventId)
                    .col(ExcuseLetter::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ExcuseLetter::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ExcuseLetter {
    Table,
    Id,
    UserId,
    EventId,
    Reason,
    AttachmentUrl,
    Status,
    SubmittedAt,
    ReviewedBy,
    ReviewedAt,
    ReviewNote,
}
