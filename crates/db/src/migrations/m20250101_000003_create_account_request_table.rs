//! Create account request table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AccountRequest::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AccountRequest::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AccountRequest::FirstName).string_len(128).not_null())
                    .col(ColumnDef::new(AccountRequest::LastName).string_len(128).not_null())
                    .col(ColumnDef::new(AccountRequest::Email).string_len(256).not_null())
                    .col(ColumnDef::new(AccountRequest::SchoolId).string_len(64).not_null())
                    .col(ColumnDef::new(AccountRequest::Department).string_len(256).not_null())
                    .col(ColumnDef::new(AccountRequest::PasswordHash).string_len(256).not_null())
                    .col(
                        ColumnDef::new(AccountRequest::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(AccountRequest::RequestedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(AccountRequest::ReviewedBy).string_len(32))
                    .col(ColumnDef::new(AccountRequest::ReviewedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(AccountRequest::RejectionReason).text())
                    .to_owned(),
            )
            .await?;

        // Index: school_id (duplicate checks at intake)
        manager
            .create_index(
                Index::create()
                    .name("idx_account_request_school_id")
                    .table(AccountRequest::Table)
                    .col(AccountRequest::SchoolId)
                    .to_owned(),
            )
            .await?;

        // Index: (status, requested_at) for pending listings
        manager
            .create_index(
                Index::create()
                    .name("idx_account_request_status_requested_at")
                    .table(AccountRequest::Table)
                    .col(AccountRequest::Status)
                    .col(AccountRequest::RequestedAt)
                    .to_owned(),
            )
            .await?;

        // Partial unique index: at most one pending request per school ID.
        // Concurrent duplicate submissions fail at insert time instead of
        // both passing the pre-insert lookup.
        manager
            .get_connection()
            .execute_unprepared(
                r"
                CREATE UNIQUE INDEX IF NOT EXISTS idx_account_request_pending_school_id
                ON account_request (school_id)
                WHERE status = 'pending';
                ",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AccountRequest::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum AccountRequest {
    Table,
    Id,
    FirstName,
    LastName,
    Email,
    SchoolId,
    Department,
    PasswordHash,
    Status,
    RequestedAt,
    ReviewedBy,
    ReviewedAt,
    RejectionReason,
}
