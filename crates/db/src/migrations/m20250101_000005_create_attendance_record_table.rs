//! Create attendance record table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AttendanceRecord::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AttendanceRecord::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AttendanceRecord::EventId).string_len(32).not_null())
                    .col(ColumnDef::new(AttendanceRecord::UserId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(AttendanceRecord::TimeIn)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AttendanceRecord::TimeOut).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(AttendanceRecord::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: one record per (event, user). Concurrent double
        // time-ins fail at insert time.
        manager
            .create_index(
                Index::create()
                    .name("idx_attendance_event_user")
                    .table(AttendanceRecord::Table)
                    .col(AttendanceRecord::EventId)
                    .col(AttendanceRecord::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: user_id (per-user listings)
        manager
            .create_index(
                Index::create()
                    .name("idx_attendance_user_id")
                    .table(AttendanceRecord::Table)
                    .col(AttendanceRecord::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AttendanceRecord::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum AttendanceRecord {
    Table,
    Id,
    EventId,
    UserId,
    TimeIn,
    TimeOut,
    CreatedAt,
}
