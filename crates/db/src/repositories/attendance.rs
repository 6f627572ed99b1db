//! Attendance record repository.

use std::sync::Arc;

use crate::entities::{attendance_record, AttendanceRecord};
use chrono::{DateTime, Utc};
use rollcall_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, SqlErr,
};

/// Attendance record repository for database operations.
#[derive(Clone)]
pub struct AttendanceRepository {
    db: Arc<DatabaseConnection>,
}

impl AttendanceRepository {
    /// Create a new attendance repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the record for an event/user pair.
    pub async fn find_by_event_and_user(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> AppResult<Option<attendance_record::Model>> {
        AttendanceRecord::find()
            .filter(attendance_record::Column::EventId.eq(event_id))
            .filter(attendance_record::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a time-in record. The (event, user) unique index maps a
    /// concurrent duplicate to Conflict.
    pub async fn create(
        &self,
        model: attendance_record::ActiveModel,
    ) -> AppResult<attendance_record::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                AppError::Conflict("Already timed in for this event".to_string())
            } else {
                AppError::Database(e.to_string())
            }
        })
    }

    /// Conditionally set time-out on an open record.
    ///
    /// Guarded by `time_out IS NULL`; returns whether a row was closed.
    pub async fn set_time_out(
        &self,
        event_id: &str,
        user_id: &str,
        time_out: DateTime<Utc>,
    ) -> AppResult<bool> {
        let update = attendance_record::ActiveModel {
            time_out: Set(Some(time_out.into())),
            ..Default::default()
        };

        let result = AttendanceRecord::update_many()
            .set(update)
            .filter(attendance_record::Column::EventId.eq(event_id))
            .filter(attendance_record::Column::UserId.eq(user_id))
            .filter(attendance_record::Column::TimeOut.is_null())
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    /// List records for an event, most recent time-in first.
    pub async fn list_by_event(
        &self,
        event_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<attendance_record::Model>> {
        AttendanceRecord::find()
            .filter(attendance_record::Column::EventId.eq(event_id))
            .order_by_desc(attendance_record::Column::TimeIn)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List records for a user, most recent time-in first.
    pub async fn list_by_user(
        &self,
        user_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<attendance_record::Model>> {
        AttendanceRecord::find()
            .filter(attendance_record::Column::UserId.eq(user_id))
            .order_by_desc(attendance_record::Column::TimeIn)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[tokio::test]
    async fn test_set_time_out_closes_open_record() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = AttendanceRepository::new(db);
        let closed = repo
            .set_time_out("ev1", "user1", Utc::now())
            .await
            .unwrap();

        assert!(closed);
    }

    #[tokio::test]
    async fn test_set_time_out_twice_reports_no_open_record() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = AttendanceRepository::new(db);
        let closed = repo
            .set_time_out("ev1", "user1", Utc::now())
            .await
            .unwrap();

        assert!(!closed);
    }
}
