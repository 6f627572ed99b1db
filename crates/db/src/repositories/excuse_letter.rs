//! Excuse letter repository.

use std::sync::Arc;

use crate::entities::{excuse_letter, excuse_letter::ExcuseStatus, ExcuseLetter};
use chrono::{DateTime, Utc};
use rollcall_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

/// Filter for excuse letter listings.
#[derive(Debug, Clone, Default)]
pub struct ExcuseLetterFilter {
    /// Restrict to a review status.
    pub status: Option<ExcuseStatus>,
    /// Restrict to an event.
    pub event_id: Option<String>,
    /// Restrict to a submitter.
    pub user_id: Option<String>,
}

/// Excuse letter repository for database operations.
#[derive(Clone)]
pub struct ExcuseLetterRepository {
    db: Arc<DatabaseConnection>,
}

impl ExcuseLetterRepository {
    /// Create a new excuse letter repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Insert a new letter.
    pub async fn create(
        &self,
        model: excuse_letter::ActiveModel,
    ) -> AppResult<excuse_letter::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a letter by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<excuse_letter::Model>> {
        ExcuseLetter::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a letter by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<excuse_letter::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Excuse letter {id} not found")))
    }

    /// List letters matching the filter, newest submission first.
    pub async fn list(
        &self,
        filter: &ExcuseLetterFilter,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<excuse_letter::Model>> {
        let mut query = ExcuseLetter::find()
            .order_by_desc(excuse_letter::Column::SubmittedAt);

        if let Some(status) = filter.status {
            query = query.filter(excuse_letter::Column::Status.eq(status));
        }
        if let Some(ref event_id) = filter.event_id {
            query = query.filter(excuse_letter::Column::EventId.eq(event_id));
        }
        if let Some(ref user_id) = filter.user_id {
            query = query.filter(excuse_letter::Column::UserId.eq(user_id));
        }

        query
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count letters matching the filter.
    pub async fn count(&self, filter: &ExcuseLetterFilter) -> AppResult<u64> {
        let mut query = ExcuseLetter::find();

        if let Some(status) = filter.status {
            query = query.filter(excuse_letter::Column::Status.eq(status));
        }
        if let Some(ref event_id) = filter.event_id {
            query = query.filter(excuse_letter::Column::EventId.eq(event_id));
        }
        if let Some(ref user_id) = filter.user_id {
            query = query.filter(excuse_letter::Column::UserId.eq(user_id));
        }

        query
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Conditionally transition a pending letter to its reviewed state.
    ///
    /// Guarded by `status = 'pending'`; returns whether this call won.
    pub async fn mark_reviewed(
        &self,
        id: &str,
        new_status: ExcuseStatus,
        reviewer_id: &str,
        review_note: Option<String>,
        reviewed_at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let update = excuse_letter::ActiveModel {
            status: Set(new_status),
            reviewed_by: Set(Some(reviewer_id.to_string())),
            reviewed_at: Set(Some(reviewed_at.into())),
            review_note: Set(review_note),
            ..Default::default()
        };

        let result = ExcuseLetter::update_many()
            .set(update)
            .filter(excuse_letter::Column::Id.eq(id))
            .filter(excuse_letter::Column::Status.eq(ExcuseStatus::Pending))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_letter(id: &str, status: ExcuseStatus) -> excuse_letter::Model {
        excuse_letter::Model {
            id: id.to_string(),
            user_id: "user1".to_string(),
            event_id: "ev1".to_string(),
            reason: "Medical appointment".to_string(),
            attachment_url: None,
            status,
            submitted_at: Utc::now().into(),
            reviewed_by: None,
            reviewed_at: None,
            review_note: None,
        }
    }

    #[tokio::test]
    async fn test_list_with_status_filter() {
        let letter = create_test_letter("ex1", ExcuseStatus::Pending);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[letter]])
                .into_connection(),
        );

        let repo = ExcuseLetterRepository::new(db);
        let filter = ExcuseLetterFilter {
            status: Some(ExcuseStatus::Pending),
            ..Default::default()
        };
        let result = repo.list(&filter, 50, 0).await.unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].status, ExcuseStatus::Pending);
    }

    #[tokio::test]
    async fn test_mark_reviewed_lost_race() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = ExcuseLetterRepository::new(db);
        let won = repo
            .mark_reviewed("ex1", ExcuseStatus::Approved, "admin1", None, Utc::now())
            .await
            .unwrap();

        assert!(!won);
    }
}
