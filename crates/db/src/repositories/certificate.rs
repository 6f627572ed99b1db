//! Certificate repository.

use std::sync::Arc;

use crate::entities::{certificate, Certificate};
use rollcall_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    Set, SqlErr,
};

/// Certificate repository for database operations.
#[derive(Clone)]
pub struct CertificateRepository {
    db: Arc<DatabaseConnection>,
}

impl CertificateRepository {
    /// Create a new certificate repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the certificate for an event/user pair.
    pub async fn find_by_event_and_user(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> AppResult<Option<certificate::Model>> {
        Certificate::find()
            .filter(certificate::Column::EventId.eq(event_id))
            .filter(certificate::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a certificate. The (event, user) unique index maps a
    /// concurrent duplicate issuance to Conflict.
    pub async fn create(&self, model: certificate::ActiveModel) -> AppResult<certificate::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                AppError::Conflict("Certificate already issued for this event".to_string())
            } else {
                AppError::Database(e.to_string())
            }
        })
    }

    /// Mark a certificate as emailed.
    pub async fn mark_emailed(&self, id: &str) -> AppResult<()> {
        let update = certificate::ActiveModel {
            emailed: Set(true),
            ..Default::default()
        };

        Certificate::update_many()
            .set(update)
            .filter(certificate::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// List certificates for an event.
    pub async fn list_by_event(&self, event_id: &str) -> AppResult<Vec<certificate::Model>> {
        Certificate::find()
            .filter(certificate::Column::EventId.eq(event_id))
            .order_by_desc(certificate::Column::IssuedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List certificates for a user.
    pub async fn list_by_user(&self, user_id: &str) -> AppResult<Vec<certificate::Model>> {
        Certificate::find()
            .filter(certificate::Column::UserId.eq(user_id))
            .order_by_desc(certificate::Column::IssuedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_find_by_event_and_user_found() {
        let cert = certificate::Model {
            id: "cert1".to_string(),
            event_id: "ev1".to_string(),
            user_id: "user1".to_string(),
            serial: "01ARZ3NDEKTSV4RRFFQ69G5FAV".to_string(),
            issued_at: Utc::now().into(),
            emailed: false,
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[cert]])
                .into_connection(),
        );

        let repo = CertificateRepository::new(db);
        let result = repo.find_by_event_and_user("ev1", "user1").await.unwrap();

        assert!(result.is_some());
        assert!(!result.unwrap().emailed);
    }
}
