//! Account request repository.

use std::sync::Arc;

use crate::entities::{account_request, account_request::RequestStatus, AccountRequest};
use chrono::{DateTime, Utc};
use rollcall_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, SqlErr,
};

/// Sort requests by submission time, newest first, records without a
/// submission time last. Used when the store cannot serve the ordered query.
#[must_use]
pub fn sort_by_requested_desc(
    mut requests: Vec<account_request::Model>,
) -> Vec<account_request::Model> {
    // Option<DateTime> orders None first, so a descending comparison puts
    // dated records first and undated ones last. sort_by is stable.
    requests.sort_by(|a, b| b.requested_at.cmp(&a.requested_at));
    requests
}

/// Account request repository for database operations.
#[derive(Clone)]
pub struct AccountRequestRepository {
    db: Arc<DatabaseConnection>,
}

impl AccountRequestRepository {
    /// Create a new account request repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Insert a new request.
    ///
    /// A unique-violation on the partial pending index maps to Conflict:
    /// two concurrent submissions for the same school ID cannot both land.
    pub async fn create(
        &self,
        model: account_request::ActiveModel,
    ) -> AppResult<account_request::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                AppError::Conflict(
                    "A pending account request already exists for this school ID".to_string(),
                )
            } else {
                AppError::Database(e.to_string())
            }
        })
    }

    /// Find a request by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<account_request::Model>> {
        AccountRequest::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a request by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<account_request::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Account request {id} not found")))
    }

    /// Find a pending request for a school ID.
    pub async fn find_pending_by_school_id(
        &self,
        school_id: &str,
    ) -> AppResult<Option<account_request::Model>> {
        AccountRequest::find()
            .filter(account_request::Column::SchoolId.eq(school_id))
            .filter(account_request::Column::Status.eq(RequestStatus::Pending))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List requests with an optional status filter, newest first.
    ///
    /// Falls back to an unordered fetch sorted in memory when the ordered
    /// query cannot be served (e.g. a missing index on a fresh deployment).
    pub async fn list(
        &self,
        status: Option<RequestStatus>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<account_request::Model>> {
        let mut ordered = AccountRequest::find()
            .order_by_desc(account_request::Column::RequestedAt);
        if let Some(s) = status {
            ordered = ordered.filter(account_request::Column::Status.eq(s));
        }

        match ordered.offset(offset).limit(limit).all(self.db.as_ref()).await {
            Ok(requests) => Ok(requests),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Ordered account request listing failed, sorting in memory"
                );

                let mut unordered = AccountRequest::find();
                if let Some(s) = status {
                    unordered = unordered.filter(account_request::Column::Status.eq(s));
                }
                let requests = unordered
                    .all(self.db.as_ref())
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;

                Ok(sort_by_requested_desc(requests)
                    .into_iter()
                    .skip(usize::try_from(offset).unwrap_or(usize::MAX))
                    .take(usize::try_from(limit).unwrap_or(usize::MAX))
                    .collect())
            }
        }
    }

    /// Count pending requests.
    pub async fn count_pending(&self) -> AppResult<u64> {
        AccountRequest::find()
            .filter(account_request::Column::Status.eq(RequestStatus::Pending))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Conditionally transition a pending request to its reviewed state.
    ///
    /// The update is guarded by `status = 'pending'`, so a concurrent review
    /// of the same request leaves exactly one winner. Returns whether this
    /// call was the winner.
    pub async fn mark_reviewed(
        &self,
        id: &str,
        new_status: RequestStatus,
        reviewer_id: &str,
        rejection_reason: Option<String>,
        reviewed_at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let update = account_request::ActiveModel {
            status: Set(new_status),
            reviewed_by: Set(Some(reviewer_id.to_string())),
            reviewed_at: Set(Some(reviewed_at.into())),
            rejection_reason: Set(rejection_reason),
            ..Default::default()
        };

        let result = AccountRequest::update_many()
            .set(update)
            .filter(account_request::Column::Id.eq(id))
            .filter(account_request::Column::Status.eq(RequestStatus::Pending))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }
}
