//! Attendance service: code-validated time-in/time-out.

use chrono::Utc;
use rollcall_common::{AppError, AppResult, IdGenerator};
use rollcall_db::{
    entities::attendance_record,
    repositories::{AttendanceRepository, EventRepository, UserRepository},
};
use sea_orm::Set;
use serde::Deserialize;

use crate::services::certificate::CertificateService;
use crate::services::email::EmailDeliveryResult;

/// Input for timing in to an event.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeInInput {
    pub event_id: String,
    pub user_id: String,
    /// The event's check-in code, usually scanned from the QR image at the
    /// venue.
    pub code: String,
}

/// Outcome of a time-in call.
#[derive(Debug)]
pub struct TimeInOutcome {
    /// The created attendance record.
    pub record: attendance_record::Model,
    /// Result of the certificate email triggered by the first time-in.
    pub certificate_notification: Option<EmailDeliveryResult>,
}

/// Attendance service for business logic.
#[derive(Clone)]
pub struct AttendanceService {
    attendance_repo: AttendanceRepository,
    event_repo: EventRepository,
    user_repo: UserRepository,
    certificate_service: CertificateService,
    id_gen: IdGenerator,
}

impl AttendanceService {
    /// Create a new attendance service.
    #[must_use]
    pub const fn new(
        attendance_repo: AttendanceRepository,
        event_repo: EventRepository,
        user_repo: UserRepository,
        certificate_service: CertificateService,
    ) -> Self {
        Self {
            attendance_repo,
            event_repo,
            user_repo,
            certificate_service,
            id_gen: IdGenerator::new(),
        }
    }

    /// Record a time-in for an event/user pair.
    ///
    /// Validates the check-in code, conflicts on a duplicate record, and on
    /// the first time-in triggers certificate issuance and emailing.
    /// Certificate failures never fail the check-in.
    pub async fn time_in(&self, input: TimeInInput) -> AppResult<TimeInOutcome> {
        let code = input.code.trim();
        if code.is_empty() {
            return Err(AppError::Validation("code is required".to_string()));
        }

        let event = self.event_repo.get_by_id(&input.event_id).await?;
        if event.check_in_code != code {
            return Err(AppError::Validation("Invalid check-in code".to_string()));
        }

        let user = self.user_repo.get_by_id(&input.user_id).await?;

        if self
            .attendance_repo
            .find_by_event_and_user(&event.id, &user.id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "Already timed in for this event".to_string(),
            ));
        }

        let now = Utc::now();
        let model = attendance_record::ActiveModel {
            id: Set(self.id_gen.generate()),
            event_id: Set(event.id.clone()),
            user_id: Set(user.id.clone()),
            time_in: Set(now.into()),
            time_out: Set(None),
            created_at: Set(now.into()),
        };

        let record = self.attendance_repo.create(model).await?;

        tracing::info!(
            event_id = %event.id,
            user_id = %user.id,
            "Timed in"
        );

        // First time-in: issue the certificate. Advisory; a failure here is
        // logged and reported but the attendance record stands.
        let certificate_notification = match self.certificate_service.issue(&event, &user).await {
            Ok(outcome) => Some(outcome.notification),
            Err(e) => {
                tracing::warn!(
                    event_id = %event.id,
                    user_id = %user.id,
                    error = %e,
                    "Certificate issuance failed after time-in"
                );
                None
            }
        };

        Ok(TimeInOutcome {
            record,
            certificate_notification,
        })
    }

    /// Record a time-out for an event/user pair.
    ///
    /// The update only touches a record whose time-out is still unset;
    /// anything else is an invalid state.
    pub async fn time_out(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> AppResult<attendance_record::Model> {
        let closed = self
            .attendance_repo
            .set_time_out(event_id, user_id, Utc::now())
            .await?;

        if !closed {
            return Err(AppError::InvalidState(
                "No open attendance record for this event".to_string(),
            ));
        }

        tracing::info!(event_id = event_id, user_id = user_id, "Timed out");

        self.attendance_repo
            .find_by_event_and_user(event_id, user_id)
            .await?
            .ok_or_else(|| AppError::Internal("Attendance record vanished".to_string()))
    }

    /// List attendance for an event.
    pub async fn list_by_event(
        &self,
        event_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<attendance_record::Model>> {
        self.attendance_repo
            .list_by_event(event_id, limit, offset)
            .await
    }

    /// List attendance for a user.
    pub async fn list_by_user(
        &self,
        user_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<attendance_record::Model>> {
        self.attendance_repo
            .list_by_user(user_id, limit, offset)
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::email::EmailService;
    use rollcall_db::entities::event;
    use rollcall_db::repositories::CertificateRepository;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn service_over(db: DatabaseConnection) -> AttendanceService {
        let db = Arc::new(db);
        AttendanceService::new(
            AttendanceRepository::new(Arc::clone(&db)),
            EventRepository::new(Arc::clone(&db)),
            UserRepository::new(Arc::clone(&db)),
            CertificateService::new(
                CertificateRepository::new(Arc::clone(&db)),
                EmailService::new(None),
                None,
                "Rollcall".to_string(),
            ),
        )
    }

    fn test_event(code: &str) -> event::Model {
        event::Model {
            id: "ev1".to_string(),
            name: "Orientation".to_string(),
            description: None,
            venue: None,
            starts_at: Utc::now().into(),
            ends_at: None,
            check_in_code: code.to_string(),
            created_by: "admin1".to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_time_in_rejects_wrong_code() {
        let service = service_over(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_event("right-code")]])
                .into_connection(),
        );

        let result = service
            .time_in(TimeInInput {
                event_id: "ev1".to_string(),
                user_id: "user1".to_string(),
                code: "wrong-code".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_time_out_without_open_record_is_invalid_state() {
        let service = service_over(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let result = service.time_out("ev1", "user1").await;

        assert!(matches!(result, Err(AppError::InvalidState(_))));
    }
}
