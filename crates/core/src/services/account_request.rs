//! Account request service: intake, listing, review, and user provisioning.

use chrono::Utc;
use regex::Regex;
use rollcall_common::config::ApprovalConfig;
use rollcall_common::{AppError, AppResult, IdGenerator};
use rollcall_db::{
    entities::{account_request, account_request::RequestStatus, user, user::UserRole},
    repositories::{AccountRequestRepository, DepartmentRepository, UserRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use std::sync::LazyLock;

use crate::services::email::{
    EmailDeliveryResult, EmailNotificationType, EmailService, EmailTemplateVars,
};
use crate::services::user::hash_password;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

/// Review decision for an account request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReviewAction {
    /// Approve and provision a user
    Approve,
    /// Reject with a reason
    Reject,
}

impl ReviewAction {
    /// Parse an action string (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "APPROVE" => Some(Self::Approve),
            "REJECT" => Some(Self::Reject),
            _ => None,
        }
    }
}

/// Input for creating an account request.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAccountRequestInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub school_id: String,
    pub department: String,
    pub password: String,
}

/// Outcome of a review call.
///
/// The core decision and the notification email are separate concerns: the
/// email is advisory, so its result rides along instead of being discarded
/// into a log line.
#[derive(Debug)]
pub struct ReviewOutcome {
    /// Human-readable outcome message.
    pub message: String,
    /// ID of the provisioned user, present on approval.
    pub user_id: Option<String>,
    /// Result of the notification email send.
    pub notification: EmailDeliveryResult,
}

/// Account request service.
#[derive(Clone)]
pub struct AccountRequestService {
    request_repo: AccountRequestRepository,
    user_repo: UserRepository,
    department_repo: DepartmentRepository,
    email_service: EmailService,
    approval: ApprovalConfig,
    id_gen: IdGenerator,
}

impl AccountRequestService {
    /// Create a new account request service.
    #[must_use]
    pub const fn new(
        request_repo: AccountRequestRepository,
        user_repo: UserRepository,
        department_repo: DepartmentRepository,
        email_service: EmailService,
        approval: ApprovalConfig,
    ) -> Self {
        Self {
            request_repo,
            user_repo,
            department_repo,
            email_service,
            approval,
            id_gen: IdGenerator::new(),
        }
    }

    /// Submit a new account request.
    ///
    /// Validates the applicant data, checks for an existing user or pending
    /// request with the same school ID, hashes the password, and persists
    /// the request with status pending. No email goes out at this stage.
    pub async fn create(
        &self,
        input: CreateAccountRequestInput,
    ) -> AppResult<account_request::Model> {
        let first_name = input.first_name.trim();
        let last_name = input.last_name.trim();
        let email = input.email.trim();
        let school_id = input.school_id.trim();
        let department = input.department.trim();
        let password = input.password.trim();

        for (field, value) in [
            ("firstName", first_name),
            ("lastName", last_name),
            ("email", email),
            ("schoolId", school_id),
            ("department", department),
            ("password", password),
        ] {
            if value.is_empty() {
                return Err(AppError::Validation(format!("{field} is required")));
            }
        }

        if !EMAIL_PATTERN.is_match(email) {
            return Err(AppError::Validation("Invalid email address".to_string()));
        }
        if password.len() < 8 {
            return Err(AppError::Validation(
                "Password must be at least 8 characters".to_string(),
            ));
        }

        if self.user_repo.find_by_school_id(school_id).await?.is_some() {
            return Err(AppError::Conflict(
                "A user already exists with this school ID".to_string(),
            ));
        }
        if self
            .request_repo
            .find_pending_by_school_id(school_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "A pending account request already exists for this school ID".to_string(),
            ));
        }

        let id = self.id_gen.generate();
        let password_hash = hash_password(password)?;

        let model = account_request::ActiveModel {
            id: Set(id),
            first_name: Set(first_name.to_string()),
            last_name: Set(last_name.to_string()),
            email: Set(email.to_string()),
            school_id: Set(school_id.to_string()),
            department: Set(department.to_string()),
            password_hash: Set(password_hash),
            status: Set(RequestStatus::Pending),
            requested_at: Set(Some(Utc::now().into())),
            reviewed_by: Set(None),
            reviewed_at: Set(None),
            rejection_reason: Set(None),
        };

        let request = self.request_repo.create(model).await?;

        tracing::info!(
            request_id = %request.id,
            school_id = %request.school_id,
            "Account request created"
        );

        Ok(request)
    }

    /// List all requests, newest first.
    pub async fn list_all(
        &self,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<account_request::Model>> {
        self.request_repo.list(None, limit, offset).await
    }

    /// List pending requests, newest first.
    pub async fn list_pending(
        &self,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<account_request::Model>> {
        self.request_repo
            .list(Some(RequestStatus::Pending), limit, offset)
            .await
    }

    /// Get a request by ID.
    pub async fn get(&self, id: &str) -> AppResult<account_request::Model> {
        self.request_repo.get_by_id(id).await
    }

    /// Count pending requests.
    pub async fn count_pending(&self) -> AppResult<u64> {
        self.request_repo.count_pending().await
    }

    /// Review a pending request.
    ///
    /// On approval, the user is provisioned before the request's status is
    /// flipped: a store failure during provisioning leaves the request
    /// pending and retryable instead of approved-but-userless. The status
    /// flip itself is a conditional update guarded on pending, so a
    /// concurrent review of the same request has exactly one winner.
    pub async fn review(
        &self,
        request_id: &str,
        action: ReviewAction,
        reviewer_id: &str,
        rejection_reason: Option<&str>,
    ) -> AppResult<ReviewOutcome> {
        // Rejections need a reason before anything is touched.
        let rejection_reason = match action {
            ReviewAction::Reject => {
                let reason = rejection_reason.map(str::trim).unwrap_or_default();
                if reason.is_empty() {
                    return Err(AppError::Validation(
                        "rejectionReason is required when rejecting".to_string(),
                    ));
                }
                Some(reason.to_string())
            }
            ReviewAction::Approve => None,
        };

        let request = self.request_repo.get_by_id(request_id).await?;

        if request.status != RequestStatus::Pending {
            return Err(AppError::InvalidState(format!(
                "Account request {request_id} was already reviewed"
            )));
        }

        match action {
            ReviewAction::Approve => self.approve(&request, reviewer_id).await,
            ReviewAction::Reject => {
                self.reject(&request, reviewer_id, rejection_reason.unwrap_or_default())
                    .await
            }
        }
    }

    async fn approve(
        &self,
        request: &account_request::Model,
        reviewer_id: &str,
    ) -> AppResult<ReviewOutcome> {
        let (department_id, department_name) = self.resolve_department(&request.department).await?;

        // Provision first. The password was hashed at intake; it is reused
        // verbatim, and the account comes up verified.
        let user_id = self.id_gen.generate();
        let token = self.id_gen.generate_token();

        let model = user::ActiveModel {
            id: Set(user_id.clone()),
            first_name: Set(request.first_name.clone()),
            last_name: Set(request.last_name.clone()),
            email: Set(request.email.clone()),
            school_id: Set(request.school_id.clone()),
            password_hash: Set(request.password_hash.clone()),
            role: Set(UserRole::User),
            department_id: Set(department_id),
            department_name: Set(department_name),
            profile_picture_url: Set(None),
            verified: Set(true),
            token: Set(Some(token)),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let user = self.user_repo.create(model).await?;

        let won = self
            .request_repo
            .mark_reviewed(
                &request.id,
                RequestStatus::Approved,
                reviewer_id,
                None,
                Utc::now(),
            )
            .await?;

        if !won {
            // A concurrent review slipped in between the pending check and
            // the guarded update. The user row from this call remains and
            // needs an operator's attention.
            tracing::warn!(
                request_id = %request.id,
                user_id = %user.id,
                "Request was reviewed concurrently after user provisioning"
            );
            return Err(AppError::InvalidState(format!(
                "Account request {} was already reviewed",
                request.id
            )));
        }

        tracing::info!(
            request_id = %request.id,
            user_id = %user.id,
            reviewer_id = reviewer_id,
            "Account request approved"
        );

        let notification = self
            .email_service
            .notify(
                EmailNotificationType::AccountApproved,
                &request.email,
                EmailTemplateVars {
                    recipient_name: Some(request.first_name.clone()),
                    school_id: Some(request.school_id.clone()),
                    ..Default::default()
                },
                None,
            )
            .await;

        Ok(ReviewOutcome {
            message: format!("Account request {} approved", request.id),
            user_id: Some(user.id),
            notification,
        })
    }

    async fn reject(
        &self,
        request: &account_request::Model,
        reviewer_id: &str,
        reason: String,
    ) -> AppResult<ReviewOutcome> {
        let won = self
            .request_repo
            .mark_reviewed(
                &request.id,
                RequestStatus::Rejected,
                reviewer_id,
                Some(reason.clone()),
                Utc::now(),
            )
            .await?;

        if !won {
            return Err(AppError::InvalidState(format!(
                "Account request {} was already reviewed",
                request.id
            )));
        }

        tracing::info!(
            request_id = %request.id,
            reviewer_id = reviewer_id,
            "Account request rejected"
        );

        let notification = self
            .email_service
            .notify(
                EmailNotificationType::AccountRejected,
                &request.email,
                EmailTemplateVars {
                    recipient_name: Some(request.first_name.clone()),
                    rejection_reason: Some(reason),
                    ..Default::default()
                },
                None,
            )
            .await;

        Ok(ReviewOutcome {
            message: format!("Account request {} rejected", request.id),
            user_id: None,
            notification,
        })
    }

    /// Resolve a department name to its reference and snapshot.
    ///
    /// Resolution failures are governed by configuration: strict mode fails
    /// the approval, otherwise the user is provisioned without a department.
    async fn resolve_department(
        &self,
        name: &str,
    ) -> AppResult<(Option<String>, Option<String>)> {
        match self.department_repo.find_by_name(name).await {
            Ok(Some(department)) => Ok((Some(department.id), Some(department.name))),
            Ok(None) => {
                if self.approval.require_department {
                    return Err(AppError::NotFound(format!(
                        "Department {name} not found"
                    )));
                }
                tracing::warn!(department = name, "Department not found, provisioning without one");
                Ok((None, None))
            }
            Err(e) => {
                if self.approval.require_department {
                    return Err(e);
                }
                tracing::warn!(
                    department = name,
                    error = %e,
                    "Department lookup failed, provisioning without one"
                );
                Ok((None, None))
            }
        }
    }

    /// Send a reminder that a request is still pending.
    ///
    /// Unlike the decision notifications, a failed reminder send surfaces
    /// to the caller.
    pub async fn send_pending_reminder(&self, request_id: &str) -> AppResult<String> {
        let request = self.request_repo.get_by_id(request_id).await?;

        if request.status != RequestStatus::Pending {
            return Err(AppError::InvalidState(format!(
                "Account request {request_id} is not pending"
            )));
        }

        let result = self
            .email_service
            .send_notification(
                EmailNotificationType::PendingReminder,
                &request.email,
                EmailTemplateVars {
                    recipient_name: Some(request.first_name.clone()),
                    school_id: Some(request.school_id.clone()),
                    ..Default::default()
                },
                None,
            )
            .await?;

        if !result.success {
            return Err(AppError::Email(
                result
                    .error
                    .unwrap_or_else(|| "Reminder email failed".to_string()),
            ));
        }

        tracing::info!(request_id = %request.id, "Pending reminder sent");

        Ok(format!("Reminder sent for account request {request_id}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rollcall_common::config::ApprovalConfig;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn service_over(db: DatabaseConnection) -> AccountRequestService {
        let db = Arc::new(db);
        AccountRequestService::new(
            AccountRequestRepository::new(Arc::clone(&db)),
            UserRepository::new(Arc::clone(&db)),
            DepartmentRepository::new(db),
            EmailService::new(None),
            ApprovalConfig::default(),
        )
    }

    fn valid_input() -> CreateAccountRequestInput {
        CreateAccountRequestInput {
            first_name: "Ana".to_string(),
            last_name: "Cruz".to_string(),
            email: "ana@x.com".to_string(),
            school_id: "S100".to_string(),
            department: "CS".to_string(),
            password: "secret12".to_string(),
        }
    }

    fn pending_request(id: &str) -> account_request::Model {
        account_request::Model {
            id: id.to_string(),
            first_name: "Ana".to_string(),
            last_name: "Cruz".to_string(),
            email: "ana@x.com".to_string(),
            school_id: "S100".to_string(),
            department: "CS".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            status: RequestStatus::Pending,
            requested_at: Some(Utc::now().into()),
            reviewed_by: None,
            reviewed_at: None,
            rejection_reason: None,
        }
    }

    #[test]
    fn test_review_action_parse() {
        assert_eq!(ReviewAction::parse("APPROVE"), Some(ReviewAction::Approve));
        assert_eq!(ReviewAction::parse("reject"), Some(ReviewAction::Reject));
        assert_eq!(ReviewAction::parse("DEFER"), None);
    }

    #[tokio::test]
    async fn test_create_rejects_blank_fields() {
        let service = service_over(
            MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
        );

        let mut input = valid_input();
        input.first_name = "   ".to_string();

        let result = service.create(input).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_bad_email() {
        let service = service_over(
            MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
        );

        let mut input = valid_input();
        input.email = "not-an-email".to_string();

        let result = service.create(input).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_conflicts_on_existing_user() {
        let existing_user = user::Model {
            id: "user1".to_string(),
            first_name: "Ana".to_string(),
            last_name: "Cruz".to_string(),
            email: "ana@x.com".to_string(),
            school_id: "S100".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            role: UserRole::User,
            department_id: None,
            department_name: None,
            profile_picture_url: None,
            verified: true,
            token: None,
            created_at: Utc::now().into(),
            updated_at: None,
        };

        let service = service_over(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing_user]])
                .into_connection(),
        );

        let result = service.create(valid_input()).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_review_reject_requires_reason_before_any_read() {
        // No query results queued: the validation failure must come first.
        let service = service_over(
            MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
        );

        let result = service
            .review("req1", ReviewAction::Reject, "admin1", Some("  "))
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_review_already_decided_is_invalid_state() {
        let mut reviewed = pending_request("req1");
        reviewed.status = RequestStatus::Approved;

        let service = service_over(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[reviewed]])
                .into_connection(),
        );

        let result = service
            .review("req1", ReviewAction::Approve, "admin1", None)
            .await;

        assert!(matches!(result, Err(AppError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_reject_flow_reports_outcome() {
        let service = service_over(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[pending_request("req1")]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let outcome = service
            .review("req1", ReviewAction::Reject, "admin1", Some("incomplete"))
            .await
            .unwrap();

        assert!(outcome.message.contains("rejected"));
        assert!(outcome.user_id.is_none());
        // No email provider configured: the advisory send reports failure
        // without failing the review.
        assert!(!outcome.notification.success);
    }

    #[tokio::test]
    async fn test_reject_lost_race_is_invalid_state() {
        let service = service_over(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[pending_request("req1")]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let result = service
            .review("req1", ReviewAction::Reject, "admin1", Some("incomplete"))
            .await;

        assert!(matches!(result, Err(AppError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_approve_provisions_verified_user() {
        let request = pending_request("req1");
        let department = rollcall_db::entities::department::Model {
            id: "dept1".to_string(),
            name: "CS".to_string(),
            created_at: Utc::now().into(),
        };
        let provisioned = user::Model {
            id: "user1".to_string(),
            first_name: "Ana".to_string(),
            last_name: "Cruz".to_string(),
            email: "ana@x.com".to_string(),
            school_id: "S100".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            role: UserRole::User,
            department_id: Some("dept1".to_string()),
            department_name: Some("CS".to_string()),
            profile_picture_url: None,
            verified: true,
            token: Some("token".to_string()),
            created_at: Utc::now().into(),
            updated_at: None,
        };

        let service = service_over(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[request]])
                .append_query_results([[department]])
                .append_query_results([[provisioned]])
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                ])
                .into_connection(),
        );

        let outcome = service
            .review("req1", ReviewAction::Approve, "admin1", None)
            .await
            .unwrap();

        assert!(outcome.message.contains("approved"));
        assert_eq!(outcome.user_id.as_deref(), Some("user1"));
    }
}
