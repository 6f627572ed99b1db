//! Excuse letter service: submission, filtered listing, review.

use chrono::Utc;
use rollcall_common::{AppError, AppResult, IdGenerator};
use rollcall_db::{
    entities::{excuse_letter, excuse_letter::ExcuseStatus},
    repositories::{EventRepository, ExcuseLetterFilter, ExcuseLetterRepository, UserRepository},
};
use sea_orm::Set;
use serde::Deserialize;

use crate::services::email::{
    EmailDeliveryResult, EmailNotificationType, EmailService, EmailTemplateVars,
};

/// Review decision for an excuse letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExcuseReviewAction {
    /// Accept the excuse
    Approve,
    /// Decline the excuse with a note
    Reject,
}

impl ExcuseReviewAction {
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

/// Input for submitting an excuse letter.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitExcuseInput {
    pub event_id: String,
    pub reason: String,
    pub attachment_url: Option<String>,
}

/// Outcome of an excuse review.
#[derive(Debug)]
pub struct ExcuseReviewOutcome {
    /// Human-readable outcome message.
    pub message: String,
    /// Result of the notification email send.
    pub notification: EmailDeliveryResult,
}

/// Maximum reason length accepted at submission.
const MAX_REASON_LENGTH: usize = 4000;

/// Excuse letter service.
#[derive(Clone)]
pub struct ExcuseLetterService {
    letter_repo: ExcuseLetterRepository,
    event_repo: EventRepository,
    user_repo: UserRepository,
    email_service: EmailService,
    id_gen: IdGenerator,
}

impl ExcuseLetterService {
    /// Create a new excuse letter service.
    #[must_use]
    pub const fn new(
        letter_repo: ExcuseLetterRepository,
        event_repo: EventRepository,
        user_repo: UserRepository,
        email_service: EmailService,
    ) -> Self {
        Self {
            letter_repo,
            event_repo,
            user_repo,
            email_service,
            id_gen: IdGenerator::new(),
        }
    }

    /// Submit an excuse letter for an event.
    pub async fn submit(
        &self,
        user_id: &str,
        input: SubmitExcuseInput,
    ) -> AppResult<excuse_letter::Model> {
        let reason = input.reason.trim();
        if reason.is_empty() {
            return Err(AppError::Validation("reason is required".to_string()));
        }
        if reason.len() > MAX_REASON_LENGTH {
            return Err(AppError::Validation("reason is too long".to_string()));
        }

        let event = self.event_repo.get_by_id(&input.event_id).await?;
        let user = self.user_repo.get_by_id(user_id).await?;

        let model = excuse_letter::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user.id.clone()),
            event_id: Set(event.id.clone()),
            reason: Set(reason.to_string()),
            attachment_url: Set(input.attachment_url),
            status: Set(ExcuseStatus::Pending),
            submitted_at: Set(Utc::now().into()),
            reviewed_by: Set(None),
            reviewed_at: Set(None),
            review_note: Set(None),
        };

        let letter = self.letter_repo.create(model).await?;

        tracing::info!(
            letter_id = %letter.id,
            event_id = %event.id,
            user_id = %user.id,
            "Excuse letter submitted"
        );

        Ok(letter)
    }

    /// List letters matching a filter, with the total match count.
    pub async fn list(
        &self,
        filter: ExcuseLetterFilter,
        limit: u64,
        offset: u64,
    ) -> AppResult<(Vec<excuse_letter::Model>, u64)> {
        let letters = self.letter_repo.list(&filter, limit, offset).await?;
        let count = self.letter_repo.count(&filter).await?;
        Ok((letters, count))
    }

    /// Get a letter by ID.
    pub async fn get(&self, id: &str) -> AppResult<excuse_letter::Model> {
        self.letter_repo.get_by_id(id).await
    }

    /// Review a pending letter.
    ///
    /// The transition is a conditional update guarded on pending; the
    /// submitter is notified best-effort afterwards.
    pub async fn review(
        &self,
        letter_id: &str,
        action: ExcuseReviewAction,
        reviewer_id: &str,
        note: Option<&str>,
    ) -> AppResult<ExcuseReviewOutcome> {
        let note = match action {
            ExcuseReviewAction::Reject => {
                let note = note.map(str::trim).unwrap_or_default();
                if note.is_empty() {
                    return Err(AppError::Validation(
                        "note is required when rejecting".to_string(),
                    ));
                }
                Some(note.to_string())
            }
            ExcuseReviewAction::Approve => note
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(String::from),
        };

        let letter = self.letter_repo.get_by_id(letter_id).await?;

        if letter.status != ExcuseStatus::Pending {
            return Err(AppError::InvalidState(format!(
                "Excuse letter {letter_id} was already reviewed"
            )));
        }

        let (new_status, decision) = match action {
            ExcuseReviewAction::Approve => (ExcuseStatus::Approved, "approved"),
            ExcuseReviewAction::Reject => (ExcuseStatus::Rejected, "rejected"),
        };

        let won = self
            .letter_repo
            .mark_reviewed(letter_id, new_status, reviewer_id, note.clone(), Utc::now())
            .await?;

        if !won {
            return Err(AppError::InvalidState(format!(
                "Excuse letter {letter_id} was already reviewed"
            )));
        }

        tracing::info!(
            letter_id = letter_id,
            reviewer_id = reviewer_id,
            decision = decision,
            "Excuse letter reviewed"
        );

        let notification = self.notify_submitter(&letter, decision, note).await;

        Ok(ExcuseReviewOutcome {
            message: format!("Excuse letter {letter_id} {decision}"),
            notification,
        })
    }

    async fn notify_submitter(
        &self,
        letter: &excuse_letter::Model,
        decision: &str,
        note: Option<String>,
    ) -> EmailDeliveryResult {
        let user = match self.user_repo.find_by_id(&letter.user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::warn!(letter_id = %letter.id, "Submitter no longer exists, skipping email");
                return EmailDeliveryResult::failed("Submitter no longer exists");
            }
            Err(e) => return EmailDeliveryResult::failed(e.to_string()),
        };

        let event_name = match self.event_repo.find_by_id(&letter.event_id).await {
            Ok(Some(event)) => Some(event.name),
            _ => None,
        };

        self.email_service
            .notify(
                EmailNotificationType::ExcuseReviewed,
                &user.email,
                EmailTemplateVars {
                    recipient_name: Some(user.first_name),
                    event_name,
                    decision: Some(decision.to_string()),
                    review_note: note,
                    ..Default::default()
                },
                None,
            )
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use std::sync::Arc;

    fn service_over(db: DatabaseConnection) -> ExcuseLetterService {
        let db = Arc::new(db);
        ExcuseLetterService::new(
            ExcuseLetterRepository::new(Arc::clone(&db)),
            EventRepository::new(Arc::clone(&db)),
            UserRepository::new(db),
            EmailService::new(None),
        )
    }

    #[test]
    fn test_excuse_review_action_parse() {
        assert_eq!(
            ExcuseReviewAction::parse("approve"),
            Some(ExcuseReviewAction::Approve)
        );
        assert_eq!(ExcuseReviewAction::parse("IGNORE"), None);
    }

    #[tokio::test]
    async fn test_submit_rejects_blank_reason() {
        let service = service_over(
            MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
        );

        let result = service
            .submit(
                "user1",
                SubmitExcuseInput {
                    event_id: "ev1".to_string(),
                    reason: "  ".to_string(),
                    attachment_url: None,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_reject_requires_note_before_any_read() {
        let service = service_over(
            MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
        );

        let result = service
            .review("ex1", ExcuseReviewAction::Reject, "admin1", None)
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_review_already_decided_is_invalid_state() {
        let letter = excuse_letter::Model {
            id: "ex1".to_string(),
            user_id: "user1".to_string(),
            event_id: "ev1".to_string(),
            reason: "Medical appointment".to_string(),
            attachment_url: None,
            status: ExcuseStatus::Approved,
            submitted_at: Utc::now().into(),
            reviewed_by: Some("admin1".to_string()),
            reviewed_at: Some(Utc::now().into()),
            review_note: None,
        };

        let service = service_over(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[letter]])
                .into_connection(),
        );

        let result = service
            .review("ex1", ExcuseReviewAction::Approve, "admin1", None)
            .await;

        assert!(matches!(result, Err(AppError::InvalidState(_))));
    }
}
