//! Certificate issuance service.
//!
//! Certificate layout is not done here: rendering is delegated to a
//! collaborator behind [`CertificateRenderer`], either a remote render
//! service returning the PDF bytes or nothing at all.

use async_trait::async_trait;
use chrono::Utc;
use rollcall_common::{AppError, AppResult, IdGenerator};
use rollcall_db::{
    entities::{certificate, event, user},
    repositories::CertificateRepository,
};
use sea_orm::Set;
use serde::Serialize;
use std::sync::Arc;

use crate::services::email::{
    EmailAttachment, EmailDeliveryResult, EmailNotificationType, EmailService, EmailTemplateVars,
};

/// Data handed to the renderer for a single certificate.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateData {
    /// Recipient display name
    pub recipient_name: String,
    /// Recipient school ID
    pub school_id: String,
    /// Event name
    pub event_name: String,
    /// Certificate serial number
    pub serial: String,
    /// Issue timestamp (RFC 3339)
    pub issued_at: String,
    /// Issuing instance name
    pub instance_name: String,
}

/// Trait for certificate rendering.
///
/// Keeps layout concerns out of the core services: implementations return
/// the finished document bytes.
#[async_trait]
pub trait CertificateRenderer: Send + Sync {
    /// Render a certificate document for the given data.
    async fn render(&self, data: &CertificateData) -> AppResult<Vec<u8>>;
}

/// Renderer that calls a remote render service over HTTP.
pub struct RemoteRenderer {
    client: reqwest::Client,
    render_url: String,
}

impl RemoteRenderer {
    /// Create a renderer pointed at a render service.
    #[must_use]
    pub fn new(render_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            render_url,
        }
    }
}

#[async_trait]
impl CertificateRenderer for RemoteRenderer {
    async fn render(&self, data: &CertificateData) -> AppResult<Vec<u8>> {
        let response = self
            .client
            .post(&self.render_url)
            .json(data)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Render request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalService(format!(
                "Render service returned {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::ExternalService(format!("Render response read failed: {e}")))?;

        Ok(bytes.to_vec())
    }
}

/// Outcome of an issuance call.
#[derive(Debug)]
pub struct IssueOutcome {
    /// The certificate record (possibly pre-existing).
    pub certificate: certificate::Model,
    /// Whether this call created the record.
    pub newly_issued: bool,
    /// Result of the certificate email send.
    pub notification: EmailDeliveryResult,
}

/// Certificate issuance service.
#[derive(Clone)]
pub struct CertificateService {
    certificate_repo: CertificateRepository,
    email_service: EmailService,
    renderer: Option<Arc<dyn CertificateRenderer>>,
    instance_name: String,
    id_gen: IdGenerator,
}

impl CertificateService {
    /// Create a new certificate service.
    #[must_use]
    pub fn new(
        certificate_repo: CertificateRepository,
        email_service: EmailService,
        renderer: Option<Arc<dyn CertificateRenderer>>,
        instance_name: String,
    ) -> Self {
        Self {
            certificate_repo,
            email_service,
            renderer,
            instance_name,
            id_gen: IdGenerator::new(),
        }
    }

    /// Issue a certificate for an event/user pair and email it.
    ///
    /// Idempotent per pair: an existing certificate short-circuits without
    /// a second email. Rendering and emailing are advisory; their failures
    /// are reported in the outcome and leave the record un-emailed.
    pub async fn issue(
        &self,
        event: &event::Model,
        user: &user::Model,
    ) -> AppResult<IssueOutcome> {
        if let Some(existing) = self
            .certificate_repo
            .find_by_event_and_user(&event.id, &user.id)
            .await?
        {
            return Ok(IssueOutcome {
                certificate: existing,
                newly_issued: false,
                notification: EmailDeliveryResult::skipped(),
            });
        }

        let now = Utc::now();
        let serial = self.id_gen.generate_serial();

        let model = certificate::ActiveModel {
            id: Set(self.id_gen.generate()),
            event_id: Set(event.id.clone()),
            user_id: Set(user.id.clone()),
            serial: Set(serial.clone()),
            issued_at: Set(now.into()),
            emailed: Set(false),
        };

        let certificate = match self.certificate_repo.create(model).await {
            Ok(certificate) => certificate,
            Err(AppError::Conflict(_)) => {
                // A concurrent time-in issued it first.
                return Ok(IssueOutcome {
                    certificate: self
                        .certificate_repo
                        .find_by_event_and_user(&event.id, &user.id)
                        .await?
                        .ok_or_else(|| {
                            AppError::Internal("Certificate vanished after conflict".to_string())
                        })?,
                    newly_issued: false,
                    notification: EmailDeliveryResult::skipped(),
                });
            }
            Err(e) => return Err(e),
        };

        tracing::info!(
            certificate_id = %certificate.id,
            event_id = %event.id,
            user_id = %user.id,
            "Certificate issued"
        );

        let attachment = self.render_attachment(event, user, &certificate).await;

        let notification = self
            .email_service
            .notify(
                EmailNotificationType::Certificate,
                &user.email,
                EmailTemplateVars {
                    recipient_name: Some(user.first_name.clone()),
                    event_name: Some(event.name.clone()),
                    ..Default::default()
                },
                attachment,
            )
            .await;

        if notification.success {
            self.certificate_repo.mark_emailed(&certificate.id).await?;
        }

        Ok(IssueOutcome {
            certificate,
            newly_issued: true,
            notification,
        })
    }

    /// Render the attachment, best-effort.
    async fn render_attachment(
        &self,
        event: &event::Model,
        user: &user::Model,
        certificate: &certificate::Model,
    ) -> Option<EmailAttachment> {
        let renderer = self.renderer.as_ref()?;

        let data = CertificateData {
            recipient_name: format!("{} {}", user.first_name, user.last_name),
            school_id: user.school_id.clone(),
            event_name: event.name.clone(),
            serial: certificate.serial.clone(),
            issued_at: certificate.issued_at.to_rfc3339(),
            instance_name: self.instance_name.clone(),
        };

        match renderer.render(&data).await {
            Ok(bytes) => Some(EmailAttachment {
                filename: format!("certificate-{}.pdf", certificate.serial),
                content_type: "application/pdf".to_string(),
                data: bytes,
            }),
            Err(e) => {
                tracing::warn!(
                    certificate_id = %certificate.id,
                    error = %e,
                    "Certificate rendering failed, emailing without attachment"
                );
                None
            }
        }
    }

    /// List certificates for an event.
    pub async fn list_by_event(&self, event_id: &str) -> AppResult<Vec<certificate::Model>> {
        self.certificate_repo.list_by_event(event_id).await
    }

    /// List certificates for a user.
    pub async fn list_by_user(&self, user_id: &str) -> AppResult<Vec<certificate::Model>> {
        self.certificate_repo.list_by_user(user_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rollcall_db::entities::user::UserRole;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn test_event() -> event::Model {
        event::Model {
            id: "ev1".to_string(),
            name: "Orientation".to_string(),
            description: None,
            venue: None,
            starts_at: Utc::now().into(),
            ends_at: None,
            check_in_code: "code".to_string(),
            created_by: "admin1".to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn test_user() -> user::Model {
        user::Model {
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
        }
    }

    #[tokio::test]
    async fn test_issue_is_idempotent_for_existing_certificate() {
        let existing = certificate::Model {
            id: "cert1".to_string(),
            event_id: "ev1".to_string(),
            user_id: "user1".to_string(),
            serial: "SER1".to_string(),
            issued_at: Utc::now().into(),
            emailed: true,
        };

        let db = std::sync::Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                .into_connection(),
        );

        let service = CertificateService::new(
            CertificateRepository::new(db),
            EmailService::new(None),
            None,
            "Rollcall".to_string(),
        );

        let outcome = service.issue(&test_event(), &test_user()).await.unwrap();

        assert!(!outcome.newly_issued);
        assert_eq!(outcome.certificate.id, "cert1");
        assert!(!outcome.notification.success);
    }
}
