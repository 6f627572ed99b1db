//! Email notification service.

use serde::{Deserialize, Serialize};

use rollcall_common::config::{EmailSettings, ServerConfig};
use rollcall_common::{AppError, AppResult};

/// Email provider configuration.
#[derive(Debug, Clone)]
pub enum EmailProvider {
    /// SMTP configuration
    Smtp(SmtpConfig),
    /// SendGrid
    SendGrid(SendGridConfig),
    /// Mailgun
    Mailgun(MailgunConfig),
}

/// SMTP configuration.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    /// SMTP host
    pub host: String,
    /// SMTP port
    pub port: u16,
    /// Negotiate STARTTLS
    pub use_tls: bool,
    /// Username
    pub username: Option<String>,
    /// Password
    pub password: Option<String>,
}

/// SendGrid configuration.
#[derive(Debug, Clone)]
pub struct SendGridConfig {
    /// SendGrid API key
    pub api_key: String,
}

/// Mailgun configuration.
#[derive(Debug, Clone)]
pub struct MailgunConfig {
    /// Mailgun API key
    pub api_key: String,
    /// Mailgun domain
    pub domain: String,
    /// Use EU region
    pub eu_region: bool,
}

/// Email configuration.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// Email provider
    pub provider: EmailProvider,
    /// From address
    pub from_address: String,
    /// From name
    pub from_name: String,
    /// Instance name (for templates)
    pub instance_name: String,
    /// Instance URL (for templates)
    pub instance_url: String,
}

impl EmailConfig {
    /// Build provider configuration from application settings.
    pub fn from_settings(settings: &EmailSettings, server: &ServerConfig) -> AppResult<Self> {
        let provider = match settings.provider.as_str() {
            "smtp" => EmailProvider::Smtp(SmtpConfig {
                host: settings
                    .smtp_host
                    .clone()
                    .ok_or_else(|| AppError::Config("email.smtp_host is required".to_string()))?,
                port: settings.smtp_port.unwrap_or(587),
                use_tls: settings.smtp_tls,
                username: settings.smtp_username.clone(),
                password: settings.smtp_password.clone(),
            }),
            "sendgrid" => EmailProvider::SendGrid(SendGridConfig {
                api_key: settings
                    .api_key
                    .clone()
                    .ok_or_else(|| AppError::Config("email.api_key is required".to_string()))?,
            }),
            "mailgun" => EmailProvider::Mailgun(MailgunConfig {
                api_key: settings
                    .api_key
                    .clone()
                    .ok_or_else(|| AppError::Config("email.api_key is required".to_string()))?,
                domain: settings
                    .domain
                    .clone()
                    .ok_or_else(|| AppError::Config("email.domain is required".to_string()))?,
                eu_region: settings.eu_region,
            }),
            other => {
                return Err(AppError::Config(format!(
                    "Unknown email provider: {other}"
                )));
            }
        };

        Ok(Self {
            provider,
            from_address: settings.from_address.clone(),
            from_name: settings.from_name.clone(),
            instance_name: server.instance_name.clone(),
            instance_url: server.url.clone(),
        })
    }
}

/// Email notification types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EmailNotificationType {
    /// Account request approved
    AccountApproved,
    /// Account request rejected
    AccountRejected,
    /// Reminder that a request is still pending review
    PendingReminder,
    /// Attendance certificate
    Certificate,
    /// Excuse letter reviewed
    ExcuseReviewed,
}

impl std::fmt::Display for EmailNotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::AccountApproved => "account_approved",
            Self::AccountRejected => "account_rejected",
            Self::PendingReminder => "pending_reminder",
            Self::Certificate => "certificate",
            Self::ExcuseReviewed => "excuse_reviewed",
        };
        write!(f, "{}", s)
    }
}

/// Binary attachment for an email.
#[derive(Debug, Clone)]
pub struct EmailAttachment {
    /// File name shown to the recipient
    pub filename: String,
    /// MIME type
    pub content_type: String,
    /// Raw bytes
    pub data: Vec<u8>,
}

/// Email message to be sent.
#[derive(Debug)]
pub struct EmailMessage {
    /// Recipient email address
    pub to: String,
    /// Subject line
    pub subject: String,
    /// Plain text body
    pub text_body: String,
    /// HTML body (optional)
    pub html_body: Option<String>,
    /// Binary attachment (optional)
    pub attachment: Option<EmailAttachment>,
}

/// Template variables for emails.
#[derive(Debug, Default)]
pub struct EmailTemplateVars {
    /// Recipient's display name
    pub recipient_name: Option<String>,
    /// School ID the notification concerns
    pub school_id: Option<String>,
    /// Event name (certificates, excuse reviews)
    pub event_name: Option<String>,
    /// Rejection reason (account rejections)
    pub rejection_reason: Option<String>,
    /// Reviewer note (excuse reviews)
    pub review_note: Option<String>,
    /// Review decision string (excuse reviews)
    pub decision: Option<String>,
}

/// Email delivery result.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailDeliveryResult {
    /// Whether the email was sent successfully
    pub success: bool,
    /// Message ID from provider (if available)
    pub message_id: Option<String>,
    /// Error message (if failed)
    pub error: Option<String>,
}

impl EmailDeliveryResult {
    /// A send that never happened because no provider is configured.
    #[must_use]
    pub fn skipped() -> Self {
        Self {
            success: false,
            message_id: None,
            error: Some("Email service not configured".to_string()),
        }
    }

    /// A send that failed before reaching the provider.
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message_id: None,
            error: Some(error.into()),
        }
    }
}

/// Email service.
#[derive(Clone)]
pub struct EmailService {
    config: Option<EmailConfig>,
    http_client: reqwest::Client,
}

impl EmailService {
    /// Create a new email service.
    #[must_use]
    pub fn new(config: Option<EmailConfig>) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    /// Check if email service is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.config.is_some()
    }

    /// Send an email.
    pub async fn send(&self, message: EmailMessage) -> AppResult<EmailDeliveryResult> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| AppError::Email("Email service not configured".to_string()))?;

        match &config.provider {
            EmailProvider::Smtp(smtp) => self.send_smtp(smtp, config, message).await,
            EmailProvider::SendGrid(sg) => self.send_sendgrid(sg, config, message).await,
            EmailProvider::Mailgun(mg) => self.send_mailgun(mg, config, message).await,
        }
    }

    /// Send a notification email.
    pub async fn send_notification(
        &self,
        notification_type: EmailNotificationType,
        to: &str,
        vars: EmailTemplateVars,
        attachment: Option<EmailAttachment>,
    ) -> AppResult<EmailDeliveryResult> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| AppError::Email("Email service not configured".to_string()))?;

        let (subject, text_body, html_body) = render_template(notification_type, &vars, config);

        let message = EmailMessage {
            to: to.to_string(),
            subject,
            text_body,
            html_body: Some(html_body),
            attachment,
        };

        self.send(message).await
    }

    /// Best-effort notification: failures and a missing provider come back
    /// as an unsuccessful [`EmailDeliveryResult`] instead of an error, so
    /// callers can report the outcome without aborting their own work.
    pub async fn notify(
        &self,
        notification_type: EmailNotificationType,
        to: &str,
        vars: EmailTemplateVars,
        attachment: Option<EmailAttachment>,
    ) -> EmailDeliveryResult {
        if !self.is_enabled() {
            tracing::debug!(kind = %notification_type, to = to, "Email not configured, skipping");
            return EmailDeliveryResult::skipped();
        }

        match self
            .send_notification(notification_type, to, vars, attachment)
            .await
        {
            Ok(result) => {
                if !result.success {
                    tracing::warn!(
                        kind = %notification_type,
                        to = to,
                        error = result.error.as_deref().unwrap_or("unknown"),
                        "Notification email was not delivered"
                    );
                }
                result
            }
            Err(e) => {
                tracing::warn!(kind = %notification_type, to = to, error = %e, "Notification email failed");
                EmailDeliveryResult::failed(e.to_string())
            }
        }
    }

    // Provider-specific implementations

    async fn send_smtp(
        &self,
        smtp: &SmtpConfig,
        config: &EmailConfig,
        message: EmailMessage,
    ) -> AppResult<EmailDeliveryResult> {
        use lettre::message::header::ContentType;
        use lettre::message::{Attachment, Mailbox, MultiPart};
        use lettre::transport::smtp::authentication::Credentials;
        use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

        let from: Mailbox = format!("{} <{}>", config.from_name, config.from_address)
            .parse()
            .map_err(|e| AppError::Email(format!("Invalid from address: {e}")))?;
        let to: Mailbox = message
            .to
            .parse()
            .map_err(|e| AppError::Email(format!("Invalid recipient address: {e}")))?;

        let html = message.html_body.unwrap_or_else(|| message.text_body.clone());
        let body = MultiPart::alternative_plain_html(message.text_body, html);

        let body = if let Some(attachment) = message.attachment {
            let content_type = ContentType::parse(&attachment.content_type)
                .map_err(|e| AppError::Email(format!("Invalid attachment type: {e}")))?;
            MultiPart::mixed()
                .multipart(body)
                .singlepart(Attachment::new(attachment.filename).body(attachment.data, content_type))
        } else {
            body
        };

        let email = Message::builder()
            .from(from)
            .to(to)
            .subject(message.subject)
            .multipart(body)
            .map_err(|e| AppError::Email(format!("Failed to build message: {e}")))?;

        let mut builder = if smtp.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)
                .map_err(|e| AppError::Email(format!("SMTP relay setup failed: {e}")))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&smtp.host)
        };
        builder = builder.port(smtp.port);

        if let (Some(username), Some(password)) = (&smtp.username, &smtp.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        let transport = builder.build();

        match transport.send(email).await {
            Ok(_) => Ok(EmailDeliveryResult {
                success: true,
                message_id: None,
                error: None,
            }),
            Err(e) => Ok(EmailDeliveryResult {
                success: false,
                message_id: None,
                error: Some(e.to_string()),
            }),
        }
    }

    async fn send_sendgrid(
        &self,
        sg: &SendGridConfig,
        config: &EmailConfig,
        message: EmailMessage,
    ) -> AppResult<EmailDeliveryResult> {
        use base64::Engine as _;

        let mut body = serde_json::json!({
            "personalizations": [{
                "to": [{"email": message.to}]
            }],
            "from": {
                "email": config.from_address,
                "name": config.from_name
            },
            "subject": message.subject,
            "content": [
                {"type": "text/plain", "value": message.text_body},
                {"type": "text/html", "value": message.html_body.unwrap_or_default()}
            ]
        });

        if let Some(attachment) = message.attachment {
            body["attachments"] = serde_json::json!([{
                "content": base64::engine::general_purpose::STANDARD.encode(&attachment.data),
                "type": attachment.content_type,
                "filename": attachment.filename,
            }]);
        }

        let response = self
            .http_client
            .post("https://api.sendgrid.com/v3/mail/send")
            .header("Authorization", format!("Bearer {}", sg.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("SendGrid request failed: {}", e)))?;

        if response.status().is_success() {
            let message_id = response
                .headers()
                .get("X-Message-Id")
                .and_then(|v| v.to_str().ok())
                .map(String::from);
            Ok(EmailDeliveryResult {
                success: true,
                message_id,
                error: None,
            })
        } else {
            let error_text = response.text().await.unwrap_or_default();
            Ok(EmailDeliveryResult {
                success: false,
                message_id: None,
                error: Some(error_text),
            })
        }
    }

    async fn send_mailgun(
        &self,
        mg: &MailgunConfig,
        config: &EmailConfig,
        message: EmailMessage,
    ) -> AppResult<EmailDeliveryResult> {
        let base_url = if mg.eu_region {
            "https://api.eu.mailgun.net"
        } else {
            "https://api.mailgun.net"
        };

        let mut form = reqwest::multipart::Form::new()
            .text(
                "from",
                format!("{} <{}>", config.from_name, config.from_address),
            )
            .text("to", message.to)
            .text("subject", message.subject)
            .text("text", message.text_body);

        if let Some(html) = message.html_body {
            form = form.text("html", html);
        }

        if let Some(attachment) = message.attachment {
            let part = reqwest::multipart::Part::bytes(attachment.data)
                .file_name(attachment.filename)
                .mime_str(&attachment.content_type)
                .map_err(|e| AppError::Email(format!("Invalid attachment type: {e}")))?;
            form = form.part("attachment", part);
        }

        let response = self
            .http_client
            .post(format!("{}/v3/{}/messages", base_url, mg.domain))
            .basic_auth("api", Some(&mg.api_key))
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Mailgun request failed: {}", e)))?;

        if response.status().is_success() {
            #[derive(Deserialize)]
            struct MailgunResponse {
                id: Option<String>,
            }
            let result: MailgunResponse = response
                .json()
                .await
                .unwrap_or(MailgunResponse { id: None });
            Ok(EmailDeliveryResult {
                success: true,
                message_id: result.id,
                error: None,
            })
        } else {
            let error_text = response.text().await.unwrap_or_default();
            Ok(EmailDeliveryResult {
                success: false,
                message_id: None,
                error: Some(error_text),
            })
        }
    }
}

/// Render an email template.
fn render_template(
    notification_type: EmailNotificationType,
    vars: &EmailTemplateVars,
    config: &EmailConfig,
) -> (String, String, String) {
    let recipient = vars.recipient_name.as_deref().unwrap_or("there");

    match notification_type {
        EmailNotificationType::AccountApproved => {
            let subject = format!("Your {} account has been approved", config.instance_name);
            let text = format!(
                "Hi {}!\n\n\
                Your account request for {} has been approved. You can now sign in \
                with your school ID {} and the password you registered with.\n\n\
                Sign in: {}",
                recipient,
                config.instance_name,
                vars.school_id.as_deref().unwrap_or(""),
                config.instance_url
            );
            let html = wrap_html(
                &format!(
                    "<p>Hi {}!</p>\
                    <p>Your account request for <strong>{}</strong> has been approved. \
                    You can now sign in with your school ID <strong>{}</strong> and the \
                    password you registered with.</p>\
                    <p><a href=\"{}\" style=\"display:inline-block;padding:12px 24px;background:#28a745;color:#fff;text-decoration:none;border-radius:4px;\">Sign In</a></p>",
                    recipient,
                    config.instance_name,
                    vars.school_id.as_deref().unwrap_or(""),
                    config.instance_url
                ),
                config,
            );
            (subject, text, html)
        }

        EmailNotificationType::AccountRejected => {
            let reason = vars.rejection_reason.as_deref().unwrap_or("Not specified");
            let subject = format!("Your {} account request was declined", config.instance_name);
            let text = format!(
                "Hi {}.\n\n\
                Unfortunately your account request for {} was declined.\n\n\
                Reason: {}\n\n\
                If you believe this is a mistake, please contact your administrator.",
                recipient, config.instance_name, reason
            );
            let html = wrap_html(
                &format!(
                    "<p>Hi {}.</p>\
                    <p>Unfortunately your account request for <strong>{}</strong> was declined.</p>\
                    <blockquote>{}</blockquote>\
                    <p>If you believe this is a mistake, please contact your administrator.</p>",
                    recipient, config.instance_name, reason
                ),
                config,
            );
            (subject, text, html)
        }

        EmailNotificationType::PendingReminder => {
            let subject = format!("Your {} account request is still pending", config.instance_name);
            let text = format!(
                "Hi {}!\n\n\
                Your account request for {} is still waiting for review. \
                No action is needed from you; this is just a reminder that it \
                has not been forgotten.",
                recipient, config.instance_name
            );
            let html = wrap_html(
                &format!(
                    "<p>Hi {}!</p>\
                    <p>Your account request for <strong>{}</strong> is still waiting for review. \
                    No action is needed from you; this is just a reminder that it has not \
                    been forgotten.</p>",
                    recipient, config.instance_name
                ),
                config,
            );
            (subject, text, html)
        }

        EmailNotificationType::Certificate => {
            let event = vars.event_name.as_deref().unwrap_or("the event");
            let subject = format!("Your certificate of attendance for {event}");
            let text = format!(
                "Hi {}!\n\n\
                Thank you for attending {}. Your certificate of attendance is \
                attached to this email.",
                recipient, event
            );
            let html = wrap_html(
                &format!(
                    "<p>Hi {}!</p>\
                    <p>Thank you for attending <strong>{}</strong>. Your certificate of \
                    attendance is attached to this email.</p>",
                    recipient, event
                ),
                config,
            );
            (subject, text, html)
        }

        EmailNotificationType::ExcuseReviewed => {
            let event = vars.event_name.as_deref().unwrap_or("the event");
            let decision = vars.decision.as_deref().unwrap_or("reviewed");
            let subject = format!("Your excuse letter for {event} was {decision}");
            let note = vars.review_note.as_deref().unwrap_or("");
            let text = format!(
                "Hi {}!\n\n\
                Your excuse letter for {} was {}.\n\n{}",
                recipient, event, decision, note
            );
            let html = wrap_html(
                &format!(
                    "<p>Hi {}!</p>\
                    <p>Your excuse letter for <strong>{}</strong> was <strong>{}</strong>.</p>\
                    <blockquote>{}</blockquote>",
                    recipient, event, decision, note
                ),
                config,
            );
            (subject, text, html)
        }
    }
}

/// Wrap HTML content in a basic email template.
fn wrap_html(content: &str, config: &EmailConfig) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px; }}
        a {{ color: #007bff; }}
        blockquote {{ margin: 10px 0; padding: 10px 20px; border-left: 4px solid #e9ecef; background: #f8f9fa; }}
    </style>
</head>
<body>
    {}
    <hr style="margin-top: 40px; border: none; border-top: 1px solid #e9ecef;">
    <p style="font-size: 12px; color: #6c757d;">
        This email was sent from <a href="{}">{}</a>.
    </p>
</body>
</html>"#,
        content, config.instance_url, config.instance_name
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_config() -> EmailConfig {
        EmailConfig {
            provider: EmailProvider::SendGrid(SendGridConfig {
                api_key: "key".to_string(),
            }),
            from_address: "noreply@example.com".to_string(),
            from_name: "Rollcall".to_string(),
            instance_name: "Rollcall Test".to_string(),
            instance_url: "https://example.com".to_string(),
        }
    }

    #[test]
    fn test_approval_template_mentions_school_id() {
        let vars = EmailTemplateVars {
            recipient_name: Some("Ana".to_string()),
            school_id: Some("S100".to_string()),
            ..Default::default()
        };
        let (subject, text, html) =
            render_template(EmailNotificationType::AccountApproved, &vars, &test_config());

        assert!(subject.contains("approved"));
        assert!(text.contains("Ana"));
        assert!(text.contains("S100"));
        assert!(html.contains("Rollcall Test"));
    }

    #[test]
    fn test_rejection_template_carries_reason() {
        let vars = EmailTemplateVars {
            recipient_name: Some("Ana".to_string()),
            rejection_reason: Some("Incomplete details".to_string()),
            ..Default::default()
        };
        let (subject, text, _) =
            render_template(EmailNotificationType::AccountRejected, &vars, &test_config());

        assert!(subject.contains("declined"));
        assert!(text.contains("Incomplete details"));
    }

    #[tokio::test]
    async fn test_notify_without_provider_is_skipped() {
        let service = EmailService::new(None);
        let result = service
            .notify(
                EmailNotificationType::PendingReminder,
                "ana@x.com",
                EmailTemplateVars::default(),
                None,
            )
            .await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("not configured"));
    }

    #[test]
    fn test_config_from_settings_rejects_unknown_provider() {
        let settings = EmailSettings {
            provider: "carrier-pigeon".to_string(),
            from_address: "noreply@example.com".to_string(),
            from_name: "Rollcall".to_string(),
            smtp_host: None,
            smtp_port: None,
            smtp_username: None,
            smtp_password: None,
            smtp_tls: true,
            api_key: None,
            domain: None,
            eu_region: false,
        };
        let server = ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 3000,
            url: "https://example.com".to_string(),
            instance_name: "Rollcall".to_string(),
        };

        assert!(EmailConfig::from_settings(&settings, &server).is_err());
    }
}
