//! Business logic services.

#![allow(missing_docs)]

pub mod account_request;
pub mod attendance;
pub mod certificate;
pub mod department;
pub mod email;
pub mod event;
pub mod excuse_letter;
pub mod user;

pub use account_request::{
    AccountRequestService, CreateAccountRequestInput, ReviewAction, ReviewOutcome,
};
pub use attendance::{AttendanceService, TimeInInput, TimeInOutcome};
pub use certificate::{
    CertificateData, CertificateRenderer, CertificateService, IssueOutcome, RemoteRenderer,
};
pub use department::DepartmentService;
pub use email::{
    EmailAttachment, EmailConfig, EmailDeliveryResult, EmailMessage, EmailNotificationType,
    EmailProvider, EmailService, EmailTemplateVars, MailgunConfig, SendGridConfig, SmtpConfig,
};
pub use event::{CreateEventInput, EventService};
pub use excuse_letter::{
    ExcuseLetterService, ExcuseReviewAction, ExcuseReviewOutcome, SubmitExcuseInput,
};
pub use user::{RegisterUserInput, UpdateUserInput, UserService};
