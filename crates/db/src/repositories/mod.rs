//! Database repositories.

#![allow(missing_docs)]

pub mod account_request;
pub mod attendance;
pub mod certificate;
pub mod department;
pub mod event;
pub mod excuse_letter;
pub mod user;

pub use account_request::{sort_by_requested_desc, AccountRequestRepository};
pub use attendance::AttendanceRepository;
pub use certificate::CertificateRepository;
pub use department::DepartmentRepository;
pub use event::EventRepository;
pub use excuse_letter::{ExcuseLetterFilter, ExcuseLetterRepository};
pub use user::UserRepository;
