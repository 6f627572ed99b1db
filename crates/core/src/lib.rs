//! Core business logic for rollcall.

pub mod services;

pub use services::*;
