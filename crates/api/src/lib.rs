//! HTTP API layer for rollcall.
//!
//! This crate provides the REST API:
//!
//! - **Endpoints**: account requests, auth, users, departments, events,
//!   attendance, certificates, excuse letters
//! - **Extractors**: Authentication
//! - **Middleware**: Bearer-token resolution, admin gating
//!
//! Built on Axum 0.8 with Tower middleware stack.

// Allow dead_code for API compatibility fields in request structs
#![allow(dead_code)]

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
