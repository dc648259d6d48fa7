//! Middleware for authentication and authorization.
//!
//! 1. Client sends `Authorization: Bearer <token>`
//! 2. The [`auth::AuthUser`] extractor verifies the credential and
//!    yields the request's principal (id + role)
//! 3. [`role`] middleware gates whole route groups on role membership
//!
//! Both failure modes short-circuit the pipeline with 401; no
//! downstream handler runs.

pub mod auth;
pub mod role;
