//! Utility modules for the CodeCamp API.
//!
//! - [`email`]: SMTP sending for password-reset mail
//! - [`errors`]: application error type and response envelope
//! - [`geocode`]: zipcode geocoding client
//! - [`jwt`]: token creation and verification
//! - [`password`]: password hashing and verification
//! - [`query`]: query-string translation, filtering and pagination
//! - [`response`]: success response envelope

pub mod email;
pub mod errors;
pub mod geocode;
pub mod jwt;
pub mod password;
pub mod query;
pub mod response;
