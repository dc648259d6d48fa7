//! Configuration modules for the CodeCamp API.
//!
//! Each submodule owns one concern and loads it from environment
//! variables into an immutable struct at startup:
//!
//! - [`cors`]: allowed origins for the CORS layer
//! - [`database`]: PostgreSQL connection pool initialization
//! - [`email`]: SMTP settings for password-reset mail
//! - [`geocoder`]: zipcode geocoding endpoint and key
//! - [`jwt`]: signing secret and token/cookie expiries
//! - [`uploads`]: photo upload directory and size cap

pub mod cors;
pub mod database;
pub mod email;
pub mod geocoder;
pub mod jwt;
pub mod uploads;
