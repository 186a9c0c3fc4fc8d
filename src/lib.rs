//! Clinic Gateway Library
//!
//! Two services sharing one token format:
//!
//! - **Gateway**: CORS for a single origin, bearer-token authentication on
//!   every request, and reverse proxying to five backends by path prefix.
//! - **Login service**: `POST /login` checks a user's credentials against the
//!   `Usuario` table and returns a signed token valid for 30 minutes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod login;
pub mod shutdown;
pub mod token;

pub use error::{ApiError, Error, Result};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup tracing/logging
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        Some("json") => subscriber
            .with(fmt::layer().json())
            .try_init()
            .map_err(|e| Error::Internal(e.to_string())),
        _ => subscriber
            .with(fmt::layer())
            .try_init()
            .map_err(|e| Error::Internal(e.to_string())),
    }
}
