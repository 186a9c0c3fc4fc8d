//! Error types for the gateway and the login service

use std::io;

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Result type alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Internal errors
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Outbound HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// User store error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Token signing or decoding error
    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// Password hashing error
    #[error("Password hashing error: {0}")]
    Password(#[from] bcrypt::BcryptError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Generic message returned to clients on internal failures
pub const INTERNAL_ERROR_MESSAGE: &str = "Error interno del servidor";

/// Errors rendered to HTTP clients as `{"error": "..."}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Malformed or incomplete input
    BadRequest(String),
    /// Missing or invalid token, or failed login
    Unauthorized(String),
    /// Store, hashing or signing failure. Details stay in the server log.
    Internal,
}

impl ApiError {
    /// Shorthand for [`ApiError::BadRequest`]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Shorthand for [`ApiError::Unauthorized`]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    /// HTTP status for this error
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the client
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest(m) | Self::Unauthorized(m) => m,
            Self::Internal => INTERNAL_ERROR_MESSAGE,
        }
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        tracing::error!(error = %e, "Request failed");
        Self::Internal
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.message() }));
        if matches!(self, Self::Unauthorized(_)) {
            (self.status(), [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response()
        } else {
            (self.status(), body).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_hides_detail() {
        let err: ApiError = Error::Internal("connection reset by peer".to_string()).into();
        assert_eq!(err, ApiError::Internal);
        assert_eq!(err.message(), INTERNAL_ERROR_MESSAGE);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_unauthorized_sets_challenge_header() {
        let response = ApiError::unauthorized("Token inválido o expirado").into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }

    #[test]
    fn test_bad_request_status() {
        let err = ApiError::bad_request("Faltan credenciales");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "Faltan credenciales");
    }
}
