//! # Error Types
//!
//! Custom error type for all `throttler` operations, with an `IntoResponse`
//! impl so the HTTP front-end in [`crate::handlers`] can propagate them
//! directly from handlers.
//!
//! Per the protocol's error-handling design: an inadmissible charge is
//! `success = false`, not an error — `ThrottlerError` only ever represents
//! transport failures, malformed caller input, or internal bugs. The script
//! itself never produces an application-level error.

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use std::fmt;

/// Errors that can occur while driving the rate limiter.
#[derive(Debug, Clone)]
pub enum ThrottlerError {
    /// The Redis connection or command failed.
    Redis(String),
    /// Configuration could not be loaded or was internally inconsistent.
    Config(String),
    /// A bucket or request parameter violated the caller contract (e.g. a
    /// negative rate, a non-positive size, an empty key).
    Validation(String),
    /// The script returned a reply shaped unlike `[success, level...]`.
    Serialization(String),
    /// Anything else unexpected (lock poisoning, unreachable states).
    Internal(String),
}

impl fmt::Display for ThrottlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThrottlerError::Redis(msg) => write!(f, "redis error: {msg}"),
            ThrottlerError::Config(msg) => write!(f, "configuration error: {msg}"),
            ThrottlerError::Validation(msg) => write!(f, "validation error: {msg}"),
            ThrottlerError::Serialization(msg) => write!(f, "serialization error: {msg}"),
            ThrottlerError::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for ThrottlerError {}

impl From<redis::RedisError> for ThrottlerError {
    fn from(err: redis::RedisError) -> Self {
        ThrottlerError::Redis(err.to_string())
    }
}

impl From<serde_json::Error> for ThrottlerError {
    fn from(err: serde_json::Error) -> Self {
        ThrottlerError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for ThrottlerError {
    fn from(err: config::ConfigError) -> Self {
        ThrottlerError::Config(err.to_string())
    }
}

impl IntoResponse for ThrottlerError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ThrottlerError::Validation(_) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({"error": "validation_error", "message": self.to_string()}),
            ),
            ThrottlerError::Config(_) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({"error": "configuration_error", "message": self.to_string()}),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({"error": "internal_error", "message": "an unexpected error occurred"}),
            ),
        };

        (status, Json(body)).into_response()
    }
}

pub type ThrottlerResult<T> = std::result::Result<T, ThrottlerError>;
pub type Result<T> = ThrottlerResult<T>;
