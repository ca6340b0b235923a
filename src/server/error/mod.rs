//! Error types for the Ferry server.
//!
//! This module provides the error handling system with specialized error types for the
//! different domains of the crate (configuration, fallback scheduling, worker queue). All
//! errors implement `IntoResponse` for Axum HTTP responses and use `thiserror` for ergonomic
//! error definitions with automatic `Display` and `Error` trait implementations.

pub mod config;
pub mod fallback;
pub mod retry;
pub mod worker;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::{
    model::api::ErrorDto,
    server::error::{config::ConfigError, fallback::FallbackError, worker::WorkerError},
};

/// Main error type for the Ferry server.
///
/// This enum aggregates all domain-specific error types and external library errors into a
/// single unified error type. It uses `thiserror`'s `#[from]` attribute to enable automatic
/// conversion from underlying error types via the `?` operator.
///
/// # Error Categories
/// - Configuration errors (missing/invalid environment variables)
/// - Fallback errors (liveness store unavailable)
/// - Worker errors (message validation, handler failures)
/// - External library errors (Redis, JSON serialization)
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error (missing or invalid environment variables).
    #[error(transparent)]
    ConfigError(#[from] ConfigError),
    /// Fallback scheduling error (liveness store unavailable).
    #[error(transparent)]
    FallbackError(#[from] FallbackError),
    /// Worker error (message validation, serialization, handler failures).
    #[error(transparent)]
    WorkerError(#[from] WorkerError),
    /// Internal error indicating a bug in Ferry's code.
    #[error("Internal error with Ferry's code, this indicates a bug: {0:?}")]
    InternalError(String),
    /// Redis error (connection issues, command or script execution).
    #[error(transparent)]
    RedisError(#[from] fred::error::Error),
    /// JSON serialization error.
    #[error(transparent)]
    SerdeJsonError(#[from] serde_json::Error),
    /// IO error (binding the HTTP listener).
    #[error(transparent)]
    IoError(#[from] std::io::Error),
}

/// Converts application errors into HTTP responses.
///
/// # Returns
/// - 400 Bad Request - For invalid queue names and unknown message kinds
/// - 500 Internal Server Error - For all other errors (with error logging)
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Self::WorkerError(err) => err.into_response(),
            err => InternalServerError(err).into_response(),
        }
    }
}

/// Wrapper type for converting any displayable error into a 500 Internal Server Error response.
///
/// Logs the error message and returns a generic "Internal server error" message to the client
/// to avoid leaking implementation details.
pub struct InternalServerError<E>(pub E);

impl<E: std::fmt::Display> IntoResponse for InternalServerError<E> {
    fn into_response(self) -> Response {
        tracing::error!("{}", self.0);

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorDto {
                error: "Internal server error".to_string(),
            }),
        )
            .into_response()
    }
}
