//! Worker error types.
//!
//! This module defines errors related to message validation, serialization, and handling.
//! Invalid queue names and unknown message kinds are client errors when they arrive over HTTP;
//! everything else is treated as an internal server error.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::{model::api::ErrorDto, server::error::InternalServerError};

/// Worker error type.
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Queue names must be non-empty and contain only `[A-Za-z0-9_.-]`.
    #[error("Invalid queue name: {0:?}")]
    InvalidQueueName(String),

    /// No handler is registered for the message kind.
    #[error("No handler registered for message kind {0:?}")]
    UnknownMessageKind(String),

    /// Requested delivery delay is longer than allowed.
    #[error("Delay of {seconds} seconds exceeds the maximum of {max} seconds")]
    InvalidDelay { seconds: u64, max: u64 },

    /// Failed to serialize or deserialize a message.
    ///
    /// This may indicate a schema mismatch or corruption of the data stored in Redis.
    #[error("Failed to serialize/deserialize message: {0}")]
    SerializationError(String),

    /// A message handler reported a failure.
    ///
    /// # Fields
    /// - `kind` - Kind of the message being handled
    /// - `reason` - Failure description returned by the handler
    #[error("Handler for {kind:?} failed: {reason}")]
    HandlerFailed { kind: String, reason: String },

    /// A message handler did not complete before its deadline.
    #[error("Handler for {kind:?} timed out after {seconds} seconds")]
    HandlerTimeout { kind: String, seconds: u64 },
}

/// Converts worker errors into HTTP responses.
///
/// # Returns
/// - 400 Bad Request - For invalid queue names, unknown message kinds and invalid delays
/// - 500 Internal Server Error - For everything else
impl IntoResponse for WorkerError {
    fn into_response(self) -> Response {
        match self {
            Self::InvalidQueueName(_)
            | Self::UnknownMessageKind(_)
            | Self::InvalidDelay { .. } => {
                tracing::debug!("Rejected message: {}", self);

                (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorDto {
                        error: self.to_string(),
                    }),
                )
                    .into_response()
            }
            err => InternalServerError(err).into_response(),
        }
    }
}
