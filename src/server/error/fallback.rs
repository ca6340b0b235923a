//! Fallback scheduling error types.
//!
//! The only failure the scheduler itself can observe is an unreachable liveness store. Callers
//! on the hot path treat it as "no worker alive" so that messages are drained rather than left
//! to starve.

use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::server::error::InternalServerError;

#[derive(Error, Debug)]
pub enum FallbackError {
    /// The expiring cache backing the liveness tracker could not be reached.
    ///
    /// # Fields
    /// - `key` - Cache key that was being read or written
    /// - `reason` - Underlying storage error message
    #[error("Liveness store unavailable while accessing {key}: {reason}")]
    StorageUnavailable { key: String, reason: String },
}

impl IntoResponse for FallbackError {
    fn into_response(self) -> Response {
        InternalServerError(self).into_response()
    }
}
