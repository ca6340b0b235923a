//! HTTP controller endpoints for the Ferry web API.
//!
//! Controllers validate input, go through the message bus or the liveness tracker and return
//! JSON responses. All of them run inside the unit-of-work middleware.

pub mod message;
pub mod queue;
