//! Server application models and type definitions.
//!
//! This module contains the application state shared by HTTP handlers and the message type
//! stored on queues.

pub mod app;
pub mod message;
