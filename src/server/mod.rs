//! Server application core modules.
//!
//! This module contains the server side of Ferry: HTTP routing, the message queue and its
//! workers, the fallback scheduler that drains queues when no dedicated worker is alive, and the
//! configuration and startup code wiring them to Valkey/Redis.

pub mod config;
pub mod controller;
pub mod error;
pub mod fallback;
pub mod model;
pub mod router;
pub mod startup;
pub mod util;
pub mod worker;
