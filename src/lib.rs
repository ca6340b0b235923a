//! Ferry keeps Redis-backed message queues moving when no dedicated worker is running.
//!
//! Dedicated workers heartbeat a short-lived liveness marker per queue. At the end of every
//! unit of work (one HTTP request) the fallback scheduler checks those markers and, for any
//! queue nobody is servicing, drains a bounded number of messages inline.

pub mod model;
pub mod server;
