//! Shared helpers for Ferry's Redis-backed integration tests.

pub mod error;
pub mod redis;

pub use error::TestError;
pub use redis::RedisTest;
