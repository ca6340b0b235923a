//! Utility functions and helpers for server operations.
//!
//! This module provides reusable helpers that don't belong to a single component, currently
//! memory limit parsing and process memory sampling used by bounded consumers.

pub mod memory;
