//! Process memory limits.
//!
//! Memory limits are configured the way PHP-style `memory_limit` values are written: a number of
//! bytes with an optional `K`, `M` or `G` suffix, where `-1` means unlimited.

use sysinfo::{ProcessesToUpdate, System};

use crate::server::error::config::ConfigError;

/// Parses a memory limit such as `134217728`, `512K`, `128M`, `2G` or `-1`.
///
/// # Arguments
/// - `var` - Name of the setting, used in error messages
/// - `value` - Raw value
///
/// # Returns
/// - `Ok(Some(bytes))` - Limit in bytes
/// - `Ok(None)` - `-1`, no limit
/// - `Err(ConfigError::InvalidEnvValue)` - Not a valid size
pub fn parse_memory_limit(var: &str, value: &str) -> Result<Option<u64>, ConfigError> {
    let value = value.trim();
    if value == "-1" {
        return Ok(None);
    }

    let invalid = |reason: &str| ConfigError::InvalidEnvValue {
        var: var.to_string(),
        reason: format!("{:?} {}", value, reason),
    };

    let (digits, multiplier) = match value.chars().last().map(|c| c.to_ascii_uppercase()) {
        Some('K') => (&value[..value.len() - 1], 1024),
        Some('M') => (&value[..value.len() - 1], 1024 * 1024),
        Some('G') => (&value[..value.len() - 1], 1024 * 1024 * 1024),
        Some(_) => (value, 1),
        None => return Err(invalid("is empty")),
    };

    let amount: u64 = digits
        .parse()
        .map_err(|_| invalid("is not a byte size (expected e.g. 128M or -1)"))?;

    if amount == 0 {
        return Err(invalid("must be greater than zero"));
    }

    amount
        .checked_mul(multiplier)
        .map(Some)
        .ok_or_else(|| invalid("is too large"))
}

/// Samples the resident memory of the current process.
pub struct MemoryProbe {
    system: System,
    pid: Option<sysinfo::Pid>,
}

impl MemoryProbe {
    pub fn new() -> Self {
        Self {
            system: System::new(),
            pid: sysinfo::get_current_pid().ok(),
        }
    }

    /// Resident set size in bytes, `None` if the platform can't report it.
    pub fn resident_bytes(&mut self) -> Option<u64> {
        let pid = self.pid?;
        self.system
            .refresh_processes(ProcessesToUpdate::Some(&[pid]), true);

        self.system.process(pid).map(sysinfo::Process::memory)
    }

    /// Whether the process currently uses more than `limit` bytes.
    pub fn exceeds(&mut self, limit: u64) -> bool {
        self.resident_bytes().is_some_and(|used| used > limit)
    }
}

impl Default for MemoryProbe {
    fn default() -> Self {
        Self::new()
    }
}
