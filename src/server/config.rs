//! Environment configuration.

use std::time::Duration;

use crate::server::{
    error::config::ConfigError,
    fallback::{FallbackConfig, FallbackHook, FallbackPolicy},
    model::message::validate_queue_name,
    util::memory::parse_memory_limit,
};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_MAX_CONCURRENT_JOBS: usize = 4;

/// Which half of the system this process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerMode {
    /// HTTP API with fallback drains at the end of each request
    Serve,
    /// Dedicated worker pool, keeps liveness markers fresh
    Work,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub valkey_url: String,
    pub bind_addr: String,
    pub mode: WorkerMode,
    pub fallback: FallbackConfig,
    pub worker_queues: Vec<String>,
    pub worker_max_concurrent_jobs: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    ///
    /// Empty values are treated as absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let valkey_url =
            get("VALKEY_URL").ok_or_else(|| ConfigError::MissingEnvVar("VALKEY_URL".to_string()))?;
        let bind_addr = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let mode = match get("WORKER_MODE").as_deref().map(str::trim) {
            None | Some("serve") => WorkerMode::Serve,
            Some("work") => WorkerMode::Work,
            Some(other) => return Err(invalid("WORKER_MODE", other, "expected serve or work")),
        };

        let fallback_queues = parse_queue_list("FALLBACK_QUEUES", get("FALLBACK_QUEUES"))?;

        let mut fallback = match get("FALLBACK_POLICY").as_deref().map(str::trim) {
            None | Some("request") => {
                let mut config = FallbackConfig::request_proportional();
                config.queues = fallback_queues.clone();
                config
            }
            Some("fixed") => {
                if fallback_queues.is_empty() {
                    return Err(ConfigError::MissingEnvVar("FALLBACK_QUEUES".to_string()));
                }
                FallbackConfig::fixed_budget(fallback_queues.clone())
            }
            Some(other) => {
                return Err(invalid("FALLBACK_POLICY", other, "expected request or fixed"))
            }
        };

        if let Some(value) = get("FALLBACK_GRACE_PERIOD_SECONDS") {
            fallback.grace_period =
                Duration::from_secs(parse_positive("FALLBACK_GRACE_PERIOD_SECONDS", &value)?);
        }

        if let Some(value) = get("FALLBACK_TIME_LIMIT_SECONDS") {
            fallback.time_limit =
                Duration::from_secs(parse_positive("FALLBACK_TIME_LIMIT_SECONDS", &value)?);
        }

        if let Some(value) = get("FALLBACK_MESSAGE_MARGIN") {
            let margin = parse_positive("FALLBACK_MESSAGE_MARGIN", &value)?;
            if let FallbackPolicy::RequestProportional { .. } = fallback.policy {
                fallback.policy = FallbackPolicy::RequestProportional { margin };
            }
        }

        if let Some(value) = get("FALLBACK_MEMORY_LIMIT") {
            fallback.memory_limit_bytes = parse_memory_limit("FALLBACK_MEMORY_LIMIT", &value)?;
        }

        fallback.hook = match get("FALLBACK_HOOK").as_deref().map(str::trim) {
            None | Some("terminate") => FallbackHook::Terminate,
            Some("response") => FallbackHook::Response,
            Some(other) => {
                return Err(invalid("FALLBACK_HOOK", other, "expected terminate or response"))
            }
        };

        // Dedicated workers service the fallback's queues unless told otherwise
        let worker_queues = match get("WORKER_QUEUES") {
            Some(value) => parse_queue_list("WORKER_QUEUES", Some(value))?,
            None => fallback_queues,
        };

        if mode == WorkerMode::Work && worker_queues.is_empty() {
            return Err(ConfigError::MissingEnvVar("WORKER_QUEUES".to_string()));
        }

        let worker_max_concurrent_jobs = match get("WORKER_MAX_CONCURRENT_JOBS") {
            Some(value) => parse_positive("WORKER_MAX_CONCURRENT_JOBS", &value)? as usize,
            None => DEFAULT_MAX_CONCURRENT_JOBS,
        };

        Ok(Self {
            valkey_url,
            bind_addr,
            mode,
            fallback,
            worker_queues,
            worker_max_concurrent_jobs,
        })
    }
}

fn invalid(var: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidEnvValue {
        var: var.to_string(),
        reason: format!("{:?}: {}", value, reason),
    }
}

fn parse_positive(var: &str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(invalid(var, value, "expected a positive integer")),
    }
}

/// Comma separated queue names, blanks skipped and duplicates removed.
fn parse_queue_list(var: &str, value: Option<String>) -> Result<Vec<String>, ConfigError> {
    let mut queues: Vec<String> = Vec::new();

    for name in value.iter().flat_map(|v| v.split(',')).map(str::trim) {
        if name.is_empty() || queues.iter().any(|q| q == name) {
            continue;
        }
        if let Err(e) = validate_queue_name(name) {
            return Err(invalid(var, name, &e.to_string()));
        }
        queues.push(name.to_string());
    }

    Ok(queues)
}
