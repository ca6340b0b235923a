use super::{worker::WorkerError, Error};

/// Strategy for handling a failed message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorRetryStrategy {
    /// Redeliver the message later with backoff
    Retry,
    /// Failed permanently, drop the message
    Fail,
}

impl Error {
    /// Determine how a message that failed with this error should be treated
    pub fn to_retry_strategy(&self) -> ErrorRetryStrategy {
        match self {
            // Connection problems are transient
            Self::RedisError(_) => ErrorRetryStrategy::Retry,
            Self::FallbackError(_) => ErrorRetryStrategy::Retry,
            Self::IoError(_) => ErrorRetryStrategy::Retry,

            Self::WorkerError(worker_error) => match worker_error {
                WorkerError::HandlerFailed { .. } => ErrorRetryStrategy::Retry,
                WorkerError::HandlerTimeout { .. } => ErrorRetryStrategy::Retry,

                // Redelivering a message nobody can handle or decode won't fix it
                WorkerError::UnknownMessageKind(_) => ErrorRetryStrategy::Fail,
                WorkerError::SerializationError(_) => ErrorRetryStrategy::Fail,
                WorkerError::InvalidQueueName(_) => ErrorRetryStrategy::Fail,
                WorkerError::InvalidDelay { .. } => ErrorRetryStrategy::Fail,
            },

            Self::ConfigError(_) => ErrorRetryStrategy::Fail,
            Self::SerdeJsonError(_) => ErrorRetryStrategy::Fail,
            Self::InternalError(_) => ErrorRetryStrategy::Fail,
        }
    }
}
