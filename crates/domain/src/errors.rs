//! Error types used throughout the client

use std::time::Duration;

use chainscan_common::resilience::LimiterError;
use serde_json::Value;
use thiserror::Error;

/// Main error type for ChainScan
///
/// A call that was declined under the `Skip` overflow behavior is not an
/// error; it is reported as `RunOutcome::Skipped`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChainScanError {
    /// Invalid client or window configuration; fatal at construction
    #[error("Configuration error: {0}")]
    Config(String),

    /// The caller's cancellation token fired
    #[error("Operation cancelled")]
    Cancelled,

    /// Client-side quota refused admission under the `Raise` behavior
    #[error(
        "Rate limit exceeded: {capacity} requests per {period:?}{}",
        retry_hint(.retry_after)
    )]
    RateLimitExceeded { capacity: u32, period: Duration, retry_after: Option<Duration> },

    /// No response after every transport attempt
    #[error("Transport error calling {operation} after {attempts} attempts: {message}")]
    Transport { operation: String, attempts: u32, message: String },

    /// The remote service kept reporting a rate limit
    #[error("Remote rate limit persisted for {operation} after {attempts} attempts: {message}")]
    ThrottleExhausted { operation: String, attempts: u32, message: String },

    /// The remote service answered with a failure envelope or a non-200 status
    #[error(
        "Remote error from {operation} (HTTP {http_status}, status {status:?}): {message}; payload: {payload}"
    )]
    Remote { operation: String, http_status: u16, status: String, message: String, payload: Value },

    /// The payload did not have the shape the caller asked for
    #[error("Failed to decode payload into {target}: {message}")]
    Decode { target: String, message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

fn retry_hint(retry_after: &Option<Duration>) -> String {
    retry_after.map(|d| format!(" (retry in {d:?})")).unwrap_or_default()
}

impl ChainScanError {
    /// Stable label suitable for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Cancelled => "cancelled",
            Self::RateLimitExceeded { .. } => "rate_limit_exceeded",
            Self::Transport { .. } => "transport",
            Self::ThrottleExhausted { .. } => "throttle_exhausted",
            Self::Remote { .. } => "remote",
            Self::Decode { .. } => "decode",
            Self::Internal(_) => "internal",
        }
    }

    /// Whether re-issuing the same call later may succeed.
    ///
    /// The engine already retried transport failures and remote throttles
    /// internally; this is a hint for callers with their own outer retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimitExceeded { .. } | Self::Transport { .. } | Self::ThrottleExhausted { .. }
        )
    }
}

impl From<LimiterError> for ChainScanError {
    fn from(err: LimiterError) -> Self {
        match err {
            LimiterError::InvalidConfiguration(message) => Self::Config(message),
            LimiterError::Exceeded { capacity, period, retry_after } => {
                Self::RateLimitExceeded { capacity, period, retry_after }
            }
            LimiterError::Cancelled => Self::Cancelled,
        }
    }
}

/// Result type alias for ChainScan operations
pub type Result<T> = std::result::Result<T, ChainScanError>;
