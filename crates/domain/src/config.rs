//! Client configuration structures
//!
//! Loaded by `chainscan_infra::config` from the environment or a TOML/JSON
//! file. Every field except `api_key` has a default.

use std::fmt;
use std::time::Duration;

use chainscan_common::resilience::{OverflowBehavior, Window};
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BASE_URL, DEFAULT_CALLS_PER_SECOND, DEFAULT_CHAIN_ID, DEFAULT_RETRY_DELAY_MS,
    DEFAULT_THROTTLE_ATTEMPTS, DEFAULT_TIMEOUT_SECS, DEFAULT_TRANSPORT_ATTEMPTS,
};
use crate::errors::{ChainScanError, Result};

/// One quota rule as written in configuration: `capacity` calls per
/// `period_ms` milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Calls admitted per period
    pub capacity: u32,
    /// Window length in milliseconds
    pub period_ms: u64,
}

impl WindowConfig {
    /// Window of `capacity` calls per `period`
    pub fn new(capacity: u32, period: Duration) -> Self {
        Self { capacity, period_ms: u64::try_from(period.as_millis()).unwrap_or(u64::MAX) }
    }

    /// Validate and convert into a limiter window
    pub fn to_window(&self) -> Result<Window> {
        Window::new(self.capacity, Duration::from_millis(self.period_ms)).map_err(Into::into)
    }

    /// Parse a comma-separated list of `capacity/period_ms` pairs, e.g.
    /// `"5/1000,100000/86400000"`.
    pub fn parse_list(list: &str) -> Result<Vec<Self>> {
        list.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                let (capacity, period) = part.split_once('/').ok_or_else(|| {
                    ChainScanError::Config(format!(
                        "Invalid rate limit '{part}': expected <capacity>/<period_ms>"
                    ))
                })?;
                let capacity = capacity.trim().parse::<u32>().map_err(|e| {
                    ChainScanError::Config(format!("Invalid capacity in '{part}': {e}"))
                })?;
                let period_ms = period.trim().parse::<u64>().map_err(|e| {
                    ChainScanError::Config(format!("Invalid period in '{part}': {e}"))
                })?;
                Ok(Self { capacity, period_ms })
            })
            .collect()
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_chain_id() -> String {
    DEFAULT_CHAIN_ID.to_string()
}

fn default_rate_limits() -> Vec<WindowConfig> {
    vec![WindowConfig { capacity: DEFAULT_CALLS_PER_SECOND, period_ms: 1000 }]
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_transport_attempts() -> u32 {
    DEFAULT_TRANSPORT_ATTEMPTS
}

fn default_throttle_attempts() -> u32 {
    DEFAULT_THROTTLE_ATTEMPTS
}

fn default_retry_delay_ms() -> u64 {
    DEFAULT_RETRY_DELAY_MS
}

/// Complete client configuration
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Credential sent as the `apikey` query parameter
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Injected as `chainid` when a call does not name a network
    #[serde(default = "default_chain_id")]
    pub default_chain_id: String,
    /// Client-level overflow behavior; `None` means `Block`
    #[serde(default)]
    pub default_overflow: Option<OverflowBehavior>,
    #[serde(default = "default_rate_limits")]
    pub rate_limits: Vec<WindowConfig>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Total transport attempts per round trip (initial try + retries)
    #[serde(default = "default_transport_attempts")]
    pub transport_attempts: u32,
    /// Fixed delay between transport attempts
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Total round trips allowed while the remote keeps throttling
    #[serde(default = "default_throttle_attempts")]
    pub throttle_attempts: u32,
    /// Fixed delay before re-issuing a throttled call
    #[serde(default = "default_retry_delay_ms")]
    pub throttle_delay_ms: u64,
}

impl ClientConfig {
    /// Configuration with defaults for everything but the key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: default_base_url(),
            default_chain_id: default_chain_id(),
            default_overflow: None,
            rate_limits: default_rate_limits(),
            timeout_secs: default_timeout_secs(),
            transport_attempts: default_transport_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            throttle_attempts: default_throttle_attempts(),
            throttle_delay_ms: default_retry_delay_ms(),
        }
    }

    /// Reject configurations the client cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(ChainScanError::Config("api_key must not be empty".to_string()));
        }
        if self.base_url.trim().is_empty() {
            return Err(ChainScanError::Config("base_url must not be empty".to_string()));
        }
        if self.rate_limits.is_empty() {
            return Err(ChainScanError::Config(
                "at least one rate limit window is required".to_string(),
            ));
        }
        if self.transport_attempts == 0 || self.throttle_attempts == 0 {
            return Err(ChainScanError::Config(
                "retry budgets must allow at least one attempt".to_string(),
            ));
        }
        self.windows().map(|_| ())
    }

    /// Limiter windows, validated
    pub fn windows(&self) -> Result<Vec<Window>> {
        self.rate_limits.iter().map(WindowConfig::to_window).collect()
    }

    /// Per-request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Pause between transport retries
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Pause after a remote throttle
    pub fn throttle_delay(&self) -> Duration {
        Duration::from_millis(self.throttle_delay_ms)
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("default_chain_id", &self.default_chain_id)
            .field("default_overflow", &self.default_overflow)
            .field("rate_limits", &self.rate_limits)
            .field("timeout_secs", &self.timeout_secs)
            .field("transport_attempts", &self.transport_attempts)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .field("throttle_attempts", &self.throttle_attempts)
            .field("throttle_delay_ms", &self.throttle_delay_ms)
            .finish()
    }
}
