//! Wire-level constants
//!
//! Parameter names are part of the remote wire contract and must not change.

/// Query parameter naming the remote module (e.g. `account`)
pub const PARAM_MODULE: &str = "module";
/// Query parameter naming the action inside the module (e.g. `balance`)
pub const PARAM_ACTION: &str = "action";
/// Query parameter carrying the API key
pub const PARAM_API_KEY: &str = "apikey";
/// Query parameter carrying the network identifier
pub const PARAM_CHAIN_ID: &str = "chainid";

/// Default endpoint of the multichain explorer API
pub const DEFAULT_BASE_URL: &str = "https://api.etherscan.io/v2/api";
/// Network used when neither the call nor the config names one
pub const DEFAULT_CHAIN_ID: &str = "1";

/// Envelope status reporting success
pub const STATUS_OK: &str = "1";
/// Envelope status reporting failure, empty results, or throttling
pub const STATUS_NOTOK: &str = "0";

// Retry budgets
/// Send attempts per round trip
pub const DEFAULT_TRANSPORT_ATTEMPTS: u32 = 3;
/// Round trips while the remote keeps throttling
pub const DEFAULT_THROTTLE_ATTEMPTS: u32 = 3;
/// Pause between transport retries and after a throttle
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;
/// Per-request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

// Free-tier quota
/// Admission window used when none is configured
pub const DEFAULT_CALLS_PER_SECOND: u32 = 5;
