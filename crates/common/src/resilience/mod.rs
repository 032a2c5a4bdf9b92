//! Resilience patterns for quota-limited remote calls
//!
//! Currently this is admission control: a [`MultiWindowLimiter`] that gates
//! every outgoing call against the caller's own usage quotas before anything
//! touches the network. Retry and throttle handling live next to the
//! transport in `chainscan-infra`, because they depend on what the remote
//! service actually answered.

pub mod rate_limiter;

pub use rate_limiter::{LimiterError, MultiWindowLimiter, OverflowBehavior, Window};
