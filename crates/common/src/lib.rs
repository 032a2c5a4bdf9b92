//! # ChainScan Common
//!
//! Domain-agnostic building blocks shared by the ChainScan crates.
//!
//! - [`time`]: injectable [`time::Clock`] plus cancellation-aware sleeping
//! - [`resilience`]: multi-window admission control
//!
//! Nothing in here knows about HTTP or the remote envelope format.

pub mod resilience;
pub mod time;

pub use resilience::{LimiterError, MultiWindowLimiter, OverflowBehavior, Window};
pub use time::{Clock, MockClock, SystemClock};
