//! Multi-window admission control
//!
//! A [`MultiWindowLimiter`] composes any number of [`Window`] rules
//! ("5 per second", "100 000 per day") with AND semantics: a request of a
//! given cost is admitted only when every window has that much spare
//! capacity, and the grant is then recorded in every window at once.
//!
//! Bookkeeping is a sliding log per window. Each grant is stored with its
//! timestamp and cost; entries older than the window's period are evicted on
//! every decision. The whole check-evict-record step runs under one mutex, so
//! concurrent callers can never over-admit. The mutex is never held across a
//! sleep.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::time::{sleep_or_cancel, Clock, SystemClock};

/// What to do when admission is not currently available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowBehavior {
    /// Suspend until every window has capacity (or the caller cancels)
    #[default]
    Block,
    /// Fail immediately with [`LimiterError::Exceeded`]
    Raise,
    /// Decline immediately without an error
    Skip,
}

impl OverflowBehavior {
    /// Resolve the effective behavior: per-call override, then client
    /// default, then [`OverflowBehavior::Block`].
    pub fn resolve(call: Option<Self>, client: Option<Self>) -> Self {
        call.or(client).unwrap_or_default()
    }

    /// Stable lowercase name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Block => "block",
            Self::Raise => "raise",
            Self::Skip => "skip",
        }
    }
}

impl fmt::Display for OverflowBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OverflowBehavior {
    type Err = LimiterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "block" => Ok(Self::Block),
            "raise" => Ok(Self::Raise),
            "skip" => Ok(Self::Skip),
            other => Err(LimiterError::InvalidConfiguration(format!(
                "unknown overflow behavior '{other}' (expected block, raise or skip)"
            ))),
        }
    }
}

/// Errors produced by the limiter
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LimiterError {
    /// A window or limiter definition is unusable
    #[error("invalid rate limit configuration: {0}")]
    InvalidConfiguration(String),

    /// Admission refused under [`OverflowBehavior::Raise`], or the cost can
    /// never fit the named window
    #[error("rate limit exceeded: {capacity} requests per {period:?}{}", format_retry(.retry_after))]
    Exceeded { capacity: u32, period: Duration, retry_after: Option<Duration> },

    /// The caller's token fired while waiting for admission
    #[error("rate limiter wait cancelled")]
    Cancelled,
}

fn format_retry(retry_after: &Option<Duration>) -> String {
    retry_after.map(|d| format!(" (retry in {d:?})")).unwrap_or_default()
}

/// A single admission rule: at most `capacity` grants per trailing `period`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Window {
    capacity: u32,
    period: Duration,
}

impl Window {
    /// Create a window, rejecting zero capacity or a zero period.
    pub fn new(capacity: u32, period: Duration) -> Result<Self, LimiterError> {
        if capacity == 0 {
            return Err(LimiterError::InvalidConfiguration(
                "window capacity must be greater than 0".to_string(),
            ));
        }
        if period.is_zero() {
            return Err(LimiterError::InvalidConfiguration(
                "window period must be greater than zero".to_string(),
            ));
        }
        Ok(Self { capacity, period })
    }

    /// `capacity` grants per second
    pub fn per_second(capacity: u32) -> Result<Self, LimiterError> {
        Self::new(capacity, Duration::from_secs(1))
    }

    /// Maximum grants inside one period
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Length of the trailing interval
    pub fn period(&self) -> Duration {
        self.period
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{:?}", self.capacity, self.period)
    }
}

/// Grant history of one window.
#[derive(Debug)]
struct WindowLog {
    window: Window,
    grants: VecDeque<(Instant, u32)>,
    used: u32,
}

impl WindowLog {
    fn new(window: Window) -> Self {
        Self { window, grants: VecDeque::new(), used: 0 }
    }

    fn evict(&mut self, now: Instant) {
        while let Some(&(at, cost)) = self.grants.front() {
            if now.saturating_duration_since(at) < self.window.period {
                break;
            }
            self.grants.pop_front();
            self.used -= cost;
        }
    }

    fn spare(&self) -> u32 {
        self.window.capacity - self.used
    }

    /// Time until `cost` fits, `Duration::ZERO` if it fits now, `None` if it
    /// never can.
    fn wait_for(&self, cost: u32, now: Instant) -> Option<Duration> {
        if cost > self.window.capacity {
            return None;
        }
        if cost <= self.spare() {
            return Some(Duration::ZERO);
        }

        let needed = cost - self.spare();
        let mut freed = 0;
        for &(at, grant) in &self.grants {
            freed += grant;
            if freed >= needed {
                return Some((at + self.window.period).saturating_duration_since(now));
            }
        }
        // used is the sum of the log, so the loop always frees enough
        Some(self.window.period)
    }

    fn record(&mut self, cost: u32, now: Instant) {
        if cost == 0 {
            return;
        }
        self.grants.push_back((now, cost));
        self.used += cost;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    Granted,
    Wait { window: Window, retry_after: Duration },
    Never { window: Window },
}

/// Composite limiter over several windows.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
///
/// use chainscan_common::resilience::{MultiWindowLimiter, Window};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let limiter = MultiWindowLimiter::new(vec![
///     Window::per_second(5)?,
///     Window::new(100_000, Duration::from_secs(86_400))?,
/// ])?;
///
/// assert!(limiter.try_acquire(1));
/// # Ok(())
/// # }
/// ```
pub struct MultiWindowLimiter<C: Clock = SystemClock> {
    windows: Vec<Window>,
    logs: Mutex<Vec<WindowLog>>,
    clock: C,
}

impl MultiWindowLimiter<SystemClock> {
    /// Create a limiter driven by the system clock
    pub fn new(windows: Vec<Window>) -> Result<Self, LimiterError> {
        Self::with_clock(windows, SystemClock)
    }
}

impl<C: Clock> MultiWindowLimiter<C> {
    /// Create a limiter with a custom clock
    pub fn with_clock(windows: Vec<Window>, clock: C) -> Result<Self, LimiterError> {
        if windows.is_empty() {
            return Err(LimiterError::InvalidConfiguration(
                "at least one window is required".to_string(),
            ));
        }

        let logs = windows.iter().copied().map(WindowLog::new).collect();
        Ok(Self { windows, logs: Mutex::new(logs), clock })
    }

    /// Configured windows, in construction order
    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    /// Spare capacity per window right now, in construction order
    pub fn available(&self) -> Vec<u32> {
        let now = self.clock.now();
        let mut logs = self.logs.lock();
        logs.iter_mut()
            .map(|log| {
                log.evict(now);
                log.spare()
            })
            .collect()
    }

    /// Non-blocking admission; records the grant when it returns `true`.
    pub fn try_acquire(&self, cost: u32) -> bool {
        self.decide(cost) == Decision::Granted
    }

    /// Acquire admission for `cost` units under the given overflow behavior.
    ///
    /// - `Ok(true)`: admitted, the grant is recorded in every window
    /// - `Ok(false)`: declined under [`OverflowBehavior::Skip`]
    /// - `Err(Exceeded)`: declined under [`OverflowBehavior::Raise`], or the
    ///   cost is larger than some window's capacity
    /// - `Err(Cancelled)`: the token fired before admission
    ///
    /// Under `Block` the caller sleeps until the earliest instant at which
    /// every window could fit the cost, then re-checks. The sleep races the
    /// token, so cancellation is observed promptly.
    pub async fn acquire(
        &self,
        cancel: &CancellationToken,
        cost: u32,
        behavior: OverflowBehavior,
    ) -> Result<bool, LimiterError> {
        if cancel.is_cancelled() {
            return Err(LimiterError::Cancelled);
        }

        loop {
            match self.decide(cost) {
                Decision::Granted => return Ok(true),
                Decision::Never { window } => {
                    debug!(cost, %window, "cost exceeds window capacity");
                    return match behavior {
                        OverflowBehavior::Skip => Ok(false),
                        OverflowBehavior::Block | OverflowBehavior::Raise => {
                            Err(LimiterError::Exceeded {
                                capacity: window.capacity,
                                period: window.period,
                                retry_after: None,
                            })
                        }
                    };
                }
                Decision::Wait { window, retry_after } => match behavior {
                    OverflowBehavior::Skip => {
                        debug!(cost, %window, "admission skipped");
                        return Ok(false);
                    }
                    OverflowBehavior::Raise => {
                        debug!(cost, %window, ?retry_after, "admission refused");
                        return Err(LimiterError::Exceeded {
                            capacity: window.capacity,
                            period: window.period,
                            retry_after: Some(retry_after),
                        });
                    }
                    OverflowBehavior::Block => {
                        debug!(cost, %window, ?retry_after, "waiting for admission");
                        sleep_or_cancel(retry_after, cancel)
                            .await
                            .map_err(|_| LimiterError::Cancelled)?;
                    }
                },
            }
        }
    }

    /// Evict, check every window, and record the grant if all fit.
    fn decide(&self, cost: u32) -> Decision {
        let now = self.clock.now();
        let mut logs = self.logs.lock();

        let mut longest: Option<(Window, Duration)> = None;
        for log in logs.iter_mut() {
            log.evict(now);
            match log.wait_for(cost, now) {
                None => return Decision::Never { window: log.window },
                Some(wait) if wait.is_zero() => {}
                Some(wait) => {
                    if longest.map_or(true, |(_, current)| wait > current) {
                        longest = Some((log.window, wait));
                    }
                }
            }
        }

        if let Some((window, retry_after)) = longest {
            return Decision::Wait { window, retry_after };
        }

        for log in logs.iter_mut() {
            log.record(cost, now);
        }
        Decision::Granted
    }
}

impl<C: Clock> fmt::Debug for MultiWindowLimiter<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiWindowLimiter").field("windows", &self.windows).finish_non_exhaustive()
    }
}
