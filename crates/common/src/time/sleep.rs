//! Cancellation-aware sleeping
//!
//! Every suspension point in the engine (blocked admission, transport retry
//! delay, throttle delay) goes through [`sleep_or_cancel`] so a cancelled
//! token wakes the caller immediately instead of at the end of the delay.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Returned when the token fired before the delay elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

/// Sleep for `delay` unless `cancel` fires first.
///
/// An already-cancelled token returns `Err(Cancelled)` without yielding, even
/// for a zero delay.
pub async fn sleep_or_cancel(delay: Duration, cancel: &CancellationToken) -> Result<(), Cancelled> {
    if cancel.is_cancelled() {
        return Err(Cancelled);
    }
    if delay.is_zero() {
        return Ok(());
    }

    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(Cancelled),
        () = tokio::time::sleep(delay) => Ok(()),
    }
}
