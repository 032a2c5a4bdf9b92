//! Time utilities: an injectable clock and cancellable sleeps.

pub mod clock;
pub mod sleep;

pub use clock::{Clock, MockClock, SystemClock};
pub use sleep::{sleep_or_cancel, Cancelled};
