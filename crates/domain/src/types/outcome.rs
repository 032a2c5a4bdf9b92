//! Non-error results of a remote call

use crate::errors::Result;

/// What a successful `run` produced.
///
/// `Skipped` is not a failure: the client-side quota was saturated under the
/// `Skip` overflow behavior and nothing was sent.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome<T> {
    /// The remote returned a payload
    Data(T),
    /// The remote reported no data (or an unreadable body); holds the sentinel
    Empty(T),
    /// Admission was declined; no request was sent
    Skipped,
}

impl<T> RunOutcome<T> {
    /// Admission was declined under `Skip`
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }

    /// The remote had nothing; the sentinel stands in
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty(_))
    }

    /// Payload or sentinel; `None` when skipped
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Data(value) | Self::Empty(value) => Some(value),
            Self::Skipped => None,
        }
    }

    /// Transform the value of `Data` and `Empty`
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> RunOutcome<U> {
        match self {
            Self::Data(value) => RunOutcome::Data(f(value)),
            Self::Empty(value) => RunOutcome::Empty(f(value)),
            Self::Skipped => RunOutcome::Skipped,
        }
    }

    /// Fallible [`map`](Self::map)
    pub fn try_map<U>(self, f: impl FnOnce(T) -> Result<U>) -> Result<RunOutcome<U>> {
        Ok(match self {
            Self::Data(value) => RunOutcome::Data(f(value)?),
            Self::Empty(value) => RunOutcome::Empty(f(value)?),
            Self::Skipped => RunOutcome::Skipped,
        })
    }
}
