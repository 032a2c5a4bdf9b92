//! # ChainScan Domain
//!
//! Types shared by the execution engine and the adapters that call it.
//!
//! This crate contains:
//! - The error taxonomy ([`ChainScanError`]) and [`Result`] alias
//! - Client configuration ([`ClientConfig`], [`WindowConfig`])
//! - Request descriptors, the response [`Envelope`], and [`RunOutcome`]
//! - Wire constants
//!
//! ## Architecture
//! - Depends only on `chainscan-common` for the overflow policy and window
//!   definitions
//! - No I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use chainscan_common::resilience::OverflowBehavior;
pub use config::*;
pub use errors::*;
pub use types::*;
