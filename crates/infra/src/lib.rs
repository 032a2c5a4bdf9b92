//! # ChainScan Infrastructure
//!
//! The I/O side of the ChainScan client.
//!
//! This crate contains:
//! - HTTP transport with bounded retry ([`http`])
//! - Envelope normalization, request execution and the public client ([`api`])
//! - Configuration loading from environment and files ([`config`])
//! - Tracing bootstrap ([`observability`])
//!
//! ## Architecture
//! - Depends on `chainscan-domain` for types and `chainscan-common` for
//!   admission control
//! - Contains all "impure" code (network, filesystem, environment)

pub mod api;
pub mod config;
pub mod http;
pub mod observability;

// Re-export commonly used items
pub use api::{decode_payload, ChainScanClient, ChainScanClientBuilder};
pub use chainscan_domain::{
    ChainScanError, ClientConfig, OverflowBehavior, RequestDescriptor, Result, RunOutcome,
    TransportMethod,
};
pub use http::HttpClient;
pub use observability::{init_tracing, LogFormat};
