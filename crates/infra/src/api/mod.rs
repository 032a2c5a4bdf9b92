//! Remote API execution
//!
//! # Architecture
//!
//! - [`envelope`]: body → [`chainscan_domain::Envelope`], pure
//! - [`executor`]: admission, request layout, transport, classification and
//!   the bounded throttle loop
//! - [`decode`]: payload → typed models
//! - [`client`]: the public host object wiring the pieces together
//!
//! The API key only ever travels in the query string and is redacted from
//! every log line.

pub mod client;
pub mod decode;
pub mod envelope;
pub mod executor;

pub use client::{ChainScanClient, ChainScanClientBuilder};
pub use decode::{convert, decode_payload};
pub use envelope::{normalize, BodyDefect};
pub use executor::{classify, Classification, ExecutorSettings, RequestExecutor};
