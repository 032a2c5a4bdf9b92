//! HTTP transport
//!
//! Thin wrapper over reqwest that owns the transport-level retry budget and
//! honours cancellation. Envelope semantics live in [`crate::api`].

pub mod client;

pub use client::{redact_url, HttpClient, HttpClientBuilder, HttpResponse, SendError};
