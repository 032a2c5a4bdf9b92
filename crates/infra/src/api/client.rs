//! Public entry point for calling the remote service
//!
//! A [`ChainScanClient`] owns the admission limiter, the HTTP transport, and
//! the executor settings. Endpoint adapters build a [`RequestDescriptor`]
//! with [`ChainScanClient::descriptor`] and hand it to [`run`] or [`run_as`].
//!
//! [`run`]: ChainScanClient::run
//! [`run_as`]: ChainScanClient::run_as

use std::sync::Arc;

use chainscan_common::resilience::MultiWindowLimiter;
use chainscan_domain::{ChainScanError, ClientConfig, RequestDescriptor, Result, RunOutcome};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::decode::decode_payload;
use super::executor::{ExecutorSettings, RequestExecutor};
use crate::http::HttpClient;

const USER_AGENT: &str = concat!("chainscan/", env!("CARGO_PKG_VERSION"));

/// Quota-aware client for the block-explorer API
pub struct ChainScanClient {
    config: ClientConfig,
    limiter: Arc<MultiWindowLimiter>,
    executor: RequestExecutor,
}

impl ChainScanClient {
    /// Create a client from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns `ChainScanError::Config` if the configuration is invalid or
    /// the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    /// Start a [`ChainScanClientBuilder`]
    pub fn builder() -> ChainScanClientBuilder {
        ChainScanClientBuilder::default()
    }

    /// Configuration this client was built from
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Limiter gating this client; shared when injected through the builder
    pub fn limiter(&self) -> &Arc<MultiWindowLimiter> {
        &self.limiter
    }

    /// Start a descriptor against the configured base URL.
    pub fn descriptor(&self, module: &str, action: &str) -> RequestDescriptor {
        RequestDescriptor::new(self.config.base_url.clone(), module, action)
    }

    /// Execute one call and return the raw payload.
    pub async fn run(
        &self,
        descriptor: &RequestDescriptor,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome<Value>> {
        self.executor.run(descriptor, cancel).await
    }

    /// Execute one call and decode payload or sentinel into `T`.
    pub async fn run_as<T: DeserializeOwned>(
        &self,
        descriptor: &RequestDescriptor,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome<T>> {
        self.run(descriptor, cancel).await?.try_map(decode_payload::<T>)
    }
}

/// Builder for [`ChainScanClient`]
#[derive(Default)]
pub struct ChainScanClientBuilder {
    config: Option<ClientConfig>,
    limiter: Option<Arc<MultiWindowLimiter>>,
    user_agent: Option<String>,
}

impl ChainScanClientBuilder {
    /// Configuration to validate and build from (required)
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Share an existing limiter instead of building one from the
    /// configured windows. Clients sharing a limiter share one quota.
    pub fn limiter(mut self, limiter: Arc<MultiWindowLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Override the default `User-Agent`
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build the client
    ///
    /// # Errors
    ///
    /// Returns error if no configuration was set or it fails validation
    pub fn build(self) -> Result<ChainScanClient> {
        let config =
            self.config.ok_or_else(|| ChainScanError::Config("configuration not set".into()))?;
        config.validate()?;

        let limiter = match self.limiter {
            Some(limiter) => limiter,
            None => Arc::new(MultiWindowLimiter::new(config.windows()?)?),
        };

        let http = HttpClient::builder()
            .timeout(config.timeout())
            .max_attempts(config.transport_attempts)
            .retry_delay(config.retry_delay())
            .user_agent(self.user_agent.unwrap_or_else(|| USER_AGENT.to_string()))
            .build()?;

        let settings = ExecutorSettings {
            api_key: config.api_key.clone(),
            default_chain_id: config.default_chain_id.clone(),
            default_overflow: config.default_overflow,
            throttle_attempts: config.throttle_attempts,
            throttle_delay: config.throttle_delay(),
        };

        debug!(?config, limiter = ?limiter, "chainscan client created");

        Ok(ChainScanClient {
            executor: RequestExecutor::new(http, Arc::clone(&limiter), settings),
            limiter,
            config,
        })
    }
}
