//! Request execution pipeline
//!
//! One call runs through: admission → default injection → pruning →
//! transport construction → send (with transport retry) → parse → classify.
//! A remote throttle sends the call back to admission; that loop is explicit
//! and bounded by the throttle budget.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chainscan_common::resilience::{MultiWindowLimiter, OverflowBehavior};
use chainscan_common::time::sleep_or_cancel;
use chainscan_domain::constants::{
    DEFAULT_CHAIN_ID, DEFAULT_RETRY_DELAY_MS, DEFAULT_THROTTLE_ATTEMPTS, PARAM_ACTION,
    PARAM_API_KEY, PARAM_CHAIN_ID, PARAM_MODULE,
};
use chainscan_domain::{ChainScanError, RequestDescriptor, Result, RunOutcome, TransportMethod};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::envelope::{normalize, BodyDefect};
use crate::http::{HttpClient, SendError};

/// Message fragments the remote uses to report its own rate limiting.
const THROTTLE_PHRASES: [&str; 4] =
    ["Max rate limit reached", "Maximum rate limit reached", "rate limit", "Rate limit"];

/// Parameters the executor owns; adapters cannot override them.
const RESERVED_PARAMS: [&str; 3] = [PARAM_MODULE, PARAM_ACTION, PARAM_API_KEY];

/// Executor-wide settings taken from the client configuration.
#[derive(Clone)]
pub struct ExecutorSettings {
    /// Sent as `apikey` on every call
    pub api_key: String,
    /// `chainid` used when the adapter supplies none; empty disables injection
    pub default_chain_id: String,
    /// Overflow behavior for descriptors without an override
    pub default_overflow: Option<OverflowBehavior>,
    /// Total round trips allowed while the remote keeps throttling
    pub throttle_attempts: u32,
    /// Pause before re-entering admission after a remote throttle
    pub throttle_delay: Duration,
}

impl ExecutorSettings {
    /// Settings with library defaults around `api_key`
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            default_chain_id: DEFAULT_CHAIN_ID.to_string(),
            default_overflow: None,
            throttle_attempts: DEFAULT_THROTTLE_ATTEMPTS,
            throttle_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
        }
    }
}

impl fmt::Debug for ExecutorSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutorSettings")
            .field("api_key", &"<redacted>")
            .field("default_chain_id", &self.default_chain_id)
            .field("default_overflow", &self.default_overflow)
            .field("throttle_attempts", &self.throttle_attempts)
            .field("throttle_delay", &self.throttle_delay)
            .finish()
    }
}

/// What a single response means.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// Usable payload
    Success(Value),
    /// The remote reported that nothing matched
    EmptyResult,
    /// The remote reported its own rate limit
    Throttled { message: String },
    /// Failure envelope or non-200 status
    Failed { http_status: u16, status: String, message: String, payload: Value },
    /// The body was not a JSON object
    Unreadable(BodyDefect),
}

/// Classify one response.
///
/// Empty-result and throttle messages are recognised before the HTTP status
/// is consulted; after that a non-200 status fails even when the envelope
/// says `"1"`.
pub fn classify(http_status: StatusCode, body: &[u8]) -> Classification {
    let envelope = match normalize(body) {
        Ok(envelope) => envelope,
        Err(defect) => return Classification::Unreadable(defect),
    };
    debug!(
        http_status = http_status.as_u16(),
        status = %envelope.status,
        json_rpc = envelope.json_rpc,
        "response envelope parsed"
    );

    if envelope.is_notok() {
        if is_empty_result_message(&envelope.message) {
            return Classification::EmptyResult;
        }
        if is_throttle_message(&envelope.message) {
            return Classification::Throttled { message: envelope.message };
        }
    }

    if http_status != StatusCode::OK || envelope.is_notok() {
        return Classification::Failed {
            http_status: http_status.as_u16(),
            status: envelope.status,
            message: envelope.message,
            payload: envelope.payload,
        };
    }

    Classification::Success(envelope.payload)
}

/// "No transactions found", "No records found", ...
fn is_empty_result_message(message: &str) -> bool {
    message.starts_with("No ") && message.ends_with(" found")
}

fn is_throttle_message(message: &str) -> bool {
    THROTTLE_PHRASES.iter().any(|phrase| message.contains(phrase))
}

/// Next move of the execution loop after a response was classified.
#[derive(Debug, Clone, PartialEq)]
enum Step {
    Done(Result<RunOutcome<Value>>),
    RetryThrottled { depth: u32, message: String },
}

/// `depth` is the throttle retry depth of the response being classified
/// (seeded from the descriptor); `sent` counts round trips this run made.
fn next_step(
    classification: Classification,
    descriptor: &RequestDescriptor,
    depth: u32,
    sent: u32,
    throttle_attempts: u32,
) -> Step {
    match classification {
        Classification::Success(payload) => Step::Done(Ok(RunOutcome::Data(payload))),
        Classification::EmptyResult | Classification::Unreadable(_) => {
            Step::Done(Ok(RunOutcome::Empty(descriptor.sentinel().clone())))
        }
        Classification::Throttled { message } => {
            let next = depth.saturating_add(1);
            if next < throttle_attempts {
                Step::RetryThrottled { depth: next, message }
            } else {
                Step::Done(Err(ChainScanError::ThrottleExhausted {
                    operation: descriptor.operation(),
                    attempts: sent,
                    message,
                }))
            }
        }
        Classification::Failed { http_status, status, message, payload } => {
            Step::Done(Err(ChainScanError::Remote {
                operation: descriptor.operation(),
                http_status,
                status,
                message,
                payload,
            }))
        }
    }
}

/// Runs descriptors against the remote service.
pub struct RequestExecutor {
    http: HttpClient,
    limiter: Arc<MultiWindowLimiter>,
    settings: ExecutorSettings,
}

impl RequestExecutor {
    /// Executor over a transport, a shared limiter and settings
    pub fn new(
        http: HttpClient,
        limiter: Arc<MultiWindowLimiter>,
        settings: ExecutorSettings,
    ) -> Self {
        Self { http, limiter, settings }
    }

    /// Execute one descriptor.
    ///
    /// Returns `RunOutcome::Skipped` when admission was declined under
    /// `Skip`, `RunOutcome::Empty(sentinel)` when the remote had no data or
    /// sent an unreadable body, and `RunOutcome::Data(payload)` otherwise.
    #[instrument(
        skip(self, descriptor, cancel),
        fields(module = %descriptor.module_name(), action = %descriptor.action_name())
    )]
    pub async fn run(
        &self,
        descriptor: &RequestDescriptor,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome<Value>> {
        let started = Instant::now();
        let behavior = OverflowBehavior::resolve(
            descriptor.overflow_override(),
            self.settings.default_overflow,
        );
        let mut depth = descriptor.depth();
        let mut sent: u32 = 0;

        loop {
            if !self.limiter.acquire(cancel, 1, behavior).await? {
                info!(%behavior, "client-side quota saturated, call skipped");
                return Ok(RunOutcome::Skipped);
            }

            let request = self.build_request(descriptor)?;
            let response = self
                .http
                .send(request, cancel)
                .await
                .map_err(|err| map_send_error(err, descriptor))?;
            sent = sent.saturating_add(1);

            let classification = classify(response.status, &response.body);
            if let Classification::Unreadable(defect) = &classification {
                warn!(
                    ?defect,
                    http_status = response.status.as_u16(),
                    body_len = response.body.len(),
                    "unreadable response body, returning empty result"
                );
            }

            match next_step(
                classification,
                descriptor,
                depth,
                sent,
                self.settings.throttle_attempts,
            ) {
                Step::Done(result) => {
                    let duration_ms = started.elapsed().as_millis() as u64;
                    match &result {
                        Ok(outcome) => {
                            debug!(duration_ms, empty = outcome.is_empty(), "call completed")
                        }
                        Err(err) => warn!(duration_ms, error = %err, kind = err.label(), "call failed"),
                    }
                    return result;
                }
                Step::RetryThrottled { depth: next, message } => {
                    warn!(depth = next, %message, "remote rate limit reported, retrying");
                    depth = next;
                    sleep_or_cancel(self.settings.throttle_delay, cancel)
                        .await
                        .map_err(|_| ChainScanError::Cancelled)?;
                }
            }
        }
    }

    /// Default injection, pruning, and transport layout.
    fn build_request(&self, descriptor: &RequestDescriptor) -> Result<RequestBuilder> {
        let url = Url::parse(descriptor.base_url()).map_err(|err| {
            ChainScanError::Config(format!("Invalid base URL '{}': {err}", descriptor.base_url()))
        })?;

        let params = self.prepare_params(descriptor.parameters());
        let mut query: Vec<(&str, &str)> = vec![
            (PARAM_MODULE, descriptor.module_name()),
            (PARAM_ACTION, descriptor.action_name()),
            (PARAM_API_KEY, self.settings.api_key.as_str()),
        ];

        let builder = match descriptor.transport_method() {
            TransportMethod::Get => {
                query.extend(params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
                self.http.request(Method::GET, url).query(&query)
            }
            TransportMethod::Post => {
                let mut body = Map::new();
                for (key, value) in &params {
                    if key == PARAM_CHAIN_ID {
                        query.push((PARAM_CHAIN_ID, value.as_str()));
                    } else {
                        body.insert(key.clone(), Value::String(value.clone()));
                    }
                }
                self.http.request(Method::POST, url).query(&query).json(&Value::Object(body))
            }
        };

        Ok(builder)
    }

    /// Inject the default network when `chainid` is absent, then drop
    /// reserved keys and empty values. An explicit empty `chainid` is pruned,
    /// so the call goes out without one.
    fn prepare_params(&self, params: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        let mut prepared = params.clone();
        if !self.settings.default_chain_id.is_empty() {
            prepared
                .entry(PARAM_CHAIN_ID.to_string())
                .or_insert_with(|| self.settings.default_chain_id.clone());
        }

        prepared.retain(|key, value| !value.is_empty() && !RESERVED_PARAMS.contains(&key.as_str()));
        prepared
    }
}

fn map_send_error(err: SendError, descriptor: &RequestDescriptor) -> ChainScanError {
    match err {
        SendError::Cancelled => ChainScanError::Cancelled,
        SendError::Failed { attempts, message } => {
            ChainScanError::Transport { operation: descriptor.operation(), attempts, message }
        }
        SendError::InvalidRequest(message) => ChainScanError::Internal(format!(
            "could not build request for {}: {message}",
            descriptor.operation()
        )),
    }
}
