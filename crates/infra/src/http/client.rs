use std::time::Duration;

use chainscan_common::time::sleep_or_cancel;
use chainscan_domain::constants::{
    DEFAULT_RETRY_DELAY_MS, DEFAULT_TIMEOUT_SECS, DEFAULT_TRANSPORT_ATTEMPTS, PARAM_API_KEY,
};
use chainscan_domain::ChainScanError;
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, StatusCode};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

/// Status and fully buffered body of a response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status of the final attempt
    pub status: StatusCode,
    /// Raw response body
    pub body: Vec<u8>,
}

/// Why [`HttpClient::send`] produced no response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    /// The caller's token fired during a request or a retry delay
    #[error("request cancelled")]
    Cancelled,

    /// Every allowed attempt failed before a response arrived
    #[error("no response after {attempts} attempts: {message}")]
    Failed { attempts: u32, message: String },

    /// The request could not be built or cloned
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// HTTP client with bounded, fixed-delay retry on transport failures.
///
/// Only failures that happen before a response arrives (connection refused,
/// timeouts, broken bodies) are retried. Any response, whatever its status,
/// is handed back to the caller for classification.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    max_attempts: u32,
    retry_delay: Duration,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self, ChainScanError> {
        Self::builder().build()
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Execute the provided request builder with retry semantics.
    ///
    /// The in-flight request and every retry delay race `cancel`.
    pub async fn send(
        &self,
        builder: RequestBuilder,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, SendError> {
        let attempts = self.max_attempts.max(1);

        for attempt in 1..=attempts {
            let cloned_builder = builder.try_clone().ok_or_else(|| {
                SendError::InvalidRequest(
                    "request body cannot be cloned; buffer the body to enable retries".into(),
                )
            })?;

            let request = cloned_builder
                .build()
                .map_err(|err| SendError::InvalidRequest(err.without_url().to_string()))?;

            let method = request.method().clone();
            let url = redact_url(request.url());
            debug!(attempt, %method, %url, "sending HTTP request");

            let result = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(SendError::Cancelled),
                result = self.execute(request) => result,
            };

            match result {
                Ok(response) => {
                    debug!(attempt, %method, %url, status = %response.status, "received HTTP response");
                    return Ok(response);
                }
                Err(err) => {
                    let retryable = should_retry_error(&err);
                    let message = err.without_url().to_string();

                    if attempt < attempts && retryable {
                        warn!(attempt, %method, %url, error = %message, "HTTP request failed, retrying");
                        sleep_or_cancel(self.retry_delay, cancel)
                            .await
                            .map_err(|_| SendError::Cancelled)?;
                        continue;
                    }

                    warn!(attempt, %method, %url, error = %message, "HTTP request failed");
                    return Err(SendError::Failed { attempts: attempt, message });
                }
            }
        }

        Err(SendError::Failed {
            attempts,
            message: "http client exhausted retries without producing a result".into(),
        })
    }

    async fn execute(&self, request: reqwest::Request) -> Result<HttpResponse, reqwest::Error> {
        let response = self.client.execute(request).await?;
        let status = response.status();
        let body = response.bytes().await?;
        Ok(HttpResponse { status, body: body.to_vec() })
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    max_attempts: u32,
    retry_delay: Duration,
    user_agent: Option<String>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_attempts: DEFAULT_TRANSPORT_ATTEMPTS,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            user_agent: None,
        }
    }
}

impl HttpClientBuilder {
    /// Per-request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Configure the total number of attempts (initial try + retries).
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Fixed delay between attempts
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Override the `User-Agent` header
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build the underlying reqwest client
    pub fn build(self) -> Result<HttpClient, ChainScanError> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        let client = builder
            .build()
            .map_err(|err| ChainScanError::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(HttpClient {
            client,
            max_attempts: self.max_attempts.max(1),
            retry_delay: self.retry_delay,
        })
    }
}

fn should_retry_error(err: &reqwest::Error) -> bool {
    if err.is_timeout() || err.is_request() || err.is_body() {
        return true;
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        if err.is_connect() {
            return true;
        }
    }
    false
}

/// Render a URL for logs with the API key value masked.
pub fn redact_url(url: &Url) -> String {
    if !url.query_pairs().any(|(key, _)| key == PARAM_API_KEY) {
        return url.to_string();
    }

    let mut redacted = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| {
            let value = if key == PARAM_API_KEY { "***".to_string() } else { value.into_owned() };
            (key.into_owned(), value)
        })
        .collect();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::time::Instant;

    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_with_defaults() -> HttpClient {
        HttpClient::builder()
            .retry_delay(Duration::from_millis(10))
            .max_attempts(3)
            .build()
            .expect("http client")
    }

    #[tokio::test]
    async fn returns_successful_response_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with_defaults();
        let token = CancellationToken::new();
        let response = client
            .send(client.request(Method::GET, server.uri()), &token)
            .await
            .expect("response");

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, b"ok");
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
    }

    #[tokio::test]
    async fn does_not_retry_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with_defaults();
        let token = CancellationToken::new();
        let response = client
            .send(client.request(Method::GET, server.uri()), &token)
            .await
            .expect("response");

        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
    }

    #[tokio::test]
    async fn retries_on_network_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener); // release the port so that requests fail with ECONNREFUSED
        let url = format!("http://{}/?apikey=secret", addr);

        let client = client_with_defaults();
        let token = CancellationToken::new();

        let result = client.send(client.request(Method::GET, &url), &token).await;
        match result {
            Err(SendError::Failed { attempts, message }) => {
                assert_eq!(attempts, 3);
                assert!(!message.contains("secret"));
            }
            other => panic!("expected transport failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn retries_timeouts_up_to_the_attempt_budget() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let client = HttpClient::builder()
            .timeout(Duration::from_millis(100))
            .retry_delay(Duration::from_millis(5))
            .max_attempts(3)
            .build()
            .expect("http client");
        let token = CancellationToken::new();

        let result = client.send(client.request(Method::GET, server.uri()), &token).await;
        assert!(matches!(result, Err(SendError::Failed { attempts: 3, .. })));
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 3);
    }

    #[tokio::test]
    async fn cancellation_aborts_in_flight_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
            .mount(&server)
            .await;

        let client = client_with_defaults();
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let result = client.send(client.request(Method::GET, server.uri()), &token).await;

        assert_eq!(result.unwrap_err(), SendError::Cancelled);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn redact_url_masks_only_the_api_key() {
        let url = Url::parse("https://api.example.test/api?module=account&apikey=SECRET&chainid=1")
            .unwrap();
        let redacted = redact_url(&url);
        assert!(!redacted.contains("SECRET"));
        assert!(redacted.contains("apikey=***") || redacted.contains("apikey=%2A%2A%2A"));
        assert!(redacted.contains("module=account"));
        assert!(redacted.contains("chainid=1"));

        let plain = Url::parse("https://api.example.test/api?module=account").unwrap();
        assert_eq!(redact_url(&plain), plain.to_string());
    }
}
