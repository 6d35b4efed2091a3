//! The pluggable HTTP layer.
//!
//! [`Transport`] is the seam every network call goes through. The default
//! stack is [`RetryingTransport`] over [`ReqwestTransport`]: a pooled
//! keep-alive client with exponential-backoff retry layered on top, so the
//! engines above it see a clean success/failure boundary.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use dagnet_core::constants::{
    DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_BASE_DELAY_MS, DEFAULT_TIMEOUT_SECS, POOL_MAX_PER_HOST,
};
use dagnet_core::error::DagError;

// ── Request / response ───────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

#[derive(Clone, Debug)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    pub timeout: Duration,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn post_json(url: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            headers: vec![("content-type".into(), "application/json".into())],
            body: Some(body),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Clone, Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: Vec<u8>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body,
        }
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, DagError> {
        serde_json::from_slice(&self.body)
            .map_err(|e| DagError::InvalidResponse(format!("malformed body: {e}")))
    }

    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

// ── Transport trait ──────────────────────────────────────────────────────────

/// A replaceable HTTP executor.
///
/// Implementations return `Ok` only for 2xx responses; transport failures
/// map to `ConnectionFailed` / `Timeout` and non-2xx statuses to
/// `DagError::Http` carrying the response body.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(&self, request: HttpRequest) -> Result<HttpResponse, DagError>;
}

// ── Retry policy ─────────────────────────────────────────────────────────────

/// Exponential backoff, doubling from `base_delay`, applied only to
/// retryable failures (timeouts, connection errors, HTTP 5xx).
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_RETRY_ATTEMPTS,
            base_delay: Duration::from_millis(DEFAULT_RETRY_BASE_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    /// No retries at all: one attempt.
    pub fn none() -> Self {
        Self {
            attempts: 1,
            base_delay: Duration::ZERO,
        }
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

// ── Retry wrapper ────────────────────────────────────────────────────────────

/// Composable retry layer over any [`Transport`].
///
/// All retry behavior in the SDK lives here, so the engines above the
/// transport see one clean success/failure boundary.
pub struct RetryingTransport<T> {
    inner: T,
    policy: RetryPolicy,
}

impl<T: Transport> RetryingTransport<T> {
    pub fn new(inner: T) -> Self {
        Self::with_policy(inner, RetryPolicy::default())
    }

    pub fn with_policy(inner: T, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<T: Transport> Transport for RetryingTransport<T> {
    async fn request(&self, request: HttpRequest) -> Result<HttpResponse, DagError> {
        let mut last_error = None;
        for attempt in 0..self.policy.attempts {
            if attempt > 0 {
                let delay = self.policy.delay_for(attempt - 1);
                debug!(url = %request.url, attempt, ?delay, "retrying request");
                tokio::time::sleep(delay).await;
            }
            match self.inner.request(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(err) if err.is_retryable() && attempt + 1 < self.policy.attempts => {
                    warn!(url = %request.url, error = %err, "retryable transport failure");
                    last_error = Some(err);
                }
                Err(err) => return Err(err),
            }
        }
        Err(last_error.unwrap_or_else(|| DagError::ConnectionFailed("no attempts made".into())))
    }
}

// ── Reqwest implementation ───────────────────────────────────────────────────

/// Default transport: a pooled, keep-alive `reqwest::Client`. Wrap in
/// [`RetryingTransport`] for the default retry behavior.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, DagError> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(POOL_MAX_PER_HOST)
            .tcp_keepalive(Duration::from_secs(60))
            .build()
            .map_err(|e| DagError::ConnectionFailed(format!("building HTTP client: {e}")))?;
        Ok(Self { client })
    }

    async fn attempt(&self, request: &HttpRequest) -> Result<HttpResponse, DagError> {
        let started = Instant::now();
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }
        let response = builder
            .timeout(request.timeout)
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, started))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| map_reqwest_error(e, started))?
            .to_vec();

        if (200..300).contains(&status) {
            Ok(HttpResponse {
                status,
                headers,
                body,
            })
        } else {
            Err(DagError::Http {
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
            })
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn request(&self, request: HttpRequest) -> Result<HttpResponse, DagError> {
        self.attempt(&request).await
    }
}

fn map_reqwest_error(err: reqwest::Error, started: Instant) -> DagError {
    if err.is_timeout() {
        DagError::Timeout {
            elapsed_ms: started.elapsed().as_millis() as u64,
        }
    } else if err.is_connect() {
        DagError::ConnectionFailed(err.to_string())
    } else if err.is_decode() {
        DagError::InvalidResponse(err.to_string())
    } else {
        DagError::ConnectionFailed(err.to_string())
    }
}
