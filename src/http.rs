//! HTTP client abstraction for batch submission.
//!
//! The submitter only needs "send this URL, give me a status and a body".
//! `HttpClient` captures that so the submit lifecycle can be exercised with
//! [`MockHttpClient`] instead of a live endpoint.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::error::{QrBatchError, Result};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Response from an HTTP request, body fully buffered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as a string
    pub body: String,
}

impl HttpResponse {
    /// Check whether the status is in the 2xx range.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for executing submission requests.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Issue a GET for a fully formed URL.
    ///
    /// # Errors
    /// Returns an error if no response could be obtained (connection refused,
    /// DNS failure, timeout, invalid URL).
    async fn get(&self, url: &str) -> Result<HttpResponse>;
}

// ============================================================================
// Production Implementation using reqwest
// ============================================================================

/// Production HTTP client using reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl ReqwestHttpClient {
    /// Create a client with the given per-request timeout.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        log::debug!("GET {} (timeout {:?})", url, self.timeout);

        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                log::warn!("Submit request failed: {}", e);
                if e.is_timeout() {
                    QrBatchError::Timeout(self.timeout.as_secs())
                } else {
                    QrBatchError::Transport(e)
                }
            })?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        log::info!("Submit completed: status {}, {} byte body", status, body.len());
        Ok(HttpResponse { status, body })
    }
}

// ============================================================================
// Test/Mock Implementation
// ============================================================================

/// Mock HTTP client for testing.
///
/// Responses are returned in FIFO order regardless of URL. Every call is
/// recorded. A response can be held back until a trigger fires, which keeps
/// a submission in flight for as long as a test needs.
///
/// # Example
/// ```
/// use qrbatch::http::{HttpResponse, MockHttpClient};
///
/// let mock = MockHttpClient::new();
/// mock.add_response(Ok(HttpResponse { status: 200, body: "ok".to_string() }));
/// assert_eq!(mock.call_count(), 0);
/// ```
#[derive(Clone, Default)]
pub struct MockHttpClient {
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    calls: Arc<Mutex<Vec<String>>>,
    in_flight: Arc<AtomicUsize>,
}

enum MockResponse {
    Immediate(Result<HttpResponse>),
    Triggered {
        response: Result<HttpResponse>,
        trigger: oneshot::Receiver<()>,
    },
}

impl MockHttpClient {
    /// Create a new mock HTTP client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response.
    pub fn add_response(&self, response: Result<HttpResponse>) {
        self.responses
            .lock()
            .push_back(MockResponse::Immediate(response));
    }

    /// Queue a response that completes only once the returned sender fires
    /// (or is dropped).
    pub fn add_response_with_trigger(&self, response: Result<HttpResponse>) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.responses.lock().push_back(MockResponse::Triggered {
            response,
            trigger: rx,
        });
        tx
    }

    /// URLs requested so far.
    pub fn get_calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Number of requests made.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Number of requests currently waiting on a response.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let _guard = InFlightGuard {
            in_flight: Arc::clone(&self.in_flight),
        };

        self.calls.lock().push(url.to_string());

        let next = self.responses.lock().pop_front();
        match next {
            Some(MockResponse::Immediate(response)) => response,
            Some(MockResponse::Triggered { response, trigger }) => {
                let _ = trigger.await;
                response
            }
            None => Err(QrBatchError::Other(anyhow::anyhow!(
                "No mock response configured for {}",
                url
            ))),
        }
    }
}

/// Decrements the in-flight counter when dropped.
struct InFlightGuard {
    in_flight: Arc<AtomicUsize>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
