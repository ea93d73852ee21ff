use std::time::Duration;

use async_trait::async_trait;
use log::warn;
use reqwest::StatusCode;

use crate::transport::{HttpRequest, HttpResponse, HttpTransport, TransportError};

/// Pause taken after a failed or recoverable attempt. Injectable so tests
/// and callers can observe or replace the backoff.
#[async_trait]
pub trait RetrySignal: Send + Sync {
    async fn wait(&self, attempt: u64);
}

/// Default signal: a fixed sleep between attempts.
pub struct SleepSignal(pub Duration);

#[async_trait]
impl RetrySignal for SleepSignal {
    async fn wait(&self, _attempt: u64) {
        tokio::time::sleep(self.0).await;
    }
}

/// Receives the body of recoverable-status responses for operational
/// visibility into why a target is unreachable.
pub trait DiagnosticSink: Send + Sync {
    fn record(&self, message: &str);
}

/// Default sink: forwards to the `log` facade.
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn record(&self, message: &str) {
        warn!("{message}");
    }
}

/// Bounded-retry wrapper around a transport: `max_retries + 1` total
/// attempts per logical request.
///
/// Per call it holds only the buffered request body, so a single client may
/// be shared by concurrent callers.
pub struct RetryClient<T> {
    inner: T,
    max_retries: u64,
    signal: Box<dyn RetrySignal>,
    diagnostics: Box<dyn DiagnosticSink>,
}

impl<T: HttpTransport> RetryClient<T> {
    pub fn new(inner: T, max_retries: u64) -> Self {
        Self {
            inner,
            max_retries,
            signal: Box::new(SleepSignal(Duration::from_secs(5))),
            diagnostics: Box::new(LogSink),
        }
    }

    pub fn with_signal(mut self, signal: impl RetrySignal + 'static) -> Self {
        self.signal = Box::new(signal);
        self
    }

    pub fn with_diagnostics(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.diagnostics = Box::new(sink);
        self
    }

    /// Issue the request, retrying transport errors and "not found"
    /// responses until the budget is spent. Any other response returns
    /// immediately. On exhaustion the final attempt's outcome is returned
    /// as-is: the last error, or the last not-found response.
    pub async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let HttpRequest { method, url, body } = request;

        let mut last_error = None;
        let mut last_response = None;

        for attempt in 1..=self.max_retries + 1 {
            // Each attempt replays an identical copy of the buffered body.
            let attempt_request = HttpRequest {
                method: method.clone(),
                url: url.clone(),
                body: body.clone(),
            };

            match self.inner.execute(attempt_request).await {
                Ok(response) if response.status == StatusCode::NOT_FOUND => {
                    self.diagnostics.record(&format!(
                        "target not found for {url} (attempt {attempt}): {}",
                        response.body_text()
                    ));
                    last_response = Some(response);
                    last_error = None;
                }
                Ok(response) => return Ok(response),
                Err(err) => {
                    warn!("attempt {attempt} against {url} failed: {err}");
                    last_error = Some(err);
                    last_response = None;
                }
            }

            // The signal fires even after the final attempt; callers may
            // rely on the cadence.
            self.signal.wait(attempt).await;
        }

        if let Some(err) = last_error {
            return Err(err);
        }
        if let Some(response) = last_response {
            return Ok(response);
        }
        Err(TransportError::Other(
            "retry budget exhausted without an attempt".to_string(),
        ))
    }
}
