use std::borrow::Cow;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Method, StatusCode, Url};
use thiserror::Error;

/// Errors produced by a transport attempt that yielded no response.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The underlying HTTP client failed before a response arrived.
    #[error("transport request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Transport failure without a client-level source.
    #[error("transport failure: {0}")]
    Other(String),
}

/// One logical request. The body is held as [`Bytes`] so every retry attempt
/// can replay an identical copy; request bodies on the wire are single-read.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub body: Bytes,
}

impl HttpRequest {
    pub fn new(method: Method, url: Url, body: impl Into<Bytes>) -> Self {
        Self {
            method,
            url,
            body: body.into(),
        }
    }

    /// Convenience constructor for the durable-upload case.
    pub fn put(url: Url, body: impl Into<Bytes>) -> Self {
        Self::new(Method::PUT, url, body)
    }
}

/// A fully-buffered response.
#[derive(Debug)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Generic request/response transport. Deadline enforcement is the
/// implementation's responsibility; callers supply none.
///
/// Safe for concurrent use: implementations hold no per-call state.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Production transport over `reqwest::Client`.
#[derive(Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let response = self
            .client
            .request(request.method, request.url)
            .body(request.body)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        Ok(HttpResponse { status, body })
    }
}
