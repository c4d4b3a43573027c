//! Primary promise-style request call
//!
//! [`ObservedHttpClient`] delegates every request unchanged and returns the
//! transport's result, success or error, exactly as produced. Only after the
//! response is in hand does it look at the body; successful JSON bodies are
//! handed to the sink without waiting on the pipeline.

use async_trait::async_trait;
use graphtap_model::{HookOrigin, HttpMethod};
use serde_json::Value;
use std::sync::Arc;
use tracing::trace;

use super::sink::CaptureSink;
use super::slot::Observable;
use crate::error::TransportError;

/// Outgoing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub method: HttpMethod,
    pub body: Option<Vec<u8>>,
}

impl FetchRequest {
    /// GET request
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: HttpMethod::Get,
            body: None,
        }
    }

    /// With method
    #[inline]
    #[must_use]
    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    /// With body
    #[inline]
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Buffered response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// Final address after redirects
    pub url: String,
    pub status: u16,
    pub body: Vec<u8>,
}

impl FetchResponse {
    /// Create response
    #[must_use]
    pub fn new(url: impl Into<String>, status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            url: url.into(),
            status,
            body: body.into(),
        }
    }

    /// 2xx status
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Host request primitive
#[async_trait]
pub trait HttpClient: Observable + Send + Sync {
    /// Perform a request
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, TransportError>;
}

/// Decorator that observes responses of the wrapped client
pub struct ObservedHttpClient {
    inner: Arc<dyn HttpClient>,
    sink: CaptureSink,
}

impl ObservedHttpClient {
    /// Wrap `inner`
    #[must_use]
    pub fn new(inner: Arc<dyn HttpClient>, sink: CaptureSink) -> Self {
        Self { inner, sink }
    }

    /// Wrapped client
    #[must_use]
    pub fn inner(&self) -> &Arc<dyn HttpClient> {
        &self.inner
    }

    fn inspect(&self, method: &HttpMethod, response: &FetchResponse) {
        if !response.is_success() {
            trace!(status = response.status, "non-success response skipped");
            return;
        }
        match structured_body(&response.body) {
            Some(payload) => self.sink.capture(
                HookOrigin::PrimaryCall,
                Some(response.url.clone()),
                method.clone(),
                payload,
            ),
            None => trace!(address = %response.url, "response body is not structured"),
        }
    }
}

impl Observable for ObservedHttpClient {
    fn is_observed(&self) -> bool {
        true
    }
}

#[async_trait]
impl HttpClient for ObservedHttpClient {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, TransportError> {
        let method = request.method.clone();
        let result = self.inner.fetch(request).await;
        if let Ok(response) = &result {
            self.inspect(&method, response);
        }
        result
    }
}

/// JSON object or array body, anything else is not worth capturing
pub(crate) fn structured_body(bytes: &[u8]) -> Option<Value> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => Some(value),
        _ => None,
    }
}
