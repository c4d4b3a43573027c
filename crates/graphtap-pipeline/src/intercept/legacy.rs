//! Legacy callback-style request object
//!
//! The host creates a request object, opens it with a method and address,
//! then sends it with a completion callback. The observer records the
//! opened address, forwards both steps untouched and, once the host's own
//! callback has run, captures the body.

use graphtap_model::{HookOrigin, HttpMethod};
use std::sync::Arc;
use tracing::trace;

use super::http::structured_body;
use super::sink::CaptureSink;
use super::slot::Observable;
use crate::error::TransportError;

/// Completed legacy request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyResponse {
    pub status: u16,
    /// Final address, empty when the host does not expose it
    pub response_url: String,
    pub body: String,
}

/// Completion callback
pub type LoadCallback = Box<dyn FnOnce(Result<LegacyResponse, TransportError>) + Send>;

/// One legacy request object
pub trait LegacyRequest: Send {
    /// Call-initiation step
    fn open(&mut self, method: HttpMethod, url: &str);

    /// Send step; `on_load` runs when the request completes
    fn send(self: Box<Self>, body: Option<Vec<u8>>, on_load: LoadCallback);
}

/// Constructor of legacy request objects
pub trait RequestFactory: Observable + Send + Sync {
    /// New unopened request
    fn create(&self) -> Box<dyn LegacyRequest>;
}

/// Factory decorator producing observed requests
pub struct ObservedRequestFactory {
    inner: Arc<dyn RequestFactory>,
    sink: CaptureSink,
}

impl ObservedRequestFactory {
    /// Wrap `inner`
    #[must_use]
    pub fn new(inner: Arc<dyn RequestFactory>, sink: CaptureSink) -> Self {
        Self { inner, sink }
    }
}

impl Observable for ObservedRequestFactory {
    fn is_observed(&self) -> bool {
        true
    }
}

impl RequestFactory for ObservedRequestFactory {
    fn create(&self) -> Box<dyn LegacyRequest> {
        Box::new(ObservedRequest {
            inner: self.inner.create(),
            sink: self.sink.clone(),
            method: HttpMethod::Unknown,
            url: None,
        })
    }
}

struct ObservedRequest {
    inner: Box<dyn LegacyRequest>,
    sink: CaptureSink,
    method: HttpMethod,
    url: Option<String>,
}

impl LegacyRequest for ObservedRequest {
    fn open(&mut self, method: HttpMethod, url: &str) {
        self.method = method.clone();
        self.url = Some(url.to_string());
        self.inner.open(method, url);
    }

    fn send(self: Box<Self>, body: Option<Vec<u8>>, on_load: LoadCallback) {
        let ObservedRequest {
            inner,
            sink,
            method,
            url,
        } = *self;

        let observe: LoadCallback = Box::new(move |result| {
            let completed = match &result {
                Ok(response) if (200..300).contains(&response.status) => Some((
                    response.body.clone(),
                    Some(response.response_url.clone()).filter(|u| !u.is_empty()),
                )),
                _ => None,
            };
            on_load(result);

            let Some((body, response_url)) = completed else {
                return;
            };
            match structured_body(body.as_bytes()) {
                Some(payload) => sink.capture(
                    HookOrigin::LegacyCall,
                    response_url.or(url),
                    method,
                    payload,
                ),
                None => trace!("legacy response body is not structured"),
            }
        });
        inner.send(body, observe);
    }
}
