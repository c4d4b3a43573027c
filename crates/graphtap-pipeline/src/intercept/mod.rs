//! Interception layer
//!
//! Decorators over the host's I/O primitives. Each one delegates first,
//! returns the host's result untouched, and only then hands a copy of the
//! decoded payload to the [`CaptureSink`].
//!
//! Rebindable primitives live in [`HookSlot`]s grouped as [`HostHooks`];
//! per-response objects (bodies, worker channels) are wrapped on demand.

mod body;
mod deserialize;
mod guardian;
mod http;
mod legacy;
mod sink;
mod slot;
mod worker;

pub use body::{BufferedBody, ObservedBody, ResponseBody};
pub use deserialize::{Deserializer, JsonDeserializer, ObservedDeserializer};
pub use guardian::Guardian;
pub use http::{FetchRequest, FetchResponse, HttpClient, ObservedHttpClient};
pub use legacy::{LegacyRequest, LegacyResponse, LoadCallback, ObservedRequestFactory, RequestFactory};
pub use sink::{CaptureSink, Observation};
pub use slot::{HookSlot, Observable};
pub use worker::ObservedWorkerChannel;

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;

use crate::correlation::TimingEntry;

/// The host's rebindable primitives
#[derive(Debug, Clone)]
pub struct HostHooks {
    pub http: Arc<HookSlot<dyn HttpClient>>,
    pub legacy: Arc<HookSlot<dyn RequestFactory>>,
    pub deserializer: Arc<HookSlot<dyn Deserializer>>,
}

impl HostHooks {
    /// Bind the host's primitives
    #[must_use]
    pub fn new(
        http: Arc<dyn HttpClient>,
        legacy: Arc<dyn RequestFactory>,
        deserializer: Arc<dyn Deserializer>,
    ) -> Self {
        Self {
            http: Arc::new(HookSlot::new(http)),
            legacy: Arc::new(HookSlot::new(legacy)),
            deserializer: Arc::new(HookSlot::new(deserializer)),
        }
    }

    /// Whether every slot is observed
    #[must_use]
    pub fn all_observed(&self) -> bool {
        self.http.is_observed() && self.legacy.is_observed() && self.deserializer.is_observed()
    }
}

/// Builds observers feeding one sink
#[derive(Debug, Clone)]
pub struct Interceptor {
    sink: CaptureSink,
}

impl Interceptor {
    /// Create interceptor
    #[must_use]
    pub fn new(sink: CaptureSink) -> Self {
        Self { sink }
    }

    /// Sink observations go to
    #[must_use]
    pub fn sink(&self) -> &CaptureSink {
        &self.sink
    }

    /// Observe a request client
    #[must_use]
    pub fn wrap_http(&self, inner: Arc<dyn HttpClient>) -> Arc<dyn HttpClient> {
        Arc::new(ObservedHttpClient::new(inner, self.sink.clone()))
    }

    /// Observe a legacy request factory
    #[must_use]
    pub fn wrap_legacy(&self, inner: Arc<dyn RequestFactory>) -> Arc<dyn RequestFactory> {
        Arc::new(ObservedRequestFactory::new(inner, self.sink.clone()))
    }

    /// Observe a deserializer
    #[must_use]
    pub fn wrap_deserializer(&self, inner: Arc<dyn Deserializer>) -> Arc<dyn Deserializer> {
        Arc::new(ObservedDeserializer::new(inner, self.sink.clone()))
    }

    /// Observe a response body
    #[must_use]
    pub fn observe_body(&self, body: Box<dyn ResponseBody>) -> Box<dyn ResponseBody> {
        Box::new(ObservedBody::new(body, self.sink.clone()))
    }

    /// Observe a worker channel
    #[must_use]
    pub fn observe_worker(&self, rx: mpsc::Receiver<Value>) -> ObservedWorkerChannel {
        ObservedWorkerChannel::new(rx, self.sink.clone())
    }

    /// Feed one resource-timing entry
    pub fn record_timing(&self, entry: TimingEntry) {
        self.sink.timing(entry);
    }

    /// Wrap every slot not yet observed, returning how many were wrapped
    pub fn install(&self, hooks: &HostHooks) -> usize {
        let wrapped = [
            hooks.http.ensure_wrapped(|inner| self.wrap_http(inner)),
            hooks.legacy.ensure_wrapped(|inner| self.wrap_legacy(inner)),
            hooks.deserializer.ensure_wrapped(|inner| self.wrap_deserializer(inner)),
        ]
        .into_iter()
        .filter(|w| *w)
        .count();
        info!(wrapped, "hooks installed");
        wrapped
    }

    /// Guardian watching every slot of `hooks`
    #[must_use]
    pub fn guardian(&self, hooks: &HostHooks, interval: Duration) -> Guardian {
        let mut guardian = Guardian::new(interval);

        let this = self.clone();
        guardian.watch("http", Arc::clone(&hooks.http), move |inner| this.wrap_http(inner));
        let this = self.clone();
        guardian.watch("legacy", Arc::clone(&hooks.legacy), move |inner| {
            this.wrap_legacy(inner)
        });
        let this = self.clone();
        guardian.watch("deserializer", Arc::clone(&hooks.deserializer), move |inner| {
            this.wrap_deserializer(inner)
        });
        guardian
    }
}
