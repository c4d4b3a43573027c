//! Fire-and-forget hand-off from hooks to the pipeline
//!
//! Exchanges and timing entries share one unbounded channel so the pipeline
//! sees them in the order the host produced them. Sending never blocks the
//! hook; after shutdown observations are silently dropped.

use graphtap_model::{CapturedExchange, HookOrigin, HttpMethod};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::trace;

use crate::clock::Clock;
use crate::correlation::TimingEntry;

/// Something a hook observed
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    /// A decoded response
    Exchange(CapturedExchange),
    /// A resource-timing entry
    Timing(TimingEntry),
}

/// Sending half handed to every hook
#[derive(Debug, Clone)]
pub struct CaptureSink {
    tx: mpsc::UnboundedSender<Observation>,
    clock: Arc<dyn Clock>,
}

impl CaptureSink {
    /// Create sink and the receiver the pipeline drains
    #[must_use]
    pub fn channel(clock: Arc<dyn Clock>) -> (Self, mpsc::UnboundedReceiver<Observation>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, clock }, rx)
    }

    /// Stamp and dispatch a decoded payload
    pub fn capture(
        &self,
        origin: HookOrigin,
        address: Option<String>,
        method: HttpMethod,
        payload: Value,
    ) {
        let exchange = CapturedExchange::new(origin, payload, self.clock.now())
            .with_optional_address(address)
            .with_method(method);
        self.send(Observation::Exchange(exchange));
    }

    /// Dispatch a resource-timing entry
    pub fn timing(&self, entry: TimingEntry) {
        self.send(Observation::Timing(entry));
    }

    /// Dispatch an already-built exchange
    pub fn exchange(&self, exchange: CapturedExchange) {
        self.send(Observation::Exchange(exchange));
    }

    fn send(&self, observation: Observation) {
        if self.tx.send(observation).is_err() {
            trace!("pipeline stopped, observation dropped");
        }
    }

    /// Current time on the sink's clock
    #[inline]
    #[must_use]
    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    /// Whether the pipeline side is gone
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn capture_stamps_and_preserves_order() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let (sink, mut rx) = CaptureSink::channel(Arc::new(ManualClock::new(start)));

        sink.timing(TimingEntry::new("/voyager/api/me", "fetch", start));
        sink.capture(
            HookOrigin::DecodeJson,
            Some("/voyager/api/me".to_string()),
            HttpMethod::Get,
            json!({"data": {}}),
        );

        assert!(matches!(rx.try_recv().unwrap(), Observation::Timing(_)));
        let Observation::Exchange(exchange) = rx.try_recv().unwrap() else {
            panic!("expected exchange");
        };
        assert_eq!(exchange.observed_at, start);
        assert_eq!(exchange.address(), Some("/voyager/api/me"));
        assert_eq!(exchange.origin, HookOrigin::DecodeJson);
    }

    #[test]
    fn send_after_close_is_silent() {
        let (sink, rx) = CaptureSink::channel(Arc::new(crate::clock::SystemClock));
        drop(rx);
        assert!(sink.is_closed());
        sink.capture(HookOrigin::PrimaryCall, None, HttpMethod::Get, json!({}));
    }
}
