//! Worker-to-main message channel
//!
//! Messages posted back from a secondary execution context arrive as
//! values, or as JSON text the worker serialized itself. Shape-bearing
//! messages are captured without an address; every message is delivered
//! to the host unchanged.

use graphtap_classify::is_shape_bearing;
use graphtap_model::{HookOrigin, HttpMethod};
use serde_json::Value;
use tokio::sync::mpsc;

use super::sink::CaptureSink;

/// Receiving end of a worker channel, observed
#[derive(Debug)]
pub struct ObservedWorkerChannel {
    rx: mpsc::Receiver<Value>,
    sink: CaptureSink,
}

impl ObservedWorkerChannel {
    /// Wrap the host's receiver
    #[must_use]
    pub fn new(rx: mpsc::Receiver<Value>, sink: CaptureSink) -> Self {
        Self { rx, sink }
    }

    /// Next message, `None` once the worker is gone
    pub async fn recv(&mut self) -> Option<Value> {
        let message = self.rx.recv().await?;
        self.inspect(&message);
        Some(message)
    }

    fn inspect(&self, message: &Value) {
        let candidate = match message {
            Value::String(text) => serde_json::from_str::<Value>(text).ok(),
            other => Some(other.clone()),
        };
        if let Some(payload) = candidate.filter(is_shape_bearing) {
            self.sink
                .capture(HookOrigin::WorkerMessage, None, HttpMethod::Unknown, payload);
        }
    }
}
