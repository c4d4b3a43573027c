//! Generic top-level deserialization routine
//!
//! Anything on the host may call the deserializer, so results carry no
//! address and only shape-bearing values (collections with `included`,
//! `data` or `elements`) are captured. The pipeline recovers the address
//! from the correlation tracker.

use graphtap_classify::is_shape_bearing;
use graphtap_model::{HookOrigin, HttpMethod};
use serde_json::Value;
use std::sync::Arc;
use tracing::trace;

use super::sink::CaptureSink;
use super::slot::Observable;

/// Host deserialization routine
pub trait Deserializer: Observable + Send + Sync {
    /// Parse text into a value
    ///
    /// # Errors
    /// Returns the parser's error for malformed input
    fn deserialize(&self, text: &str) -> Result<Value, serde_json::Error>;
}

/// Plain `serde_json` deserializer
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDeserializer;

impl Observable for JsonDeserializer {}

impl Deserializer for JsonDeserializer {
    fn deserialize(&self, text: &str) -> Result<Value, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Decorator capturing shape-bearing results
pub struct ObservedDeserializer {
    inner: Arc<dyn Deserializer>,
    sink: CaptureSink,
}

impl ObservedDeserializer {
    /// Wrap `inner`
    #[must_use]
    pub fn new(inner: Arc<dyn Deserializer>, sink: CaptureSink) -> Self {
        Self { inner, sink }
    }
}

impl Observable for ObservedDeserializer {
    fn is_observed(&self) -> bool {
        true
    }
}

impl Deserializer for ObservedDeserializer {
    fn deserialize(&self, text: &str) -> Result<Value, serde_json::Error> {
        let result = self.inner.deserialize(text);
        match &result {
            Ok(value) if is_shape_bearing(value) => {
                self.sink.capture(
                    HookOrigin::GenericDeserialize,
                    None,
                    HttpMethod::Unknown,
                    value.clone(),
                );
            }
            Ok(_) => trace!("deserialized value is not shape-bearing"),
            Err(_) => {}
        }
        result
    }
}
