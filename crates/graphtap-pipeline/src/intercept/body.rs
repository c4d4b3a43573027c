//! Response-body decoding methods
//!
//! Every decode method (structured, text, binary) is observed. The decode
//! result goes back to the caller unchanged; a failed decode produces no
//! capture.

use async_trait::async_trait;
use graphtap_model::{HookOrigin, HttpMethod};
use serde_json::Value;
use tracing::trace;

use super::http::{structured_body, FetchResponse};
use super::sink::CaptureSink;
use crate::error::DecodeError;

/// A response body that can be decoded once
#[async_trait]
pub trait ResponseBody: Send {
    /// Address the body was fetched from
    fn url(&self) -> &str;

    /// Decode as JSON
    async fn json(self: Box<Self>) -> Result<Value, DecodeError>;

    /// Decode as UTF-8 text
    async fn text(self: Box<Self>) -> Result<String, DecodeError>;

    /// Raw bytes
    async fn bytes(self: Box<Self>) -> Result<Vec<u8>, DecodeError>;
}

/// Body already held in memory
#[derive(Debug, Clone)]
pub struct BufferedBody {
    url: String,
    body: Vec<u8>,
}

impl BufferedBody {
    /// Create body
    #[must_use]
    pub fn new(url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            url: url.into(),
            body: body.into(),
        }
    }
}

impl From<FetchResponse> for BufferedBody {
    fn from(response: FetchResponse) -> Self {
        Self::new(response.url, response.body)
    }
}

#[async_trait]
impl ResponseBody for BufferedBody {
    fn url(&self) -> &str {
        &self.url
    }

    async fn json(self: Box<Self>) -> Result<Value, DecodeError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    async fn text(self: Box<Self>) -> Result<String, DecodeError> {
        Ok(String::from_utf8(self.body)?)
    }

    async fn bytes(self: Box<Self>) -> Result<Vec<u8>, DecodeError> {
        Ok(self.body)
    }
}

/// Decorator capturing what the wrapped body decodes to
pub struct ObservedBody {
    inner: Box<dyn ResponseBody>,
    sink: CaptureSink,
    method: HttpMethod,
}

impl ObservedBody {
    /// Wrap `inner`
    #[must_use]
    pub fn new(inner: Box<dyn ResponseBody>, sink: CaptureSink) -> Self {
        Self {
            inner,
            sink,
            method: HttpMethod::Unknown,
        }
    }

    /// With method of the originating request
    #[inline]
    #[must_use]
    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }
}

#[async_trait]
impl ResponseBody for ObservedBody {
    fn url(&self) -> &str {
        self.inner.url()
    }

    async fn json(self: Box<Self>) -> Result<Value, DecodeError> {
        let url = self.inner.url().to_string();
        let ObservedBody { inner, sink, method } = *self;
        let value = inner.json().await?;
        if matches!(value, Value::Object(_) | Value::Array(_)) {
            sink.capture(HookOrigin::DecodeJson, Some(url), method, value.clone());
        }
        Ok(value)
    }

    async fn text(self: Box<Self>) -> Result<String, DecodeError> {
        let url = self.inner.url().to_string();
        let ObservedBody { inner, sink, method } = *self;
        let text = inner.text().await?;
        match structured_body(text.as_bytes()) {
            Some(payload) => sink.capture(HookOrigin::DecodeText, Some(url), method, payload),
            None => trace!(address = %url, "text body is not structured"),
        }
        Ok(text)
    }

    async fn bytes(self: Box<Self>) -> Result<Vec<u8>, DecodeError> {
        let url = self.inner.url().to_string();
        let ObservedBody { inner, sink, method } = *self;
        let bytes = inner.bytes().await?;
        match structured_body(&bytes) {
            Some(payload) => sink.capture(HookOrigin::DecodeBinary, Some(url), method, payload),
            None => trace!(address = %url, "binary body is not structured"),
        }
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::intercept::sink::Observation;
    use std::sync::Arc;

    fn observed(body: &[u8]) -> (
        Box<dyn ResponseBody>,
        tokio::sync::mpsc::UnboundedReceiver<Observation>,
    ) {
        let (sink, rx) = CaptureSink::channel(Arc::new(SystemClock));
        let inner = Box::new(BufferedBody::new("/voyager/api/feed", body.to_vec()));
        (Box::new(ObservedBody::new(inner, sink)), rx)
    }

    fn origin_of(observation: Observation) -> HookOrigin {
        match observation {
            Observation::Exchange(exchange) => exchange.origin,
            Observation::Timing(_) => panic!("expected exchange"),
        }
    }

    #[tokio::test]
    async fn each_decode_method_has_its_origin() {
        let (body, mut rx) = observed(br#"{"elements":[]}"#);
        assert_eq!(body.json().await.unwrap(), serde_json::json!({"elements": []}));
        assert_eq!(origin_of(rx.try_recv().unwrap()), HookOrigin::DecodeJson);

        let (body, mut rx) = observed(br#"{"elements":[]}"#);
        assert_eq!(body.text().await.unwrap(), r#"{"elements":[]}"#);
        assert_eq!(origin_of(rx.try_recv().unwrap()), HookOrigin::DecodeText);

        let (body, mut rx) = observed(br#"{"elements":[]}"#);
        assert_eq!(body.bytes().await.unwrap(), br#"{"elements":[]}"#.to_vec());
        assert_eq!(origin_of(rx.try_recv().unwrap()), HookOrigin::DecodeBinary);
    }

    #[tokio::test]
    async fn decode_failure_is_returned_without_capture() {
        let (body, mut rx) = observed(b"{broken");
        assert!(matches!(body.json().await, Err(DecodeError::Json(_))));
        assert!(rx.try_recv().is_err());

        let (body, mut rx) = observed(&[0xff, 0xfe]);
        assert!(matches!(body.text().await, Err(DecodeError::Utf8(_))));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn plain_text_is_not_captured() {
        let (body, mut rx) = observed(b"hello");
        assert_eq!(body.text().await.unwrap(), "hello");
        assert!(rx.try_recv().is_err());
    }
}
