//! Captured exchanges
//!
//! A [`CapturedExchange`] is created once per observed response by one of the
//! interception hooks and then moved, unchanged, through the pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// Which observation point produced an exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HookOrigin {
    /// Primary promise-style request call
    PrimaryCall,
    /// Legacy callback-style request object
    LegacyCall,
    /// Structured (JSON) body decode
    DecodeJson,
    /// Text body decode
    DecodeText,
    /// Binary body decode
    DecodeBinary,
    /// Generic top-level deserialization routine
    GenericDeserialize,
    /// Message posted back from a worker context
    WorkerMessage,
}

impl HookOrigin {
    /// All origins, in hook installation order
    pub const ALL: [HookOrigin; 7] = [
        HookOrigin::PrimaryCall,
        HookOrigin::LegacyCall,
        HookOrigin::DecodeJson,
        HookOrigin::DecodeText,
        HookOrigin::DecodeBinary,
        HookOrigin::GenericDeserialize,
        HookOrigin::WorkerMessage,
    ];

    /// Stable kebab-case name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            HookOrigin::PrimaryCall => "primary-call",
            HookOrigin::LegacyCall => "legacy-call",
            HookOrigin::DecodeJson => "decode-json",
            HookOrigin::DecodeText => "decode-text",
            HookOrigin::DecodeBinary => "decode-binary",
            HookOrigin::GenericDeserialize => "generic-deserialize",
            HookOrigin::WorkerMessage => "worker-message",
        }
    }

    /// Whether hooks of this origin normally know their request address
    #[inline]
    #[must_use]
    pub const fn carries_address(&self) -> bool {
        !matches!(
            self,
            HookOrigin::GenericDeserialize | HookOrigin::WorkerMessage
        )
    }
}

impl fmt::Display for HookOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HookOrigin {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|origin| origin.as_str() == s)
            .ok_or_else(|| ModelError::UnknownHookOrigin(s.to_string()))
    }
}

/// HTTP method of the originating request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    /// Method not visible at the observation point
    #[default]
    Unknown,
}

impl HttpMethod {
    /// Canonical upper-case name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Unknown => "UNKNOWN",
        }
    }

    /// Parse a method name leniently; anything unrecognized is `Unknown`
    #[must_use]
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => HttpMethod::Get,
            "POST" => HttpMethod::Post,
            "PUT" => HttpMethod::Put,
            "PATCH" => HttpMethod::Patch,
            "DELETE" => HttpMethod::Delete,
            "HEAD" => HttpMethod::Head,
            "OPTIONS" => HttpMethod::Options,
            _ => HttpMethod::Unknown,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observed response, as seen by a single hook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedExchange {
    /// Request address, when the hook could see it
    #[serde(default)]
    pub source_address: Option<String>,
    /// Request method
    #[serde(default)]
    pub method: HttpMethod,
    /// Decoded response payload
    pub payload: Value,
    /// When the hook obtained the result
    pub observed_at: DateTime<Utc>,
    /// Hook that produced this exchange
    pub origin: HookOrigin,
}

impl CapturedExchange {
    /// Create new exchange without an address
    #[inline]
    #[must_use]
    pub fn new(origin: HookOrigin, payload: Value, observed_at: DateTime<Utc>) -> Self {
        Self {
            source_address: None,
            method: HttpMethod::Unknown,
            payload,
            observed_at,
            origin,
        }
    }

    /// With source address
    #[inline]
    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.source_address = Some(address.into());
        self
    }

    /// With optional source address
    #[inline]
    #[must_use]
    pub fn with_optional_address(mut self, address: Option<String>) -> Self {
        self.source_address = address;
        self
    }

    /// With HTTP method
    #[inline]
    #[must_use]
    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    /// Address as a string slice
    #[inline]
    #[must_use]
    pub fn address(&self) -> Option<&str> {
        self.source_address.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hook_origin_roundtrip_names() {
        for origin in HookOrigin::ALL {
            assert_eq!(origin.as_str().parse::<HookOrigin>().unwrap(), origin);
        }
        assert!("fetch".parse::<HookOrigin>().is_err());
    }

    #[test]
    fn hook_origin_serde_is_kebab_case() {
        let encoded = serde_json::to_string(&HookOrigin::GenericDeserialize).unwrap();
        assert_eq!(encoded, "\"generic-deserialize\"");
    }

    #[test]
    fn address_less_origins() {
        assert!(HookOrigin::DecodeJson.carries_address());
        assert!(!HookOrigin::GenericDeserialize.carries_address());
        assert!(!HookOrigin::WorkerMessage.carries_address());
    }

    #[test]
    fn method_parse_lenient() {
        assert_eq!(HttpMethod::parse_lenient("get"), HttpMethod::Get);
        assert_eq!(HttpMethod::parse_lenient(" Post "), HttpMethod::Post);
        assert_eq!(HttpMethod::parse_lenient("BREW"), HttpMethod::Unknown);
    }

    #[test]
    fn exchange_builder() {
        let exchange = CapturedExchange::new(HookOrigin::DecodeJson, json!({}), Utc::now())
            .with_address("/voyager/api/feed")
            .with_method(HttpMethod::Get);
        assert_eq!(exchange.address(), Some("/voyager/api/feed"));
        assert_eq!(exchange.method, HttpMethod::Get);
    }

    #[test]
    fn exchange_deserializes_with_defaults() {
        let exchange: CapturedExchange = serde_json::from_value(json!({
            "payload": {"data": {}},
            "observed_at": "2024-01-01T00:00:00Z",
            "origin": "worker-message"
        }))
        .unwrap();
        assert_eq!(exchange.source_address, None);
        assert_eq!(exchange.method, HttpMethod::Unknown);
    }
}
