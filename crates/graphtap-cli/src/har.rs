//! HTTP Archive (HAR) input
//!
//! Each entry becomes a timing entry at its completion time, and each
//! successful JSON response additionally becomes a primary-call exchange
//! observed at that same instant, right after the timing entry.

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use graphtap_model::{CapturedExchange, HookOrigin, HttpMethod};
use graphtap_pipeline::{Observation, TimingEntry};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// HAR document root
#[derive(Debug, Deserialize)]
pub struct HarFile {
    pub log: HarLog,
}

#[derive(Debug, Deserialize)]
pub struct HarLog {
    #[serde(default)]
    pub entries: Vec<HarEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarEntry {
    pub started_date_time: String,
    /// Total elapsed time in milliseconds
    #[serde(default)]
    pub time: f64,
    pub request: HarRequest,
    pub response: HarResponse,
    /// Chromium resource type (`fetch`, `xhr`, `script`, ...)
    #[serde(default, rename = "_resourceType")]
    pub resource_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HarRequest {
    pub method: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct HarResponse {
    pub status: u16,
    #[serde(default)]
    pub content: HarContent,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarContent {
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
}

impl HarEntry {
    /// When the response finished
    ///
    /// `None` if the start time is unparseable or the end overflows.
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        let started = DateTime::parse_from_rfc3339(&self.started_date_time).ok()?;
        let elapsed = Duration::microseconds((self.time.max(0.0) * 1_000.0) as i64);
        started.with_timezone(&Utc).checked_add_signed(elapsed)
    }

    /// Initiator type in resource-timing terms
    pub fn initiator_type(&self) -> &str {
        match self.resource_type.as_deref() {
            Some("xhr") => "xmlhttprequest",
            Some("fetch") => "fetch",
            Some(other) => other,
            None => "other",
        }
    }

    /// Response payload, when it is a successful JSON object or array
    pub fn payload(&self) -> Option<Value> {
        if !(200..300).contains(&self.response.status) {
            return None;
        }
        let content = &self.response.content;
        let text = content.text.as_deref()?;
        let parsed = if content.encoding.as_deref() == Some("base64") {
            let decoded = match BASE64.decode(text.trim()) {
                Ok(decoded) => decoded,
                Err(e) => {
                    debug!(address = %self.request.url, error = %e, "undecodable base64 body skipped");
                    return None;
                }
            };
            serde_json::from_slice::<Value>(&decoded)
        } else {
            serde_json::from_str::<Value>(text)
        };
        match parsed {
            Ok(value @ (Value::Object(_) | Value::Array(_))) => Some(value),
            _ => None,
        }
    }
}

/// Parse a HAR document into observations in completion order
///
/// # Errors
/// Returns an error if the document is not valid HAR JSON
pub fn parse_har(raw: &str) -> Result<Vec<Observation>> {
    let har: HarFile = serde_json::from_str(raw).context("invalid HAR document")?;

    let mut timed: Vec<(DateTime<Utc>, usize, Observation)> = Vec::new();
    for (index, entry) in har.log.entries.iter().enumerate() {
        let Some(at) = entry.completed_at() else {
            debug!(index, started = %entry.started_date_time, "entry without usable timestamp skipped");
            continue;
        };
        timed.push((
            at,
            timed.len(),
            Observation::Timing(TimingEntry::new(&entry.request.url, entry.initiator_type(), at)),
        ));
        if let Some(payload) = entry.payload() {
            let exchange = CapturedExchange::new(HookOrigin::PrimaryCall, payload, at)
                .with_address(&entry.request.url)
                .with_method(HttpMethod::parse_lenient(&entry.request.method));
            timed.push((at, timed.len(), Observation::Exchange(exchange)));
        }
    }

    timed.sort_by_key(|(at, seq, _)| (*at, *seq));
    Ok(timed.into_iter().map(|(_, _, observation)| observation).collect())
}
