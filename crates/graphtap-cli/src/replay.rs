//! Offline replay of recorded traffic
//!
//! Observations run through a pipeline whose clock follows the recording,
//! so dedup windows and correlation retention behave as they did live.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use graphtap_model::{CapturedExchange, ForwardedEvent};
use graphtap_pipeline::{
    ManualClock, Observation, Pipeline, PipelineConfig, PipelineOutcome, PipelineStats,
    TimingEntry,
};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::har::parse_har;

/// Recording format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayFormat {
    /// One exchange or timing entry JSON per line
    Jsonl,
    /// HTTP Archive
    Har,
}

impl ReplayFormat {
    /// Guess from the file extension, defaulting to JSONL
    pub fn detect(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("har") => ReplayFormat::Har,
            _ => ReplayFormat::Jsonl,
        }
    }

    /// Parse a format name
    ///
    /// # Errors
    /// Returns an error for unknown names
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "jsonl" => Ok(ReplayFormat::Jsonl),
            "har" => Ok(ReplayFormat::Har),
            other => bail!("unknown replay format: {other}"),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ReplayLine {
    Exchange(CapturedExchange),
    Timing(TimingEntry),
}

/// Parse JSONL, skipping blank lines and `#` comments
///
/// # Errors
/// Returns an error naming the first line that is neither an exchange nor a
/// timing entry
pub fn parse_jsonl(raw: &str) -> Result<Vec<Observation>> {
    let mut observations = Vec::new();
    for (index, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let parsed: ReplayLine = serde_json::from_str(line)
            .with_context(|| format!("line {}: not an exchange or timing entry", index + 1))?;
        observations.push(match parsed {
            ReplayLine::Exchange(exchange) => Observation::Exchange(exchange),
            ReplayLine::Timing(entry) => Observation::Timing(entry),
        });
    }
    Ok(observations)
}

/// Read and parse a recording
///
/// # Errors
/// Returns an error if the file cannot be read or parsed
pub async fn load(path: &Path, format: ReplayFormat) -> Result<Vec<Observation>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("cannot read {}", path.display()))?;
    match format {
        ReplayFormat::Jsonl => parse_jsonl(&raw),
        ReplayFormat::Har => parse_har(&raw),
    }
    .with_context(|| format!("cannot parse {}", path.display()))
}

/// Result of a replay
#[derive(Debug)]
pub struct ReplayReport {
    /// Forwarded events in processing order
    pub events: Vec<Arc<ForwardedEvent>>,
    pub stats: PipelineStats,
}

fn observed_at(observation: &Observation) -> DateTime<Utc> {
    match observation {
        Observation::Exchange(exchange) => exchange.observed_at,
        Observation::Timing(entry) => entry.response_end,
    }
}

/// Run observations through a fresh pipeline
///
/// # Errors
/// Returns an error if the configuration is rejected
pub fn replay(config: PipelineConfig, observations: Vec<Observation>) -> Result<ReplayReport> {
    let start = observations.first().map_or_else(Utc::now, observed_at);
    let clock = Arc::new(ManualClock::new(start));
    let pipeline = Pipeline::with_clock(config, clock.clone())?;

    let mut events = Vec::new();
    for observation in observations {
        clock.set(observed_at(&observation));
        if let Some(PipelineOutcome::Forwarded(event)) = pipeline.apply(observation) {
            events.push(event);
        }
    }

    let stats = pipeline.stats();
    info!(
        captured = stats.captured,
        forwarded = stats.forwarded,
        duplicates = stats.duplicates,
        excluded = stats.excluded,
        "replay finished"
    );
    Ok(ReplayReport { events, stats })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_detection() {
        assert_eq!(ReplayFormat::detect(Path::new("capture.HAR")), ReplayFormat::Har);
        assert_eq!(ReplayFormat::detect(Path::new("capture.jsonl")), ReplayFormat::Jsonl);
        assert_eq!(ReplayFormat::parse("har").unwrap(), ReplayFormat::Har);
        assert!(ReplayFormat::parse("pcap").is_err());
    }

    #[test]
    fn jsonl_mixes_exchanges_and_timing() {
        let raw = r#"
# recorded session
{"name":"/voyager/api/me","initiator_type":"fetch","response_end":"2024-03-01T12:00:00Z"}
{"origin":"decode-json","payload":{"data":{}},"observed_at":"2024-03-01T12:00:00.100Z"}
"#;
        let observations = parse_jsonl(raw).unwrap();
        assert!(matches!(observations[0], Observation::Timing(_)));
        assert!(matches!(observations[1], Observation::Exchange(_)));
    }

    #[test]
    fn jsonl_reports_bad_line() {
        let err = parse_jsonl("{\"origin\":\"decode-json\"}\n").unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }
}
