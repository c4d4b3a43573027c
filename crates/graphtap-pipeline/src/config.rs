//! Pipeline configuration
//!
//! Pure data, loadable from TOML. Every section falls back to its defaults
//! when absent:
//!
//! ```toml
//! forward_excluded = false
//!
//! [dedup]
//! window_ms = 500
//!
//! [correlation]
//! retention_ms = 10000
//!
//! [classifier]
//! exclusions = ["/li/track", "thirdpartyidsync"]
//! ```

use graphtap_classify::ClassifierTables;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;

/// Upper bound for every window and interval: one day
pub const MAX_WINDOW_MS: u64 = 24 * 60 * 60 * 1_000;

/// Deduplication settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Suppression window in milliseconds
    pub window_ms: u64,
    /// Canonical payload bytes hashed into the key
    pub prefix_bytes: usize,
    /// Maximum remembered keys
    pub max_entries: u64,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            window_ms: 500,
            prefix_bytes: 2048,
            max_entries: 4096,
        }
    }
}

impl DedupConfig {
    /// Suppression window
    #[inline]
    #[must_use]
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

/// Correlation tracker settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationConfig {
    /// How long an observed address stays usable, in milliseconds
    pub retention_ms: u64,
    /// Maximum remembered addresses
    pub max_entries: usize,
    /// Resource-timing initiator types accepted from the timing feed
    pub initiator_types: Vec<String>,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            retention_ms: 10_000,
            max_entries: 256,
            initiator_types: vec![
                "fetch".to_string(),
                "xmlhttprequest".to_string(),
                "other".to_string(),
            ],
        }
    }
}

impl CorrelationConfig {
    /// Retention window
    #[inline]
    #[must_use]
    pub fn retention(&self) -> Duration {
        Duration::from_millis(self.retention_ms)
    }

    /// Whether an initiator type is accepted (case-insensitive)
    #[must_use]
    pub fn accepts_initiator(&self, initiator: &str) -> bool {
        self.initiator_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(initiator))
    }
}

/// Complete pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Hook health-check period in milliseconds
    pub guardian_interval_ms: u64,
    /// Buffered events per subscriber before it starts lagging
    pub event_capacity: usize,
    /// Publish excluded exchanges instead of dropping them
    pub forward_excluded: bool,
    pub dedup: DedupConfig,
    pub correlation: CorrelationConfig,
    pub classifier: ClassifierTables,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            guardian_interval_ms: 1_000,
            event_capacity: 1024,
            forward_excluded: false,
            dedup: DedupConfig::default(),
            correlation: CorrelationConfig::default(),
            classifier: ClassifierTables::builtin(),
        }
    }
}

impl PipelineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With dedup window
    #[inline]
    #[must_use]
    pub fn with_dedup_window(mut self, window: Duration) -> Self {
        self.dedup.window_ms = u64::try_from(window.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// With dedup prefix length
    #[inline]
    #[must_use]
    pub fn with_dedup_prefix(mut self, bytes: usize) -> Self {
        self.dedup.prefix_bytes = bytes;
        self
    }

    /// With correlation retention window
    #[inline]
    #[must_use]
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.correlation.retention_ms = u64::try_from(retention.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// With classifier tables
    #[inline]
    #[must_use]
    pub fn with_classifier(mut self, tables: ClassifierTables) -> Self {
        self.classifier = tables;
        self
    }

    /// With guardian interval
    #[inline]
    #[must_use]
    pub fn with_guardian_interval(mut self, interval: Duration) -> Self {
        self.guardian_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// With subscriber buffer capacity
    #[inline]
    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// With excluded exchanges published
    #[inline]
    #[must_use]
    pub fn with_forward_excluded(mut self, forward: bool) -> Self {
        self.forward_excluded = forward;
        self
    }

    /// Guardian interval
    #[inline]
    #[must_use]
    pub fn guardian_interval(&self) -> Duration {
        Duration::from_millis(self.guardian_interval_ms)
    }

    /// Parse and validate TOML
    ///
    /// # Errors
    /// - `ConfigError::Parse` on malformed TOML
    /// - any error from [`validate`](Self::validate)
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    ///
    /// # Errors
    /// - `ConfigError::Io` if the file cannot be read
    /// - any error from [`from_toml_str`](Self::from_toml_str)
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::io_error(path, e))?;
        Self::from_toml_str(&raw)
    }

    /// Encode as TOML
    ///
    /// # Errors
    /// Returns `ConfigError::Encode` if encoding fails
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every value is usable
    ///
    /// # Errors
    /// - `ConfigError::Invalid` for zero windows, capacities or prefix,
    ///   or windows longer than [`MAX_WINDOW_MS`]
    /// - `ConfigError::Tables` for unusable classifier tables
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive: [(&'static str, u64); 7] = [
            ("dedup.window_ms", self.dedup.window_ms),
            ("dedup.prefix_bytes", self.dedup.prefix_bytes as u64),
            ("dedup.max_entries", self.dedup.max_entries),
            ("correlation.retention_ms", self.correlation.retention_ms),
            ("correlation.max_entries", self.correlation.max_entries as u64),
            ("guardian_interval_ms", self.guardian_interval_ms),
            ("event_capacity", self.event_capacity as u64),
        ];
        if let Some(&(field, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::invalid(field, "must be greater than zero"));
        }
        let bounded: [(&'static str, u64); 3] = [
            ("dedup.window_ms", self.dedup.window_ms),
            ("correlation.retention_ms", self.correlation.retention_ms),
            ("guardian_interval_ms", self.guardian_interval_ms),
        ];
        if let Some(&(field, _)) = bounded.iter().find(|(_, value)| *value > MAX_WINDOW_MS) {
            return Err(ConfigError::invalid(
                field,
                format!("must be at most {MAX_WINDOW_MS} ms"),
            ));
        }
        if self.correlation.initiator_types.is_empty() {
            return Err(ConfigError::invalid(
                "correlation.initiator_types",
                "at least one initiator type is required",
            ));
        }
        self.classifier.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = PipelineConfig::new();
        assert_eq!(config.dedup.window(), Duration::from_millis(500));
        assert_eq!(config.correlation.retention(), Duration::from_secs(10));
        assert_eq!(config.guardian_interval(), Duration::from_secs(1));
        assert!(!config.forward_excluded);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_methods() {
        let config = PipelineConfig::new()
            .with_dedup_window(Duration::from_millis(250))
            .with_dedup_prefix(64)
            .with_retention(Duration::from_secs(3))
            .with_event_capacity(8)
            .with_forward_excluded(true);
        assert_eq!(config.dedup.window_ms, 250);
        assert_eq!(config.dedup.prefix_bytes, 64);
        assert_eq!(config.correlation.retention_ms, 3_000);
        assert_eq!(config.event_capacity, 8);
        assert!(config.forward_excluded);
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config = PipelineConfig::from_toml_str(
            r#"
            forward_excluded = true

            [dedup]
            window_ms = 750
            "#,
        )
        .unwrap();
        assert_eq!(config.dedup.window_ms, 750);
        assert_eq!(config.dedup.prefix_bytes, 2048);
        assert_eq!(config.correlation, CorrelationConfig::default());
        assert_eq!(config.classifier, ClassifierTables::builtin());
        assert!(config.forward_excluded);
    }

    #[test]
    fn validate_rejects_zero_window() {
        let err = PipelineConfig::from_toml_str("[dedup]\nwindow_ms = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "dedup.window_ms", .. }));
    }

    #[test]
    fn validate_rejects_oversized_windows() {
        let err = PipelineConfig::from_toml_str("[dedup]\nwindow_ms = 9223372036854775807")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "dedup.window_ms", .. }));

        let err = PipelineConfig::from_toml_str("[correlation]\nretention_ms = 9223372036854775807")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "correlation.retention_ms", .. }));

        let config = PipelineConfig::new().with_guardian_interval(Duration::from_secs(2 * 86_400));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "guardian_interval_ms", .. })
        ));
    }

    #[test]
    fn validate_accepts_windows_at_the_bound() {
        let config = PipelineConfig::new()
            .with_dedup_window(Duration::from_millis(MAX_WINDOW_MS))
            .with_retention(Duration::from_millis(MAX_WINDOW_MS))
            .with_guardian_interval(Duration::from_millis(MAX_WINDOW_MS));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_identifier_params() {
        let err = PipelineConfig::from_toml_str("[classifier]\nidentifier_params = []\n").unwrap_err();
        assert!(matches!(err, ConfigError::Tables(_)));
    }

    #[test]
    fn toml_roundtrip() {
        let config = PipelineConfig::new().with_dedup_window(Duration::from_millis(900));
        let encoded = config.to_toml_string().unwrap();
        assert_eq!(PipelineConfig::from_toml_str(&encoded).unwrap(), config);
    }

    #[test]
    fn initiator_match_is_case_insensitive() {
        let config = CorrelationConfig::default();
        assert!(config.accepts_initiator("XMLHttpRequest"));
        assert!(!config.accepts_initiator("img"));
    }
}
