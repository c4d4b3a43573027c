//! Time-windowed deduplication
//!
//! Several hooks can observe the same response (the primary call and a
//! body decode, for instance). Keys are remembered in a moka cache; a key
//! seen again within the window is suppressed, otherwise its timestamp is
//! refreshed and the exchange is forwarded.
//!
//! The check and the refresh happen in one atomic cache operation, so two
//! concurrent observers of the same key never both forward.

use chrono::{DateTime, Utc};
use graphtap_model::DedupKey;
use moka::ops::compute::{CompResult, Op};
use moka::sync::Cache;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::clock::Clock;
use crate::config::DedupConfig;

/// Remembered keys outlive the window so entries are swept eventually
const MIN_TTL: Duration = Duration::from_secs(1);

/// Kept well under the longest lifetime moka accepts
const MAX_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Suppresses repeats of the same payload within a window
#[derive(Debug, Clone)]
pub struct Deduplicator {
    seen: Cache<DedupKey, DateTime<Utc>>,
    window: chrono::Duration,
    prefix_bytes: usize,
    clock: Arc<dyn Clock>,
}

impl Deduplicator {
    /// Create deduplicator reading time from `clock`
    #[must_use]
    pub fn new(config: &DedupConfig, clock: Arc<dyn Clock>) -> Self {
        let window = config.window();
        let ttl = window.checked_mul(2).unwrap_or(MAX_TTL).clamp(MIN_TTL, MAX_TTL);
        Self {
            seen: Cache::builder()
                .max_capacity(config.max_entries)
                .time_to_live(ttl)
                .build(),
            window: chrono::Duration::from_std(window)
                .unwrap_or_else(|_| chrono::Duration::milliseconds(i64::MAX)),
            prefix_bytes: config.prefix_bytes,
            clock,
        }
    }

    /// Key a payload is deduplicated under
    #[inline]
    #[must_use]
    pub fn key_for(&self, payload: &Value) -> DedupKey {
        DedupKey::from_payload(payload, self.prefix_bytes)
    }

    /// Decide whether a payload should be forwarded
    pub fn should_forward(&self, payload: &Value) -> bool {
        self.should_forward_key(self.key_for(payload))
    }

    /// Decide whether a key should be forwarded, recording it if so
    pub fn should_forward_key(&self, key: DedupKey) -> bool {
        let now = self.clock.now();
        let window = self.window;
        let result = self.seen.entry(key).and_compute_with(|existing| match existing {
            Some(entry) if now - *entry.value() < window => Op::Nop,
            _ => Op::Put(now),
        });
        matches!(result, CompResult::Inserted(_) | CompResult::ReplacedWith(_))
    }

    /// Forget every key
    pub fn clear(&self) {
        self.seen.invalidate_all();
        self.seen.run_pending_tasks();
    }

    /// Number of remembered keys
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.seen.run_pending_tasks();
        self.seen.entry_count()
    }

    /// Suppression window
    #[inline]
    #[must_use]
    pub fn window(&self) -> chrono::Duration {
        self.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::TimeZone;
    use serde_json::json;

    fn setup() -> (Deduplicator, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        ));
        let dedup = Deduplicator::new(&DedupConfig::default(), clock.clone());
        (dedup, clock)
    }

    #[test]
    fn repeat_within_window_is_suppressed() {
        let (dedup, clock) = setup();
        let payload = json!({"data": {"elements": [1, 2, 3]}});
        assert!(dedup.should_forward(&payload));
        clock.advance_ms(499);
        assert!(!dedup.should_forward(&payload));
    }

    #[test]
    fn repeat_after_window_is_forwarded() {
        let (dedup, clock) = setup();
        let payload = json!({"included": []});
        assert!(dedup.should_forward(&payload));
        clock.advance_ms(500);
        assert!(dedup.should_forward(&payload));
        clock.advance_ms(100);
        assert!(!dedup.should_forward(&payload));
    }

    #[test]
    fn suppressed_repeat_does_not_extend_window() {
        let (dedup, clock) = setup();
        let payload = json!({"a": 1});
        assert!(dedup.should_forward(&payload));
        clock.advance_ms(400);
        assert!(!dedup.should_forward(&payload));
        clock.advance_ms(200);
        assert!(dedup.should_forward(&payload));
    }

    #[test]
    fn distinct_payloads_are_independent() {
        let (dedup, _clock) = setup();
        assert!(dedup.should_forward(&json!({"a": 1})));
        assert!(dedup.should_forward(&json!({"a": 2})));
        assert_eq!(dedup.entry_count(), 2);
    }

    #[test]
    fn oversized_window_is_capped() {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        ));
        let config = DedupConfig {
            window_ms: u64::MAX,
            ..DedupConfig::default()
        };
        let dedup = Deduplicator::new(&config, clock.clone());
        let payload = json!({"elements": [7]});
        assert!(dedup.should_forward(&payload));
        clock.advance_ms(60_000);
        assert!(!dedup.should_forward(&payload));
    }

    #[test]
    fn clear_forgets_keys() {
        let (dedup, _clock) = setup();
        let payload = json!({"a": 1});
        assert!(dedup.should_forward(&payload));
        dedup.clear();
        assert!(dedup.should_forward(&payload));
    }

    #[test]
    fn concurrent_observers_forward_once() {
        let (dedup, _clock) = setup();
        let key = dedup.key_for(&json!({"shared": true}));
        let forwarded: usize = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| usize::from(dedup.should_forward_key(key))))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });
        assert_eq!(forwarded, 1);
    }
}
