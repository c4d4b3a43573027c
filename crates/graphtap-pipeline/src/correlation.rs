//! URL correlation tracker
//!
//! Hooks that only see a decoded value (generic deserializer, worker
//! messages) cannot tell which request produced it. The tracker remembers
//! recently completed request addresses, fed by the host's passive
//! resource-timing facility, so the pipeline can attach the freshest
//! relevant one.
//!
//! Eviction is lazy: expired records are dropped on the next write. There
//! is no background timer.

use chrono::{DateTime, Utc};
use graphtap_classify::Classifier;
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::trace;

use crate::config::CorrelationConfig;

/// One resource-timing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingEntry {
    /// Request address
    pub name: String,
    /// What issued the request (`fetch`, `xmlhttprequest`, `img`, ...)
    pub initiator_type: String,
    /// When the response finished
    pub response_end: DateTime<Utc>,
}

impl TimingEntry {
    /// Create new entry
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        initiator_type: impl Into<String>,
        response_end: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            initiator_type: initiator_type.into(),
            response_end,
        }
    }
}

/// Recently observed addresses, most recent last
#[derive(Debug)]
pub struct CorrelationTracker {
    config: CorrelationConfig,
    retention: chrono::Duration,
    classifier: Arc<Classifier>,
    records: Mutex<IndexMap<String, DateTime<Utc>>>,
}

impl CorrelationTracker {
    /// Create tracker
    #[must_use]
    pub fn new(config: CorrelationConfig, classifier: Arc<Classifier>) -> Self {
        let retention = chrono::Duration::from_std(config.retention())
            .unwrap_or_else(|_| chrono::Duration::milliseconds(i64::MAX));
        Self {
            config,
            retention,
            classifier,
            records: Mutex::new(IndexMap::new()),
        }
    }

    /// Feed one timing entry
    ///
    /// Returns `false` when the initiator type is not tracked.
    pub fn observe(&self, entry: &TimingEntry) -> bool {
        if !self.config.accepts_initiator(&entry.initiator_type) {
            trace!(initiator = %entry.initiator_type, "timing entry ignored");
            return false;
        }
        self.record(&entry.name, entry.response_end);
        true
    }

    /// Remember an address observed at `at`
    pub fn record(&self, address: &str, at: DateTime<Utc>) {
        let mut records = self.records.lock();
        if let Some(horizon) = at.checked_sub_signed(self.retention) {
            records.retain(|_, seen| *seen >= horizon);
        }

        records.shift_remove(address);
        records.insert(address.to_string(), at);

        while records.len() > self.config.max_entries {
            records.shift_remove_index(0);
        }
    }

    /// Freshest address within the retention window that passes the
    /// classifier's relevance filter
    ///
    /// Records observed after `now` are ignored. `None` means the address
    /// is unknown.
    #[must_use]
    pub fn most_recent_relevant_address(&self, now: DateTime<Utc>) -> Option<String> {
        let records = self.records.lock();
        let horizon = now.checked_sub_signed(self.retention);
        records
            .iter()
            .rev()
            .filter(|(_, seen)| **seen <= now && horizon.map_or(true, |h| **seen >= h))
            .filter(|(address, _)| self.classifier.is_relevant_address(address))
            .max_by_key(|(_, seen)| **seen)
            .map(|(address, _)| address.clone())
    }

    /// Number of remembered addresses
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Check if nothing is remembered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Forget everything
    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const MESSAGING: &str = "https://www.linkedin.com/voyager/api/messaging/conversations?q=syncToken";
    const FEED: &str = "https://www.linkedin.com/voyager/api/feed/updates?q=chronFeed";

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn ms(n: i64) -> chrono::Duration {
        chrono::Duration::milliseconds(n)
    }

    fn tracker(max_entries: usize) -> CorrelationTracker {
        let config = CorrelationConfig {
            max_entries,
            ..CorrelationConfig::default()
        };
        CorrelationTracker::new(config, Arc::new(Classifier::builtin()))
    }

    #[test]
    fn freshest_relevant_wins() {
        let tracker = tracker(16);
        tracker.record(FEED, t0());
        tracker.record(MESSAGING, t0() + ms(100));
        tracker.record("https://static.licdn.com/sc/h/app.js", t0() + ms(200));
        assert_eq!(tracker.most_recent_relevant_address(t0() + ms(300)).as_deref(), Some(MESSAGING));
    }

    #[test]
    fn expired_records_are_not_returned() {
        let tracker = tracker(16);
        tracker.record(MESSAGING, t0());
        assert_eq!(tracker.most_recent_relevant_address(t0() + ms(10_001)), None);
        assert!(tracker.most_recent_relevant_address(t0() + ms(9_999)).is_some());
    }

    #[test]
    fn future_records_are_ignored() {
        let tracker = tracker(16);
        tracker.record(MESSAGING, t0() + ms(500));
        assert_eq!(tracker.most_recent_relevant_address(t0()), None);
    }

    #[test]
    fn eviction_is_lazy_on_write() {
        let tracker = tracker(16);
        tracker.record(FEED, t0());
        tracker.record(MESSAGING, t0() + ms(20_000));
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn bounded_by_max_entries() {
        let tracker = tracker(2);
        tracker.record("/voyager/api/a", t0());
        tracker.record("/voyager/api/b", t0() + ms(1));
        tracker.record("/voyager/api/c", t0() + ms(2));
        assert_eq!(tracker.len(), 2);
        assert_eq!(
            tracker.most_recent_relevant_address(t0() + ms(3)).as_deref(),
            Some("/voyager/api/c")
        );
    }

    #[test]
    fn rerecording_refreshes() {
        let tracker = tracker(16);
        tracker.record(MESSAGING, t0());
        tracker.record(FEED, t0() + ms(10));
        tracker.record(MESSAGING, t0() + ms(20));
        assert_eq!(tracker.len(), 2);
        assert_eq!(tracker.most_recent_relevant_address(t0() + ms(30)).as_deref(), Some(MESSAGING));
    }

    #[test]
    fn unbounded_retention_keeps_everything() {
        let config = CorrelationConfig {
            retention_ms: u64::MAX,
            ..CorrelationConfig::default()
        };
        let tracker = CorrelationTracker::new(config, Arc::new(Classifier::builtin()));
        tracker.record(MESSAGING, t0());
        tracker.record(FEED, t0() + ms(20_000));
        assert_eq!(tracker.len(), 2);
        assert!(tracker.observe(&TimingEntry::new(MESSAGING, "fetch", t0() + ms(30_000))));
        assert_eq!(tracker.most_recent_relevant_address(t0() + ms(40_000)).as_deref(), Some(MESSAGING));
    }

    #[test]
    fn observe_filters_initiators() {
        let tracker = tracker(16);
        assert!(!tracker.observe(&TimingEntry::new(MESSAGING, "img", t0())));
        assert!(tracker.is_empty());
        assert!(tracker.observe(&TimingEntry::new(MESSAGING, "fetch", t0())));
        tracker.clear();
        assert!(tracker.is_empty());
    }
}
