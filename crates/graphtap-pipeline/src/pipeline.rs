//! Pipeline context
//!
//! Owns every piece of shared state (correlation tracker, dedup cache,
//! event bus) for one capture session. Each exchange runs correlate,
//! classify, dedup, resolve and publish synchronously; nothing in that
//! path awaits or fails.

use graphtap_classify::Classifier;
use graphtap_model::{CapturedExchange, Category, Classification, DedupKey, ForwardedEvent};
use graphtap_resolve::EntityResolver;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::bus::{EventBus, Subscription};
use crate::clock::{Clock, SystemClock};
use crate::config::PipelineConfig;
use crate::correlation::{CorrelationTracker, TimingEntry};
use crate::dedup::Deduplicator;
use crate::error::PipelineError;
use crate::intercept::{CaptureSink, HostHooks, Interceptor, Observation};

/// What happened to one exchange
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    /// Published to subscribers
    Forwarded(Arc<ForwardedEvent>),
    /// Administrative traffic, dropped
    Excluded(Classification),
    /// Same payload seen within the dedup window
    Duplicate(DedupKey),
}

impl PipelineOutcome {
    /// Forwarded event, if any
    #[must_use]
    pub fn event(&self) -> Option<&Arc<ForwardedEvent>> {
        match self {
            PipelineOutcome::Forwarded(event) => Some(event),
            _ => None,
        }
    }

    /// Check if forwarded
    #[inline]
    #[must_use]
    pub fn is_forwarded(&self) -> bool {
        matches!(self, PipelineOutcome::Forwarded(_))
    }
}

/// Pipeline counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    /// Exchanges received
    pub captured: u64,
    /// Events published
    pub forwarded: u64,
    /// Suppressed by dedup
    pub duplicates: u64,
    /// Dropped as administrative traffic
    pub excluded: u64,
    /// Forwarded without a category
    pub unclassified: u64,
    /// Addresses recovered by correlation
    pub correlated: u64,
    /// Entities resolved across forwarded events
    pub entities: u64,
}

/// Capture pipeline for one session
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    classifier: Arc<Classifier>,
    tracker: CorrelationTracker,
    dedup: Deduplicator,
    resolver: EntityResolver,
    bus: EventBus,
    stats: Mutex<PipelineStats>,
    clock: Arc<dyn Clock>,
}

impl Pipeline {
    /// Create pipeline on the wall clock
    ///
    /// # Errors
    /// Returns `PipelineError::Config` if the configuration is invalid
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create pipeline reading time from `clock`
    ///
    /// # Errors
    /// Returns `PipelineError::Config` if the configuration is invalid
    pub fn with_clock(config: PipelineConfig, clock: Arc<dyn Clock>) -> Result<Self, PipelineError> {
        config.validate()?;
        let classifier = Arc::new(
            Classifier::new(config.classifier.clone()).map_err(crate::error::ConfigError::from)?,
        );
        Ok(Self {
            tracker: CorrelationTracker::new(config.correlation.clone(), Arc::clone(&classifier)),
            dedup: Deduplicator::new(&config.dedup, Arc::clone(&clock)),
            resolver: EntityResolver::new(),
            bus: EventBus::new(config.event_capacity),
            stats: Mutex::new(PipelineStats::default()),
            classifier,
            config,
            clock,
        })
    }

    /// Run one exchange through the pipeline
    pub fn process(&self, exchange: CapturedExchange) -> PipelineOutcome {
        self.bump(|s| s.captured += 1);

        let (origin_address, address_correlated) = match exchange.source_address {
            Some(address) => (Some(address), false),
            None => {
                let found = self.tracker.most_recent_relevant_address(exchange.observed_at);
                match &found {
                    Some(address) => {
                        debug!(origin = %exchange.origin, address = %address, "correlation hit");
                        self.bump(|s| s.correlated += 1);
                    }
                    None => debug!(origin = %exchange.origin, "correlation miss"),
                }
                let correlated = found.is_some();
                (found, correlated)
            }
        };

        let classification = self
            .classifier
            .classify(origin_address.as_deref(), &exchange.payload);
        debug!(
            origin = %exchange.origin,
            category = %classification.category,
            matched_by = %classification.matched_by,
            "classified"
        );

        if classification.is_excluded() && !self.config.forward_excluded {
            self.bump(|s| s.excluded += 1);
            return PipelineOutcome::Excluded(classification);
        }

        let key = self.dedup.key_for(&exchange.payload);
        if !self.dedup.should_forward_key(key) {
            debug!(origin = %exchange.origin, key = %key.short(), "duplicate suppressed");
            self.bump(|s| s.duplicates += 1);
            return PipelineOutcome::Duplicate(key);
        }

        let entities = self.resolver.resolve(classification.category, &exchange.payload);
        let event = Arc::new(ForwardedEvent {
            classification,
            origin_address,
            address_correlated,
            hook_origin: exchange.origin,
            method: exchange.method,
            observed_at: exchange.observed_at,
            key,
            entities,
            raw_payload: exchange.payload,
        });

        let entity_count = event.entities.len() as u64;
        let unclassified = event.category() == Category::Unclassified;
        self.bump(|s| {
            s.forwarded += 1;
            s.entities += entity_count;
            if unclassified {
                s.unclassified += 1;
            }
        });
        let receivers = self.bus.publish(Arc::clone(&event));
        debug!(
            category = %event.category(),
            key = %key.short(),
            entities = entity_count,
            receivers,
            "forwarded"
        );
        PipelineOutcome::Forwarded(event)
    }

    /// Feed one resource-timing entry to the correlation tracker
    pub fn observe_timing(&self, entry: &TimingEntry) -> bool {
        self.tracker.observe(entry)
    }

    /// Apply one observation
    pub fn apply(&self, observation: Observation) -> Option<PipelineOutcome> {
        match observation {
            Observation::Exchange(exchange) => Some(self.process(exchange)),
            Observation::Timing(entry) => {
                self.observe_timing(&entry);
                None
            }
        }
    }

    /// Subscribe to forwarded events
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        self.bus.subscribe()
    }

    /// Counters so far
    #[must_use]
    pub fn stats(&self) -> PipelineStats {
        *self.stats.lock()
    }

    /// Forget remembered addresses and dedup keys
    pub fn clear_caches(&self) {
        self.tracker.clear();
        self.dedup.clear();
    }

    /// Clear caches and counters
    pub fn reset(&self) {
        self.clear_caches();
        *self.stats.lock() = PipelineStats::default();
    }

    /// Configuration in effect
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Classifier in effect
    #[must_use]
    pub fn classifier(&self) -> &Arc<Classifier> {
        &self.classifier
    }

    /// Correlation tracker
    #[must_use]
    pub fn tracker(&self) -> &CorrelationTracker {
        &self.tracker
    }

    /// Pipeline clock
    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    fn bump(&self, f: impl FnOnce(&mut PipelineStats)) {
        f(&mut self.stats.lock());
    }

    /// Spawn the processing loop
    ///
    /// Observations are applied one at a time in arrival order. The loop
    /// ends on [`PipelineHandle::shutdown`], after which caches are cleared;
    /// counters are kept.
    #[must_use]
    pub fn start(self: Arc<Self>) -> PipelineHandle {
        let (sink, mut rx) = CaptureSink::channel(Arc::clone(&self.clock));
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let pipeline = Arc::clone(&self);

        let task = tokio::spawn(async move {
            info!("pipeline started");
            loop {
                tokio::select! {
                    observation = rx.recv() => match observation {
                        Some(observation) => {
                            pipeline.apply(observation);
                        }
                        None => break,
                    },
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            drain(&pipeline, &mut rx);
            pipeline.clear_caches();
            let stats = pipeline.stats();
            info!(
                captured = stats.captured,
                forwarded = stats.forwarded,
                duplicates = stats.duplicates,
                "pipeline stopped"
            );
        });

        PipelineHandle {
            pipeline: self,
            interceptor: Interceptor::new(sink),
            shutdown: shutdown_tx,
            task: Mutex::new(Some(task)),
            guardians: Mutex::new(Vec::new()),
        }
    }
}

fn drain(pipeline: &Pipeline, rx: &mut mpsc::UnboundedReceiver<Observation>) {
    rx.close();
    while let Ok(observation) = rx.try_recv() {
        pipeline.apply(observation);
    }
}

/// Running pipeline
#[derive(Debug)]
pub struct PipelineHandle {
    pipeline: Arc<Pipeline>,
    interceptor: Interceptor,
    shutdown: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
    guardians: Mutex<Vec<JoinHandle<()>>>,
}

impl PipelineHandle {
    /// Sink feeding the loop
    #[must_use]
    pub fn sink(&self) -> CaptureSink {
        self.interceptor.sink().clone()
    }

    /// Builder of observers feeding the loop
    #[must_use]
    pub fn interceptor(&self) -> &Interceptor {
        &self.interceptor
    }

    /// Subscribe to forwarded events
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        self.pipeline.subscribe()
    }

    /// Underlying pipeline
    #[must_use]
    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }

    /// Wrap the host's primitives and keep them wrapped
    ///
    /// Returns how many slots were wrapped now.
    pub fn install(&self, hooks: &HostHooks) -> usize {
        let wrapped = self.interceptor.install(hooks);
        let guardian = self
            .interceptor
            .guardian(hooks, self.pipeline.config().guardian_interval());
        self.guardians
            .lock()
            .push(guardian.spawn(self.shutdown.subscribe()));
        wrapped
    }

    /// Stop the loop and every guardian, then wait for them
    ///
    /// Observations already sent are processed before the loop exits.
    ///
    /// # Errors
    /// Returns `PipelineError::TaskFailed` if a task panicked
    pub async fn shutdown(&self) -> Result<(), PipelineError> {
        self.shutdown.send_replace(true);
        let guardians: Vec<_> = self.guardians.lock().drain(..).collect();
        for guardian in guardians {
            guardian
                .await
                .map_err(|e| PipelineError::TaskFailed(e.to_string()))?;
        }
        let task = self.task.lock().take();
        if let Some(task) = task {
            task.await
                .map_err(|e| PipelineError::TaskFailed(e.to_string()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{TimeZone, Utc};
    use graphtap_model::HookOrigin;
    use serde_json::json;

    fn pipeline() -> (Pipeline, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        ));
        let pipeline = Pipeline::with_clock(PipelineConfig::default(), clock.clone()).unwrap();
        (pipeline, clock)
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = PipelineConfig::default().with_event_capacity(0);
        assert!(matches!(Pipeline::new(config), Err(PipelineError::Config(_))));
    }

    #[test]
    fn unclassified_is_still_forwarded() {
        let (pipeline, clock) = pipeline();
        let exchange = CapturedExchange::new(HookOrigin::DecodeJson, json!({"ok": true}), clock.now());
        let outcome = pipeline.process(exchange);
        let event = outcome.event().unwrap();
        assert_eq!(event.category(), Category::Unclassified);
        assert!(event.entities.is_empty());
        assert!(!event.address_correlated);
        assert_eq!(pipeline.stats().unclassified, 1);
    }

    #[test]
    fn reset_clears_counters() {
        let (pipeline, clock) = pipeline();
        pipeline.process(CapturedExchange::new(HookOrigin::DecodeJson, json!({}), clock.now()));
        assert_eq!(pipeline.stats().captured, 1);
        pipeline.reset();
        assert_eq!(pipeline.stats(), PipelineStats::default());
    }

    #[test]
    fn timing_observation_produces_no_outcome() {
        let (pipeline, clock) = pipeline();
        let entry = TimingEntry::new("/voyager/api/feed", "fetch", clock.now());
        assert!(pipeline.apply(Observation::Timing(entry)).is_none());
        assert_eq!(pipeline.tracker().len(), 1);
    }
}
