//! End-to-end pipeline scenarios on a hand-driven clock

use chrono::Duration;
use graphtap_model::{Category, Entity, HookOrigin, MatchedBy};
use graphtap_pipeline::{
    Clock, ManualClock, Pipeline, PipelineConfig, PipelineOutcome, PipelineStats, TimingEntry,
};
use graphtap_test_utils::{
    exchange, feed_payload, fixed_time, messaging_payload, minimal_feed_payload, FEED_ADDRESS,
    MESSAGING_ADDRESS, MESSAGING_REST_ADDRESS, TELEMETRY_ADDRESS,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;
use std::sync::Arc;

fn pipeline_with(config: PipelineConfig) -> (Pipeline, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(fixed_time()));
    let pipeline = Pipeline::with_clock(config, clock.clone()).unwrap();
    (pipeline, clock)
}

fn pipeline() -> (Pipeline, Arc<ManualClock>) {
    pipeline_with(PipelineConfig::default())
}

#[test]
fn feed_identifier_yields_one_post() {
    let (pipeline, _clock) = pipeline();
    let mut sub = pipeline.subscribe();

    let outcome = pipeline.process(exchange(
        HookOrigin::PrimaryCall,
        Some(FEED_ADDRESS),
        minimal_feed_payload(),
    ));

    let event = outcome.event().unwrap();
    assert_eq!(event.category(), Category::Feed);
    assert_eq!(event.matched_by(), MatchedBy::Identifier);
    assert_eq!(event.origin_address.as_deref(), Some(FEED_ADDRESS));
    assert_eq!(event.count_kind("post"), 1);
    let Entity::Post(post) = &event.entities[0] else { panic!("expected post") };
    assert!(post.author_name.as_deref().is_some_and(|n| !n.is_empty()));
    assert!(post.text.as_deref().is_some_and(|t| !t.is_empty()));

    assert_eq!(sub.try_recv().unwrap().key, event.key);
}

#[test]
fn telemetry_address_is_excluded_despite_feed_shape() {
    let (pipeline, _clock) = pipeline();
    let mut sub = pipeline.subscribe();

    let outcome = pipeline.process(exchange(
        HookOrigin::PrimaryCall,
        Some(TELEMETRY_ADDRESS),
        feed_payload(),
    ));

    let PipelineOutcome::Excluded(classification) = outcome else {
        panic!("expected exclusion, got {outcome:?}");
    };
    assert_eq!(classification.category, Category::Excluded);
    assert_eq!(classification.matched_by, MatchedBy::Exclusion);
    assert!(sub.try_recv().is_none());
    assert_eq!(pipeline.stats().excluded, 1);
}

#[test]
fn forward_excluded_publishes_with_excluded_category() {
    let (pipeline, _clock) = pipeline_with(PipelineConfig::default().with_forward_excluded(true));
    let outcome = pipeline.process(exchange(
        HookOrigin::PrimaryCall,
        Some(TELEMETRY_ADDRESS),
        feed_payload(),
    ));
    let event = outcome.event().unwrap();
    assert_eq!(event.category(), Category::Excluded);
    assert!(event.entities.is_empty());
}

#[test]
fn two_decode_hooks_within_window_forward_once() {
    let (pipeline, clock) = pipeline();
    let mut sub = pipeline.subscribe();

    let first = pipeline.process(exchange(HookOrigin::DecodeJson, Some(FEED_ADDRESS), feed_payload()));
    clock.advance_ms(120);
    let mut second = exchange(HookOrigin::DecodeText, Some(FEED_ADDRESS), feed_payload());
    second.observed_at = clock.now();
    let second = pipeline.process(second);

    assert!(first.is_forwarded());
    assert!(matches!(second, PipelineOutcome::Duplicate(_)));
    assert!(sub.try_recv().is_some());
    assert!(sub.try_recv().is_none());
    assert_eq!(pipeline.stats().duplicates, 1);
}

#[test]
fn same_payload_after_window_is_forwarded_again() {
    let (pipeline, clock) = pipeline();
    assert!(pipeline
        .process(exchange(HookOrigin::DecodeJson, Some(FEED_ADDRESS), feed_payload()))
        .is_forwarded());
    clock.advance_ms(600);
    assert!(pipeline
        .process(exchange(HookOrigin::DecodeJson, Some(FEED_ADDRESS), feed_payload()))
        .is_forwarded());
}

#[test]
fn deserialize_without_address_is_correlated() {
    let (pipeline, _clock) = pipeline();
    assert!(pipeline.observe_timing(&TimingEntry::new(MESSAGING_ADDRESS, "fetch", fixed_time())));

    let mut captured = exchange(HookOrigin::GenericDeserialize, None, messaging_payload());
    captured.observed_at = fixed_time() + Duration::milliseconds(150);
    let outcome = pipeline.process(captured);

    let event = outcome.event().unwrap();
    assert_eq!(event.origin_address.as_deref(), Some(MESSAGING_ADDRESS));
    assert!(event.address_correlated);
    assert_eq!(event.category(), Category::Messaging);
    assert_eq!(pipeline.stats().correlated, 1);
}

#[test]
fn correlated_address_classifies_by_path_fragment() {
    let (pipeline, _clock) = pipeline();
    pipeline.observe_timing(&TimingEntry::new(FEED_ADDRESS, "fetch", fixed_time()));
    pipeline.observe_timing(&TimingEntry::new(
        MESSAGING_REST_ADDRESS,
        "xmlhttprequest",
        fixed_time() + Duration::milliseconds(40),
    ));

    let mut captured = exchange(HookOrigin::GenericDeserialize, None, messaging_payload());
    captured.observed_at = fixed_time() + Duration::milliseconds(150);
    let event = pipeline.process(captured).event().cloned().unwrap();

    assert_eq!(event.origin_address.as_deref(), Some(MESSAGING_REST_ADDRESS));
    assert!(event.address_correlated);
    assert_eq!(event.category(), Category::Messaging);
    assert_eq!(event.matched_by(), MatchedBy::AddressHeuristic);
}

#[test]
fn stale_timing_entry_falls_back_to_shape() {
    let (pipeline, _clock) = pipeline();
    pipeline.observe_timing(&TimingEntry::new(MESSAGING_ADDRESS, "fetch", fixed_time()));

    let mut captured = exchange(HookOrigin::GenericDeserialize, None, messaging_payload());
    captured.observed_at = fixed_time() + Duration::seconds(30);
    let event = pipeline.process(captured).event().cloned().unwrap();

    assert_eq!(event.origin_address, None);
    assert!(!event.address_correlated);
    assert_eq!(event.category(), Category::Messaging);
    assert_eq!(event.matched_by(), MatchedBy::ShapeHeuristic);
}

#[test]
fn stats_track_every_decision() {
    let (pipeline, _clock) = pipeline();
    pipeline.process(exchange(HookOrigin::PrimaryCall, Some(FEED_ADDRESS), minimal_feed_payload()));
    pipeline.process(exchange(HookOrigin::DecodeJson, Some(FEED_ADDRESS), minimal_feed_payload()));
    pipeline.process(exchange(HookOrigin::PrimaryCall, Some(TELEMETRY_ADDRESS), feed_payload()));
    pipeline.process(exchange(HookOrigin::DecodeJson, None, json!({"settings": {}})));

    assert_eq!(
        pipeline.stats(),
        PipelineStats {
            captured: 4,
            forwarded: 2,
            duplicates: 1,
            excluded: 1,
            unclassified: 1,
            correlated: 0,
            entities: 1,
        }
    );
}

proptest! {
    #[test]
    fn identical_payloads_forward_once_per_window(gaps in proptest::collection::vec(0u64..200, 1..6)) {
        let (pipeline, clock) = pipeline();
        let payload = json!({"data": {"elements": [1, 2, 3]}});
        prop_assert!(pipeline
            .process(exchange(HookOrigin::DecodeJson, None, payload.clone()))
            .is_forwarded());

        let mut elapsed = 0;
        for gap in gaps {
            elapsed += gap;
            if elapsed >= 500 {
                break;
            }
            clock.advance_ms(gap);
            let outcome = pipeline.process(exchange(HookOrigin::DecodeJson, None, payload.clone()));
            prop_assert!(matches!(outcome, PipelineOutcome::Duplicate(_)));
        }
        prop_assert_eq!(pipeline.stats().forwarded, 1);
    }
}
