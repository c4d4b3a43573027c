//! Configuration files feeding a pipeline

use graphtap_model::{Category, HookOrigin, MatchedBy};
use graphtap_pipeline::{ConfigError, Pipeline, PipelineConfig};
use graphtap_test_utils::{exchange, feed_payload};
use std::io::Write;

const CUSTOM: &str = r#"
forward_excluded = false

[dedup]
window_ms = 250

[classifier]
identifier_params = ["queryId"]
exclusions = ["/internal/probe"]

[[classifier.identifiers]]
pattern = "voyagerCareersDash"
category = "jobs"

[[classifier.fragments]]
pattern = "/feed/"
category = "feed"
"#;

#[test]
fn load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(CUSTOM.as_bytes()).unwrap();

    let config = PipelineConfig::load(file.path()).unwrap();
    assert_eq!(config.dedup.window_ms, 250);
    assert_eq!(config.correlation.retention_ms, 10_000);
    assert_eq!(config.classifier.exclusions, vec!["/internal/probe".to_string()]);
}

#[test]
fn custom_tables_drive_classification() {
    let config = PipelineConfig::from_toml_str(CUSTOM).unwrap();
    let pipeline = Pipeline::new(config).unwrap();

    let jobs = pipeline.process(exchange(
        HookOrigin::PrimaryCall,
        Some("https://www.linkedin.com/voyager/api/graphql?queryId=voyagerCareersDashJobCards.77aa"),
        serde_json::json!({"data": {}}),
    ));
    assert_eq!(jobs.event().unwrap().category(), Category::Jobs);

    let probe = pipeline.process(exchange(
        HookOrigin::PrimaryCall,
        Some("https://www.linkedin.com/internal/probe/feed/"),
        feed_payload(),
    ));
    assert!(!probe.is_forwarded());

    let feed = pipeline.process(exchange(
        HookOrigin::PrimaryCall,
        Some("https://www.linkedin.com/voyager/api/feed/updates"),
        feed_payload(),
    ));
    assert_eq!(feed.event().unwrap().matched_by(), MatchedBy::AddressHeuristic);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = PipelineConfig::load(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn default_config_survives_a_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graphtap.toml");
    std::fs::write(&path, PipelineConfig::default().to_toml_string().unwrap()).unwrap();
    assert_eq!(PipelineConfig::load(&path).unwrap(), PipelineConfig::default());
}

#[test]
fn non_domain_table_category_is_rejected() {
    let raw = r#"
[[classifier.fragments]]
pattern = "/x/"
category = "unclassified"
"#;
    assert!(matches!(
        PipelineConfig::from_toml_str(raw),
        Err(ConfigError::Tables(_))
    ));
}
