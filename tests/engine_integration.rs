//! Integration tests for the local engine
//!
//! Runs realistic pipelines end to end and checks normalise idempotence.

mod common;

use common::output_lines;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use streamlab_rs::config::EngineConfig;
use streamlab_rs::engine::stream_config::{self, ProcessorConfig};
use streamlab_rs::engine::{ComponentKind, ComputeEngine, EngineError, LocalEngine};
use streamlab_rs::session::{LogStyle, OutputLog};

async fn compiled(config: &str) -> LocalEngine {
    let engine = LocalEngine::load(EngineConfig::default()).await.unwrap();
    engine.compile(config, &OutputLog::new()).await.unwrap();
    engine
}

#[tokio::test]
async fn test_script_split_archive_pipeline() {
    let engine = compiled(
        r##"
pipeline:
  processors:
    - type: script
      source: 'if content.starts_with("#") { () } else { content + "!" }'
    - type: archive
      separator: "|"
    - type: split
"##,
    )
    .await;

    let log = OutputLog::new();
    let report = engine.execute("a\n# skip\nb\n\nc", &log).await.unwrap();

    assert_eq!(report.batches, 2);
    assert_eq!(output_lines(&log), vec!["a!|b!", "", "c!", ""]);
}

#[tokio::test]
async fn test_cache_round_trip_across_batches() {
    let engine = compiled(
        r#"
pipeline:
  processors:
    - type: cache
      resource: seen
      operator: set
      key: last
    - type: cache
      resource: seen
      operator: get
      key: last
resources:
  caches:
    seen:
      type: lru
      cap: 4
"#,
    )
    .await;

    let log = OutputLog::new();
    engine.execute("one\n\ntwo", &log).await.unwrap();
    assert_eq!(output_lines(&log), vec!["one", "", "two", ""]);
}

#[tokio::test]
async fn test_cache_with_maximum_ttl_executes() {
    let engine = compiled(
        r#"
pipeline:
  processors:
    - type: cache
      resource: forever
      operator: set
    - type: cache
      resource: forever
      operator: get
resources:
  caches:
    forever:
      type: memory
      ttl_secs: 18446744073709551615
"#,
    )
    .await;

    let log = OutputLog::new();
    let report = engine.execute("hello", &log).await.unwrap();
    assert_eq!(report.failed_batches, 0);
    assert_eq!(output_lines(&log), vec!["hello", ""]);
}

#[tokio::test]
async fn test_missing_resource_fails_compile() {
    let engine = LocalEngine::load(EngineConfig::default()).await.unwrap();
    let err = engine
        .compile(
            "pipeline:\n  processors:\n    - type: rate_limit\n      resource: nope\n",
            &OutputLog::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
    assert!(!engine.is_loaded());
}

#[tokio::test]
async fn test_runaway_script_is_stopped() {
    let engine = compiled(
        "pipeline:\n  processors:\n    - type: script\n      source: 'loop { }'\n",
    )
    .await;

    let log = OutputLog::new();
    let report = engine.execute("x", &log).await.unwrap();
    assert_eq!(report.failed_batches, 1);
    assert_eq!(log.count(LogStyle::Error), 1);
}

#[tokio::test]
async fn test_empty_input_produces_nothing() {
    let engine = compiled("pipeline: {}").await;
    let log = OutputLog::new();
    let report = engine.execute("\n\n", &log).await.unwrap();
    assert_eq!(report.batches, 0);
    assert!(log.is_empty());
}

#[tokio::test]
async fn test_insert_then_compile() {
    let engine = LocalEngine::load(EngineConfig::default()).await.unwrap();
    let mut config = "pipeline: {}".to_string();
    for name in engine.list_components(ComponentKind::Processor) {
        if name == "cache" || name == "rate_limit" {
            continue;
        }
        config = engine
            .insert_component(ComponentKind::Processor, &name, &config)
            .unwrap()
            .unwrap();
    }
    engine.compile(&config, &OutputLog::new()).await.unwrap();
    assert!(engine.is_loaded());
}

fn processor_strategy() -> impl Strategy<Value = ProcessorConfig> {
    prop_oneof![
        Just(ProcessorConfig::Noop {}),
        Just(ProcessorConfig::Split {}),
        "[a-z ]{0,8}".prop_map(|separator| ProcessorConfig::Archive { separator }),
        "[a-z+ \"]{0,12}".prop_map(|source| ProcessorConfig::Script { source }),
        "[a-z]{0,6}".prop_map(|check| ProcessorConfig::Filter { check }),
    ]
}

proptest! {
    #[test]
    fn prop_normalise_is_idempotent(processors in prop::collection::vec(processor_strategy(), 0..6)) {
        let mut config = stream_config::StreamConfig::default();
        config.pipeline.processors = processors;
        let text = config.to_yaml().unwrap();

        let once = stream_config::normalise(&text).unwrap();
        let twice = stream_config::normalise(&once).unwrap();
        prop_assert_eq!(&once, &twice);
        prop_assert_eq!(stream_config::StreamConfig::parse(&once).unwrap(), config);
    }

    #[test]
    fn prop_insertion_labels_are_unique(count in 1usize..20) {
        let mut config = stream_config::StreamConfig::default();
        for _ in 0..count {
            config.insert(ComponentKind::Cache, "memory").unwrap();
        }
        prop_assert_eq!(config.resources.caches.len(), count);
        prop_assert!(config.resources.caches.contains_key("example"));
    }
}
