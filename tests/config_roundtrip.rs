//! Configuration and corpus files survive a write/read cycle.

mod common;

use std::fs;

use tempfile::TempDir;

use movewise_rs::{AlgorithmKind, EntityCorpus, MovewiseConfig, MovewiseError};

#[test]
fn yaml_round_trip_preserves_every_setting() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("movewise.yml");

    let mut config = MovewiseConfig::default();
    config.algorithms.enabled = vec![AlgorithmKind::Hac, AlgorithmKind::Rmmr];
    config.algorithms.akmeans.seed = Some(7);
    config.algorithms.hac.distance_cutoff = 0.8;
    config.performance.max_threads = Some(3);
    config.output.min_accuracy = 0.25;

    config.to_yaml_file(&path).unwrap();
    let loaded = MovewiseConfig::from_yaml_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn partial_yaml_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("partial.yml");
    fs::write(
        &path,
        "algorithms:\n  enabled: [ccda, mri]\n  ccda:\n    epsilon: 0.01\n",
    )
    .unwrap();

    let loaded = MovewiseConfig::from_yaml_file(&path).unwrap();
    let defaults = MovewiseConfig::default();
    assert_eq!(loaded.algorithms.enabled, vec![AlgorithmKind::Ccda, AlgorithmKind::Mri]);
    assert_eq!(loaded.algorithms.ccda.epsilon, 0.01);
    assert_eq!(loaded.algorithms.ccda.max_iterations, defaults.algorithms.ccda.max_iterations);
    assert_eq!(loaded.algorithms.hac, defaults.algorithms.hac);
    assert_eq!(loaded.output, defaults.output);
}

#[test]
fn invalid_values_are_rejected_on_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("invalid.yml");
    fs::write(&path, "output:\n  min_accuracy: 1.5\n").unwrap();

    let err = MovewiseConfig::from_yaml_file(&path).unwrap_err();
    assert!(matches!(err, MovewiseError::Validation { .. } | MovewiseError::Config { .. }));
}

#[test]
fn unknown_algorithm_is_a_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("unknown.yml");
    fs::write(&path, "algorithms:\n  enabled: [kmeans]\n").unwrap();

    let err = MovewiseConfig::from_yaml_file(&path).unwrap_err();
    assert!(matches!(err, MovewiseError::Serialization { .. }));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let err = MovewiseConfig::from_yaml_file(dir.path().join("absent.yml")).unwrap_err();
    assert!(matches!(err, MovewiseError::Io { .. }));
}

#[test]
fn corpus_json_round_trip() {
    let corpus = common::misplaced_method();
    let json = serde_json::to_string_pretty(&corpus).unwrap();
    let restored: EntityCorpus = serde_json::from_str(&json).unwrap();

    assert_eq!(restored.len(), corpus.len());
    assert!(restored.include_fields());
    let m = restored.get("B.m").unwrap();
    assert_eq!(m.class_name(), "B");
    assert_eq!(m.id(), corpus.get("B.m").unwrap().id());
    assert_eq!(
        restored.distance(m, restored.class("A").unwrap()),
        corpus.distance(corpus.get("B.m").unwrap(), corpus.class("A").unwrap())
    );
}

#[test]
fn corpus_json_with_duplicate_names_is_rejected() {
    let json = r#"{
        "classes": [{"name": "A", "kind": "class"}],
        "methods": [
            {"name": "A.m", "kind": "method", "class_name": "A"},
            {"name": "A.m", "kind": "method", "class_name": "A"}
        ]
    }"#;
    let err = serde_json::from_str::<EntityCorpus>(json).unwrap_err();
    assert!(err.to_string().contains("duplicate"));
}
