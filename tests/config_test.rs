use schedforge::config::{Config, PenaltyWeights, SearchParams};
use schedforge::error::SchedError;
use schedforge::optimizer::OptimizationOptions;
use std::fs;

fn write_config(body: &str) -> (tempfile::TempDir, String) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("config.json");
    fs::write(&path, body).unwrap();
    let path = path.to_str().unwrap().to_string();
    (dir, path)
}

#[test]
fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.search.initial_pop, 10);
    assert_eq!(config.search.max_pop, 10);
    assert_eq!(config.search.num_remove, 1);
    assert_eq!(config.search.frontier_cap, 28_000);
    assert_eq!(config.weights.w_pref, 1);
    assert_eq!(config.weights.pen_section, 1);
}

#[test]
fn test_partial_file_keeps_defaults() {
    let (_dir, path) = write_config(
        r#"{
            "search": { "max_generations": 250, "stable_threshold": 5 },
            "weights": { "pen_not_paired": 12 }
        }"#,
    );
    let config = Config::load_from_file(&path).unwrap();

    assert_eq!(config.search.max_generations, 250);
    assert_eq!(config.search.stable_threshold, 5);
    assert_eq!(config.search.max_pop, SearchParams::default().max_pop);
    assert_eq!(config.weights.pen_not_paired, 12);
    assert_eq!(config.weights.w_pair, PenaltyWeights::default().w_pair);
}

#[test]
fn test_empty_object_is_all_defaults() {
    let (_dir, path) = write_config("{}");
    let config = Config::load_from_file(&path).unwrap();
    assert_eq!(config.search.frontier_cap, 28_000);
    assert_eq!(config.weights.pen_course_min, 1);
}

#[test]
fn test_missing_file_is_io_error() {
    let err = Config::load_from_file("/definitely/not/here.json").unwrap_err();
    assert!(matches!(err, SchedError::Io(_)), "got {:?}", err);
}

#[test]
fn test_bad_json_is_parse_error() {
    let (_dir, path) = write_config(r#"{ "search": { "max_pop": "many" } }"#);
    let err = Config::load_from_file(&path).unwrap_err();
    assert!(matches!(err, SchedError::Json(_)), "got {:?}", err);
}

#[test]
fn test_options_follow_config() {
    let mut config = Config::default();
    config.search.max_generations = 77;
    config.search.selection_retries = 3;
    let options = OptimizationOptions::from(&config);
    assert_eq!(options.max_generations, 77);
    assert_eq!(options.selection_retries, 3);
    assert!(options.max_time.is_none());
}
