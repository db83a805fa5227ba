//! Unit tests for configuration module
//!
//! Tests configuration parsing, validation, serialization/deserialization,
//! and edge cases in configuration handling.

use super::*;
use anyhow::Result;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_default_configuration_is_valid() {
    let config = FramescopeConfig::default();

    assert!(config.validate().is_ok());
    assert_eq!(config.sampler.target_fps, 60.0);
    assert_eq!(config.sampler.buffer_capacity, 300);
    assert_eq!(config.sampler.jank_event_capacity, 50);
    assert_eq!(config.sampler.sample_every_n, 1);

    // Weights of the overall improvement score sum to 100
    let w = &config.regression.weights;
    let total = w.fps
        + w.time_to_interactive
        + w.mount_time
        + w.dropped_frames
        + w.jank_score
        + w.memory
        + w.render_passes
        + w.touch_response;
    assert_eq!(total, 100.0);
}

#[test]
fn test_configuration_serialization_roundtrip() -> Result<()> {
    let original_config = FramescopeConfig::default();

    let toml_string = toml::to_string(&original_config)?;
    let deserialized_config: FramescopeConfig = toml::from_str(&toml_string)?;

    assert_eq!(original_config, deserialized_config);
    Ok(())
}

#[test]
fn test_configuration_from_file() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("framescope.toml");

    let test_config = r#"
[sampler]
target_fps = 120.0
buffer_capacity = 600
jank_event_capacity = 20
rolling_window_ms = 500.0
sample_every_n = 4

[thresholds]
drop_multiplier = 2.0
jank_multiplier = 4.0
severe_multiplier = 8.0

[export]
default_format = "csv"
filename_prefix = "modal-bench"
"#;

    fs::write(&file_path, test_config)?;

    let config = FramescopeConfig::load(&file_path)?;

    assert_eq!(config.sampler.target_fps, 120.0);
    assert_eq!(config.sampler.buffer_capacity, 600);
    assert_eq!(config.sampler.sample_every_n, 4);
    assert_eq!(config.thresholds.jank_multiplier, 4.0);
    assert_eq!(config.export.default_format, "csv");

    // Sections not in the file keep their defaults
    assert_eq!(config.scoring, ScoringConfig::default());
    assert_eq!(config.regression, RegressionConfig::default());

    Ok(())
}

#[test]
fn test_optional_sampler_fields_default() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("partial.toml");

    fs::write(
        &file_path,
        r#"
[sampler]
target_fps = 90.0
buffer_capacity = 100
jank_event_capacity = 10
"#,
    )?;

    let config = FramescopeConfig::load(&file_path)?;
    assert_eq!(config.sampler.rolling_window_ms, 1000.0);
    assert_eq!(config.sampler.sample_every_n, 1);

    Ok(())
}

#[test]
fn test_save_and_reload() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("saved.toml");

    let mut config = FramescopeConfig::default();
    config.regression.significance_percent = 10.0;
    config.export.default_format = "json".to_string();
    config.save(&file_path)?;

    let reloaded = FramescopeConfig::load(&file_path)?;
    assert_eq!(reloaded, config);

    Ok(())
}

#[test]
fn test_malformed_toml_handling() {
    let dir = tempdir().unwrap();
    let file_path = dir.path().join("malformed_config.toml");

    let malformed_config = r#"
[sampler
target_fps = 60.0
missing_bracket

[thresholds]
drop_multiplier = "not a number"
"#;

    fs::write(&file_path, malformed_config).unwrap();

    let result = FramescopeConfig::load(&file_path);
    assert!(result.is_err());
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = tempdir().unwrap();
    let result = FramescopeConfig::load(dir.path().join("absent.toml"));
    assert!(result.is_err());
}

#[test]
fn test_configuration_validation() {
    let config = FramescopeConfig::default();
    assert!(config.validate().is_ok());

    let mut invalid_config = config.clone();
    invalid_config.sampler.target_fps = 0.0;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.sampler.buffer_capacity = 0;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.sampler.sample_every_n = 0;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.export.default_format = "xml".to_string();
    assert!(invalid_config.validate().is_err());
}

#[test]
fn test_threshold_ordering_is_enforced() {
    let mut config = FramescopeConfig::default();

    config.thresholds.jank_multiplier = config.thresholds.drop_multiplier;
    assert!(config.validate().is_err());

    config.thresholds = ThresholdConfig::default();
    config.thresholds.severe_multiplier = 2.0;
    assert!(config.validate().is_err());

    config.thresholds = ThresholdConfig::default();
    config.thresholds.drop_multiplier = 1.0;
    assert!(config.validate().is_err());
}

#[test]
fn test_scoring_and_regression_validation() {
    let mut config = FramescopeConfig::default();
    config.scoring.fps_weight = 60.0;
    assert!(config.validate().is_err());

    let mut config = FramescopeConfig::default();
    config.scoring.jank_weight = -1.0;
    assert!(config.validate().is_err());

    let mut config = FramescopeConfig::default();
    config.regression.significance_percent = 0.5;
    assert!(config.validate().is_err());
}

#[test]
fn test_partial_configuration_merge() {
    let base = FramescopeConfig::default();

    let mut partial = FramescopeConfig::default();
    partial.export.filename_prefix = "nightly".to_string();

    let merged = base.merge_partial(partial);
    assert_eq!(merged.export.filename_prefix, "nightly");
    assert_eq!(merged.sampler, SamplerConfig::default());
}
