// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::io::Write;

#[test]
fn defaults_match_hosted_service() {
    let config = EngineConfig::default();
    assert_eq!(config.poll_interval, Duration::from_millis(100));
    assert_eq!(config.max_delay_secs(), MAX_DELAY);
}

#[test]
fn empty_document_uses_defaults() {
    let config = EngineConfig::from_toml_str("").unwrap();
    assert_eq!(config, EngineConfig::default());
}

#[test]
fn parses_humantime_durations() {
    let config = EngineConfig::from_toml_str(
        r#"
        poll_interval = "250ms"
        max_delay = "1day"
        "#,
    )
    .unwrap();
    assert_eq!(config.poll_interval, Duration::from_millis(250));
    assert_eq!(config.max_delay_secs(), 86_400);
}

#[test]
fn rejects_zero_poll_interval() {
    let err = EngineConfig::from_toml_str(r#"poll_interval = "0s""#).unwrap_err();
    assert!(matches!(err, ConfigError::ZeroPollInterval));
}

#[test]
fn rejects_malformed_duration() {
    let err = EngineConfig::from_toml_str(r#"poll_interval = "soon""#).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn loads_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, r#"poll_interval = "5ms""#).unwrap();

    let config = EngineConfig::load(file.path()).unwrap();
    assert_eq!(config.poll_interval, Duration::from_millis(5));
    assert_eq!(config.max_delay, EngineConfig::default().max_delay);
}

#[test]
fn missing_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    let err = EngineConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn huge_max_delay_saturates() {
    let config = EngineConfig::default().with_max_delay(Duration::from_secs(u64::MAX));
    assert_eq!(config.max_delay_secs(), u32::MAX);
}
