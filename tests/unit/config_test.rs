//! Tests for configuration validation

use prometheus_script_threads::config::SchedulerConfig;

#[test]
fn test_default_config_is_valid() {
    let config = SchedulerConfig::default();
    assert_eq!(config.idle_poll_ticks, 5);
    assert_eq!(config.fault_log_capacity, 256);
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_invalid_idle_poll_ticks() {
    let invalid = SchedulerConfig {
        idle_poll_ticks: 0,
        ..SchedulerConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_config_invalid_fault_log_capacity() {
    let invalid = SchedulerConfig {
        fault_log_capacity: 0,
        ..SchedulerConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_config_from_json_fills_defaults() {
    let config = SchedulerConfig::from_json_str(r#"{ "idle_poll_ticks": 9 }"#).expect("valid json");
    assert_eq!(config.idle_poll_ticks, 9);
    assert_eq!(config.fault_log_capacity, 256);
}

#[test]
fn test_config_from_json_rejects_invalid() {
    let err = SchedulerConfig::from_json_str(r#"{ "fault_log_capacity": 0 }"#).unwrap_err();
    assert!(err.contains("fault_log_capacity"));

    let err = SchedulerConfig::from_json_str("not json").unwrap_err();
    assert!(err.starts_with("parse error"));
}
