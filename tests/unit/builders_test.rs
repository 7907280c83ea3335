//! Tests for builder modules

use std::sync::Arc;

use prometheus_script_threads::builders::SchedulerBuilder;
use prometheus_script_threads::config::SchedulerConfig;
use prometheus_script_threads::core::{
    CallbackTable, FaultKind, InMemoryFaultSink, SchedulerError, ThreadError, ThreadRegistry,
    TICK_CALLBACK,
};
use prometheus_script_threads::runtime::ManualClock;

fn builder() -> SchedulerBuilder {
    SchedulerBuilder::new(Arc::new(CallbackTable::new()), Arc::new(ManualClock::new(0)))
}

#[test]
fn test_builder_defaults() {
    let builder = builder();
    assert_eq!(builder.config(), &SchedulerConfig::default());
    let scheduler = builder.build().expect("default config");
    assert_eq!(scheduler.env().idle_poll_ticks(), 5);
    assert!(scheduler.registry().is_empty());
}

#[test]
fn test_builder_applies_config() {
    let config = SchedulerConfig {
        idle_poll_ticks: 11,
        ..SchedulerConfig::default()
    };
    let scheduler = builder().with_config(config).build().expect("valid config");
    assert_eq!(scheduler.env().idle_poll_ticks(), 11);
}

#[test]
fn test_builder_rejects_invalid_config() {
    let config = SchedulerConfig {
        idle_poll_ticks: 0,
        ..SchedulerConfig::default()
    };
    let result = builder().with_config(config).build();
    assert!(matches!(result, Err(SchedulerError::InvalidConfig(_))));
}

#[test]
fn test_builder_shares_registry() {
    let registry = Arc::new(ThreadRegistry::new());
    let id = registry.create("shared");
    let scheduler = builder()
        .with_registry(Arc::clone(&registry))
        .build()
        .expect("default config");
    assert_eq!(scheduler.api().get_name(id).as_deref(), Ok("shared"));
}

fn failing_table() -> Arc<CallbackTable> {
    let table = Arc::new(CallbackTable::new());
    table.register("flaky", TICK_CALLBACK, |t| {
        t.reset();
        Err(ThreadError::Callback("tick failed".to_string()))
    });
    table
}

#[test]
fn test_default_fault_log_records_faults() {
    let scheduler = SchedulerBuilder::new(failing_table(), Arc::new(ManualClock::new(0)))
        .build()
        .expect("default config");
    scheduler.create("flaky");
    scheduler.tick();

    let log = scheduler.fault_log().expect("default sink is kept");
    let events = log.events();
    let tick_faults: Vec<_> = events.iter().filter(|e| e.callback == TICK_CALLBACK).collect();
    assert_eq!(tick_faults.len(), 1);
    assert_eq!(tick_faults[0].thread, "flaky");
    assert_eq!(tick_faults[0].kind, FaultKind::Callback);
    assert_eq!(tick_faults[0].message, "tick failed");
    assert!(scheduler.env().fault_sink().is_some());
}

#[test]
fn test_default_fault_log_uses_configured_capacity() {
    let config = SchedulerConfig {
        fault_log_capacity: 2,
        ..SchedulerConfig::default()
    };
    let scheduler = SchedulerBuilder::new(failing_table(), Arc::new(ManualClock::new(0)))
        .with_config(config)
        .build()
        .expect("valid config");
    scheduler.create("flaky");

    for _ in 0..4 {
        scheduler.tick();
    }

    assert_eq!(scheduler.fault_log().expect("default sink").len(), 2);
}

#[test]
fn test_custom_sink_replaces_default_log() {
    let sink = Arc::new(InMemoryFaultSink::new(8));
    let scheduler = SchedulerBuilder::new(failing_table(), Arc::new(ManualClock::new(0)))
        .with_fault_sink(sink.clone())
        .build()
        .expect("default config");
    scheduler.create("flaky");
    scheduler.tick();

    assert!(scheduler.fault_log().is_none());
    assert!(!sink.is_empty());
}
