//! Tests for host clocks and the script API

use std::sync::Arc;

use prometheus_script_threads::core::{Lifecycle, ThreadError, ThreadMode, ThreadRegistry};
use prometheus_script_threads::runtime::{HostClock, ManualClock, ScriptApi};

#[test]
fn test_manual_clock_set_and_advance() {
    let clock = ManualClock::new(10);
    clock.advance(5);
    assert_eq!(clock.now(), 15);
    clock.set(3);
    assert_eq!(clock.now(), 3);
    assert_eq!(clock.yields(), 0);
}

#[test]
fn test_api_lists_threads_in_registration_order() {
    let api = ScriptApi::new(Arc::new(ThreadRegistry::new()));
    let first = api.create("first");
    let second = api.create("second");

    let names: Vec<_> = api.list().into_iter().map(|s| s.name).collect();
    assert_eq!(names, vec!["first", "second"]);

    api.kill(first).expect("live handle");
    let listed = api.list();
    assert_eq!(listed[0].lifecycle, Lifecycle::Dead);
    assert_eq!(listed[1].id, second);
    assert_eq!(listed[1].mode, ThreadMode::HostDriven);
}

#[test]
fn test_api_reset_marks_thread() {
    let api = ScriptApi::new(Arc::new(ThreadRegistry::new()));
    let id = api.create("t");
    api.reset(id).expect("live handle");
    assert!(api.is_active(id));
    assert!(!api.is_running(id));
    assert_eq!(
        api.snapshot(id).map(|s| s.lifecycle),
        Some(Lifecycle::Resetting)
    );
    assert_eq!(api.wait(id, 3), Err(ThreadError::OutsideCallback));
}
