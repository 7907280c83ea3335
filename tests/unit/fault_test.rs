//! Tests for fault recording

use prometheus_script_threads::core::{build_fault_event, FaultKind, FaultSink, InMemoryFaultSink};

#[test]
fn test_build_fault_event() {
    let event = build_fault_event("patrol", "Tick", FaultKind::Callback, "boom");
    assert_eq!(event.thread, "patrol");
    assert_eq!(event.callback, "Tick");
    assert_eq!(event.kind, FaultKind::Callback);
    assert_eq!(event.message, "boom");
    assert!(uuid::Uuid::parse_str(&event.event_id).is_ok());
    assert!(event.created_at_ms > 0);
}

#[test]
fn test_event_ids_are_unique() {
    let a = build_fault_event("t", "Tick", FaultKind::Unknown, "x");
    let b = build_fault_event("t", "Tick", FaultKind::Unknown, "x");
    assert_ne!(a.event_id, b.event_id);
}

#[test]
fn test_sink_keeps_most_recent_events() {
    let sink = InMemoryFaultSink::new(2);
    for message in ["first", "second", "third"] {
        sink.record(build_fault_event("t", "Tick", FaultKind::Callback, message));
    }
    let messages: Vec<_> = sink.events().into_iter().map(|e| e.message).collect();
    assert_eq!(messages, vec!["second", "third"]);
}

#[test]
fn test_fault_event_json_shape() {
    let event = build_fault_event("t", "SetupCoroutine", FaultKind::Unknown, "panic");
    let json = serde_json::to_value(&event).expect("serialize");
    assert_eq!(json["kind"], "unknown");
    assert_eq!(json["callback"], "SetupCoroutine");
}
