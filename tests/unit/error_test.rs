//! Tests for error types

use prometheus_script_threads::core::{AppResult, SchedulerError, ThreadError};

#[test]
fn test_controlled_reset_error() {
    let err = ThreadError::ControlledReset;
    assert_eq!(format!("{}", err), "script thread reset");
}

#[test]
fn test_callback_error() {
    let err = ThreadError::Callback("attempt to index a nil value".to_string());
    assert_eq!(format!("{}", err), "callback error: attempt to index a nil value");
}

#[test]
fn test_invalid_thread_error() {
    let err = ThreadError::InvalidThread;
    assert_eq!(format!("{}", err), "wait called on an invalid thread");
}

#[test]
fn test_outside_callback_error() {
    let err = ThreadError::OutsideCallback;
    assert_eq!(
        format!("{}", err),
        "wait called outside of the thread's own callback"
    );
}

#[test]
fn test_unknown_error() {
    let err = ThreadError::Unknown("stack overflow".to_string());
    assert_eq!(format!("{}", err), "unknown fault: stack overflow");
}

#[test]
fn test_scheduler_errors() {
    let err = SchedulerError::InvalidConfig("idle_poll_ticks must be greater than 0".to_string());
    assert_eq!(
        format!("{}", err),
        "invalid config: idle_poll_ticks must be greater than 0"
    );
    let err = SchedulerError::Env("X=y: invalid digit".to_string());
    assert_eq!(format!("{}", err), "environment error: X=y: invalid digit");
}

#[test]
fn test_app_result_wraps_scheduler_error() {
    fn load() -> AppResult<()> {
        Err(SchedulerError::Env("bad".to_string()).into())
    }
    let err = load().unwrap_err();
    assert!(err.downcast_ref::<SchedulerError>().is_some());
}
