//! Fault sink implementations.
//!
//! Callback failures never propagate past the invocation boundary; they are
//! logged and recorded here instead.

use std::collections::VecDeque;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::util::clock::now_ms;

/// Classification of a recorded fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    /// The script reported an error.
    Callback,
    /// The engine failed in a way it could not classify.
    Unknown,
}

/// A single callback failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaultEvent {
    /// Event identifier.
    pub event_id: String,
    /// Name of the failing thread.
    pub thread: String,
    /// Callback that failed (`Tick`, `SetupCoroutine`, ...).
    pub callback: String,
    /// Fault classification.
    pub kind: FaultKind,
    /// Message reported by the engine.
    pub message: String,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
}

/// Fault sink abstraction.
pub trait FaultSink: Send + Sync {
    /// Record a fault event.
    fn record(&self, event: FaultEvent);
}

/// In-memory fault sink with a bounded buffer.
pub struct InMemoryFaultSink {
    events: Mutex<VecDeque<FaultEvent>>,
    max_events: usize,
}

impl InMemoryFaultSink {
    /// Create a new in-memory sink holding at most `max_events` entries.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(max_events.min(1024))),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<FaultEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Number of stored events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// True when no fault has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl FaultSink for InMemoryFaultSink {
    fn record(&self, event: FaultEvent) {
        if self.max_events == 0 {
            return;
        }
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event);
    }
}

/// Helper to build a fault event stamped with a fresh id and the wall clock.
pub fn build_fault_event(
    thread: impl Into<String>,
    callback: impl Into<String>,
    kind: FaultKind,
    message: impl Into<String>,
) -> FaultEvent {
    FaultEvent {
        event_id: uuid::Uuid::new_v4().to_string(),
        thread: thread.into(),
        callback: callback.into(),
        kind,
        message: message.into(),
        created_at_ms: now_ms(),
    }
}
