//! Script-facing API surface.
//!
//! Binding layers expose these operations to scripts under stable names
//! (`GetName`, `IsRunning`, `IsActive`, `Wait`, `Reset`, `Kill`). Threads
//! are addressed by [`ThreadId`]; a handle whose thread has been swept
//! from the registry is reported as invalid.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::{Lifecycle, ScriptThread, ThreadError, ThreadId, ThreadMode, ThreadRegistry};

/// Point-in-time view of a thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadSnapshot {
    /// Thread handle.
    pub id: ThreadId,
    /// Thread name.
    pub name: String,
    /// Execution strategy.
    pub mode: ThreadMode,
    /// Lifecycle state.
    pub lifecycle: Lifecycle,
    /// Pending wait duration.
    pub wait_ticks: u64,
    /// Next due time, once observed by the scheduler.
    pub next_run: Option<u64>,
}

impl From<&ScriptThread> for ThreadSnapshot {
    fn from(thread: &ScriptThread) -> Self {
        Self {
            id: thread.id(),
            name: thread.name().to_string(),
            mode: thread.mode(),
            lifecycle: thread.lifecycle(),
            wait_ticks: thread.wait_ticks(),
            next_run: thread.next_run(),
        }
    }
}

/// Handle-based operations over a [`ThreadRegistry`].
#[derive(Clone)]
pub struct ScriptApi {
    registry: Arc<ThreadRegistry>,
}

impl ScriptApi {
    /// Wrap a registry.
    #[must_use]
    pub fn new(registry: Arc<ThreadRegistry>) -> Self {
        Self { registry }
    }

    fn thread(&self, id: ThreadId) -> Result<Arc<ScriptThread>, ThreadError> {
        self.registry.get(id).ok_or(ThreadError::InvalidThread)
    }

    /// Create and register a thread.
    pub fn create(&self, name: impl Into<String>) -> ThreadId {
        self.registry.create(name)
    }

    /// Name of the thread.
    ///
    /// # Errors
    ///
    /// [`ThreadError::InvalidThread`] for a stale handle.
    pub fn get_name(&self, id: ThreadId) -> Result<String, ThreadError> {
        Ok(self.thread(id)?.name().to_string())
    }

    /// Active and not idle. False for stale handles.
    #[must_use]
    pub fn is_running(&self, id: ThreadId) -> bool {
        self.registry.get(id).is_some_and(|t| t.is_running())
    }

    /// Not dead. False for stale handles.
    #[must_use]
    pub fn is_active(&self, id: ThreadId) -> bool {
        self.registry.get(id).is_some_and(|t| t.is_active())
    }

    /// Request a wait from inside the thread's own callback.
    ///
    /// # Errors
    ///
    /// See [`ScriptThread::wait`]; stale handles are
    /// [`ThreadError::InvalidThread`].
    pub fn wait(&self, id: ThreadId, ticks: u64) -> Result<(), ThreadError> {
        self.thread(id)?.wait(ticks)
    }

    /// Request a reset.
    ///
    /// # Errors
    ///
    /// [`ThreadError::InvalidThread`] for a stale handle.
    pub fn reset(&self, id: ThreadId) -> Result<(), ThreadError> {
        self.thread(id)?.reset();
        Ok(())
    }

    /// Kill the thread.
    ///
    /// # Errors
    ///
    /// [`ThreadError::InvalidThread`] for a stale handle.
    pub fn kill(&self, id: ThreadId) -> Result<(), ThreadError> {
        self.thread(id)?.kill();
        Ok(())
    }

    /// Currently pending wait duration.
    #[must_use]
    pub fn wait_ticks(&self, id: ThreadId) -> Option<u64> {
        self.registry.get(id).map(|t| t.wait_ticks())
    }

    /// Snapshot of the thread's state.
    #[must_use]
    pub fn snapshot(&self, id: ThreadId) -> Option<ThreadSnapshot> {
        self.registry.get(id).map(|t| ThreadSnapshot::from(t.as_ref()))
    }

    /// Snapshots of every registered thread in registration order.
    #[must_use]
    pub fn list(&self) -> Vec<ThreadSnapshot> {
        self.registry
            .snapshot()
            .iter()
            .map(|t| ThreadSnapshot::from(t.as_ref()))
            .collect()
    }
}
