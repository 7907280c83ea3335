//! Thread registry.
//!
//! Threads live in a generation-checked arena so handles held by scripts go
//! stale instead of aliasing a newer thread. A separate list keeps
//! registration order, which is also dispatch order.

use std::sync::Arc;

use parking_lot::Mutex;
use slotmap::{new_key_type, SlotMap};
use tracing::debug;

use crate::core::ScriptThread;

new_key_type! {
    /// Stable, generation-checked handle to a registered thread.
    pub struct ThreadId;
}

#[derive(Default)]
struct RegistryInner {
    threads: SlotMap<ThreadId, Arc<ScriptThread>>,
    order: Vec<ThreadId>,
}

/// Authoritative collection of host-driven script threads.
///
/// Every method takes the lock briefly and never while a callback runs, so
/// callbacks may create or kill threads during a dispatch pass.
#[derive(Default)]
pub struct ThreadRegistry {
    inner: Mutex<RegistryInner>,
}

impl ThreadRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new host-driven thread and return its handle.
    ///
    /// A thread created during a dispatch pass is first seen by the next
    /// pass.
    pub fn create(&self, name: impl Into<String>) -> ThreadId {
        let name = name.into();
        let mut inner = self.inner.lock();
        let id = inner
            .threads
            .insert_with_key(|id| Arc::new(ScriptThread::host_driven(id, name.clone())));
        inner.order.push(id);
        drop(inner);
        debug!(thread = %name, ?id, "thread registered");
        id
    }

    /// Look up a thread by handle. Stale handles return `None`.
    #[must_use]
    pub fn get(&self, id: ThreadId) -> Option<Arc<ScriptThread>> {
        self.inner.lock().threads.get(id).cloned()
    }

    /// Registered threads in registration order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Arc<ScriptThread>> {
        let inner = self.inner.lock();
        inner
            .order
            .iter()
            .filter_map(|id| inner.threads.get(*id).cloned())
            .collect()
    }

    /// Drop dead threads from the arena. Their handles go stale.
    pub fn sweep(&self) -> usize {
        let mut inner = self.inner.lock();
        let RegistryInner { threads, order } = &mut *inner;
        let before = order.len();
        order.retain(|id| match threads.get(*id) {
            Some(thread) if thread.is_active() => true,
            Some(_) => {
                threads.remove(*id);
                false
            }
            None => false,
        });
        before - order.len()
    }

    /// Number of registered threads, dead ones included until swept.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().order.len()
    }

    /// True when no thread is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().order.is_empty()
    }

    /// Kill and remove every thread.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        for thread in inner.threads.values() {
            thread.kill();
        }
        inner.threads.clear();
        inner.order.clear();
    }
}

impl Drop for ThreadRegistry {
    fn drop(&mut self) {
        self.clear();
    }
}
