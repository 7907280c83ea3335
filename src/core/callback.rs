//! Callback engine seam.
//!
//! The scripting runtime is opaque to the scheduler: it only asks the engine
//! to run a named callback in a thread's context, or whether such a
//! callback exists.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::core::{ScriptThread, ThreadError};

/// Setup callback, run on first dispatch and after every reset.
pub const SETUP_CALLBACK: &str = "SetupCoroutine";
/// Per-activation body.
pub const TICK_CALLBACK: &str = "Tick";
/// Optional handler, run when `Tick` failed with an error.
pub const ERROR_CALLBACK: &str = "OnError";

/// Abstraction over the embedded scripting runtime.
///
/// # Example
///
/// ```rust,ignore
/// struct Lua { /* ... */ }
///
/// impl CallbackEngine for Lua {
///     fn invoke(&self, thread: &ScriptThread, callback: &str) -> Result<(), ThreadError> {
///         self.call_method(thread.name(), callback)
///             .map_err(|e| ThreadError::Callback(e.to_string()))
///     }
///
///     fn has_callback(&self, thread: &ScriptThread, callback: &str) -> bool {
///         self.lookup(thread.name(), callback).is_some()
///     }
/// }
/// ```
pub trait CallbackEngine: Send + Sync {
    /// Run `callback` in the context of `thread`.
    ///
    /// A callback that calls [`ScriptThread::wait`] while a reset is pending
    /// receives [`ThreadError::ControlledReset`] and should return it as-is.
    ///
    /// # Errors
    ///
    /// Returns the script fault, or the reset signal, raised by the callback.
    fn invoke(&self, thread: &ScriptThread, callback: &str) -> Result<(), ThreadError>;

    /// Whether `thread` defines `callback`. Must not run script code.
    fn has_callback(&self, thread: &ScriptThread, callback: &str) -> bool;
}

/// Tri-state outcome of a single callback invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackResult {
    /// The callback returned normally.
    NormalExit,
    /// The callback was unwound by a pending reset.
    ControlledReset,
    /// The callback failed; the message has already been reported.
    Error(String),
}

impl CallbackResult {
    /// Boolean projection used by the run loop: a controlled reset counts as
    /// a normal exit, so `OnError` never fires after one.
    #[must_use]
    pub const fn is_normal_exit(&self) -> bool {
        matches!(self, Self::NormalExit | Self::ControlledReset)
    }

    /// True for [`CallbackResult::Error`].
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// Boxed script callback stored in a [`CallbackTable`].
pub type CallbackFn = Arc<dyn Fn(&ScriptThread) -> Result<(), ThreadError> + Send + Sync>;

/// In-process engine that maps (thread name, callback name) to closures.
///
/// Useful for native script threads and for tests. The table lock is
/// released before a callback runs, so callbacks may freely register,
/// reset or kill other threads.
#[derive(Default)]
pub struct CallbackTable {
    entries: RwLock<HashMap<String, HashMap<String, CallbackFn>>>,
}

impl CallbackTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Define or replace `callback` for threads named `thread`.
    pub fn register<F>(&self, thread: impl Into<String>, callback: impl Into<String>, f: F)
    where
        F: Fn(&ScriptThread) -> Result<(), ThreadError> + Send + Sync + 'static,
    {
        self.entries
            .write()
            .entry(thread.into())
            .or_default()
            .insert(callback.into(), Arc::new(f));
    }

    /// Remove `callback` for `thread`. Returns true if it was defined.
    pub fn unregister(&self, thread: &str, callback: &str) -> bool {
        let mut entries = self.entries.write();
        let Some(callbacks) = entries.get_mut(thread) else {
            return false;
        };
        let removed = callbacks.remove(callback).is_some();
        if callbacks.is_empty() {
            entries.remove(thread);
        }
        removed
    }

    fn lookup(&self, thread: &str, callback: &str) -> Option<CallbackFn> {
        self.entries
            .read()
            .get(thread)
            .and_then(|callbacks| callbacks.get(callback))
            .cloned()
    }
}

impl CallbackEngine for CallbackTable {
    fn invoke(&self, thread: &ScriptThread, callback: &str) -> Result<(), ThreadError> {
        let Some(f) = self.lookup(thread.name(), callback) else {
            return Err(ThreadError::Callback(format!(
                "attempt to call a nil callback '{callback}'"
            )));
        };
        f(thread)
    }

    fn has_callback(&self, thread: &ScriptThread, callback: &str) -> bool {
        self.lookup(thread.name(), callback).is_some()
    }
}
