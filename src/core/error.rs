//! Error types for script threads and scheduler construction.

use thiserror::Error;

/// Errors raised by script-thread operations and callback invocations.
///
/// Callback engines return this from
/// [`CallbackEngine::invoke`](crate::core::CallbackEngine::invoke);
/// scripts receive it from [`ScriptThread::wait`](crate::core::ScriptThread::wait)
/// and propagate it with `?` so a pending reset unwinds the callback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ThreadError {
    /// A reset was requested while the callback was running. Not a failure.
    #[error("script thread reset")]
    ControlledReset,
    /// Script-level fault with the engine's message.
    #[error("callback error: {0}")]
    Callback(String),
    /// Operation attempted on a dead, never-started or unknown thread.
    #[error("wait called on an invalid thread")]
    InvalidThread,
    /// `wait` called while the thread is not inside one of its own callbacks.
    #[error("wait called outside of the thread's own callback")]
    OutsideCallback,
    /// Any failure the engine could not classify (including panics).
    #[error("unknown fault: {0}")]
    Unknown(String),
}

/// Errors produced while constructing a scheduler.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Configuration failed validation.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    /// Environment variable could not be parsed.
    #[error("environment error: {0}")]
    Env(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
