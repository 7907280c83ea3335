//! Script threads, their registry and the dispatch loop.

pub mod callback;
pub mod error;
pub mod fault;
pub mod registry;
pub mod scheduler;
pub mod thread;

pub use callback::{
    CallbackEngine, CallbackFn, CallbackResult, CallbackTable, ERROR_CALLBACK, SETUP_CALLBACK,
    TICK_CALLBACK,
};
pub use error::{AppResult, SchedulerError, ThreadError};
pub use fault::{build_fault_event, FaultEvent, FaultKind, FaultSink, InMemoryFaultSink};
pub use registry::{ThreadId, ThreadRegistry};
pub use scheduler::{PassReport, SchedulerStats, ThreadScheduler};
pub use thread::{
    IdleReason, Lifecycle, RunOutcome, ScriptThread, ThreadEnv, ThreadMode, DEFAULT_IDLE_POLL_TICKS,
    DEFAULT_WAIT_TICKS,
};
