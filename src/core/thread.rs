//! Script thread lifecycle and execution strategies.
//!
//! A [`ScriptThread`] is a logical, cooperatively scheduled unit of script
//! execution. It never runs on an OS thread of its own: either the
//! scheduler drives it one tick at a time ([`ThreadMode::HostDriven`]), or
//! it owns a run loop that suspends through the host clock
//! ([`ThreadMode::Standalone`]).
//!
//! The state lock is never held while a callback runs, so callbacks may call
//! back into their own thread (`wait`, `reset`, `kill`) or into siblings.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::core::callback::{
    CallbackEngine, CallbackResult, ERROR_CALLBACK, SETUP_CALLBACK, TICK_CALLBACK,
};
use crate::core::fault::{build_fault_event, FaultKind, FaultSink};
use crate::core::{ThreadError, ThreadId};
use crate::runtime::clock::HostClock;

/// Wait duration restored after every resumption.
pub const DEFAULT_WAIT_TICKS: u64 = 1;
/// Poll interval of [`ScriptThread::run_idle`].
pub const DEFAULT_IDLE_POLL_TICKS: u64 = 5;

/// Who owns the suspend loop of a thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadMode {
    /// Owns its run loop and yields to the host between ticks.
    Standalone,
    /// Runs exactly one tick per scheduler dispatch.
    HostDriven,
    /// The host-tick entry point that drives the scheduler itself.
    PrimaryDriver,
}

impl ThreadMode {
    /// True when the thread completes within one scheduler tick.
    #[must_use]
    pub const fn runs_on_primary(self) -> bool {
        matches!(self, Self::HostDriven)
    }

    /// True for the scheduler's own driver thread.
    #[must_use]
    pub const fn is_primary_driver(self) -> bool {
        matches!(self, Self::PrimaryDriver)
    }

    const fn owns_run_loop(self) -> bool {
        matches!(self, Self::Standalone)
    }
}

/// Why an idle thread is parked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdleReason {
    /// Parked until its next run time.
    Waiting,
    /// Stopped after a fault; only a reset revives it.
    Stopped,
}

/// Lifecycle state. Exactly one holds at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    /// Created but never dispatched.
    Created,
    /// Eligible to run.
    Active,
    /// Alive but not due for invocation.
    Idle(IdleReason),
    /// Setup must re-run on the next dispatch opportunity.
    Resetting,
    /// Killed; never dispatched again.
    Dead,
}

/// How a call to [`ScriptThread::run`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// A host-driven tick exited normally.
    Completed,
    /// `Tick` failed and no `OnError` handler is defined.
    Faulted,
    /// `Tick` failed and `OnError` was invoked.
    Recovered,
    /// The loop ended because a reset is pending.
    ResetPending,
    /// The thread was killed.
    Quit,
    /// `SetupCoroutine` failed.
    SetupFailed,
}

impl RunOutcome {
    /// Idle state the caller should move the thread into, if any.
    #[must_use]
    pub const fn idle_reason(self) -> Option<IdleReason> {
        match self {
            Self::Completed => Some(IdleReason::Waiting),
            Self::Faulted | Self::Recovered | Self::SetupFailed => Some(IdleReason::Stopped),
            Self::ResetPending | Self::Quit => None,
        }
    }
}

/// Collaborators a thread needs to execute.
#[derive(Clone)]
pub struct ThreadEnv {
    engine: Arc<dyn CallbackEngine>,
    clock: Arc<dyn HostClock>,
    faults: Option<Arc<dyn FaultSink>>,
    idle_poll_ticks: u64,
}

impl ThreadEnv {
    /// Create an environment without a fault sink.
    pub fn new(engine: Arc<dyn CallbackEngine>, clock: Arc<dyn HostClock>) -> Self {
        Self {
            engine,
            clock,
            faults: None,
            idle_poll_ticks: DEFAULT_IDLE_POLL_TICKS,
        }
    }

    /// Attach a fault sink.
    #[must_use]
    pub fn with_fault_sink(mut self, sink: Arc<dyn FaultSink>) -> Self {
        self.faults = Some(sink);
        self
    }

    /// Override the idle poll interval.
    #[must_use]
    pub fn with_idle_poll_ticks(mut self, ticks: u64) -> Self {
        self.idle_poll_ticks = ticks;
        self
    }

    /// The callback engine.
    #[must_use]
    pub fn engine(&self) -> &dyn CallbackEngine {
        self.engine.as_ref()
    }

    /// The host clock.
    #[must_use]
    pub fn clock(&self) -> &dyn HostClock {
        self.clock.as_ref()
    }

    /// The fault sink, if one is attached.
    #[must_use]
    pub fn fault_sink(&self) -> Option<&dyn FaultSink> {
        self.faults.as_deref()
    }

    /// Ticks between reset checks while idle.
    #[must_use]
    pub const fn idle_poll_ticks(&self) -> u64 {
        self.idle_poll_ticks
    }
}

#[derive(Debug)]
struct ThreadState {
    lifecycle: Lifecycle,
    wait_ticks: u64,
    next_run: Option<u64>,
    callback_depth: u32,
}

/// One schedulable unit of script execution.
#[derive(Debug)]
pub struct ScriptThread {
    id: ThreadId,
    name: String,
    mode: ThreadMode,
    state: Mutex<ThreadState>,
}

impl ScriptThread {
    fn with_mode(id: ThreadId, name: String, mode: ThreadMode) -> Self {
        Self {
            id,
            name,
            mode,
            state: Mutex::new(ThreadState {
                lifecycle: Lifecycle::Created,
                wait_ticks: DEFAULT_WAIT_TICKS,
                next_run: None,
                callback_depth: 0,
            }),
        }
    }

    /// A thread that owns its own run loop (see [`ScriptThread::start`]).
    pub fn standalone(name: impl Into<String>) -> Self {
        Self::with_mode(ThreadId::default(), name.into(), ThreadMode::Standalone)
    }

    /// The host-tick entry point passed to
    /// [`ThreadScheduler::drive`](crate::core::ThreadScheduler::drive).
    pub fn primary_driver(name: impl Into<String>) -> Self {
        Self::with_mode(ThreadId::default(), name.into(), ThreadMode::PrimaryDriver)
    }

    pub(crate) fn host_driven(id: ThreadId, name: String) -> Self {
        Self::with_mode(id, name, ThreadMode::HostDriven)
    }

    /// Registry handle; the null key for threads outside a registry.
    #[must_use]
    pub const fn id(&self) -> ThreadId {
        self.id
    }

    /// Thread name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Execution strategy.
    #[must_use]
    pub const fn mode(&self) -> ThreadMode {
        self.mode
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        self.state.lock().lifecycle
    }

    /// Pending wait duration.
    #[must_use]
    pub fn wait_ticks(&self) -> u64 {
        self.state.lock().wait_ticks
    }

    /// Next host time at which the thread is due, once observed.
    #[must_use]
    pub fn next_run(&self) -> Option<u64> {
        self.state.lock().next_run
    }

    /// Active and not idle.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.lifecycle() == Lifecycle::Active
    }

    /// Not dead.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.lifecycle() != Lifecycle::Dead
    }

    /// Reset requested and not yet handled.
    #[must_use]
    pub fn is_resetting(&self) -> bool {
        self.lifecycle() == Lifecycle::Resetting
    }

    /// Request `ticks` of delay before the next resumption.
    ///
    /// Only valid from inside one of this thread's own callbacks.
    ///
    /// # Errors
    ///
    /// [`ThreadError::ControlledReset`] if a reset is pending; the callback
    /// should propagate it so the invocation unwinds.
    /// [`ThreadError::InvalidThread`] if the thread is not active, and
    /// [`ThreadError::OutsideCallback`] if no callback of this thread is
    /// running. Failures leave the thread untouched.
    pub fn wait(&self, ticks: u64) -> Result<(), ThreadError> {
        let mut state = self.state.lock();
        if !matches!(state.lifecycle, Lifecycle::Active | Lifecycle::Resetting) {
            return Err(ThreadError::InvalidThread);
        }
        if state.callback_depth == 0 {
            return Err(ThreadError::OutsideCallback);
        }
        if state.lifecycle == Lifecycle::Resetting {
            return Err(ThreadError::ControlledReset);
        }
        state.wait_ticks = ticks;
        Ok(())
    }

    /// Mark the thread for reset. Applied on the next dispatch opportunity.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        if matches!(state.lifecycle, Lifecycle::Dead | Lifecycle::Resetting) {
            return;
        }
        state.lifecycle = Lifecycle::Resetting;
        drop(state);
        debug!(thread = %self.name, "reset requested");
    }

    /// Kill the thread. Any in-flight callback finishes its current step.
    pub fn kill(&self) {
        let mut state = self.state.lock();
        if state.lifecycle == Lifecycle::Dead {
            return;
        }
        state.lifecycle = Lifecycle::Dead;
        drop(state);
        info!(thread = %self.name, "thread killed");
    }

    /// Whether the engine defines `callback` for this thread.
    pub fn is_callback_present(&self, env: &ThreadEnv, callback: &str) -> bool {
        env.engine.has_callback(self, callback)
    }

    /// Invoke `callback`, containing any failure at this boundary.
    ///
    /// Errors are logged, reported to the fault sink and returned as
    /// [`CallbackResult::Error`]; they never propagate further.
    pub fn invoke_callback(&self, env: &ThreadEnv, callback: &str) -> CallbackResult {
        self.state.lock().callback_depth += 1;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| env.engine.invoke(self, callback)));
        self.state.lock().callback_depth -= 1;

        match outcome {
            Ok(Ok(())) => CallbackResult::NormalExit,
            Ok(Err(ThreadError::ControlledReset)) => {
                debug!(thread = %self.name, callback, "callback unwound by reset");
                CallbackResult::ControlledReset
            }
            Ok(Err(ThreadError::Callback(message))) => {
                self.report_fault(env, callback, FaultKind::Callback, message)
            }
            Ok(Err(ThreadError::Unknown(message))) => {
                self.report_fault(env, callback, FaultKind::Unknown, message)
            }
            Ok(Err(other)) => {
                self.report_fault(env, callback, FaultKind::Callback, other.to_string())
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                self.report_fault(env, callback, FaultKind::Unknown, message)
            }
        }
    }

    fn report_fault(
        &self,
        env: &ThreadEnv,
        callback: &str,
        kind: FaultKind,
        message: String,
    ) -> CallbackResult {
        error!(thread = %self.name, callback, ?kind, %message, "script thread callback failed");
        if let Some(sink) = &env.faults {
            sink.record(build_fault_event(self.name.as_str(), callback, kind, message.as_str()));
        }
        CallbackResult::Error(message)
    }

    /// Execute the thread.
    ///
    /// Stand-alone threads run `SetupCoroutine`, then loop on `Tick`,
    /// yielding `wait_ticks` to the host after each one, until the thread is
    /// killed, reset, or `Tick` fails. Host-driven threads run exactly one
    /// `Tick` and leave timing to the scheduler.
    pub fn run(&self, env: &ThreadEnv) -> RunOutcome {
        self.enter_active();

        if self.mode.owns_run_loop()
            && !self.invoke_callback(env, SETUP_CALLBACK).is_normal_exit()
        {
            warn!(thread = %self.name, "thread failed to set up its coroutine");
            return RunOutcome::SetupFailed;
        }

        let mut result = CallbackResult::NormalExit;
        while result.is_normal_exit() && self.is_running() {
            result = self.invoke_callback(env, TICK_CALLBACK);
            if !self.mode.owns_run_loop() {
                break;
            }
            env.clock.yield_to_host(self.take_wait_ticks());
        }

        if !self.is_active() {
            debug!(thread = %self.name, "thread quit during run");
            return RunOutcome::Quit;
        }

        if result.is_error() {
            if self.is_callback_present(env, ERROR_CALLBACK) {
                self.invoke_callback(env, ERROR_CALLBACK);
                return RunOutcome::Recovered;
            }
            return RunOutcome::Faulted;
        }

        if self.is_resetting() {
            RunOutcome::ResetPending
        } else {
            RunOutcome::Completed
        }
    }

    /// Park a stand-alone thread until it is reset or killed.
    ///
    /// Polls every `idle_poll_ticks` without calling any script callback. A
    /// pending reset is consumed and the thread returns to `Active`.
    pub fn run_idle(&self, env: &ThreadEnv) {
        {
            let mut state = self.state.lock();
            if state.lifecycle == Lifecycle::Active {
                state.lifecycle = Lifecycle::Idle(IdleReason::Stopped);
            }
        }

        loop {
            {
                let mut state = self.state.lock();
                match state.lifecycle {
                    Lifecycle::Idle(_) => {}
                    Lifecycle::Resetting => {
                        state.lifecycle = Lifecycle::Active;
                        drop(state);
                        info!(thread = %self.name, "thread reset");
                        return;
                    }
                    Lifecycle::Created | Lifecycle::Active | Lifecycle::Dead => return,
                }
            }
            env.clock.yield_to_host(env.idle_poll_ticks);
        }
    }

    /// Run a stand-alone thread until it is killed: `run`, then idle until
    /// reset, then `run` again.
    pub fn start(&self, env: &ThreadEnv) {
        if !self.mode.owns_run_loop() {
            warn!(
                thread = %self.name,
                mode = ?self.mode,
                "only stand-alone threads own a run loop"
            );
            return;
        }
        if !self.activate() {
            return;
        }

        info!(thread = %self.name, "thread started");
        while self.is_active() {
            let outcome = self.run(env);
            debug!(thread = %self.name, ?outcome, "run finished");
            if self.is_active() {
                self.run_idle(env);
            }
        }
        info!(thread = %self.name, "thread quit");
    }

    /// `Created` becomes `Active`. Returns false for dead threads.
    pub(crate) fn activate(&self) -> bool {
        let mut state = self.state.lock();
        match state.lifecycle {
            Lifecycle::Dead => false,
            Lifecycle::Created => {
                state.lifecycle = Lifecycle::Active;
                true
            }
            _ => true,
        }
    }

    fn enter_active(&self) {
        let mut state = self.state.lock();
        if matches!(state.lifecycle, Lifecycle::Created | Lifecycle::Idle(_)) {
            state.lifecycle = Lifecycle::Active;
        }
    }

    fn take_wait_ticks(&self) -> u64 {
        std::mem::replace(&mut self.state.lock().wait_ticks, DEFAULT_WAIT_TICKS)
    }

    /// Start-of-dispatch check. Returns true when setup must run, either
    /// because the thread is fresh or because a reset is pending.
    ///
    /// A pending reset is consumed here, before setup runs, so a reset
    /// requested by the setup callback itself stays pending for the next
    /// pass.
    pub(crate) fn observe(&self, now: u64) -> bool {
        let mut state = self.state.lock();
        if state.lifecycle == Lifecycle::Dead {
            return false;
        }
        let fresh = state.next_run.is_none();
        if fresh {
            state.next_run = Some(now);
        }
        let pending_reset = state.lifecycle == Lifecycle::Resetting;
        if fresh || pending_reset {
            if matches!(state.lifecycle, Lifecycle::Created | Lifecycle::Resetting) {
                state.lifecycle = Lifecycle::Active;
            }
            return true;
        }
        false
    }

    /// Setup ran: the thread is due immediately. A reset or kill raised
    /// while setup ran is left in place.
    pub(crate) fn finish_setup(&self, now: u64) {
        let mut state = self.state.lock();
        if state.lifecycle == Lifecycle::Dead {
            return;
        }
        state.next_run = Some(now);
    }

    /// Whether a tick should run at `now`. Wakes threads parked on a timer.
    pub(crate) fn is_due(&self, now: u64) -> bool {
        let mut state = self.state.lock();
        let due = state.next_run.is_some_and(|next| now >= next);
        match state.lifecycle {
            Lifecycle::Active => due,
            Lifecycle::Idle(IdleReason::Waiting) if due => {
                state.lifecycle = Lifecycle::Active;
                true
            }
            _ => false,
        }
    }

    /// Apply a host-driven tick's outcome and schedule the next run.
    pub(crate) fn settle(&self, outcome: RunOutcome, now: u64) {
        let mut state = self.state.lock();
        if let Some(reason) = outcome.idle_reason() {
            if state.lifecycle == Lifecycle::Active {
                state.lifecycle = Lifecycle::Idle(reason);
            }
        }
        state.next_run = Some(now.saturating_add(state.wait_ticks));
        state.wait_ticks = DEFAULT_WAIT_TICKS;
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown exception thrown".to_string()
    }
}
