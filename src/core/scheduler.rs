//! Host-tick dispatch loop.
//!
//! Once per host frame the scheduler walks its registry in registration
//! order:
//!
//! 1. A freshly registered thread becomes active and due immediately.
//! 2. A fresh or resetting thread runs `SetupCoroutine` and is due now.
//! 3. A due, non-idle thread runs one `Tick`; its next run time becomes
//!    `now + wait_ticks`.
//!
//! The pass walks a snapshot taken at pass start, so threads created during
//! the pass wait for the next one and threads killed mid-pass are skipped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::core::callback::SETUP_CALLBACK;
use crate::core::fault::InMemoryFaultSink;
use crate::core::{RunOutcome, ScriptThread, ThreadEnv, ThreadId, ThreadRegistry};
use crate::runtime::api::ScriptApi;

/// What a single pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassReport {
    /// Host time observed at pass start.
    pub now: u64,
    /// Threads that ran a `Tick`.
    pub dispatched: usize,
    /// Threads that ran `SetupCoroutine` (first run or reset).
    pub resets: usize,
    /// Ticks that ended in a fault.
    pub faults: usize,
    /// Snapshot entries skipped because they were dead.
    pub skipped_dead: usize,
}

/// Cumulative scheduler statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStats {
    /// Completed passes.
    pub passes: u64,
    /// Ticks dispatched.
    pub dispatched: u64,
    /// Setup runs.
    pub resets: u64,
    /// Faulted ticks.
    pub faults: u64,
}

#[derive(Debug, Default)]
struct SchedulerCounters {
    passes: AtomicU64,
    dispatched: AtomicU64,
    resets: AtomicU64,
    faults: AtomicU64,
}

impl SchedulerCounters {
    fn record(&self, report: &PassReport) {
        self.passes.fetch_add(1, Ordering::Relaxed);
        self.dispatched.fetch_add(report.dispatched as u64, Ordering::Relaxed);
        self.resets.fetch_add(report.resets as u64, Ordering::Relaxed);
        self.faults.fetch_add(report.faults as u64, Ordering::Relaxed);
    }

    fn snapshot(&self) -> SchedulerStats {
        SchedulerStats {
            passes: self.passes.load(Ordering::Relaxed),
            dispatched: self.dispatched.load(Ordering::Relaxed),
            resets: self.resets.load(Ordering::Relaxed),
            faults: self.faults.load(Ordering::Relaxed),
        }
    }
}

/// Cooperative scheduler for host-driven script threads.
pub struct ThreadScheduler {
    env: ThreadEnv,
    registry: Arc<ThreadRegistry>,
    counters: SchedulerCounters,
    fault_log: Option<Arc<InMemoryFaultSink>>,
}

impl ThreadScheduler {
    /// Create a scheduler with an empty registry.
    #[must_use]
    pub fn new(env: ThreadEnv) -> Self {
        Self::with_registry(env, Arc::new(ThreadRegistry::new()))
    }

    /// Create a scheduler over an existing registry.
    #[must_use]
    pub fn with_registry(env: ThreadEnv, registry: Arc<ThreadRegistry>) -> Self {
        Self {
            env,
            registry,
            counters: SchedulerCounters::default(),
            fault_log: None,
        }
    }

    /// Keep a handle on the in-memory log that `env` reports faults to.
    #[must_use]
    pub fn with_fault_log(mut self, log: Arc<InMemoryFaultSink>) -> Self {
        self.fault_log = Some(log);
        self
    }

    /// The execution environment shared by every dispatched thread.
    #[must_use]
    pub const fn env(&self) -> &ThreadEnv {
        &self.env
    }

    /// The thread registry.
    #[must_use]
    pub const fn registry(&self) -> &Arc<ThreadRegistry> {
        &self.registry
    }

    /// The in-memory fault log, when the scheduler owns one.
    ///
    /// Set by [`SchedulerBuilder`](crate::builders::SchedulerBuilder) when no
    /// custom sink is supplied.
    #[must_use]
    pub const fn fault_log(&self) -> Option<&Arc<InMemoryFaultSink>> {
        self.fault_log.as_ref()
    }

    /// Script-facing API over this scheduler's registry.
    #[must_use]
    pub fn api(&self) -> ScriptApi {
        ScriptApi::new(Arc::clone(&self.registry))
    }

    /// Register a host-driven thread.
    pub fn create(&self, name: impl Into<String>) -> ThreadId {
        self.registry.create(name)
    }

    /// Cumulative statistics.
    #[must_use]
    pub fn stats(&self) -> SchedulerStats {
        self.counters.snapshot()
    }

    /// Run one dispatch pass, then yield to the host for this frame.
    pub fn tick(&self) -> PassReport {
        let now = self.env.clock().now();
        let swept = self.registry.sweep();
        if swept > 0 {
            debug!(swept, "removed dead threads");
        }

        let mut report = PassReport {
            now,
            ..PassReport::default()
        };
        for thread in self.registry.snapshot() {
            if thread.is_active() {
                self.dispatch(&thread, now, &mut report);
            } else {
                report.skipped_dead += 1;
            }
        }

        self.counters.record(&report);
        trace!(?report, "pass complete");
        self.env.clock().yield_to_host(0);
        report
    }

    fn dispatch(&self, thread: &ScriptThread, now: u64, report: &mut PassReport) {
        if thread.observe(now) {
            debug!(thread = thread.name(), "running setup");
            thread.invoke_callback(&self.env, SETUP_CALLBACK);
            thread.finish_setup(now);
            report.resets += 1;
        }

        if !thread.is_due(now) {
            return;
        }

        let outcome = thread.run(&self.env);
        if matches!(outcome, RunOutcome::Faulted | RunOutcome::Recovered) {
            report.faults += 1;
        }
        thread.settle(outcome, now);
        report.dispatched += 1;
        trace!(thread = thread.name(), ?outcome, next_run = ?thread.next_run(), "tick dispatched");
    }

    /// Primary-driver loop: run a pass per host frame until `driver` is
    /// killed.
    pub fn drive(&self, driver: &ScriptThread) {
        if !driver.activate() {
            return;
        }
        info!(thread = driver.name(), threads = self.registry.len(), "primary driver started");
        while driver.is_active() {
            self.tick();
        }
        info!(thread = driver.name(), "primary driver quit");
    }
}
