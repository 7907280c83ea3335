//! # Prometheus Script Threads
//!
//! A cooperative, tick-driven scheduler that runs many independently defined
//! script threads on top of a single host-driven update loop.
//!
//! The host calls into the scheduler once per frame. Each script thread gets
//! the illusion of blocking semantics: a callback asks to `wait` for some
//! ticks, returns, and is resumed once that time has passed. Nothing is
//! preempted; a thread yields by returning from its callback.
//!
//! ## Core Problem Solved
//!
//! Game and simulation hosts expose exactly one update hook. Scripts want to
//! be written as long-lived loops ("do this, wait half a second, do that").
//! This crate sits between the two:
//!
//! - **Per-thread lifecycle**: created, active, idle, resetting, dead
//! - **Voluntary preemption**: `wait(ticks)` schedules the next resumption
//! - **Cooperative reset**: a pending reset unwinds the running callback and
//!   re-runs `SetupCoroutine` on the next dispatch
//! - **Fault isolation**: a failing script is logged, reported to a fault
//!   sink and parked; every other thread keeps running
//! - **Mutation-safe dispatch**: callbacks may create, reset or kill threads,
//!   including themselves, while the pass is running
//!
//! ## Host-driven threads
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use prometheus_script_threads::builders::SchedulerBuilder;
//! use prometheus_script_threads::core::{CallbackTable, TICK_CALLBACK};
//! use prometheus_script_threads::runtime::ManualClock;
//!
//! let table = Arc::new(CallbackTable::new());
//! table.register("patrol", "SetupCoroutine", |_| Ok(()));
//! table.register("patrol", TICK_CALLBACK, |thread| thread.wait(30));
//!
//! let clock = Arc::new(ManualClock::new(0));
//! let scheduler = SchedulerBuilder::new(table, clock.clone()).build()?;
//! scheduler.create("patrol");
//!
//! // Once per host frame:
//! let report = scheduler.tick();
//! ```
//!
//! ## Stand-alone threads
//!
//! A [`ScriptThread::standalone`](crate::core::ScriptThread::standalone)
//! thread owns its loop and suspends through
//! [`HostClock::yield_to_host`](crate::runtime::HostClock::yield_to_host).
//! Paired with [`FrameClock`](crate::runtime::FrameClock) it can run on its
//! own OS thread while still returning control to the host at every frame
//! boundary.
//!
//! For complete examples, see:
//! - `tests/scheduler_scenarios.rs` - dispatch-pass behaviour
//! - `tests/standalone_thread_test.rs` - self-looping threads

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Script threads, registry, scheduler and error taxonomy.
pub mod core;
/// Configuration models for the scheduler.
pub mod config;
/// Builders to construct schedulers from configuration.
pub mod builders;
/// Host clocks and the script-facing API surface.
pub mod runtime;
/// Shared utilities.
pub mod util;
