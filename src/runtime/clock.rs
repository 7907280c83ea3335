//! Host clock adapters.
//!
//! The scheduler never owns time. It reads `now()` once per pass and hands
//! control back through `yield_to_host`, which is the only point where a
//! script thread is suspended from the host's point of view.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Condvar, Mutex};

/// Host timing source and suspension primitive.
pub trait HostClock: Send + Sync {
    /// Current host time in ticks.
    fn now(&self) -> u64;

    /// Suspend the caller until the host resumes it `ticks` later.
    /// A zero-tick yield means "done for this frame".
    fn yield_to_host(&self, ticks: u64);
}

/// Deterministic clock driven by the caller.
///
/// `yield_to_host(t)` advances time by `t` instead of blocking, which makes
/// stand-alone run loops replayable in tests and tools.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
    yields: AtomicU64,
}

impl ManualClock {
    /// Create a clock starting at `now`.
    #[must_use]
    pub fn new(now: u64) -> Self {
        Self {
            now: AtomicU64::new(now),
            yields: AtomicU64::new(0),
        }
    }

    /// Jump to an absolute time.
    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::Release);
    }

    /// Move time forward by `ticks`.
    pub fn advance(&self, ticks: u64) {
        self.now.fetch_add(ticks, Ordering::AcqRel);
    }

    /// Number of `yield_to_host` calls observed so far.
    #[must_use]
    pub fn yields(&self) -> u64 {
        self.yields.load(Ordering::Acquire)
    }
}

impl HostClock for ManualClock {
    fn now(&self) -> u64 {
        self.now.load(Ordering::Acquire)
    }

    fn yield_to_host(&self, ticks: u64) {
        self.yields.fetch_add(1, Ordering::AcqRel);
        self.advance(ticks);
    }
}

struct FrameState {
    now: u64,
    frame: u64,
    shutdown: bool,
}

/// Bridge between a host frame loop and script threads running their own
/// loop on a separate OS thread.
///
/// The host calls [`FrameClock::advance_frame`] once per frame. A script-side
/// `yield_to_host(t)` parks on a `Condvar` until at least one frame boundary
/// has passed and host time has reached `start + t`, so long waits still
/// give control back at every frame.
pub struct FrameClock {
    state: Mutex<FrameState>,
    frame_signal: Condvar,
}

impl FrameClock {
    /// Create a bridge at host time `now`.
    #[must_use]
    pub fn new(now: u64) -> Self {
        Self {
            state: Mutex::new(FrameState {
                now,
                frame: 0,
                shutdown: false,
            }),
            frame_signal: Condvar::new(),
        }
    }

    /// Publish a new frame at host time `now` and wake parked threads.
    pub fn advance_frame(&self, now: u64) {
        let mut state = self.state.lock();
        state.now = state.now.max(now);
        state.frame += 1;
        drop(state);
        self.frame_signal.notify_all();
    }

    /// Number of frames published so far.
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.state.lock().frame
    }

    /// Release every parked thread; later yields return immediately.
    pub fn shutdown(&self) {
        let mut state = self.state.lock();
        state.shutdown = true;
        drop(state);
        self.frame_signal.notify_all();
    }

    /// True once [`FrameClock::shutdown`] has been called.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.state.lock().shutdown
    }
}

impl HostClock for FrameClock {
    fn now(&self) -> u64 {
        self.state.lock().now
    }

    fn yield_to_host(&self, ticks: u64) {
        let mut state = self.state.lock();
        let start_frame = state.frame;
        let target = state.now.saturating_add(ticks);
        while !state.shutdown && (state.frame == start_frame || state.now < target) {
            self.frame_signal.wait(&mut state);
        }
    }
}
