//! Configuration models for the scheduler.

pub mod scheduler;

pub use scheduler::{SchedulerConfig, ENV_FAULT_LOG_CAPACITY, ENV_IDLE_POLL_TICKS};
