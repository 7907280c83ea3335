//! Builder assembling a [`ThreadScheduler`] from configuration.

use std::sync::Arc;

use anyhow::Context;

use crate::config::SchedulerConfig;
use crate::core::{
    AppResult, CallbackEngine, FaultSink, InMemoryFaultSink, SchedulerError, ThreadEnv,
    ThreadRegistry, ThreadScheduler,
};
use crate::runtime::clock::HostClock;

/// Builds a scheduler from an engine, a host clock and configuration.
///
/// Without an explicit sink, faults go to an [`InMemoryFaultSink`] sized by
/// `fault_log_capacity` and readable through
/// [`ThreadScheduler::fault_log`].
pub struct SchedulerBuilder {
    engine: Arc<dyn CallbackEngine>,
    clock: Arc<dyn HostClock>,
    config: SchedulerConfig,
    faults: Option<Arc<dyn FaultSink>>,
    registry: Option<Arc<ThreadRegistry>>,
}

impl SchedulerBuilder {
    /// Start from default configuration.
    pub fn new(engine: Arc<dyn CallbackEngine>, clock: Arc<dyn HostClock>) -> Self {
        Self {
            engine,
            clock,
            config: SchedulerConfig::default(),
            faults: None,
            registry: None,
        }
    }

    /// Replace the configuration.
    #[must_use]
    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    /// Route faults to `sink`.
    #[must_use]
    pub fn with_fault_sink(mut self, sink: Arc<dyn FaultSink>) -> Self {
        self.faults = Some(sink);
        self
    }

    /// Share an existing registry.
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<ThreadRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Current configuration.
    #[must_use]
    pub const fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Validate the configuration and build the scheduler.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::InvalidConfig`] when validation fails.
    pub fn build(self) -> Result<ThreadScheduler, SchedulerError> {
        self.config.validate().map_err(SchedulerError::InvalidConfig)?;

        let (faults, fault_log) = match self.faults {
            Some(sink) => (sink, None),
            None => {
                let log = Arc::new(InMemoryFaultSink::new(self.config.fault_log_capacity));
                (Arc::clone(&log) as Arc<dyn FaultSink>, Some(log))
            }
        };
        let env = ThreadEnv::new(self.engine, self.clock)
            .with_fault_sink(faults)
            .with_idle_poll_ticks(self.config.idle_poll_ticks);

        let scheduler = match self.registry {
            Some(registry) => ThreadScheduler::with_registry(env, registry),
            None => ThreadScheduler::new(env),
        };
        Ok(match fault_log {
            Some(log) => scheduler.with_fault_log(log),
            None => scheduler,
        })
    }

    /// Build with configuration loaded from the environment (`.env` included).
    ///
    /// # Errors
    ///
    /// Fails when the environment holds an unparsable or invalid value.
    pub fn build_from_env(self) -> AppResult<ThreadScheduler> {
        let config =
            SchedulerConfig::from_env().context("loading scheduler config from environment")?;
        let scheduler = self
            .with_config(config)
            .build()
            .context("building thread scheduler")?;
        Ok(scheduler)
    }
}
