//! Scheduler configuration.

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::thread::DEFAULT_IDLE_POLL_TICKS;
use crate::core::SchedulerError;

/// Environment variable overriding [`SchedulerConfig::idle_poll_ticks`].
pub const ENV_IDLE_POLL_TICKS: &str = "SCRIPT_THREADS_IDLE_POLL_TICKS";
/// Environment variable overriding [`SchedulerConfig::fault_log_capacity`].
pub const ENV_FAULT_LOG_CAPACITY: &str = "SCRIPT_THREADS_FAULT_LOG_CAPACITY";

/// Root scheduler configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Ticks between reset checks while a stand-alone thread idles.
    pub idle_poll_ticks: u64,
    /// Capacity of the default in-memory fault sink.
    pub fault_log_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            idle_poll_ticks: DEFAULT_IDLE_POLL_TICKS,
            fault_log_capacity: 256,
        }
    }
}

impl SchedulerConfig {
    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.idle_poll_ticks == 0 {
            return Err("idle_poll_ticks must be greater than 0".into());
        }
        if self.fault_log_capacity == 0 {
            return Err("fault_log_capacity must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate. Missing fields
    /// take their defaults.
    ///
    /// # Errors
    ///
    /// Returns a parse or validation message.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load defaults overridden by the process environment, after reading a
    /// `.env` file if one is present.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::Env`] when a `.env` file exists but cannot be read
    /// or parsed, or when a variable does not parse.
    /// [`SchedulerError::InvalidConfig`] when the result fails validation.
    pub fn from_env() -> Result<Self, SchedulerError> {
        check_dotenv(dotenvy::dotenv())?;
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`SchedulerConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SchedulerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(value) = parse_var(&lookup, ENV_IDLE_POLL_TICKS)? {
            cfg.idle_poll_ticks = value;
        }
        if let Some(value) = parse_var(&lookup, ENV_FAULT_LOG_CAPACITY)? {
            cfg.fault_log_capacity = value;
        }
        cfg.validate().map_err(SchedulerError::InvalidConfig)?;
        Ok(cfg)
    }
}

/// A missing `.env` file is fine; a broken one is not.
fn check_dotenv(result: Result<PathBuf, dotenvy::Error>) -> Result<(), SchedulerError> {
    match result {
        Ok(path) => {
            debug!(path = %path.display(), "loaded .env file");
            Ok(())
        }
        Err(err) if err.not_found() => Ok(()),
        Err(err) => {
            warn!(error = %err, "failed to load .env file");
            Err(SchedulerError::Env(format!(".env: {err}")))
        }
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>, SchedulerError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|e| SchedulerError::Env(format!("{key}={raw}: {e}")))
        })
        .transpose()
}
