//! # Runtime Configuration
//!
//! Typed configuration for the runtime's tunables: worker pool sizing, poll intervals,
//! out-of-state behaviour and failure policies. Durations are carried as `*_ms` integer
//! fields so every source format (TOML, YAML, JSON, environment) expresses them the
//! same way; typed accessors return [`Duration`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use flowlane_core::config::ConfigLoader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // defaults <- ./flowlane.{toml,yaml,json} <- FLOWLANE_* environment
//! let config = ConfigLoader::new().load()?;
//! let max_workers = config.pool.max_total;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::defaults;
use crate::workflow::{ProcessingErrorPolicy, ProduceFailurePolicy};

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Worker pool sizing for pooled workflows
    pub pool: PoolConfig,

    /// Interval strategy for polling consumers
    pub poller: PollerConfig,

    /// What a workflow does with messages arriving while it is not started
    pub out_of_state: OutOfStateConfig,

    /// Applied when a producer fails to deliver
    pub produce_failure: ProduceFailurePolicy,

    /// Applied when a processing step fails
    pub processing_errors: ProcessingErrorPolicy,

    /// Upper bound on draining in-flight messages during stop
    pub shutdown_timeout_ms: u64,

    /// Failed messages kept by the retaining error handler
    pub retained_failures: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            pool: PoolConfig::default(),
            poller: PollerConfig::default(),
            out_of_state: OutOfStateConfig::default(),
            produce_failure: ProduceFailurePolicy::default(),
            processing_errors: ProcessingErrorPolicy::default(),
            shutdown_timeout_ms: defaults::SHUTDOWN_TIMEOUT_MS,
            retained_failures: defaults::RETAINED_FAILURES,
        }
    }
}

impl RuntimeConfig {
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    /// Validate every section; the first violation is returned
    pub fn validate(&self) -> ConfigResult<()> {
        self.pool.validate()?;
        self.poller.validate()?;
        self.out_of_state.validate()?;

        if self.shutdown_timeout_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "shutdown_timeout_ms",
                0,
                "shutdown timeout must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Worker pool sizing
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Workers created at startup and kept idle
    pub min_idle: usize,
    /// Idle workers above this are destroyed on return
    pub max_idle: usize,
    /// Upper bound on live workers (idle + borrowed)
    pub max_total: usize,
    /// Time allowed to pre-populate `min_idle` workers at startup
    pub init_wait_time_ms: u64,
    /// How long a borrow blocks when every worker is busy
    pub max_borrow_wait_ms: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_idle: defaults::POOL_MIN_IDLE,
            max_idle: defaults::POOL_MAX_IDLE,
            max_total: defaults::POOL_MAX_TOTAL,
            init_wait_time_ms: defaults::POOL_INIT_WAIT_MS,
            max_borrow_wait_ms: defaults::POOL_MAX_BORROW_WAIT_MS,
        }
    }
}

impl PoolConfig {
    pub fn init_wait_time(&self) -> Duration {
        Duration::from_millis(self.init_wait_time_ms)
    }

    pub fn max_borrow_wait(&self) -> Duration {
        Duration::from_millis(self.max_borrow_wait_ms)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_total == 0 {
            return Err(ConfigurationError::invalid_value(
                "pool.max_total",
                self.max_total,
                "pool must allow at least one worker",
            ));
        }
        if self.min_idle > self.max_total {
            return Err(ConfigurationError::invalid_value(
                "pool.min_idle",
                self.min_idle,
                format!("min_idle cannot exceed max_total ({})", self.max_total),
            ));
        }
        if self.min_idle > self.max_idle {
            return Err(ConfigurationError::invalid_value(
                "pool.min_idle",
                self.min_idle,
                format!("min_idle cannot exceed max_idle ({})", self.max_idle),
            ));
        }
        Ok(())
    }
}

/// Poll interval strategy and its parameters
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PollerConfig {
    /// Constant delay between polls
    Fixed { interval_ms: u64 },
    /// `mean + stddev * N(0,1)`; signed so invalid settings can be expressed and rejected
    Gaussian { mean_ms: i64, stddev_ms: i64 },
    /// Uniform in `[0, bound)`
    Random { bound_ms: u64 },
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self::Fixed {
            interval_ms: defaults::FIXED_POLL_INTERVAL_MS,
        }
    }
}

impl PollerConfig {
    pub fn fixed(interval: Duration) -> Self {
        Self::Fixed {
            interval_ms: interval.as_millis() as u64,
        }
    }

    pub fn gaussian(mean_ms: i64, stddev_ms: i64) -> Self {
        Self::Gaussian { mean_ms, stddev_ms }
    }

    pub fn random(bound: Duration) -> Self {
        Self::Random {
            bound_ms: bound.as_millis() as u64,
        }
    }

    /// Gaussian parameters must satisfy `mean >= 0` and `stddev > 0`; a zero random
    /// bound is rejected because the sampling range would be empty
    pub fn validate(&self) -> ConfigResult<()> {
        match self {
            Self::Fixed { .. } => Ok(()),
            Self::Gaussian { mean_ms, stddev_ms } => {
                if *mean_ms < 0 {
                    return Err(ConfigurationError::invalid_value(
                        "poller.mean_ms",
                        mean_ms,
                        "mean interval must be >= 0",
                    ));
                }
                if *stddev_ms <= 0 {
                    return Err(ConfigurationError::invalid_value(
                        "poller.stddev_ms",
                        stddev_ms,
                        "standard deviation must be > 0",
                    ));
                }
                Ok(())
            }
            Self::Random { bound_ms } => {
                if *bound_ms == 0 {
                    return Err(ConfigurationError::invalid_value(
                        "poller.bound_ms",
                        bound_ms,
                        "random bound must be > 0",
                    ));
                }
                Ok(())
            }
        }
    }
}

/// Out-of-state behaviour for message arrival
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutOfStateConfig {
    #[default]
    Raise,
    Waiting {
        maximum_wait_ms: u64,
        interval_to_check_ms: u64,
    },
}

impl OutOfStateConfig {
    pub fn waiting_default() -> Self {
        Self::Waiting {
            maximum_wait_ms: defaults::OUT_OF_STATE_MAX_WAIT_MS,
            interval_to_check_ms: defaults::OUT_OF_STATE_CHECK_INTERVAL_MS,
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if let Self::Waiting {
            interval_to_check_ms,
            ..
        } = self
        {
            if *interval_to_check_ms == 0 {
                return Err(ConfigurationError::invalid_value(
                    "out_of_state.interval_to_check_ms",
                    0,
                    "check interval must be > 0",
                ));
            }
        }
        Ok(())
    }
}
