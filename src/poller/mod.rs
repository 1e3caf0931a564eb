//! # Interval Poller
//!
//! Delay strategies for time-driven ingestion and the [`PollingConsumer`] that
//! schedules itself with them.

pub mod consumer;

use async_trait::async_trait;
use rand::Rng;
use std::f64::consts::PI;
use std::time::Duration;
use tracing::debug;

use crate::config::PollerConfig;
use crate::constants::defaults;
use crate::error::{FlowlaneError, Result};
use crate::message::Message;

pub use consumer::PollingConsumer;

/// Where a polling consumer gets its messages from on each fire
#[async_trait]
pub trait PollSource: Send + Sync {
    async fn poll(&self) -> Result<Vec<Message>>;
}

/// Computes the delay before the next poll.
///
/// Parameters are checked by [`Poller::init`]; [`Poller::next_delay`] never panics and
/// never returns a negative delay.
#[derive(Debug, Clone, PartialEq)]
pub enum Poller {
    Fixed { interval: Duration },
    Gaussian { mean_ms: i64, stddev_ms: i64 },
    Random { bound: Duration },
}

impl Default for Poller {
    fn default() -> Self {
        Self::Fixed {
            interval: Duration::from_millis(defaults::FIXED_POLL_INTERVAL_MS),
        }
    }
}

impl Poller {
    pub fn fixed(interval: Duration) -> Self {
        Self::Fixed { interval }
    }

    pub fn gaussian(mean_ms: i64, stddev_ms: i64) -> Self {
        Self::Gaussian { mean_ms, stddev_ms }
    }

    /// Gaussian poller with the default mean (0) and standard deviation (20s)
    pub fn gaussian_default() -> Self {
        Self::gaussian(defaults::GAUSSIAN_MEAN_MS, defaults::GAUSSIAN_STDDEV_MS)
    }

    pub fn random(bound: Duration) -> Self {
        Self::Random { bound }
    }

    /// Random poller with the default bound (20s)
    pub fn random_default() -> Self {
        Self::random(Duration::from_millis(defaults::RANDOM_BOUND_MS))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fixed { .. } => "fixed",
            Self::Gaussian { .. } => "gaussian",
            Self::Random { .. } => "random",
        }
    }

    /// Validate parameters; failures are fatal configuration errors
    pub fn init(&self) -> Result<()> {
        match self {
            Self::Fixed { .. } => Ok(()),
            Self::Gaussian { mean_ms, stddev_ms } => {
                if *mean_ms < 0 {
                    return Err(FlowlaneError::ConfigurationError(format!(
                        "gaussian poller mean must be >= 0, got {mean_ms}ms"
                    )));
                }
                if *stddev_ms <= 0 {
                    return Err(FlowlaneError::ConfigurationError(format!(
                        "gaussian poller standard deviation must be > 0, got {stddev_ms}ms"
                    )));
                }
                Ok(())
            }
            Self::Random { bound } => {
                // delays are sampled in whole milliseconds
                if *bound < Duration::from_millis(1) {
                    return Err(FlowlaneError::ConfigurationError(format!(
                        "random poller bound must be at least 1ms, got {bound:?}"
                    )));
                }
                Ok(())
            }
        }
    }

    pub fn next_delay(&self) -> Duration {
        let delay = match self {
            Self::Fixed { interval } => *interval,
            Self::Gaussian { mean_ms, stddev_ms } => {
                let sample = *mean_ms as f64 + *stddev_ms as f64 * standard_normal();
                Duration::from_millis(sample.max(0.0).round() as u64)
            }
            Self::Random { bound } => {
                let bound_ms = bound.as_millis() as u64;
                if bound_ms == 0 {
                    Duration::ZERO
                } else {
                    Duration::from_millis(rand::thread_rng().gen_range(0..bound_ms))
                }
            }
        };
        debug!(kind = self.kind(), delay_ms = delay.as_millis() as u64, "⏱️ POLLER: Next delay");
        delay
    }
}

impl From<&PollerConfig> for Poller {
    fn from(config: &PollerConfig) -> Self {
        match config {
            PollerConfig::Fixed { interval_ms } => Self::fixed(Duration::from_millis(*interval_ms)),
            PollerConfig::Gaussian { mean_ms, stddev_ms } => Self::gaussian(*mean_ms, *stddev_ms),
            PollerConfig::Random { bound_ms } => Self::random(Duration::from_millis(*bound_ms)),
        }
    }
}

// Box-Muller
fn standard_normal() -> f64 {
    let mut rng = rand::thread_rng();
    // (0, 1] so the logarithm is finite
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gaussian_validation() {
        assert!(Poller::gaussian(0, 0).init().is_err());
        assert!(Poller::gaussian(0, -2).init().is_err());
        assert!(Poller::gaussian(-2, 10).init().is_err());
        assert!(Poller::gaussian(0, 10).init().is_ok());
        assert!(Poller::gaussian_default().init().is_ok());

        let err = Poller::gaussian(0, 0).init().unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_fixed_delay_is_constant() {
        let poller = Poller::fixed(Duration::from_millis(100));
        for _ in 0..10 {
            assert_eq!(poller.next_delay(), Duration::from_millis(100));
        }
        assert_eq!(
            Poller::default().next_delay(),
            Duration::from_millis(defaults::FIXED_POLL_INTERVAL_MS)
        );
    }

    #[test]
    fn test_random_delay_is_within_bound() {
        let poller = Poller::random(Duration::from_millis(50));
        assert!(poller.init().is_ok());
        for _ in 0..200 {
            assert!(poller.next_delay() < Duration::from_millis(50));
        }
        assert!(Poller::random(Duration::ZERO).init().is_err());
    }

    #[test]
    fn test_random_bound_below_one_millisecond_is_rejected() {
        let err = Poller::random(Duration::from_micros(500)).init().unwrap_err();
        assert!(err.is_fatal());
        assert!(Poller::random(Duration::from_millis(1)).init().is_ok());

        let poller = Poller::random_default();
        assert!(poller.init().is_ok());
        assert_eq!(poller, Poller::random(Duration::from_millis(defaults::RANDOM_BOUND_MS)));
    }

    #[test]
    fn test_from_config() {
        assert_eq!(
            Poller::from(&PollerConfig::random(Duration::from_millis(500))),
            Poller::random(Duration::from_millis(500))
        );
        assert_eq!(Poller::from(&PollerConfig::default()), Poller::default());
    }
}
