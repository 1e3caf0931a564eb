//! Gating of operations on a component's current lifecycle state.

use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::OutOfStateConfig;
use crate::error::{FlowlaneError, Result};

use super::manager::StateQuery;
use super::states::LifecycleState;

/// Policy applied when a component is not in the state an operation requires
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutOfStateHandler {
    /// Fail immediately
    Raise { target: LifecycleState },
    /// Re-check every `interval_to_check` until `maximum_wait` has elapsed
    Waiting {
        target: LifecycleState,
        maximum_wait: Duration,
        interval_to_check: Duration,
    },
}

impl Default for OutOfStateHandler {
    fn default() -> Self {
        Self::raise()
    }
}

impl OutOfStateHandler {
    pub fn raise() -> Self {
        Self::Raise {
            target: LifecycleState::Started,
        }
    }

    pub fn waiting(maximum_wait: Duration, interval_to_check: Duration) -> Self {
        Self::Waiting {
            target: LifecycleState::Started,
            maximum_wait,
            interval_to_check,
        }
    }

    /// Replace the target state (default `Started`)
    pub fn with_target(self, target: LifecycleState) -> Self {
        match self {
            Self::Raise { .. } => Self::Raise { target },
            Self::Waiting {
                maximum_wait,
                interval_to_check,
                ..
            } => Self::Waiting {
                target,
                maximum_wait,
                interval_to_check,
            },
        }
    }

    pub fn target_state(&self) -> LifecycleState {
        match self {
            Self::Raise { target } | Self::Waiting { target, .. } => *target,
        }
    }

    pub fn is_in_correct_state(&self, component: &dyn StateQuery) -> bool {
        component.current_state() == self.target_state()
    }

    /// Called after [`Self::is_in_correct_state`] returned false.
    ///
    /// `Waiting` succeeds silently if the component reaches the target state before the
    /// deadline, whoever drives the transition.
    pub async fn handle_out_of_state(&self, component: &dyn StateQuery, name: &str) -> Result<()> {
        match self {
            Self::Raise { target } => Err(FlowlaneError::OutOfState {
                component: name.to_string(),
                current: component.current_state(),
                expected: *target,
            }),
            Self::Waiting {
                target,
                maximum_wait,
                interval_to_check,
            } => {
                let deadline = Instant::now() + *maximum_wait;
                debug!(
                    component = %name,
                    current = %component.current_state(),
                    target = %target,
                    maximum_wait_ms = maximum_wait.as_millis() as u64,
                    "⏳ OUT_OF_STATE: Waiting for component"
                );

                loop {
                    if component.current_state() == *target {
                        return Ok(());
                    }
                    let now = Instant::now();
                    if now >= deadline {
                        break;
                    }
                    tokio::time::sleep((*interval_to_check).min(deadline - now)).await;
                }

                let current = component.current_state();
                warn!(
                    component = %name,
                    current = %current,
                    target = %target,
                    "⏳ OUT_OF_STATE: Gave up waiting"
                );
                Err(FlowlaneError::OutOfState {
                    component: name.to_string(),
                    current,
                    expected: *target,
                })
            }
        }
    }

    /// Check then handle in one call
    pub async fn ensure(&self, component: &dyn StateQuery, name: &str) -> Result<()> {
        if self.is_in_correct_state(component) {
            return Ok(());
        }
        self.handle_out_of_state(component, name).await
    }
}

impl From<&OutOfStateConfig> for OutOfStateHandler {
    fn from(config: &OutOfStateConfig) -> Self {
        match config {
            OutOfStateConfig::Raise => Self::raise(),
            OutOfStateConfig::Waiting {
                maximum_wait_ms,
                interval_to_check_ms,
            } => Self::waiting(
                Duration::from_millis(*maximum_wait_ms),
                Duration::from_millis(*interval_to_check_ms),
            ),
        }
    }
}
