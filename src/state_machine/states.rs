use serde::{Deserialize, Serialize};
use std::fmt;

use super::events::{LifecycleHook, LifecycleRequest};

/// Lifecycle states shared by every managed component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Initial state; resources released
    #[default]
    Closed,
    /// Configured and validated, not yet accepting work
    Initialised,
    /// Accepting and processing work
    Started,
    /// Work paused; resources still held
    Stopped,
}

/// Outcome of applying one primitive request to a state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Hooks to run, in order
    pub hooks: &'static [LifecycleHook],
    /// State reached once every hook succeeded
    pub target: LifecycleState,
}

impl Transition {
    const fn noop(state: LifecycleState) -> Self {
        Self {
            hooks: &[],
            target: state,
        }
    }

    const fn run(hooks: &'static [LifecycleHook], target: LifecycleState) -> Self {
        Self { hooks, target }
    }

    pub fn is_noop(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl LifecycleState {
    /// Transition table.
    ///
    /// The `Restart` rows are what [`LifecycleRequest::RESTART_SEQUENCE`] folds to; the
    /// manager never executes them directly, it applies the sequence one request at a
    /// time.
    pub fn plan(self, request: LifecycleRequest) -> Transition {
        use LifecycleHook as H;
        use LifecycleRequest as R;
        use LifecycleState as S;

        match (self, request) {
            (S::Closed, R::Init) => Transition::run(&[H::Init], S::Initialised),
            (S::Closed, R::Start) => Transition::run(&[H::Init, H::Start], S::Started),
            (S::Closed, R::Stop | R::Close) => Transition::noop(S::Closed),

            (S::Initialised, R::Start) => Transition::run(&[H::Start], S::Started),
            (S::Initialised, R::Close) => Transition::run(&[H::Close], S::Closed),
            (S::Initialised, R::Init | R::Stop) => Transition::noop(S::Initialised),

            (S::Started, R::Stop) => Transition::run(&[H::Stop], S::Stopped),
            (S::Started, R::Close) => Transition::run(&[H::Stop, H::Close], S::Closed),
            (S::Started, R::Init | R::Start) => Transition::noop(S::Started),

            (S::Stopped, R::Start) => Transition::run(&[H::Start], S::Started),
            (S::Stopped, R::Close) => Transition::run(&[H::Close], S::Closed),
            (S::Stopped, R::Init | R::Stop) => Transition::noop(S::Stopped),

            (S::Closed, R::Restart) => Transition::run(&[H::Init, H::Start], S::Started),
            (S::Initialised | S::Stopped, R::Restart) => {
                Transition::run(&[H::Close, H::Init, H::Start], S::Started)
            }
            (S::Started, R::Restart) => {
                Transition::run(&[H::Stop, H::Close, H::Init, H::Start], S::Started)
            }
        }
    }

    /// Whether the component currently holds initialised resources
    pub fn is_initialised(&self) -> bool {
        !matches!(self, Self::Closed)
    }

    pub fn is_started(&self) -> bool {
        matches!(self, Self::Started)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Initialised => write!(f, "initialised"),
            Self::Started => write!(f, "started"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

impl std::str::FromStr for LifecycleState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "closed" => Ok(Self::Closed),
            "initialised" | "initialized" => Ok(Self::Initialised),
            "started" => Ok(Self::Started),
            "stopped" => Ok(Self::Stopped),
            _ => Err(format!("Invalid lifecycle state: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use LifecycleHook as H;
    use LifecycleRequest as R;
    use LifecycleState as S;

    #[test]
    fn test_transition_table() {
        let cases: &[(S, R, &[H], S)] = &[
            (S::Closed, R::Init, &[H::Init], S::Initialised),
            (S::Closed, R::Start, &[H::Init, H::Start], S::Started),
            (S::Closed, R::Stop, &[], S::Closed),
            (S::Closed, R::Close, &[], S::Closed),
            (S::Initialised, R::Init, &[], S::Initialised),
            (S::Initialised, R::Start, &[H::Start], S::Started),
            (S::Initialised, R::Stop, &[], S::Initialised),
            (S::Initialised, R::Close, &[H::Close], S::Closed),
            (S::Started, R::Init, &[], S::Started),
            (S::Started, R::Start, &[], S::Started),
            (S::Started, R::Stop, &[H::Stop], S::Stopped),
            (S::Started, R::Close, &[H::Stop, H::Close], S::Closed),
            (S::Stopped, R::Init, &[], S::Stopped),
            (S::Stopped, R::Start, &[H::Start], S::Started),
            (S::Stopped, R::Stop, &[], S::Stopped),
            (S::Stopped, R::Close, &[H::Close], S::Closed),
        ];

        for (from, request, hooks, target) in cases {
            let transition = from.plan(*request);
            assert_eq!(transition.hooks, *hooks, "{from} + {request:?}");
            assert_eq!(transition.target, *target, "{from} + {request:?}");
        }
    }

    #[test]
    fn test_restart_always_reaches_started() {
        let expected: &[(S, &[H])] = &[
            (S::Closed, &[H::Init, H::Start]),
            (S::Initialised, &[H::Close, H::Init, H::Start]),
            (S::Started, &[H::Stop, H::Close, H::Init, H::Start]),
            (S::Stopped, &[H::Close, H::Init, H::Start]),
        ];

        for (from, hooks) in expected {
            let transition = from.plan(R::Restart);
            assert_eq!(transition.target, S::Started);
            assert_eq!(transition.hooks, *hooks, "restart from {from}");
        }
    }

    #[test]
    fn test_restart_rows_match_restart_sequence() {
        for from in [S::Closed, S::Initialised, S::Started, S::Stopped] {
            let mut hooks = Vec::new();
            let mut current = from;
            for step in R::RESTART_SEQUENCE {
                let transition = current.plan(step);
                hooks.extend_from_slice(transition.hooks);
                current = transition.target;
            }
            let restart = from.plan(R::Restart);
            assert_eq!(restart.hooks, hooks.as_slice());
            assert_eq!(restart.target, current);
        }
    }

    #[test]
    fn test_state_string_conversion() {
        assert_eq!(S::Initialised.to_string(), "initialised");
        assert_eq!("started".parse::<S>().unwrap(), S::Started);
        assert_eq!("initialized".parse::<S>().unwrap(), S::Initialised);
        assert!("running".parse::<S>().is_err());
    }

    #[test]
    fn test_state_serde() {
        let json = serde_json::to_string(&S::Stopped).unwrap();
        assert_eq!(json, "\"stopped\"");
        let parsed: S = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, S::Stopped);
    }
}
