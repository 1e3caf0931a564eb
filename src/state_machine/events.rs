use serde::{Deserialize, Serialize};
use std::fmt;

use super::states::LifecycleState;

/// Transition requests accepted by every managed component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleRequest {
    Init,
    Start,
    Stop,
    Close,
    /// Stop-if-applicable, close-if-applicable, init, start
    Restart,
}

impl LifecycleRequest {
    /// The primitive requests a restart is delegated to, in order
    pub const RESTART_SEQUENCE: [LifecycleRequest; 4] =
        [Self::Stop, Self::Close, Self::Init, Self::Start];

    /// Get a string representation of the request for logging
    pub fn request_type(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Close => "close",
            Self::Restart => "restart",
        }
    }
}

impl fmt::Display for LifecycleRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.request_type())
    }
}

/// The underlying component hook a transition invokes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleHook {
    Init,
    Start,
    Stop,
    Close,
}

impl LifecycleHook {
    /// State the component is in once this hook has completed
    pub fn resulting_state(&self) -> LifecycleState {
        match self {
            Self::Init => LifecycleState::Initialised,
            Self::Start => LifecycleState::Started,
            Self::Stop => LifecycleState::Stopped,
            Self::Close => LifecycleState::Closed,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Close => "close",
        }
    }
}
