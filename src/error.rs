use crate::state_machine::LifecycleState;

/// Crate-wide error type.
///
/// Fatal kinds (see [`FlowlaneError::is_fatal`]) abort startup or registration and are
/// never retried. Everything else is scoped to a single message or a single call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FlowlaneError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Duplicate workflow id: {0}")]
    DuplicateWorkflow(String),

    #[error("Service '{service}' cannot be cloned: {reason}")]
    CloneFailure { service: String, reason: String },

    #[error("Worker pool startup failed: {0}")]
    PoolStartup(String),

    #[error("{component} is {current}, expected {expected}")]
    OutOfState {
        component: String,
        current: LifecycleState,
        expected: LifecycleState,
    },

    #[error("Processing error in service '{service}': {message}")]
    ProcessingError { service: String, message: String },

    #[error("Produce error: {0}")]
    ProduceError(String),

    #[error("Worker pool exhausted: {0}")]
    PoolExhausted(String),

    #[error("Worker pool illegal state: {0}")]
    PoolIllegalState(String),

    #[error("Lifecycle error in {component}: {message}")]
    LifecycleError { component: String, message: String },

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("No workflow registered with id '{0}'")]
    UnknownWorkflow(String),
}

impl FlowlaneError {
    /// Fatal configuration errors prevent a component from reaching `Started`
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConfigurationError(_)
                | Self::DuplicateWorkflow(_)
                | Self::CloneFailure { .. }
                | Self::PoolStartup(_)
        )
    }

    pub fn processing(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProcessingError {
            service: service.into(),
            message: message.into(),
        }
    }

    pub fn lifecycle(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::LifecycleError {
            component: component.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FlowlaneError>;
