use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::PoolConfig;

/// What a workflow does when its producer fails to deliver a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProduceFailurePolicy {
    /// Log and carry on
    #[default]
    Null,
    /// Restart the workflow that failed to produce
    RestartWorkflow,
    /// Restart the channel owning the workflow (and so all of its workflows)
    RestartChannel,
}

impl fmt::Display for ProduceFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::RestartWorkflow => write!(f, "restart_workflow"),
            Self::RestartChannel => write!(f, "restart_channel"),
        }
    }
}

/// What a workflow does after a processing step fails a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingErrorPolicy {
    /// Hand the message to the error handler; the workflow keeps running
    #[default]
    Record,
    /// Hand the message to the error handler, then stop the workflow
    StopWorkflow,
}

/// How a workflow runs its processing chain
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProcessingMode {
    /// One chain, one message at a time
    #[default]
    SingleThreaded,
    /// Messages run concurrently on copies of the chain borrowed from a worker pool
    Pooled(PoolConfig),
}

impl ProcessingMode {
    pub fn is_pooled(&self) -> bool {
        matches!(self, Self::Pooled(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_serde_names() {
        let policy: ProduceFailurePolicy = serde_json::from_str("\"restart_channel\"").unwrap();
        assert_eq!(policy, ProduceFailurePolicy::RestartChannel);
        assert_eq!(policy.to_string(), "restart_channel");

        let policy: ProcessingErrorPolicy = serde_json::from_str("\"stop_workflow\"").unwrap();
        assert_eq!(policy, ProcessingErrorPolicy::StopWorkflow);
        assert_eq!(ProduceFailurePolicy::default(), ProduceFailurePolicy::Null);
    }
}
