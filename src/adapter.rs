//! # Adapter
//!
//! Top-level container: owns the channels and the [`FailedMessageRetrier`] that knows
//! every workflow in them.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use crate::channel::Channel;
use crate::error::Result;
use crate::registry::FailedMessageRetrier;
use crate::state_machine::{LifecycleHooks, LifecycleManager, ManagedComponent};
use crate::workflow::Workflow;

#[derive(Debug)]
pub struct Adapter {
    id: String,
    lifecycle: LifecycleManager,
    channels: Vec<Arc<Channel>>,
    retrier: Arc<FailedMessageRetrier>,
}

impl Adapter {
    pub fn new(id: impl Into<String>, channels: Vec<Arc<Channel>>) -> Self {
        Self {
            id: id.into(),
            lifecycle: LifecycleManager::new(),
            channels,
            retrier: Arc::new(FailedMessageRetrier::new()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn channels(&self) -> &[Arc<Channel>] {
        &self.channels
    }

    pub fn channel(&self, id: &str) -> Option<&Arc<Channel>> {
        self.channels.iter().find(|channel| channel.id() == id)
    }

    pub fn retrier(&self) -> &Arc<FailedMessageRetrier> {
        &self.retrier
    }

    pub fn workflows(&self) -> impl Iterator<Item = &Arc<Workflow>> {
        self.channels.iter().flat_map(|channel| channel.workflows())
    }
}

#[async_trait]
impl LifecycleHooks for Adapter {
    fn component_name(&self) -> String {
        format!("Adapter[{}]", self.id)
    }

    /// Registers every workflow with the retrier (a duplicate id is fatal), then
    /// initialises the channels
    async fn on_init(&self) -> Result<()> {
        self.retrier.clear();
        self.retrier.add_workflows(self.workflows().cloned())?;
        for channel in &self.channels {
            channel.init().await?;
        }
        Ok(())
    }

    async fn on_start(&self) -> Result<()> {
        for channel in &self.channels {
            channel.start().await?;
        }
        info!(
            adapter = %self.id,
            channels = self.channels.len(),
            workflows = self.retrier.len(),
            "🚀 ADAPTER: Started"
        );
        Ok(())
    }

    async fn on_stop(&self) -> Result<()> {
        for channel in &self.channels {
            if let Err(e) = channel.stop().await {
                warn!(adapter = %self.id, channel = %channel.id(), error = %e, "⚠️ ADAPTER: Channel stop failed");
            }
        }
        Ok(())
    }

    async fn on_close(&self) -> Result<()> {
        for channel in &self.channels {
            if let Err(e) = channel.close().await {
                warn!(adapter = %self.id, channel = %channel.id(), error = %e, "⚠️ ADAPTER: Channel close failed");
            }
        }
        self.retrier.clear();
        Ok(())
    }
}

impl ManagedComponent for Adapter {
    fn lifecycle(&self) -> &LifecycleManager {
        &self.lifecycle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FlowlaneError;
    use crate::state_machine::LifecycleState;

    #[tokio::test]
    async fn test_registers_workflows_on_init() {
        let adapter = Adapter::new(
            "adapter",
            vec![
                Channel::new("c1", vec![Workflow::builder("a").build()]),
                Channel::new("c2", vec![Workflow::builder("b").build()]),
            ],
        );

        adapter.start().await.unwrap();
        assert_eq!(adapter.retrier().workflow_ids(), vec!["a", "b"]);

        adapter.close().await.unwrap();
        assert!(adapter.retrier().is_empty());

        // re-registration after close is not a duplicate
        adapter.start().await.unwrap();
        assert_eq!(adapter.retrier().len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_workflow_ids_abort_init() {
        let adapter = Adapter::new(
            "adapter",
            vec![
                Channel::new("c1", vec![Workflow::builder("same").build()]),
                Channel::new("c2", vec![Workflow::builder("same").build()]),
            ],
        );

        let err = adapter.start().await.unwrap_err();
        assert!(matches!(err, FlowlaneError::DuplicateWorkflow(ref id) if id == "same"));
        assert_eq!(adapter.current_state(), LifecycleState::Closed);
        assert_eq!(adapter.channel("c1").unwrap().current_state(), LifecycleState::Closed);
    }
}
