//! # Channel
//!
//! Group of workflows sharing one lifecycle. A workflow whose produce-failure policy
//! is `RestartChannel` restarts its owning channel, and with it every sibling.

use async_trait::async_trait;
use std::sync::{Arc, Weak};
use tracing::{info, warn};

use crate::error::Result;
use crate::logging::log_error;
use crate::state_machine::{LifecycleHooks, LifecycleManager, ManagedComponent};
use crate::workflow::Workflow;

#[derive(Debug)]
pub struct Channel {
    id: String,
    lifecycle: LifecycleManager,
    workflows: Vec<Arc<Workflow>>,
}

impl Channel {
    /// Create the channel and make it the owner of every workflow
    pub fn new(id: impl Into<String>, workflows: Vec<Arc<Workflow>>) -> Arc<Self> {
        Arc::new_cyclic(|self_ref: &Weak<Channel>| {
            for workflow in &workflows {
                workflow.bind_owner(self_ref.clone());
            }
            Self {
                id: id.into(),
                lifecycle: LifecycleManager::new(),
                workflows,
            }
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn workflows(&self) -> &[Arc<Workflow>] {
        &self.workflows
    }

    pub fn workflow(&self, id: &str) -> Option<&Arc<Workflow>> {
        self.workflows.iter().find(|workflow| workflow.id() == id)
    }
}

#[async_trait]
impl LifecycleHooks for Channel {
    fn component_name(&self) -> String {
        format!("Channel[{}]", self.id)
    }

    async fn on_init(&self) -> Result<()> {
        for workflow in &self.workflows {
            workflow.init().await?;
        }
        Ok(())
    }

    async fn on_start(&self) -> Result<()> {
        for workflow in &self.workflows {
            workflow.start().await?;
        }
        info!(channel = %self.id, workflows = self.workflows.len(), "📡 CHANNEL: Started");
        Ok(())
    }

    // stop and close reach every workflow even when one of them fails
    async fn on_stop(&self) -> Result<()> {
        for workflow in &self.workflows {
            if let Err(e) = workflow.stop().await {
                log_error(&self.component_name(), "stop workflow", &e.to_string(), Some(workflow.id()));
            }
        }
        Ok(())
    }

    async fn on_close(&self) -> Result<()> {
        for workflow in &self.workflows {
            if let Err(e) = workflow.close().await {
                warn!(channel = %self.id, workflow = %workflow.id(), error = %e, "📡 CHANNEL: Workflow close failed");
            }
        }
        Ok(())
    }
}

impl ManagedComponent for Channel {
    fn lifecycle(&self) -> &LifecycleManager {
        &self.lifecycle
    }
}
