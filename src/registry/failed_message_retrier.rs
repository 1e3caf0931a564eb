//! # Failed Message Retrier
//!
//! Registry of workflows by id, used to resubmit failed messages to the workflow they
//! failed in. Messages carry that id in their `workflowId` metadata, written by the
//! workflow when a processing step fails.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use flowlane_core::registry::FailedMessageRetrier;
//! use flowlane_core::workflow::{RetainingErrorHandler, Workflow};
//! use std::sync::Arc;
//!
//! # async fn example() -> flowlane_core::Result<()> {
//! let handler = Arc::new(RetainingErrorHandler::default());
//! let workflow = Workflow::builder("orders").error_handler(handler.clone()).build();
//!
//! let retrier = FailedMessageRetrier::new();
//! retrier.add_workflow(workflow)?;
//!
//! for message in handler.take_failed() {
//!     retrier.retry(message).await?;
//! }
//! # Ok(())
//! # }
//! ```

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::constants::metadata_keys;
use crate::error::{FlowlaneError, Result};
use crate::message::Message;
use crate::transport::MessageListener;
use crate::workflow::Workflow;

#[derive(Debug, Default)]
pub struct FailedMessageRetrier {
    workflows: DashMap<String, Arc<Workflow>>,
}

impl FailedMessageRetrier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a workflow under its id; an id that is already registered is rejected
    /// and the existing entry kept
    pub fn add_workflow(&self, workflow: Arc<Workflow>) -> Result<()> {
        match self.workflows.entry(workflow.id().to_string()) {
            Entry::Occupied(existing) => Err(FlowlaneError::DuplicateWorkflow(existing.key().clone())),
            Entry::Vacant(slot) => {
                debug!(workflow = %workflow.id(), "🗂️ RETRIER: Registered workflow");
                slot.insert(workflow);
                Ok(())
            }
        }
    }

    /// Register several workflows, stopping at the first duplicate
    pub fn add_workflows<I>(&self, workflows: I) -> Result<()>
    where
        I: IntoIterator<Item = Arc<Workflow>>,
    {
        workflows
            .into_iter()
            .try_for_each(|workflow| self.add_workflow(workflow))
    }

    pub fn remove_workflow(&self, id: &str) -> Option<Arc<Workflow>> {
        self.workflows.remove(id).map(|(_, workflow)| workflow)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.workflows.contains_key(id)
    }

    pub fn workflow(&self, id: &str) -> Option<Arc<Workflow>> {
        self.workflows.get(id).map(|entry| entry.value().clone())
    }

    /// Registered ids, sorted
    pub fn workflow_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.workflows.iter().map(|entry| entry.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.workflows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workflows.is_empty()
    }

    pub fn clear(&self) {
        self.workflows.clear();
    }

    /// Resubmit a message to the workflow named in its `workflowId` metadata
    pub async fn retry(&self, message: Message) -> Result<()> {
        let id = message
            .workflow_id()
            .map(str::to_owned)
            .ok_or_else(|| FlowlaneError::UnknownWorkflow(String::new()))?;
        self.retry_to(&id, message).await
    }

    /// Resubmit a message to a specific workflow
    pub async fn retry_to(&self, id: &str, mut message: Message) -> Result<()> {
        let workflow = self
            .workflow(id)
            .ok_or_else(|| FlowlaneError::UnknownWorkflow(id.to_string()))?;

        message.add_metadata(metadata_keys::MESSAGE_RETRIED, "true");
        info!(workflow = %id, message_id = %message.unique_id(), "🗂️ RETRIER: Retrying message");
        workflow.on_message(message).await
    }
}
