use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use tracing::{info, warn};

use crate::constants::defaults;
use crate::message::Message;

/// Destination for messages a workflow could not process
#[async_trait]
pub trait MessageErrorHandler: Send + Sync {
    async fn handle_failed_message(&self, message: Message);
}

/// Keeps the most recent failed messages in memory so a host can inspect them or feed
/// them to a [`crate::FailedMessageRetrier`]. When full, the oldest message is dropped.
#[derive(Debug)]
pub struct RetainingErrorHandler {
    capacity: usize,
    messages: Mutex<VecDeque<Message>>,
}

impl Default for RetainingErrorHandler {
    fn default() -> Self {
        Self::new(defaults::RETAINED_FAILURES)
    }
}

impl RetainingErrorHandler {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            messages: Mutex::new(VecDeque::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }

    /// Copies of the retained messages, oldest first
    pub fn failed_messages(&self) -> Vec<Message> {
        self.messages.lock().iter().cloned().collect()
    }

    /// Remove and return every retained message
    pub fn take_failed(&self) -> Vec<Message> {
        self.messages.lock().drain(..).collect()
    }
}

#[async_trait]
impl MessageErrorHandler for RetainingErrorHandler {
    async fn handle_failed_message(&self, message: Message) {
        info!(
            message_id = %message.unique_id(),
            workflow_id = message.workflow_id().unwrap_or("unknown"),
            failures = message.failures().len(),
            "📥 ERROR_HANDLER: Retaining failed message"
        );

        let mut messages = self.messages.lock();
        if messages.len() >= self.capacity {
            if let Some(dropped) = messages.pop_front() {
                warn!(
                    message_id = %dropped.unique_id(),
                    capacity = self.capacity,
                    "📥 ERROR_HANDLER: Capacity reached, dropping oldest failed message"
                );
            }
        }
        messages.push_back(message);
    }
}
