//! Small general-purpose services.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::info;

use crate::error::{FlowlaneError, Result};
use crate::message::Message;

use super::{clone_boxed, Service};

/// Does nothing
#[derive(Debug, Clone)]
pub struct NullService {
    id: String,
}

impl NullService {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

#[async_trait]
impl Service for NullService {
    fn unique_id(&self) -> &str {
        &self.id
    }

    async fn process(&mut self, _message: &mut Message) -> Result<()> {
        Ok(())
    }

    fn try_clone(&self) -> Result<Box<dyn Service>> {
        clone_boxed(self)
    }
}

/// Adds fixed metadata entries, overwriting existing keys
#[derive(Debug, Clone)]
pub struct AddMetadataService {
    id: String,
    entries: BTreeMap<String, String>,
}

impl AddMetadataService {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entries: BTreeMap::new(),
        }
    }

    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }
}

#[async_trait]
impl Service for AddMetadataService {
    fn unique_id(&self) -> &str {
        &self.id
    }

    async fn process(&mut self, message: &mut Message) -> Result<()> {
        for (key, value) in &self.entries {
            message.add_metadata(key.clone(), value.clone());
        }
        Ok(())
    }

    fn try_clone(&self) -> Result<Box<dyn Service>> {
        clone_boxed(self)
    }
}

/// Always fails with the configured reason
#[derive(Debug, Clone)]
pub struct FailingService {
    id: String,
    reason: String,
}

impl FailingService {
    pub fn new(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Service for FailingService {
    fn unique_id(&self) -> &str {
        &self.id
    }

    async fn process(&mut self, _message: &mut Message) -> Result<()> {
        Err(FlowlaneError::processing(&self.id, &self.reason))
    }

    fn try_clone(&self) -> Result<Box<dyn Service>> {
        clone_boxed(self)
    }
}

/// Logs the message id, metadata and (optionally) payload at info level
#[derive(Debug, Clone)]
pub struct LogMessageService {
    id: String,
    include_payload: bool,
}

impl LogMessageService {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            include_payload: false,
        }
    }

    pub fn including_payload(mut self) -> Self {
        self.include_payload = true;
        self
    }
}

#[async_trait]
impl Service for LogMessageService {
    fn unique_id(&self) -> &str {
        &self.id
    }

    async fn process(&mut self, message: &mut Message) -> Result<()> {
        if self.include_payload {
            info!(
                service = %self.id,
                message_id = %message.unique_id(),
                metadata = ?message.metadata(),
                payload = %message.payload_str(),
                "📨 MESSAGE"
            );
        } else {
            info!(
                service = %self.id,
                message_id = %message.unique_id(),
                metadata = ?message.metadata(),
                "📨 MESSAGE"
            );
        }
        Ok(())
    }

    fn try_clone(&self) -> Result<Box<dyn Service>> {
        clone_boxed(self)
    }
}

/// Replaces the payload with the value of a metadata key
#[derive(Debug, Clone)]
pub struct PayloadFromMetadataService {
    id: String,
    key: String,
}

impl PayloadFromMetadataService {
    pub fn new(id: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            key: key.into(),
        }
    }
}

#[async_trait]
impl Service for PayloadFromMetadataService {
    fn unique_id(&self) -> &str {
        &self.id
    }

    async fn process(&mut self, message: &mut Message) -> Result<()> {
        let value = message
            .metadata_value(&self.key)
            .map(str::to_owned)
            .ok_or_else(|| {
                FlowlaneError::processing(&self.id, format!("metadata key '{}' not present", self.key))
            })?;
        message.set_payload(value);
        Ok(())
    }

    fn try_clone(&self) -> Result<Box<dyn Service>> {
        clone_boxed(self)
    }
}

/// Sleeps for a fixed time; simulates slow processing
#[derive(Debug, Clone)]
pub struct DelayService {
    id: String,
    delay: Duration,
}

impl DelayService {
    pub fn new(id: impl Into<String>, delay: Duration) -> Self {
        Self {
            id: id.into(),
            delay,
        }
    }
}

#[async_trait]
impl Service for DelayService {
    fn unique_id(&self) -> &str {
        &self.id
    }

    async fn process(&mut self, _message: &mut Message) -> Result<()> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }

    fn try_clone(&self) -> Result<Box<dyn Service>> {
        clone_boxed(self)
    }
}
