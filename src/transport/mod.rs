//! # Transport Interfaces
//!
//! Consumers bring messages in, producers send them out. Concrete transports live
//! outside this crate; [`memory`] provides in-process implementations used by the
//! demo binary and tests.

pub mod memory;

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::message::Message;

pub use memory::{CollectingProducer, ManualConsumer, NullProducer, TriggerSource};

/// Receiver of consumed messages; implemented by workflows
#[async_trait]
pub trait MessageListener: Send + Sync {
    fn listener_id(&self) -> String;

    /// `Ok` means the message was accepted. Processing and delivery failures after
    /// acceptance are handled by the listener's own policies.
    async fn on_message(&self, message: Message) -> Result<()>;
}

/// Message source.
///
/// Lifecycle calls are made by the owning workflow, which guarantees they follow the
/// transition table; implementations do not need their own guard.
#[async_trait]
pub trait Consumer: Send + Sync + fmt::Debug {
    fn unique_id(&self) -> &str;

    async fn init(&self) -> Result<()> {
        Ok(())
    }

    /// Begin delivering to `listener`
    async fn start(&self, listener: Arc<dyn MessageListener>) -> Result<()>;

    /// Stop delivering; must not return while a delivery is still in progress
    async fn stop(&self) -> Result<()>;

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Message destination
#[async_trait]
pub trait Producer: Send + Sync + fmt::Debug {
    fn unique_id(&self) -> &str;

    async fn init(&self) -> Result<()> {
        Ok(())
    }

    async fn start(&self) -> Result<()> {
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }

    /// Fails with [`crate::FlowlaneError::ProduceError`] when delivery is impossible
    async fn produce(&self, message: &Message) -> Result<()>;
}
