//! # Processing Services
//!
//! A [`Service`] is one step of a processing chain. Services own their state and are
//! driven through `&mut self`; concurrency comes from giving each worker its own deep
//! copy of the chain (see [`Service::try_clone`]), never from sharing one.

pub mod builtin;
pub mod chain;

use async_trait::async_trait;
use std::fmt;

use crate::error::{FlowlaneError, Result};
use crate::message::Message;

pub use builtin::{
    AddMetadataService, DelayService, FailingService, LogMessageService, NullService,
    PayloadFromMetadataService,
};
pub use chain::ServiceChain;

#[async_trait]
pub trait Service: Send + Sync + fmt::Debug {
    /// Identifier used in logs and in failures recorded on messages
    fn unique_id(&self) -> &str;

    async fn init(&mut self) -> Result<()> {
        Ok(())
    }

    async fn start(&mut self) -> Result<()> {
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }

    /// Apply this step to the message; an error aborts the rest of the chain
    async fn process(&mut self, message: &mut Message) -> Result<()>;

    /// Independent copy for a worker. Cloning is opt-in: a service that does not
    /// override this cannot be used in a pooled workflow.
    fn try_clone(&self) -> Result<Box<dyn Service>> {
        Err(FlowlaneError::CloneFailure {
            service: self.unique_id().to_string(),
            reason: "service does not provide a copy strategy".to_string(),
        })
    }
}

/// `try_clone` body for services that are plain `Clone` values
pub fn clone_boxed<S>(service: &S) -> Result<Box<dyn Service>>
where
    S: Service + Clone + 'static,
{
    Ok(Box::new(service.clone()))
}
