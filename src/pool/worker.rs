use async_trait::async_trait;
use std::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{FlowlaneError, Result};
use crate::services::ServiceChain;

/// A private copy of a workflow's processing chain, owned by exactly one pool
#[derive(Debug)]
pub struct Worker {
    id: Uuid,
    chain: ServiceChain,
    created_at: Instant,
    borrow_count: u64,
}

impl Worker {
    pub fn new(chain: ServiceChain) -> Self {
        Self {
            id: Uuid::new_v4(),
            chain,
            created_at: Instant::now(),
            borrow_count: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn chain(&self) -> &ServiceChain {
        &self.chain
    }

    pub fn chain_mut(&mut self) -> &mut ServiceChain {
        &mut self.chain
    }

    pub fn age(&self) -> std::time::Duration {
        self.created_at.elapsed()
    }

    pub fn borrow_count(&self) -> u64 {
        self.borrow_count
    }

    pub(crate) fn mark_borrowed(&mut self) {
        self.borrow_count += 1;
    }

    pub(crate) fn into_chain(self) -> ServiceChain {
        self.chain
    }
}

/// Creates and maintains the workers of a [`super::WorkerPool`]
#[async_trait]
pub trait WorkerFactory: Send + Sync {
    /// New, started worker. Errors that are fatal (see
    /// [`FlowlaneError::is_fatal`]) abort pool startup.
    async fn make_object(&self) -> Result<Worker>;

    /// Called before a worker is handed to a borrower
    async fn activate_object(&self, _worker: &mut Worker) -> Result<()> {
        Ok(())
    }

    /// Called when a worker goes back to the idle set
    async fn passivate_object(&self, _worker: &mut Worker) -> Result<()> {
        Ok(())
    }

    /// Called on idle workers when the owning workflow stops; the next
    /// `activate_object` brings the worker back
    async fn suspend_object(&self, _worker: &mut Worker) -> Result<()> {
        Ok(())
    }

    fn validate_object(&self, worker: &Worker) -> bool {
        worker.chain().is_usable()
    }

    async fn destroy_object(&self, worker: Worker) -> Result<()>;
}

/// Builds workers by deep-cloning a template chain
#[derive(Debug)]
pub struct ChainWorkerFactory {
    template: ServiceChain,
}

impl ChainWorkerFactory {
    /// Fails when the template contains a service that cannot be cloned, so an unusable
    /// template is rejected before any worker is needed
    pub fn new(template: &ServiceChain) -> Result<Self> {
        let template = template.try_clone()?;
        Ok(Self { template })
    }

    pub fn template(&self) -> &ServiceChain {
        &self.template
    }
}

#[async_trait]
impl WorkerFactory for ChainWorkerFactory {
    async fn make_object(&self) -> Result<Worker> {
        let mut chain = self.template.try_clone().map_err(|e| match e {
            FlowlaneError::CloneFailure { service, reason } => FlowlaneError::CloneFailure {
                service,
                reason: format!("cannot create worker for chain '{}': {reason}", self.template.id()),
            },
            other => other,
        })?;
        chain.start().await?;

        let worker = Worker::new(chain);
        debug!(worker_id = %worker.id(), chain = %self.template.id(), "🏊 POOL: Worker created");
        Ok(worker)
    }

    async fn activate_object(&self, worker: &mut Worker) -> Result<()> {
        // a worker whose chain was stopped is brought back before use
        worker.chain_mut().start().await
    }

    async fn suspend_object(&self, worker: &mut Worker) -> Result<()> {
        worker.chain_mut().stop().await
    }

    async fn destroy_object(&self, worker: Worker) -> Result<()> {
        let id = worker.id();
        let mut chain = worker.into_chain();
        if let Err(e) = chain.close().await {
            warn!(worker_id = %id, error = %e, "⚠️ POOL: Worker close failed");
            return Err(e);
        }
        debug!(worker_id = %id, "🏊 POOL: Worker destroyed");
        Ok(())
    }
}
