use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use flowlane_core::state_machine::{LifecycleHooks, LifecycleManager, ManagedComponent};
use flowlane_core::transport::{CollectingProducer, ManualConsumer};
use flowlane_core::services::Service;
use flowlane_core::{Message, ProduceFailurePolicy, Result, Workflow};

/// Component with no-op hooks; only the lifecycle manager's bookkeeping is observed
#[derive(Debug, Default)]
pub struct ProbeComponent {
    lifecycle: LifecycleManager,
}

#[async_trait]
impl LifecycleHooks for ProbeComponent {
    fn component_name(&self) -> String {
        "ProbeComponent".to_string()
    }

    async fn on_init(&self) -> Result<()> {
        Ok(())
    }

    async fn on_start(&self) -> Result<()> {
        Ok(())
    }

    async fn on_stop(&self) -> Result<()> {
        Ok(())
    }

    async fn on_close(&self) -> Result<()> {
        Ok(())
    }
}

impl ManagedComponent for ProbeComponent {
    fn lifecycle(&self) -> &LifecycleManager {
        &self.lifecycle
    }
}

/// Service without a copy strategy
#[derive(Debug)]
pub struct UncloneableService;

#[async_trait]
impl Service for UncloneableService {
    fn unique_id(&self) -> &str {
        "uncloneable"
    }

    async fn process(&mut self, _message: &mut Message) -> Result<()> {
        Ok(())
    }
}

/// Lifecycle calls seen by every copy of a [`CountingService`]
#[derive(Debug, Default)]
pub struct ServiceCalls {
    pub start: AtomicU64,
    pub stop: AtomicU64,
    pub close: AtomicU64,
}

impl ServiceCalls {
    pub fn starts(&self) -> u64 {
        self.start.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> u64 {
        self.stop.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> u64 {
        self.close.load(Ordering::SeqCst)
    }
}

/// Cloneable service whose copies share one [`ServiceCalls`]
#[derive(Debug, Clone)]
pub struct CountingService {
    pub calls: Arc<ServiceCalls>,
}

impl CountingService {
    pub fn new() -> (Self, Arc<ServiceCalls>) {
        let calls = Arc::new(ServiceCalls::default());
        (
            Self {
                calls: calls.clone(),
            },
            calls,
        )
    }
}

#[async_trait]
impl Service for CountingService {
    fn unique_id(&self) -> &str {
        "counting"
    }

    async fn start(&mut self) -> Result<()> {
        self.calls.start.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        self.calls.stop.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.calls.close.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn process(&mut self, _message: &mut Message) -> Result<()> {
        Ok(())
    }

    fn try_clone(&self) -> Result<Box<dyn Service>> {
        Ok(Box::new(self.clone()))
    }
}

/// A workflow fed by a manual consumer and writing to a collecting producer
pub struct ManualWorkflow {
    pub workflow: Arc<Workflow>,
    pub consumer: Arc<ManualConsumer>,
    pub producer: Arc<CollectingProducer>,
}

impl ManualWorkflow {
    pub fn new(id: &str, policy: ProduceFailurePolicy) -> Self {
        let consumer = Arc::new(ManualConsumer::new(format!("{id}-in")));
        let producer = Arc::new(CollectingProducer::new(format!("{id}-out")));
        let workflow = Workflow::builder(id)
            .consumer(consumer.clone())
            .producer(producer.clone())
            .produce_failure(policy)
            .build();
        Self {
            workflow,
            consumer,
            producer,
        }
    }
}
