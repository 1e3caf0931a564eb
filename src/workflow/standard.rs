use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::Mutex as ChainLock;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use crate::channel::Channel;
use crate::config::RuntimeConfig;
use crate::constants::{defaults, metadata_keys};
use crate::error::{FlowlaneError, Result};
use crate::logging::log_error;
use crate::message::Message;
use crate::pool::{BorrowedWorker, ChainWorkerFactory, PoolStatus, WorkerPool};
use crate::services::{Service, ServiceChain};
use crate::state_machine::{
    LifecycleHooks, LifecycleManager, ManagedComponent, OutOfStateHandler,
};
use crate::transport::{Consumer, ManualConsumer, MessageListener, NullProducer, Producer};

use super::error_handler::MessageErrorHandler;
use super::policy::{ProcessingErrorPolicy, ProcessingMode, ProduceFailurePolicy};

#[derive(Debug, Default)]
struct Counters {
    received: AtomicU64,
    rejected: AtomicU64,
    processed: AtomicU64,
    failed: AtomicU64,
    produced: AtomicU64,
    produce_failures: AtomicU64,
}

/// Message counters for one workflow since construction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WorkflowStats {
    /// Messages handed to the workflow by its consumer
    pub received: u64,
    /// Messages refused because the workflow was not started
    pub rejected: u64,
    /// Messages the chain completed
    pub processed: u64,
    /// Messages a processing step failed
    pub failed: u64,
    pub produced: u64,
    pub produce_failures: u64,
}

/// Consumer, processing chain and producer wired together under one lifecycle.
///
/// Lifecycle requests cascade to the parts in a fixed order:
///
/// | request | order |
/// |---------|-------|
/// | init    | producer, chain, consumer |
/// | start   | producer, chain or worker pool, consumer |
/// | stop    | consumer, in-flight messages, chain, producer |
/// | close   | consumer, worker pool, chain, producer |
///
/// Restarts triggered by a failed delivery run on a detached task so the consumer
/// delivering the message can be stopped without waiting on itself.
pub struct Workflow {
    id: String,
    lifecycle: LifecycleManager,
    consumer: Arc<dyn Consumer>,
    producer: Arc<dyn Producer>,
    chain: ChainLock<ServiceChain>,
    mode: ProcessingMode,
    pool: RwLock<Option<Arc<WorkerPool>>>,
    in_flight: Mutex<JoinSet<()>>,
    // copies of messages handed to pooled tasks that have not finished processing
    unfinished: Mutex<HashMap<u64, Message>>,
    dispatch_seq: AtomicU64,
    out_of_state: OutOfStateHandler,
    produce_failure: ProduceFailurePolicy,
    processing_errors: ProcessingErrorPolicy,
    error_handler: Option<Arc<dyn MessageErrorHandler>>,
    shutdown_timeout: Duration,
    owner: RwLock<Weak<Channel>>,
    pending_transition: Mutex<Option<JoinHandle<Result<()>>>>,
    counters: Counters,
    self_ref: Weak<Workflow>,
}

impl std::fmt::Debug for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workflow")
            .field("id", &self.id)
            .field("state", &self.lifecycle.current_state())
            .field("consumer", &self.consumer.unique_id())
            .field("producer", &self.producer.unique_id())
            .field("mode", &self.mode)
            .field("produce_failure", &self.produce_failure)
            .finish()
    }
}

impl Workflow {
    pub fn builder(id: impl Into<String>) -> WorkflowBuilder {
        WorkflowBuilder::new(id)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn mode(&self) -> &ProcessingMode {
        &self.mode
    }

    pub fn produce_failure_policy(&self) -> ProduceFailurePolicy {
        self.produce_failure
    }

    pub fn stats(&self) -> WorkflowStats {
        let c = &self.counters;
        WorkflowStats {
            received: c.received.load(Ordering::Acquire),
            rejected: c.rejected.load(Ordering::Acquire),
            processed: c.processed.load(Ordering::Acquire),
            failed: c.failed.load(Ordering::Acquire),
            produced: c.produced.load(Ordering::Acquire),
            produce_failures: c.produce_failures.load(Ordering::Acquire),
        }
    }

    /// Status of the worker pool while a pooled workflow is started
    pub fn pool_status(&self) -> Option<PoolStatus> {
        self.pool.read().as_ref().map(|pool| pool.status())
    }

    pub fn owner(&self) -> Option<Arc<Channel>> {
        self.owner.read().upgrade()
    }

    pub(crate) fn bind_owner(&self, channel: Weak<Channel>) {
        *self.owner.write() = channel;
    }

    /// Wait for the restart or stop most recently scheduled by a failure policy.
    /// Returns `None` when nothing was scheduled since the last call.
    pub async fn wait_for_pending_transition(&self) -> Option<Result<()>> {
        let handle = self.pending_transition.lock().take()?;
        Some(match handle.await {
            Ok(result) => result,
            Err(e) => Err(FlowlaneError::lifecycle(self.component_name(), e.to_string())),
        })
    }

    async fn process_single(&self, mut message: Message) {
        let outcome = {
            let mut chain = self.chain.lock().await;
            chain.process(&mut message).await
        };
        self.complete(message, outcome).await;
    }

    async fn dispatch_pooled(&self, message: Message) -> Result<()> {
        let pool = self.pool.read().clone().ok_or_else(|| {
            FlowlaneError::PoolIllegalState(format!("{} has no worker pool", self.component_name()))
        })?;

        // waiting here is the backpressure on the consumer
        let borrowed = pool.borrow().await?;

        let Some(workflow) = self.self_ref.upgrade() else {
            pool.return_worker(borrowed).await?;
            return Err(FlowlaneError::lifecycle(self.component_name(), "workflow dropped"));
        };

        let seq = self.dispatch_seq.fetch_add(1, Ordering::AcqRel);
        self.unfinished.lock().insert(seq, message.clone());

        let mut in_flight = self.in_flight.lock();
        while in_flight.try_join_next().is_some() {}
        in_flight.spawn(async move {
            workflow.process_on_worker(pool, borrowed, seq, message).await;
        });
        Ok(())
    }

    async fn process_on_worker(
        &self,
        pool: Arc<WorkerPool>,
        mut borrowed: BorrowedWorker,
        seq: u64,
        mut message: Message,
    ) {
        let outcome = borrowed.worker_mut().chain_mut().process(&mut message).await;
        self.unfinished.lock().remove(&seq);

        let returned = if pool.validate(&borrowed) {
            pool.return_worker(borrowed).await
        } else {
            pool.invalidate(borrowed).await
        };
        if let Err(e) = returned {
            log_error(&self.component_name(), "return_worker", &e.to_string(), Some(pool.name()));
        }

        self.complete(message, outcome).await;
    }

    async fn complete(&self, message: Message, outcome: Result<()>) {
        match outcome {
            Ok(()) => {
                self.counters.processed.fetch_add(1, Ordering::AcqRel);
                self.deliver(message).await;
            }
            Err(e) => self.handle_processing_error(message, e).await,
        }
    }

    async fn deliver(&self, message: Message) {
        match self.producer.produce(&message).await {
            Ok(()) => {
                self.counters.produced.fetch_add(1, Ordering::AcqRel);
            }
            Err(e) => {
                self.counters.produce_failures.fetch_add(1, Ordering::AcqRel);
                log_error(
                    &self.component_name(),
                    "produce",
                    &e.to_string(),
                    Some(format!("message {} policy {}", message.unique_id(), self.produce_failure).as_str()),
                );
                self.handle_produce_failure();
            }
        }
    }

    fn handle_produce_failure(&self) {
        match self.produce_failure {
            ProduceFailurePolicy::Null => {
                debug!(workflow = %self.id, "🔁 RECOVERY: Produce failure ignored");
            }
            ProduceFailurePolicy::RestartWorkflow => self.schedule_restart_workflow(),
            ProduceFailurePolicy::RestartChannel => match self.owner() {
                Some(channel) => {
                    info!(workflow = %self.id, channel = %channel.id(), "🔁 RECOVERY: Restarting channel");
                    self.schedule(async move { channel.restart().await });
                }
                None => {
                    warn!(
                        workflow = %self.id,
                        "🔁 RECOVERY: No owning channel, restarting workflow instead"
                    );
                    self.schedule_restart_workflow();
                }
            },
        }
    }

    fn schedule_restart_workflow(&self) {
        if let Some(workflow) = self.self_ref.upgrade() {
            info!(workflow = %self.id, "🔁 RECOVERY: Restarting workflow");
            self.schedule(async move { workflow.restart().await });
        }
    }

    // At most one pending transition; failures while one is outstanding are covered by it
    fn schedule<F>(&self, transition: F)
    where
        F: std::future::Future<Output = Result<()>> + Send + 'static,
    {
        let mut pending = self.pending_transition.lock();
        if pending.as_ref().is_some_and(|handle| !handle.is_finished()) {
            debug!(workflow = %self.id, "🔁 RECOVERY: Transition already pending");
            return;
        }
        *pending = Some(tokio::spawn(transition));
    }

    async fn handle_processing_error(&self, message: Message, error: FlowlaneError) {
        self.record_failed(message, &error).await;

        if self.processing_errors == ProcessingErrorPolicy::StopWorkflow {
            if let Some(workflow) = self.self_ref.upgrade() {
                warn!(workflow = %self.id, "🔁 RECOVERY: Stopping workflow after processing error");
                self.schedule(async move { workflow.stop().await });
            }
        }
    }

    async fn record_failed(&self, mut message: Message, error: &FlowlaneError) {
        self.counters.failed.fetch_add(1, Ordering::AcqRel);
        message.add_metadata(metadata_keys::WORKFLOW_ID, self.id.clone());
        log_error(
            &self.component_name(),
            "process",
            &error.to_string(),
            Some(format!("message {}", message.unique_id()).as_str()),
        );

        if let Some(handler) = &self.error_handler {
            handler.handle_failed_message(message).await;
        }
    }

    async fn drain_in_flight(&self) {
        let mut in_flight = std::mem::take(&mut *self.in_flight.lock());
        if in_flight.is_empty() {
            return;
        }

        let count = in_flight.len();
        debug!(workflow = %self.id, in_flight = count, "Draining in-flight messages");
        let drained = tokio::time::timeout(self.shutdown_timeout, async {
            while in_flight.join_next().await.is_some() {}
        })
        .await;

        if drained.is_err() {
            warn!(
                workflow = %self.id,
                remaining = in_flight.len(),
                timeout_ms = self.shutdown_timeout.as_millis() as u64,
                "In-flight messages did not finish before shutdown timeout, aborting"
            );
            in_flight.abort_all();
            while in_flight.join_next().await.is_some() {}

            let aborted: Vec<Message> = self.unfinished.lock().drain().map(|(_, m)| m).collect();
            for mut message in aborted {
                let error = FlowlaneError::Timeout(format!(
                    "processing aborted after {}ms shutdown timeout",
                    self.shutdown_timeout.as_millis()
                ));
                message.record_failure(self.component_name(), error.to_string());
                self.record_failed(message, &error).await;
            }
        }
    }

    fn listener(&self) -> Result<Arc<dyn MessageListener>> {
        let workflow = self
            .self_ref
            .upgrade()
            .ok_or_else(|| FlowlaneError::lifecycle(self.component_name(), "workflow dropped"))?;
        Ok(workflow)
    }

    fn note_failure(&self, step: &str, result: Result<()>) {
        if let Err(e) = result {
            log_error(&self.component_name(), step, &e.to_string(), None);
        }
    }
}

#[async_trait]
impl LifecycleHooks for Workflow {
    fn component_name(&self) -> String {
        format!("Workflow[{}]", self.id)
    }

    async fn on_init(&self) -> Result<()> {
        self.producer.init().await?;
        match &self.mode {
            ProcessingMode::SingleThreaded => self.chain.lock().await.init().await?,
            ProcessingMode::Pooled(config) => {
                config.validate()?;
                // reject an uncloneable chain before the workflow can start
                let chain = self.chain.lock().await;
                ChainWorkerFactory::new(&chain)?;
            }
        }
        self.consumer.init().await
    }

    async fn on_start(&self) -> Result<()> {
        self.producer.start().await?;
        match &self.mode {
            ProcessingMode::SingleThreaded => self.chain.lock().await.start().await?,
            ProcessingMode::Pooled(config) => {
                let has_pool = self.pool.read().is_some();
                if !has_pool {
                    let factory = {
                        let chain = self.chain.lock().await;
                        ChainWorkerFactory::new(&chain)?
                    };
                    let pool =
                        WorkerPool::start(self.id.clone(), config.clone(), Arc::new(factory)).await?;
                    *self.pool.write() = Some(Arc::new(pool));
                }
            }
        }
        self.consumer.start(self.listener()?).await
    }

    async fn on_stop(&self) -> Result<()> {
        self.note_failure("stop consumer", self.consumer.stop().await);
        self.drain_in_flight().await;
        let pool = self.pool.read().clone();
        if let Some(pool) = pool {
            pool.stop_idle().await;
        }
        let chain_stopped = self.chain.lock().await.stop().await;
        self.note_failure("stop chain", chain_stopped);
        self.note_failure("stop producer", self.producer.stop().await);
        Ok(())
    }

    async fn on_close(&self) -> Result<()> {
        self.note_failure("close consumer", self.consumer.close().await);
        let pool = self.pool.write().take();
        if let Some(pool) = pool {
            pool.close().await;
        }
        let chain_closed = self.chain.lock().await.close().await;
        self.note_failure("close chain", chain_closed);
        self.note_failure("close producer", self.producer.close().await);
        Ok(())
    }
}

impl ManagedComponent for Workflow {
    fn lifecycle(&self) -> &LifecycleManager {
        &self.lifecycle
    }
}

#[async_trait]
impl MessageListener for Workflow {
    fn listener_id(&self) -> String {
        self.id.clone()
    }

    async fn on_message(&self, message: Message) -> Result<()> {
        self.counters.received.fetch_add(1, Ordering::AcqRel);

        if let Err(e) = self
            .out_of_state
            .ensure(&self.lifecycle, &self.component_name())
            .await
        {
            self.counters.rejected.fetch_add(1, Ordering::AcqRel);
            warn!(
                workflow = %self.id,
                message_id = %message.unique_id(),
                error = %e,
                "⏳ OUT_OF_STATE: Message not processed"
            );
            return Err(e);
        }

        match &self.mode {
            ProcessingMode::SingleThreaded => {
                self.process_single(message).await;
                Ok(())
            }
            ProcessingMode::Pooled(_) => self.dispatch_pooled(message).await,
        }
    }
}

/// Assembles a [`Workflow`].
///
/// Unset parts default to a [`ManualConsumer`], a [`NullProducer`], an empty chain and
/// single-threaded processing.
pub struct WorkflowBuilder {
    id: String,
    consumer: Option<Arc<dyn Consumer>>,
    producer: Option<Arc<dyn Producer>>,
    chain: ServiceChain,
    mode: ProcessingMode,
    out_of_state: OutOfStateHandler,
    produce_failure: ProduceFailurePolicy,
    processing_errors: ProcessingErrorPolicy,
    error_handler: Option<Arc<dyn MessageErrorHandler>>,
    shutdown_timeout: Duration,
}

impl WorkflowBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            chain: ServiceChain::new(format!("{id}-chain")),
            id,
            consumer: None,
            producer: None,
            mode: ProcessingMode::SingleThreaded,
            out_of_state: OutOfStateHandler::default(),
            produce_failure: ProduceFailurePolicy::default(),
            processing_errors: ProcessingErrorPolicy::default(),
            error_handler: None,
            shutdown_timeout: Duration::from_millis(defaults::SHUTDOWN_TIMEOUT_MS),
        }
    }

    /// Take the policies and timeouts from loaded configuration. The pool section is
    /// applied only to workflows already set to pooled mode.
    pub fn with_config(mut self, config: &RuntimeConfig) -> Self {
        self.out_of_state = OutOfStateHandler::from(&config.out_of_state);
        self.produce_failure = config.produce_failure;
        self.processing_errors = config.processing_errors;
        self.shutdown_timeout = config.shutdown_timeout();
        if self.mode.is_pooled() {
            self.mode = ProcessingMode::Pooled(config.pool.clone());
        }
        self
    }

    pub fn consumer(mut self, consumer: Arc<dyn Consumer>) -> Self {
        self.consumer = Some(consumer);
        self
    }

    pub fn producer(mut self, producer: Arc<dyn Producer>) -> Self {
        self.producer = Some(producer);
        self
    }

    pub fn chain(mut self, chain: ServiceChain) -> Self {
        self.chain = chain;
        self
    }

    pub fn service(mut self, service: impl Service + 'static) -> Self {
        self.chain.push(Box::new(service));
        self
    }

    pub fn mode(mut self, mode: ProcessingMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn out_of_state(mut self, handler: OutOfStateHandler) -> Self {
        self.out_of_state = handler;
        self
    }

    pub fn produce_failure(mut self, policy: ProduceFailurePolicy) -> Self {
        self.produce_failure = policy;
        self
    }

    pub fn processing_errors(mut self, policy: ProcessingErrorPolicy) -> Self {
        self.processing_errors = policy;
        self
    }

    pub fn error_handler(mut self, handler: Arc<dyn MessageErrorHandler>) -> Self {
        self.error_handler = Some(handler);
        self
    }

    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn build(self) -> Arc<Workflow> {
        let consumer = self
            .consumer
            .unwrap_or_else(|| Arc::new(ManualConsumer::new(format!("{}-consumer", self.id))));
        let producer = self
            .producer
            .unwrap_or_else(|| Arc::new(NullProducer::new(format!("{}-producer", self.id))));

        Arc::new_cyclic(|self_ref| Workflow {
            id: self.id,
            lifecycle: LifecycleManager::new(),
            consumer,
            producer,
            chain: ChainLock::new(self.chain),
            mode: self.mode,
            pool: RwLock::new(None),
            in_flight: Mutex::new(JoinSet::new()),
            unfinished: Mutex::new(HashMap::new()),
            dispatch_seq: AtomicU64::new(0),
            out_of_state: self.out_of_state,
            produce_failure: self.produce_failure,
            processing_errors: self.processing_errors,
            error_handler: self.error_handler,
            shutdown_timeout: self.shutdown_timeout,
            owner: RwLock::new(Weak::new()),
            pending_transition: Mutex::new(None),
            counters: Counters::default(),
            self_ref: self_ref.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolConfig;
    use crate::services::{AddMetadataService, DelayService, FailingService};
    use crate::state_machine::LifecycleState;
    use crate::transport::CollectingProducer;
    use crate::workflow::RetainingErrorHandler;

    fn pool_config(max_total: usize) -> PoolConfig {
        PoolConfig {
            min_idle: 1,
            max_idle: max_total,
            max_total,
            init_wait_time_ms: 1_000,
            max_borrow_wait_ms: 5_000,
        }
    }

    #[tokio::test]
    async fn test_processes_and_produces() {
        let consumer = Arc::new(ManualConsumer::new("in"));
        let producer = Arc::new(CollectingProducer::new("out"));
        let workflow = Workflow::builder("orders")
            .consumer(consumer.clone())
            .producer(producer.clone())
            .service(AddMetadataService::new("tag").with_entry("seen", "true"))
            .build();

        workflow.start().await.unwrap();
        consumer.submit(Message::new("order-1")).await.unwrap();

        let produced = producer.produced();
        assert_eq!(produced.len(), 1);
        assert_eq!(produced[0].metadata_value("seen"), Some("true"));
        assert_eq!(workflow.stats().processed, 1);
    }

    #[tokio::test]
    async fn test_rejects_messages_when_not_started() {
        let workflow = Workflow::builder("orders").build();
        workflow.init().await.unwrap();

        let err = workflow.on_message(Message::new("early")).await.unwrap_err();
        assert!(matches!(
            err,
            FlowlaneError::OutOfState {
                current: LifecycleState::Initialised,
                ..
            }
        ));
        assert_eq!(workflow.stats().rejected, 1);
    }

    #[tokio::test]
    async fn test_processing_error_goes_to_error_handler() {
        let consumer = Arc::new(ManualConsumer::new("in"));
        let producer = Arc::new(CollectingProducer::new("out"));
        let handler = Arc::new(RetainingErrorHandler::new(10));
        let workflow = Workflow::builder("orders")
            .consumer(consumer.clone())
            .producer(producer.clone())
            .service(FailingService::new("validate", "missing customer"))
            .error_handler(handler.clone())
            .build();

        workflow.start().await.unwrap();
        consumer.submit(Message::new("order-1")).await.unwrap();

        assert_eq!(producer.produced_count(), 0);
        let failed = handler.failed_messages();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].workflow_id(), Some("orders"));
        assert_eq!(failed[0].last_failure().unwrap().service, "validate");
        // the workflow keeps running
        assert_eq!(workflow.current_state(), LifecycleState::Started);
    }

    #[tokio::test]
    async fn test_stop_workflow_policy() {
        let consumer = Arc::new(ManualConsumer::new("in"));
        let workflow = Workflow::builder("orders")
            .consumer(consumer.clone())
            .service(FailingService::new("validate", "bad"))
            .processing_errors(ProcessingErrorPolicy::StopWorkflow)
            .build();

        workflow.start().await.unwrap();
        consumer.submit(Message::new("order-1")).await.unwrap();
        workflow.wait_for_pending_transition().await.unwrap().unwrap();

        assert_eq!(workflow.current_state(), LifecycleState::Stopped);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_pooled_processing_runs_concurrently() {
        let consumer = Arc::new(ManualConsumer::new("in"));
        let producer = Arc::new(CollectingProducer::new("out"));
        let workflow = Workflow::builder("pooled")
            .consumer(consumer.clone())
            .producer(producer.clone())
            .service(DelayService::new("slow", Duration::from_millis(200)))
            .mode(ProcessingMode::Pooled(pool_config(4)))
            .build();

        workflow.start().await.unwrap();
        assert_eq!(workflow.pool_status().unwrap().idle, 1);

        let started = std::time::Instant::now();
        for i in 0..4 {
            consumer.submit(Message::new(format!("m{i}"))).await.unwrap();
        }
        // hand-off returns before processing completes
        assert!(started.elapsed() < Duration::from_millis(200));

        workflow.stop().await.unwrap();
        assert_eq!(producer.produced_count(), 4);
        assert!(started.elapsed() < Duration::from_millis(700));

        workflow.close().await.unwrap();
        assert!(workflow.pool_status().is_none());
    }

    #[tokio::test]
    async fn test_pooled_workflow_rejects_uncloneable_chain() {
        #[derive(Debug)]
        struct Unclonable;

        #[async_trait]
        impl Service for Unclonable {
            fn unique_id(&self) -> &str {
                "unclonable"
            }

            async fn process(&mut self, _message: &mut Message) -> Result<()> {
                Ok(())
            }
        }

        let workflow = Workflow::builder("pooled")
            .service(Unclonable)
            .mode(ProcessingMode::Pooled(pool_config(2)))
            .build();

        let err = workflow.start().await.unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(workflow.current_state(), LifecycleState::Closed);
    }

    #[tokio::test]
    async fn test_restart_workflow_on_produce_failure() {
        let consumer = Arc::new(ManualConsumer::new("in"));
        let producer = Arc::new(CollectingProducer::new("out"));
        let workflow = Workflow::builder("orders")
            .consumer(consumer.clone())
            .producer(producer.clone())
            .produce_failure(ProduceFailurePolicy::RestartWorkflow)
            .build();

        workflow.start().await.unwrap();
        producer.set_failing(true);
        consumer.submit(Message::new("order-1")).await.unwrap();
        workflow.wait_for_pending_transition().await.unwrap().unwrap();

        assert_eq!(workflow.lifecycle().hook_counts().start, 2);
        assert_eq!(workflow.stats().produce_failures, 1);
        assert_eq!(workflow.current_state(), LifecycleState::Started);
    }
}
