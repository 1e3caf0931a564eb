mod common;

use common::*;
use std::sync::Arc;
use std::time::Duration;

use flowlane_core::config::PoolConfig;
use flowlane_core::poller::{Poller, PollingConsumer};
use flowlane_core::services::{AddMetadataService, ServiceChain};
use flowlane_core::transport::{CollectingProducer, MessageListener, TriggerSource};
use flowlane_core::workflow::ProcessingMode;
use flowlane_core::{
    Adapter, Channel, LifecycleState, ManagedComponent, Message, OutOfStateHandler, Workflow,
};

const RUN: Duration = Duration::from_millis(350);

fn polled_workflow(
    id: &str,
    mode: ProcessingMode,
) -> (Arc<Workflow>, Arc<CollectingProducer>, Arc<TriggerSource>) {
    let source = Arc::new(TriggerSource::new("tick"));
    let consumer = Arc::new(PollingConsumer::new(
        format!("{id}-poller"),
        Poller::fixed(Duration::from_millis(100)),
        source.clone(),
    ));
    let producer = Arc::new(CollectingProducer::new(format!("{id}-out")));
    let workflow = Workflow::builder(id)
        .consumer(consumer)
        .producer(producer.clone())
        .chain(
            ServiceChain::new("chain")
                .with_service(AddMetadataService::new("tag").with_entry("workflow", id)),
        )
        .mode(mode)
        .build();
    (workflow, producer, source)
}

#[tokio::test]
async fn fixed_poller_produces_on_every_run() {
    let (workflow, producer, _source) = polled_workflow("ticks", ProcessingMode::SingleThreaded);

    workflow.start().await.unwrap();
    tokio::time::sleep(RUN).await;
    workflow.stop().await.unwrap();
    assert!(producer.produced_count() >= 1, "first run produced nothing");

    for run in 0..3 {
        producer.clear();
        workflow.restart().await.unwrap();
        tokio::time::sleep(RUN).await;
        workflow.stop().await.unwrap();
        assert!(producer.produced_count() >= 1, "restart {run} produced nothing");
    }

    let produced = producer.produced();
    assert!(produced.iter().all(|m| m.metadata_value("workflow") == Some("ticks")));
    workflow.close().await.unwrap();
    assert_eq!(workflow.current_state(), LifecycleState::Closed);
}

#[tokio::test]
async fn nothing_is_produced_while_stopped() {
    let (workflow, producer, source) = polled_workflow("ticks", ProcessingMode::SingleThreaded);

    workflow.start().await.unwrap();
    tokio::time::sleep(RUN).await;
    workflow.stop().await.unwrap();

    let fired = source.fired();
    let produced = producer.produced_count();
    tokio::time::sleep(RUN).await;
    assert_eq!(source.fired(), fired);
    assert_eq!(producer.produced_count(), produced);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn adapter_runs_pooled_and_single_threaded_workflows() {
    let pool = PoolConfig {
        min_idle: 1,
        max_idle: 2,
        max_total: 2,
        init_wait_time_ms: 1_000,
        max_borrow_wait_ms: 1_000,
    };
    let (pooled, pooled_out, _) = polled_workflow("pooled", ProcessingMode::Pooled(pool));
    let (single, single_out, _) = polled_workflow("single", ProcessingMode::SingleThreaded);

    let adapter = Adapter::new(
        "adapter",
        vec![
            Channel::new("c1", vec![pooled.clone()]),
            Channel::new("c2", vec![single.clone()]),
        ],
    );

    adapter.start().await.unwrap();
    assert!(wait_until(Duration::from_secs(2), || {
        pooled_out.produced_count() >= 2 && single_out.produced_count() >= 2
    })
    .await);

    adapter.restart().await.unwrap();
    assert_eq!(pooled.lifecycle().hook_counts().start, 2);
    assert_eq!(adapter.retrier().workflow_ids(), vec!["pooled", "single"]);

    adapter.close().await.unwrap();
    assert_eq!(pooled.current_state(), LifecycleState::Closed);
    assert_eq!(single.current_state(), LifecycleState::Closed);
}

#[tokio::test]
async fn waiting_handler_holds_messages_until_started() {
    let producer = Arc::new(CollectingProducer::new("out"));
    let workflow = Workflow::builder("waiting")
        .producer(producer.clone())
        .out_of_state(OutOfStateHandler::waiting(
            Duration::from_secs(2),
            Duration::from_millis(20),
        ))
        .build();

    workflow.start().await.unwrap();
    workflow.stop().await.unwrap();

    let restarter = {
        let workflow = workflow.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            workflow.start().await
        })
    };

    // handed straight to the workflow while it is stopped
    workflow.on_message(Message::new("held")).await.unwrap();
    restarter.await.unwrap().unwrap();

    assert_eq!(producer.produced_count(), 1);
    assert_eq!(workflow.stats().rejected, 0);
}
