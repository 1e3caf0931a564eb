//! # Flowlane Demo
//!
//! Runs a small adapter (one channel, one polling workflow) for a fixed time, or
//! validates a configuration file.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use flowlane_core::config::ConfigLoader;
use flowlane_core::logging::init_structured_logging;
use flowlane_core::poller::{Poller, PollingConsumer};
use flowlane_core::services::{AddMetadataService, LogMessageService};
use flowlane_core::transport::{CollectingProducer, TriggerSource};
use flowlane_core::workflow::{ProcessingMode, RetainingErrorHandler};
use flowlane_core::{Adapter, Channel, ManagedComponent, RuntimeConfig, Workflow};

#[derive(Parser)]
#[command(name = "flowlane-demo")]
#[command(about = "Run or inspect a demo Flowlane adapter")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Configuration file (default: ./flowlane.{toml,yaml,json} when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the adapter, let it poll, then shut it down
    Run {
        /// How long to keep the adapter started, in seconds
        #[arg(short, long, default_value_t = 5)]
        seconds: u64,

        /// Process on pooled workers instead of a single chain
        #[arg(long)]
        pooled: bool,

        /// Restart the adapter this many times while running
        #[arg(long, default_value_t = 0)]
        restarts: u32,
    },

    /// Load and validate configuration, then print it as JSON
    Validate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_structured_logging();
    let cli = Cli::parse();

    let loader = match &cli.config {
        Some(path) => ConfigLoader::new().with_file(path),
        None => ConfigLoader::new(),
    };
    let config = loader.load().context("loading configuration")?;

    match cli.command {
        Commands::Validate => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        Commands::Run {
            seconds,
            pooled,
            restarts,
        } => run(config, Duration::from_secs(seconds), pooled, restarts).await,
    }
}

async fn run(config: RuntimeConfig, duration: Duration, pooled: bool, restarts: u32) -> anyhow::Result<()> {
    let source = Arc::new(TriggerSource::new("hello from flowlane").with_metadata("origin", "demo"));
    let consumer = Arc::new(PollingConsumer::new(
        "demo-poller",
        Poller::from(&config.poller),
        source.clone(),
    ));
    let producer = Arc::new(CollectingProducer::new("demo-sink"));
    let failures = Arc::new(RetainingErrorHandler::new(config.retained_failures));

    let mode = if pooled {
        ProcessingMode::Pooled(config.pool.clone())
    } else {
        ProcessingMode::SingleThreaded
    };

    let workflow = Workflow::builder("demo-workflow")
        .mode(mode)
        .with_config(&config)
        .consumer(consumer.clone())
        .producer(producer.clone())
        .service(AddMetadataService::new("stamp").with_entry("processedBy", "flowlane-demo"))
        .service(LogMessageService::new("log").including_payload())
        .error_handler(failures.clone())
        .build();

    let adapter = Adapter::new("demo", vec![Channel::new("demo-channel", vec![workflow.clone()])]);

    adapter.start().await.context("starting adapter")?;
    let slice = duration / (restarts + 1);
    for _ in 0..restarts {
        tokio::time::sleep(slice).await;
        adapter.restart().await.context("restarting adapter")?;
    }
    tokio::time::sleep(slice).await;
    adapter.close().await.context("closing adapter")?;

    let stats = workflow.stats();
    info!(
        polls = consumer.poll_count(),
        produced = producer.produced_count(),
        failed = failures.len(),
        "🏁 DEMO: Finished"
    );
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
