#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Flowlane Core
//!
//! Embeddable message-processing runtime.
//!
//! ## Overview
//!
//! A host assembles **workflows** (consumer → processing chain → producer), groups them
//! into **channels** and channels into an **adapter**, then drives the whole tree
//! through one lifecycle: `init`, `start`, `stop`, `close` and `restart`. Every component
//! follows the same transition table, so repeated or concurrent requests are safe and
//! hooks never run twice for one transition.
//!
//! ## Module Organization
//!
//! - [`state_machine`] - Lifecycle states, transition table, guarded manager, out-of-state handling
//! - [`services`] - Processing steps and the service chain
//! - [`transport`] - Consumer/producer interfaces and in-memory transports
//! - [`poller`] - Poll interval strategies and the polling consumer
//! - [`pool`] - Worker pool for concurrent processing
//! - [`workflow`] - Workflow assembly and failure policies
//! - [`channel`] / [`adapter`] - Component containers
//! - [`registry`] - Failed-message retrier
//! - [`config`] - Layered configuration
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use flowlane_core::poller::{Poller, PollingConsumer};
//! use flowlane_core::services::LogMessageService;
//! use flowlane_core::transport::{NullProducer, TriggerSource};
//! use flowlane_core::{Adapter, Channel, ManagedComponent, Workflow};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> flowlane_core::Result<()> {
//! let consumer = PollingConsumer::new(
//!     "ticker",
//!     Poller::fixed(Duration::from_secs(1)),
//!     Arc::new(TriggerSource::new("tick")),
//! );
//! let workflow = Workflow::builder("ticks")
//!     .consumer(Arc::new(consumer))
//!     .service(LogMessageService::new("log"))
//!     .producer(Arc::new(NullProducer::new("sink")))
//!     .build();
//!
//! let adapter = Adapter::new("demo", vec![Channel::new("main", vec![workflow])]);
//! adapter.start().await?;
//! tokio::time::sleep(Duration::from_secs(5)).await;
//! adapter.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod channel;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod message;
pub mod poller;
pub mod pool;
pub mod registry;
pub mod services;
pub mod state_machine;
pub mod transport;
pub mod workflow;

pub use adapter::Adapter;
pub use channel::Channel;
pub use config::{ConfigLoader, RuntimeConfig};
pub use error::{FlowlaneError, Result};
pub use message::Message;
pub use registry::FailedMessageRetrier;
pub use state_machine::{LifecycleState, ManagedComponent, OutOfStateHandler};
pub use workflow::{ProduceFailurePolicy, Workflow, WorkflowBuilder};
