//! # Workflow
//!
//! A [`Workflow`] receives messages from its consumer, runs them through a processing
//! chain (directly, or on workers borrowed from a pool) and hands the result to its
//! producer. Failures are routed through configurable policies:
//!
//! - processing failures go to the [`MessageErrorHandler`], then
//!   [`ProcessingErrorPolicy`] decides whether the workflow keeps running;
//! - delivery failures go through exactly one [`ProduceFailurePolicy`].

pub mod error_handler;
pub mod policy;
pub mod standard;

pub use error_handler::{MessageErrorHandler, RetainingErrorHandler};
pub use policy::{ProcessingErrorPolicy, ProcessingMode, ProduceFailurePolicy};
pub use standard::{Workflow, WorkflowBuilder, WorkflowStats};
