//! # Registry Infrastructure
//!
//! Lookup of running components by id.
//!
//! - **FailedMessageRetrier**: workflows by id, for resubmitting failed messages

pub mod failed_message_retrier;

pub use failed_message_retrier::FailedMessageRetrier;
