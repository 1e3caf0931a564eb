//! # Worker Pool
//!
//! Bounded pool of independently-owned processing-chain copies used by pooled
//! workflows. A borrowed worker is never shared: it moves into the task processing one
//! message and moves back on return.

pub mod worker;
pub mod worker_pool;

pub use worker::{ChainWorkerFactory, Worker, WorkerFactory};
pub use worker_pool::{BorrowedWorker, PoolStatus, WorkerPool};
