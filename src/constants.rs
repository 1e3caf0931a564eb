//! # System Constants
//!
//! Defaults and well-known names shared across the runtime.

/// Default values for configuration sections
pub mod defaults {
    pub const POOL_MIN_IDLE: usize = 1;
    pub const POOL_MAX_IDLE: usize = 10;
    pub const POOL_MAX_TOTAL: usize = 10;
    pub const POOL_INIT_WAIT_MS: u64 = 60_000;
    pub const POOL_MAX_BORROW_WAIT_MS: u64 = 30_000;

    pub const FIXED_POLL_INTERVAL_MS: u64 = 20_000;
    pub const GAUSSIAN_MEAN_MS: i64 = 0;
    pub const GAUSSIAN_STDDEV_MS: i64 = 20_000;
    pub const RANDOM_BOUND_MS: u64 = 20_000;

    pub const OUT_OF_STATE_MAX_WAIT_MS: u64 = 20_000;
    pub const OUT_OF_STATE_CHECK_INTERVAL_MS: u64 = 1_000;

    pub const SHUTDOWN_TIMEOUT_MS: u64 = 30_000;
    pub const RETAINED_FAILURES: usize = 1_000;
}

/// Metadata keys the runtime reads or writes on messages
pub mod metadata_keys {
    /// Id of the workflow a failed message came from; routes retries
    pub const WORKFLOW_ID: &str = "workflowId";
    /// Present on messages resubmitted by the failed-message retrier
    pub const MESSAGE_RETRIED: &str = "messageRetried";
    /// Name of the service that last failed the message
    pub const FAILED_SERVICE: &str = "failedService";
}
