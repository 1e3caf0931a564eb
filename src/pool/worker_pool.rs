use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::PoolConfig;
use crate::error::{FlowlaneError, Result};

use super::worker::{Worker, WorkerFactory};

type LoanLedger = Arc<Mutex<HashSet<Uuid>>>;

// Clears the loan entry however the borrow ends, including a dropped or aborted task
#[derive(Debug)]
struct Loan {
    worker_id: Uuid,
    ledger: LoanLedger,
}

impl Drop for Loan {
    fn drop(&mut self) {
        self.ledger.lock().remove(&self.worker_id);
    }
}

/// A worker on loan from a [`WorkerPool`]; holds one of the pool's `max_total` permits.
///
/// Dropping it without [`WorkerPool::return_worker`] or [`WorkerPool::invalidate`]
/// releases the permit and the loan, but the worker's chain is not closed.
#[derive(Debug)]
pub struct BorrowedWorker {
    worker: Worker,
    loan: Loan,
    _permit: OwnedSemaphorePermit,
}

impl BorrowedWorker {
    pub fn worker(&self) -> &Worker {
        &self.worker
    }

    pub fn worker_mut(&mut self) -> &mut Worker {
        &mut self.worker
    }

    pub fn id(&self) -> Uuid {
        self.worker.id()
    }
}

/// Point-in-time view of a pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolStatus {
    pub idle: usize,
    pub borrowed: usize,
    pub min_idle: usize,
    pub max_idle: usize,
    pub max_total: usize,
    pub created: u64,
    pub destroyed: u64,
    pub closed: bool,
    pub uptime_seconds: u64,
}

/// Bounded pool of workers.
///
/// At most `max_total` workers are on loan at once; further borrowers wait up to
/// `max_borrow_wait` for a return. Returned workers are kept idle up to `max_idle`,
/// surplus ones are destroyed.
pub struct WorkerPool {
    name: String,
    config: PoolConfig,
    factory: Arc<dyn WorkerFactory>,
    idle: Mutex<VecDeque<Worker>>,
    borrowed: LoanLedger,
    permits: Arc<Semaphore>,
    created: AtomicU64,
    destroyed: AtomicU64,
    closed: AtomicBool,
    created_at: Instant,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("factory", &"WorkerFactory")
            .finish()
    }
}

impl WorkerPool {
    /// Create the pool and fill it to `min_idle` within `init_wait_time`.
    ///
    /// Factory errors that are already fatal propagate unchanged; anything else that
    /// keeps the pool from reaching `min_idle` becomes [`FlowlaneError::PoolStartup`].
    pub async fn start(
        name: impl Into<String>,
        config: PoolConfig,
        factory: Arc<dyn WorkerFactory>,
    ) -> Result<Self> {
        config.validate()?;
        let name = name.into();

        info!(
            "🏊 POOL: Creating worker pool {} (min_idle: {}, max_idle: {}, max_total: {})",
            name, config.min_idle, config.max_idle, config.max_total
        );

        let pool = Self {
            permits: Arc::new(Semaphore::new(config.max_total)),
            name,
            config,
            factory,
            idle: Mutex::new(VecDeque::new()),
            borrowed: Arc::new(Mutex::new(HashSet::new())),
            created: AtomicU64::new(0),
            destroyed: AtomicU64::new(0),
            closed: AtomicBool::new(false),
            created_at: Instant::now(),
        };

        let fill = futures::future::try_join_all(
            (0..pool.config.min_idle).map(|_| pool.create_idle_worker()),
        );

        let failure = match tokio::time::timeout(pool.config.init_wait_time(), fill).await {
            Ok(Ok(workers)) => {
                pool.idle.lock().extend(workers);
                None
            }
            Ok(Err(e)) if e.is_fatal() => Some(e),
            Ok(Err(e)) => Some(FlowlaneError::PoolStartup(format!(
                "pool {} could not create {} idle workers: {e}",
                pool.name, pool.config.min_idle
            ))),
            Err(_) => Some(FlowlaneError::PoolStartup(format!(
                "pool {} did not reach {} idle workers within {}ms",
                pool.name, pool.config.min_idle, pool.config.init_wait_time_ms
            ))),
        };

        if let Some(e) = failure {
            error!("❌ POOL: Worker pool {} failed to start: {}", pool.name, e);
            pool.close().await;
            return Err(e);
        }

        info!(
            "✅ POOL: Worker pool {} created with {} idle workers",
            pool.name,
            pool.idle.lock().len()
        );
        Ok(pool)
    }

    async fn create_idle_worker(&self) -> Result<Worker> {
        let mut worker = self.factory.make_object().await?;
        self.created.fetch_add(1, Ordering::AcqRel);
        self.factory.passivate_object(&mut worker).await?;
        Ok(worker)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Take a worker, waiting up to `max_borrow_wait` when all `max_total` are on loan
    pub async fn borrow(&self) -> Result<BorrowedWorker> {
        if self.closed.load(Ordering::Acquire) {
            return Err(FlowlaneError::PoolIllegalState(format!(
                "pool {} is closed",
                self.name
            )));
        }

        let permit = match tokio::time::timeout(
            self.config.max_borrow_wait(),
            self.permits.clone().acquire_owned(),
        )
        .await
        {
            Ok(Ok(permit)) => permit,
            Ok(Err(_)) => {
                return Err(FlowlaneError::PoolIllegalState(format!(
                    "pool {} closed while waiting for a worker",
                    self.name
                )))
            }
            Err(_) => {
                warn!(
                    "⚠️ POOL: No worker available in pool {} after {}ms",
                    self.name, self.config.max_borrow_wait_ms
                );
                return Err(FlowlaneError::PoolExhausted(format!(
                    "all {} workers of pool {} busy for {}ms",
                    self.config.max_total, self.name, self.config.max_borrow_wait_ms
                )));
            }
        };

        let mut worker = loop {
            let candidate = self.idle.lock().pop_front();
            match candidate {
                Some(mut worker) => {
                    let activated = self.factory.activate_object(&mut worker).await;
                    if activated.is_ok() && self.factory.validate_object(&worker) {
                        break worker;
                    }
                    debug!("🏊 POOL: Discarding idle worker {} that failed activation", worker.id());
                    self.destroy(worker).await;
                }
                None => {
                    let mut worker = self.factory.make_object().await?;
                    self.created.fetch_add(1, Ordering::AcqRel);
                    if let Err(e) = self.factory.activate_object(&mut worker).await {
                        warn!("⚠️ POOL: New worker {} failed activation: {}", worker.id(), e);
                        self.destroy(worker).await;
                        return Err(e);
                    }
                    break worker;
                }
            }
        };

        worker.mark_borrowed();
        self.borrowed.lock().insert(worker.id());
        let loan = Loan {
            worker_id: worker.id(),
            ledger: self.borrowed.clone(),
        };
        Ok(BorrowedWorker {
            worker,
            loan,
            _permit: permit,
        })
    }

    pub fn validate(&self, borrowed: &BorrowedWorker) -> bool {
        self.factory.validate_object(borrowed.worker())
    }

    /// Give a worker back. Fails with [`FlowlaneError::PoolIllegalState`] for a worker
    /// this pool does not have on loan; that worker is destroyed.
    pub async fn return_worker(&self, borrowed: BorrowedWorker) -> Result<()> {
        let BorrowedWorker {
            mut worker,
            loan,
            _permit,
        } = borrowed;

        let on_loan = self.owns(&loan);
        drop(loan);
        if !on_loan {
            let id = worker.id();
            self.destroy(worker).await;
            return Err(FlowlaneError::PoolIllegalState(format!(
                "worker {id} is not on loan from pool {}",
                self.name
            )));
        }

        let keep = !self.closed.load(Ordering::Acquire)
            && self.factory.validate_object(&worker)
            && self.factory.passivate_object(&mut worker).await.is_ok();

        if keep {
            let mut idle = self.idle.lock();
            if idle.len() < self.config.max_idle {
                idle.push_back(worker);
                return Ok(());
            }
        }

        self.destroy(worker).await;
        Ok(())
    }

    /// Destroy a borrowed worker instead of returning it
    pub async fn invalidate(&self, borrowed: BorrowedWorker) -> Result<()> {
        let BorrowedWorker {
            worker,
            loan,
            _permit,
        } = borrowed;
        let known = self.owns(&loan);
        drop(loan);
        let id = worker.id();
        self.destroy(worker).await;

        if known {
            debug!("🏊 POOL: Invalidated worker {} of pool {}", id, self.name);
            Ok(())
        } else {
            Err(FlowlaneError::PoolIllegalState(format!(
                "worker {id} is not on loan from pool {}",
                self.name
            )))
        }
    }

    fn owns(&self, loan: &Loan) -> bool {
        Arc::ptr_eq(&loan.ledger, &self.borrowed) && self.borrowed.lock().contains(&loan.worker_id)
    }

    /// Stop the chains of idle workers. They are started again by
    /// [`WorkerFactory::activate_object`] when next borrowed; a worker that fails to
    /// stop is destroyed.
    pub async fn stop_idle(&self) -> usize {
        let idle: Vec<Worker> = self.idle.lock().drain(..).collect();
        let mut stopped = Vec::with_capacity(idle.len());
        for mut worker in idle {
            match self.factory.suspend_object(&mut worker).await {
                Ok(()) => stopped.push(worker),
                Err(e) => {
                    warn!("⚠️ POOL: Failed to stop idle worker {}: {}", worker.id(), e);
                    self.destroy(worker).await;
                }
            }
        }

        let count = stopped.len();
        self.idle.lock().extend(stopped);
        debug!("🏊 POOL: Stopped {} idle workers of pool {}", count, self.name);
        count
    }

    async fn destroy(&self, worker: Worker) {
        let id = worker.id();
        if let Err(e) = self.factory.destroy_object(worker).await {
            warn!("⚠️ POOL: Failed to destroy worker {}: {}", id, e);
        }
        self.destroyed.fetch_add(1, Ordering::AcqRel);
    }

    /// Destroy idle workers and refuse further borrows. Workers still on loan are
    /// destroyed when they come back.
    pub async fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.permits.close();

        let idle: Vec<Worker> = self.idle.lock().drain(..).collect();
        let count = idle.len();
        for worker in idle {
            self.destroy(worker).await;
        }

        let outstanding = self.borrowed.lock().len();
        if outstanding > 0 {
            warn!(
                "⚠️ POOL: Pool {} closed with {} workers still borrowed",
                self.name, outstanding
            );
        }
        info!("🛑 POOL: Worker pool {} closed, {} idle workers destroyed", self.name, count);
    }

    pub fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }

    pub fn borrowed_count(&self) -> usize {
        self.borrowed.lock().len()
    }

    pub fn status(&self) -> PoolStatus {
        PoolStatus {
            idle: self.idle_count(),
            borrowed: self.borrowed_count(),
            min_idle: self.config.min_idle,
            max_idle: self.config.max_idle,
            max_total: self.config.max_total,
            created: self.created.load(Ordering::Acquire),
            destroyed: self.destroyed.load(Ordering::Acquire),
            closed: self.closed.load(Ordering::Acquire),
            uptime_seconds: self.created_at.elapsed().as_secs(),
        }
    }
}
