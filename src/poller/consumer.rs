use async_trait::async_trait;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::transport::{Consumer, MessageListener};

use super::{PollSource, Poller};

struct PollTask {
    running: Arc<AtomicBool>,
    shutdown_notify: Arc<Notify>,
    handle: JoinHandle<()>,
}

/// Consumer that polls a [`PollSource`] on the delay computed by its [`Poller`].
///
/// Each fire re-arms with a fresh delay. Stopping cancels a pending sleep immediately;
/// a fire that is already delivering completes before `stop` returns.
pub struct PollingConsumer<S> {
    id: String,
    poller: Poller,
    source: Arc<S>,
    task: Mutex<Option<PollTask>>,
    polls: Arc<AtomicU64>,
}

impl<S> fmt::Debug for PollingConsumer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollingConsumer")
            .field("id", &self.id)
            .field("poller", &self.poller)
            .field("running", &self.is_running())
            .field("polls", &self.poll_count())
            .finish()
    }
}

impl<S> PollingConsumer<S> {
    /// Fires completed since construction
    pub fn poll_count(&self) -> u64 {
        self.polls.load(Ordering::Acquire)
    }

    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .as_ref()
            .map(|task| task.running.load(Ordering::Acquire))
            .unwrap_or(false)
    }
}

impl<S: PollSource + 'static> PollingConsumer<S> {
    pub fn new(id: impl Into<String>, poller: Poller, source: Arc<S>) -> Self {
        Self {
            id: id.into(),
            poller,
            source,
            task: Mutex::new(None),
            polls: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn poller(&self) -> &Poller {
        &self.poller
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    async fn run(
        id: String,
        poller: Poller,
        source: Arc<S>,
        listener: Arc<dyn MessageListener>,
        running: Arc<AtomicBool>,
        shutdown_notify: Arc<Notify>,
        polls: Arc<AtomicU64>,
    ) {
        while running.load(Ordering::Acquire) {
            let delay = poller.next_delay();

            // Wait with ability to be interrupted by shutdown
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown_notify.notified() => {
                    debug!(consumer = %id, "⏱️ POLLER: Pending fire cancelled");
                    break;
                }
            }

            if !running.load(Ordering::Acquire) {
                break;
            }

            match source.poll().await {
                Ok(messages) => {
                    for message in messages {
                        let message_id = message.unique_id();
                        if let Err(e) = listener.on_message(message).await {
                            warn!(
                                consumer = %id,
                                listener = %listener.listener_id(),
                                message_id = %message_id,
                                error = %e,
                                "⏱️ POLLER: Message rejected by listener"
                            );
                        }
                    }
                }
                Err(e) => {
                    warn!(consumer = %id, error = %e, "⏱️ POLLER: Poll failed");
                }
            }
            polls.fetch_add(1, Ordering::AcqRel);
        }

        debug!(consumer = %id, "⏱️ POLLER: Loop exited");
    }
}

#[async_trait]
impl<S: PollSource + 'static> Consumer for PollingConsumer<S> {
    fn unique_id(&self) -> &str {
        &self.id
    }

    async fn init(&self) -> Result<()> {
        self.poller.init()
    }

    async fn start(&self, listener: Arc<dyn MessageListener>) -> Result<()> {
        let mut slot = self.task.lock();
        if slot.is_some() {
            debug!(consumer = %self.id, "⏱️ POLLER: Already running");
            return Ok(());
        }

        let running = Arc::new(AtomicBool::new(true));
        let shutdown_notify = Arc::new(Notify::new());
        let handle = tokio::spawn(Self::run(
            self.id.clone(),
            self.poller.clone(),
            self.source.clone(),
            listener,
            running.clone(),
            shutdown_notify.clone(),
            self.polls.clone(),
        ));

        *slot = Some(PollTask {
            running,
            shutdown_notify,
            handle,
        });
        info!(consumer = %self.id, poller = self.poller.kind(), "⏱️ POLLER: Started");
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        let Some(task) = self.task.lock().take() else {
            return Ok(());
        };

        task.running.store(false, Ordering::Release);
        // notify_one keeps a permit if the loop is mid-fire rather than sleeping
        task.shutdown_notify.notify_one();

        if let Err(e) = task.handle.await {
            warn!(consumer = %self.id, error = %e, "⏱️ POLLER: Poll task ended abnormally");
        }
        info!(consumer = %self.id, polls = self.poll_count(), "⏱️ POLLER: Stopped");
        Ok(())
    }
}
