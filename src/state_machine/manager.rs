//! # Lifecycle Manager
//!
//! Guarded execution of the transition table in [`LifecycleState::plan`].
//!
//! Every transition runs under a per-component async mutex: the current state is read,
//! the plan is computed and the hooks are executed while the lock is held. A caller that
//! queued behind an identical request re-reads the state once it gets the lock, finds
//! the transition is now a no-op and returns without invoking any hook.
//!
//! The state itself lives in a `parking_lot::RwLock` so it can be observed without
//! waiting on an in-progress transition (the out-of-state handlers poll it).

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tokio::sync::Mutex as TransitionLock;
use tracing::{debug, error};

use crate::error::Result;
use crate::logging::log_lifecycle_operation;

use super::events::{LifecycleHook, LifecycleRequest};
use super::states::LifecycleState;

/// Hooks a concrete component implements; invoked only by [`LifecycleManager`]
#[async_trait]
pub trait LifecycleHooks: Send + Sync {
    /// Name used in logs and errors, e.g. `Workflow[orders]`
    fn component_name(&self) -> String;

    async fn on_init(&self) -> Result<()>;

    async fn on_start(&self) -> Result<()>;

    async fn on_stop(&self) -> Result<()>;

    async fn on_close(&self) -> Result<()>;
}

/// Read-only view of a component's current state
pub trait StateQuery: Send + Sync {
    fn current_state(&self) -> LifecycleState;
}

/// Number of times each hook has actually executed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HookCounts {
    pub init: u64,
    pub start: u64,
    pub stop: u64,
    pub close: u64,
}

impl HookCounts {
    fn record(&mut self, hook: LifecycleHook) {
        match hook {
            LifecycleHook::Init => self.init += 1,
            LifecycleHook::Start => self.start += 1,
            LifecycleHook::Stop => self.stop += 1,
            LifecycleHook::Close => self.close += 1,
        }
    }
}

/// Per-component lifecycle state with an atomic check-and-transition guard
#[derive(Debug, Default)]
pub struct LifecycleManager {
    state: RwLock<LifecycleState>,
    transition_lock: TransitionLock<()>,
    counts: Mutex<HookCounts>,
}

impl LifecycleManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_state(&self) -> LifecycleState {
        *self.state.read()
    }

    pub fn hook_counts(&self) -> HookCounts {
        *self.counts.lock()
    }

    /// Apply a request to `component`.
    ///
    /// `Restart` is delegated to [`LifecycleRequest::RESTART_SEQUENCE`], each element
    /// taking the guard separately, so it follows exactly the same idempotency rules as
    /// the direct calls. Returns the state reached.
    pub async fn request<H>(&self, component: &H, request: LifecycleRequest) -> Result<LifecycleState>
    where
        H: LifecycleHooks + ?Sized,
    {
        match request {
            LifecycleRequest::Restart => {
                for step in LifecycleRequest::RESTART_SEQUENCE {
                    self.apply(component, step).await?;
                }
                Ok(self.current_state())
            }
            primitive => self.apply(component, primitive).await,
        }
    }

    async fn apply<H>(&self, component: &H, request: LifecycleRequest) -> Result<LifecycleState>
    where
        H: LifecycleHooks + ?Sized,
    {
        let _guard = self.transition_lock.lock().await;

        let current = self.current_state();
        let transition = current.plan(request);

        if transition.is_noop() {
            debug!(
                component = %component.component_name(),
                state = %current,
                request = %request,
                "🔄 LIFECYCLE: No-op request"
            );
            return Ok(current);
        }

        for hook in transition.hooks {
            let outcome = match hook {
                LifecycleHook::Init => component.on_init().await,
                LifecycleHook::Start => component.on_start().await,
                LifecycleHook::Stop => component.on_stop().await,
                LifecycleHook::Close => component.on_close().await,
            };

            if let Err(e) = outcome {
                error!(
                    component = %component.component_name(),
                    hook = hook.name(),
                    state = %self.current_state(),
                    error = %e,
                    "🔄 LIFECYCLE: Hook failed"
                );
                return Err(e);
            }

            *self.state.write() = hook.resulting_state();
            self.counts.lock().record(*hook);
        }

        log_lifecycle_operation(
            &component.component_name(),
            request.request_type(),
            &current.to_string(),
            &transition.target.to_string(),
        );

        Ok(transition.target)
    }
}

impl StateQuery for LifecycleManager {
    fn current_state(&self) -> LifecycleState {
        LifecycleManager::current_state(self)
    }
}

/// Lifecycle API exposed by every managed component
#[async_trait]
pub trait ManagedComponent: LifecycleHooks {
    fn lifecycle(&self) -> &LifecycleManager;

    fn current_state(&self) -> LifecycleState {
        self.lifecycle().current_state()
    }

    async fn init(&self) -> Result<()> {
        self.lifecycle()
            .request(self, LifecycleRequest::Init)
            .await
            .map(|_| ())
    }

    async fn start(&self) -> Result<()> {
        self.lifecycle()
            .request(self, LifecycleRequest::Start)
            .await
            .map(|_| ())
    }

    async fn stop(&self) -> Result<()> {
        self.lifecycle()
            .request(self, LifecycleRequest::Stop)
            .await
            .map(|_| ())
    }

    async fn close(&self) -> Result<()> {
        self.lifecycle()
            .request(self, LifecycleRequest::Close)
            .await
            .map(|_| ())
    }

    async fn restart(&self) -> Result<()> {
        self.lifecycle()
            .request(self, LifecycleRequest::Restart)
            .await
            .map(|_| ())
    }
}
