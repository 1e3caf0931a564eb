use tracing::{debug, warn};

use crate::error::{FlowlaneError, Result};
use crate::message::Message;
use crate::state_machine::{LifecycleHook, LifecycleRequest, LifecycleState};

use super::Service;

/// Ordered list of services run against each message.
///
/// The chain follows the shared transition table. It is always reached through `&mut`
/// (either behind the workflow's mutex or owned by a single worker), so exclusivity is
/// what guards its transitions.
#[derive(Debug)]
pub struct ServiceChain {
    id: String,
    services: Vec<Box<dyn Service>>,
    state: LifecycleState,
}

impl Default for ServiceChain {
    fn default() -> Self {
        Self::new("service-chain")
    }
}

impl ServiceChain {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            services: Vec::new(),
            state: LifecycleState::Closed,
        }
    }

    pub fn with_service(mut self, service: impl Service + 'static) -> Self {
        self.services.push(Box::new(service));
        self
    }

    pub fn push(&mut self, service: Box<dyn Service>) {
        self.services.push(service);
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Initialised or started chains can process messages
    pub fn is_usable(&self) -> bool {
        matches!(
            self.state,
            LifecycleState::Initialised | LifecycleState::Started
        )
    }

    pub async fn request(&mut self, request: LifecycleRequest) -> Result<LifecycleState> {
        match request {
            LifecycleRequest::Restart => {
                for step in LifecycleRequest::RESTART_SEQUENCE {
                    self.apply(step).await?;
                }
                Ok(self.state)
            }
            primitive => self.apply(primitive).await,
        }
    }

    pub async fn init(&mut self) -> Result<()> {
        self.request(LifecycleRequest::Init).await.map(|_| ())
    }

    pub async fn start(&mut self) -> Result<()> {
        self.request(LifecycleRequest::Start).await.map(|_| ())
    }

    pub async fn stop(&mut self) -> Result<()> {
        self.request(LifecycleRequest::Stop).await.map(|_| ())
    }

    pub async fn close(&mut self) -> Result<()> {
        self.request(LifecycleRequest::Close).await.map(|_| ())
    }

    async fn apply(&mut self, request: LifecycleRequest) -> Result<LifecycleState> {
        let transition = self.state.plan(request);
        for hook in transition.hooks {
            self.run_hook(*hook).await?;
            self.state = hook.resulting_state();
        }
        Ok(self.state)
    }

    // init/start run front to back, stop/close back to front
    async fn run_hook(&mut self, hook: LifecycleHook) -> Result<()> {
        debug!(chain = %self.id, hook = hook.name(), services = self.services.len(), "🔗 CHAIN: Running hook");
        match hook {
            LifecycleHook::Init => {
                for service in self.services.iter_mut() {
                    service.init().await?;
                }
            }
            LifecycleHook::Start => {
                for service in self.services.iter_mut() {
                    service.start().await?;
                }
            }
            LifecycleHook::Stop => {
                for service in self.services.iter_mut().rev() {
                    service.stop().await?;
                }
            }
            LifecycleHook::Close => {
                for service in self.services.iter_mut().rev() {
                    if let Err(e) = service.close().await {
                        warn!(chain = %self.id, service = %service.unique_id(), error = %e, "🔗 CHAIN: Close failed, continuing");
                    }
                }
            }
        }
        Ok(())
    }

    /// Run every service in order. The first failure is recorded on the message and
    /// returned; later services are not run.
    pub async fn process(&mut self, message: &mut Message) -> Result<()> {
        for service in self.services.iter_mut() {
            if let Err(e) = service.process(message).await {
                let error = match e {
                    FlowlaneError::ProcessingError { .. } => e,
                    other => FlowlaneError::processing(service.unique_id(), other.to_string()),
                };
                let reason = match &error {
                    FlowlaneError::ProcessingError { message, .. } => message.clone(),
                    other => other.to_string(),
                };
                message.record_failure(service.unique_id(), reason);
                return Err(error);
            }
        }
        Ok(())
    }

    /// Deep copy of every service, in a `Closed` chain. Fails on the first service that
    /// cannot be cloned.
    pub fn try_clone(&self) -> Result<ServiceChain> {
        let services = self
            .services
            .iter()
            .map(|service| service.try_clone())
            .collect::<Result<Vec<_>>>()?;

        Ok(ServiceChain {
            id: self.id.clone(),
            services,
            state: LifecycleState::Closed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{AddMetadataService, FailingService, NullService};
    use async_trait::async_trait;

    #[derive(Debug)]
    struct Unclonable;

    #[async_trait]
    impl Service for Unclonable {
        fn unique_id(&self) -> &str {
            "unclonable"
        }

        async fn process(&mut self, _message: &mut Message) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_chain_runs_in_order_and_stops_at_first_failure() {
        let mut chain = ServiceChain::new("chain")
            .with_service(AddMetadataService::new("first").with_entry("a", "1"))
            .with_service(FailingService::new("broken", "boom"))
            .with_service(AddMetadataService::new("never").with_entry("b", "2"));
        chain.start().await.unwrap();

        let mut msg = Message::new("payload");
        let err = chain.process(&mut msg).await.unwrap_err();

        assert!(matches!(err, FlowlaneError::ProcessingError { ref service, .. } if service == "broken"));
        assert_eq!(msg.metadata_value("a"), Some("1"));
        assert!(!msg.has_metadata("b"));
        assert_eq!(msg.last_failure().unwrap().reason, "boom");
    }

    #[tokio::test]
    async fn test_chain_lifecycle_follows_table() {
        let mut chain = ServiceChain::new("chain").with_service(NullService::new("null"));
        assert!(!chain.is_usable());

        chain.start().await.unwrap();
        assert_eq!(chain.state(), LifecycleState::Started);

        chain.init().await.unwrap();
        assert_eq!(chain.state(), LifecycleState::Started);

        chain.close().await.unwrap();
        assert_eq!(chain.state(), LifecycleState::Closed);
        assert!(!chain.is_usable());

        chain.request(LifecycleRequest::Restart).await.unwrap();
        assert_eq!(chain.state(), LifecycleState::Started);
    }

    #[tokio::test]
    async fn test_try_clone() {
        let mut template = ServiceChain::new("chain").with_service(NullService::new("null"));
        template.start().await.unwrap();

        let copy = template.try_clone().unwrap();
        assert_eq!(copy.len(), 1);
        assert_eq!(copy.state(), LifecycleState::Closed);

        let broken = ServiceChain::new("chain")
            .with_service(NullService::new("null"))
            .with_service(Unclonable);
        let err = broken.try_clone().unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(err, FlowlaneError::CloneFailure { ref service, .. } if service == "unclonable"));
    }
}
