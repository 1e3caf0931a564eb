//! In-process transports.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{FlowlaneError, Result};
use crate::message::Message;
use crate::poller::PollSource;

use super::{Consumer, MessageListener, Producer};

/// Consumer driven by the host: messages are pushed in with [`ManualConsumer::submit`]
#[derive(Default)]
pub struct ManualConsumer {
    id: String,
    listener: Mutex<Option<Arc<dyn MessageListener>>>,
}

impl std::fmt::Debug for ManualConsumer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualConsumer")
            .field("id", &self.id)
            .field("listening", &self.listener.lock().is_some())
            .finish()
    }
}

impl ManualConsumer {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            listener: Mutex::new(None),
        }
    }

    /// Deliver a message to the registered listener
    pub async fn submit(&self, message: Message) -> Result<()> {
        let listener = self.listener.lock().clone();
        match listener {
            Some(listener) => listener.on_message(message).await,
            None => Err(FlowlaneError::lifecycle(
                format!("ManualConsumer[{}]", self.id),
                "consumer is not started",
            )),
        }
    }
}

#[async_trait]
impl Consumer for ManualConsumer {
    fn unique_id(&self) -> &str {
        &self.id
    }

    async fn start(&self, listener: Arc<dyn MessageListener>) -> Result<()> {
        *self.listener.lock() = Some(listener);
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.listener.lock().take();
        Ok(())
    }
}

/// Keeps every produced message; can be switched into a failing mode
#[derive(Debug, Default)]
pub struct CollectingProducer {
    id: String,
    produced: Mutex<Vec<Message>>,
    failing: AtomicBool,
    attempts: AtomicU64,
}

impl CollectingProducer {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// While set, every `produce` fails
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn produced(&self) -> Vec<Message> {
        self.produced.lock().clone()
    }

    pub fn produced_count(&self) -> usize {
        self.produced.lock().len()
    }

    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn clear(&self) {
        self.produced.lock().clear();
    }
}

#[async_trait]
impl Producer for CollectingProducer {
    fn unique_id(&self) -> &str {
        &self.id
    }

    async fn produce(&self, message: &Message) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(FlowlaneError::ProduceError(format!(
                "producer '{}' is refusing messages",
                self.id
            )));
        }
        self.produced.lock().push(message.clone());
        Ok(())
    }
}

/// Discards messages, optionally logging them
#[derive(Debug, Clone, Default)]
pub struct NullProducer {
    id: String,
    log_messages: bool,
}

impl NullProducer {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            log_messages: false,
        }
    }

    pub fn logging(mut self) -> Self {
        self.log_messages = true;
        self
    }
}

#[async_trait]
impl Producer for NullProducer {
    fn unique_id(&self) -> &str {
        &self.id
    }

    async fn produce(&self, message: &Message) -> Result<()> {
        if self.log_messages {
            info!(
                producer = %self.id,
                message_id = %message.unique_id(),
                payload_bytes = message.payload().len(),
                "📤 PRODUCED"
            );
        }
        Ok(())
    }
}

/// Poll source that emits one templated message per fire
#[derive(Debug, Default)]
pub struct TriggerSource {
    payload: Vec<u8>,
    metadata: BTreeMap<String, String>,
    fired: AtomicU64,
}

impl TriggerSource {
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
            metadata: BTreeMap::new(),
            fired: AtomicU64::new(0),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn fired(&self) -> u64 {
        self.fired.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PollSource for TriggerSource {
    async fn poll(&self) -> Result<Vec<Message>> {
        let sequence = self.fired.fetch_add(1, Ordering::SeqCst) + 1;
        let mut message = Message::new(self.payload.clone());
        for (key, value) in &self.metadata {
            message.add_metadata(key.clone(), value.clone());
        }
        message.add_metadata("triggerSequence", sequence.to_string());
        debug!(sequence = sequence, message_id = %message.unique_id(), "⏱️ TRIGGER: Fired");
        Ok(vec![message])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recorder(Mutex<Vec<Message>>);

    #[async_trait]
    impl MessageListener for Recorder {
        fn listener_id(&self) -> String {
            "recorder".to_string()
        }

        async fn on_message(&self, message: Message) -> Result<()> {
            self.0.lock().push(message);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_manual_consumer_requires_start() {
        let consumer = ManualConsumer::new("manual");
        assert!(consumer.submit(Message::new("early")).await.is_err());

        let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
        consumer.start(recorder.clone()).await.unwrap();
        consumer.submit(Message::new("on time")).await.unwrap();
        consumer.stop().await.unwrap();
        assert!(consumer.submit(Message::new("late")).await.is_err());

        assert_eq!(recorder.0.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_collecting_producer_failure_mode() {
        let producer = CollectingProducer::new("out");
        producer.produce(&Message::new("a")).await.unwrap();

        producer.set_failing(true);
        let err = producer.produce(&Message::new("b")).await.unwrap_err();
        assert!(matches!(err, FlowlaneError::ProduceError(_)));

        assert_eq!(producer.produced_count(), 1);
        assert_eq!(producer.attempts(), 2);
    }

    #[tokio::test]
    async fn test_trigger_source_templates_messages() {
        let source = TriggerSource::new("tick").with_metadata("origin", "trigger");
        let first = source.poll().await.unwrap();
        let second = source.poll().await.unwrap();

        assert_eq!(first[0].payload_str(), "tick");
        assert_eq!(first[0].metadata_value("origin"), Some("trigger"));
        assert_eq!(second[0].metadata_value("triggerSequence"), Some("2"));
        assert_eq!(source.fired(), 2);
    }
}
