//! Opaque message carrier: metadata view, byte payload and a record of processing
//! failures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::constants::metadata_keys;

/// A failure recorded against a message by the processing chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageFailure {
    pub service: String,
    pub reason: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    unique_id: Uuid,
    metadata: BTreeMap<String, String>,
    payload: Vec<u8>,
    created_at: DateTime<Utc>,
    failures: Vec<MessageFailure>,
}

impl Default for Message {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Message {
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            unique_id: Uuid::new_v4(),
            metadata: BTreeMap::new(),
            payload: payload.into(),
            created_at: Utc::now(),
            failures: Vec::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_metadata(key, value);
        self
    }

    pub fn unique_id(&self) -> Uuid {
        self.unique_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn add_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(key.into(), value.into());
    }

    pub fn remove_metadata(&mut self, key: &str) -> Option<String> {
        self.metadata.remove(key)
    }

    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    pub fn has_metadata(&self, key: &str) -> bool {
        self.metadata.contains_key(key)
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn set_payload(&mut self, payload: impl Into<Vec<u8>>) {
        self.payload = payload.into();
    }

    /// Payload decoded as UTF-8, lossily
    pub fn payload_str(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }

    pub fn record_failure(&mut self, service: impl Into<String>, reason: impl Into<String>) {
        let service = service.into();
        self.add_metadata(metadata_keys::FAILED_SERVICE, service.clone());
        self.failures.push(MessageFailure {
            service,
            reason: reason.into(),
            at: Utc::now(),
        });
    }

    pub fn failures(&self) -> &[MessageFailure] {
        &self.failures
    }

    pub fn last_failure(&self) -> Option<&MessageFailure> {
        self.failures.last()
    }

    pub fn has_failed(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Id of the workflow that last failed this message, if any
    pub fn workflow_id(&self) -> Option<&str> {
        self.metadata_value(metadata_keys::WORKFLOW_ID)
    }
}
