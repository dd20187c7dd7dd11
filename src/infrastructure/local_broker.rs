// In-process topic bus standing in for the message broker
use crate::application::broker_link::BrokerLink;
use crate::application::publish_transport::PublishTransport;
use crate::domain::error::{SubscriptionError, TransportError};
use crate::domain::publish::PublishRecord;
use crate::domain::telemetry::TelemetryMessage;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashSet;
use std::sync::{PoisonError, RwLock};
use tokio::sync::broadcast;

#[derive(Debug, Clone)]
pub struct BrokerMessage {
    pub topic: String,
    pub payload: Bytes,
}

/// Carries raw JSON payloads; only topics subscribed on the broker are forwarded.
pub struct LocalBroker {
    tx: broadcast::Sender<BrokerMessage>,
    subscriptions: RwLock<HashSet<String>>,
}

impl LocalBroker {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            subscriptions: RwLock::new(HashSet::new()),
        }
    }

    pub fn receiver(&self) -> broadcast::Receiver<BrokerMessage> {
        self.tx.subscribe()
    }

    fn is_forwarded(&self, topic: &str) -> bool {
        self.subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(topic)
    }

    /// Publish a raw payload. Topics nobody subscribed to are accepted and discarded.
    pub fn publish_raw(&self, topic: &str, payload: Bytes) -> Result<(), TransportError> {
        if !self.is_forwarded(topic) {
            tracing::debug!("No broker subscription for {}, discarding message", topic);
            return Ok(());
        }

        self.tx
            .send(BrokerMessage {
                topic: topic.to_string(),
                payload,
            })
            .map(|_| ())
            .map_err(|_| TransportError::BrokerUnavailable)
    }

    pub fn publish_message(&self, message: &TelemetryMessage) -> Result<(), TransportError> {
        let payload = serde_json::to_vec(message)?;
        self.publish_raw(&message.topic, Bytes::from(payload))
    }
}

/// Exact-match topics only: no wildcards and no empty segments.
pub fn validate_topic(topic: &str) -> Result<(), SubscriptionError> {
    let valid = !topic.is_empty()
        && !topic.contains(|c: char| c == '+' || c == '#')
        && topic.split('/').all(|segment| !segment.is_empty());

    if valid {
        Ok(())
    } else {
        Err(SubscriptionError::InvalidTopic(topic.to_string()))
    }
}

#[async_trait]
impl BrokerLink for LocalBroker {
    async fn subscribe(&self, topic: &str) -> Result<(), SubscriptionError> {
        validate_topic(topic)?;
        self.subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(topic.to_string());
        Ok(())
    }

    async fn unsubscribe(&self, topic: &str) -> Result<(), SubscriptionError> {
        validate_topic(topic)?;
        self.subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(topic);
        Ok(())
    }
}

#[async_trait]
impl PublishTransport for LocalBroker {
    async fn publish(&self, record: &PublishRecord) -> Result<(), TransportError> {
        self.publish_message(&record.to_message())
    }
}
