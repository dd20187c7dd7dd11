// Publish transport and pacing traits used by the publish pipeline
use crate::domain::error::TransportError;
use crate::domain::publish::PublishRecord;
use async_trait::async_trait;
use std::time::Duration;

#[async_trait]
pub trait PublishTransport: Send + Sync {
    /// Deliver one record; resolves once the receiving side has settled it.
    async fn publish(&self, record: &PublishRecord) -> Result<(), TransportError>;
}

/// Source of the delay between batches, injected so tests do not sleep.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, delay: Duration);
}
