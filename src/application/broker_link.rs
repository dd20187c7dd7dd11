// Broker link trait for subscription control
use crate::domain::error::SubscriptionError;
use async_trait::async_trait;

#[async_trait]
pub trait BrokerLink: Send + Sync {
    /// Ask the broker to start forwarding `topic`.
    async fn subscribe(&self, topic: &str) -> Result<(), SubscriptionError>;

    /// Ask the broker to stop forwarding `topic`.
    async fn unsubscribe(&self, topic: &str) -> Result<(), SubscriptionError>;
}
