// Subscription service - Keeps broker subscriptions and the session registry in step
use crate::application::broker_link::BrokerLink;
use crate::application::telemetry_session::{SharedSession, lock_session};
use crate::domain::error::SubscriptionError;
use std::sync::Arc;

#[derive(Clone)]
pub struct SubscriptionService {
    broker: Arc<dyn BrokerLink>,
    session: SharedSession,
}

impl SubscriptionService {
    pub fn new(broker: Arc<dyn BrokerLink>, session: SharedSession) -> Self {
        Self { broker, session }
    }

    /// The registry only changes after the broker confirmed the subscription.
    pub async fn subscribe(&self, topic: &str) -> Result<(), SubscriptionError> {
        self.broker.subscribe(topic).await?;

        let added = lock_session(&self.session).subscribe(topic);
        if added {
            tracing::info!("Subscribed to {}", topic);
        } else {
            tracing::debug!("Already subscribed to {}", topic);
        }
        Ok(())
    }

    pub async fn unsubscribe(&self, topic: &str) -> Result<(), SubscriptionError> {
        self.broker.unsubscribe(topic).await?;

        if lock_session(&self.session).unsubscribe(topic) {
            tracing::info!("Unsubscribed from {}", topic);
        }
        Ok(())
    }

    pub fn topics(&self) -> Vec<String> {
        lock_session(&self.session).topics()
    }
}
