// Broker bridge - Decodes broker payloads and feeds them to the session
use crate::application::series_store::IngestResult;
use crate::application::telemetry_session::{SharedSession, lock_session};
use crate::domain::telemetry::decode_payload;
use crate::infrastructure::local_broker::BrokerMessage;
use tokio::sync::broadcast::{self, error::RecvError};

/// Handle one broker message. Undecodable payloads are logged and skipped.
pub fn forward_message(message: &BrokerMessage, session: &SharedSession) -> Option<IngestResult> {
    match decode_payload(&message.payload) {
        Ok(event) => Some(lock_session(session).ingest(&event)),
        Err(e) => {
            tracing::warn!("Error processing message on {}: {}", message.topic, e);
            None
        }
    }
}

/// Run until the broker goes away.
pub async fn run_bridge(mut rx: broadcast::Receiver<BrokerMessage>, session: SharedSession) {
    tracing::info!("Broker bridge started");

    loop {
        match rx.recv().await {
            Ok(message) => {
                forward_message(&message, &session);
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!("Broker bridge fell behind, {} messages skipped", skipped);
            }
            Err(RecvError::Closed) => {
                tracing::info!("Broker closed, bridge stopping");
                break;
            }
        }
    }
}
