// Prediction service - Forwards a series archive once the gate opens
use crate::application::prediction_gate::Readiness;
use crate::application::telemetry_session::{SharedSession, lock_session};
use crate::domain::error::PredictionError;
use crate::domain::series::{DisplayPoint, SeriesKind};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};

#[async_trait]
pub trait PredictionBackend: Send + Sync {
    async fn predict(
        &self,
        data: &[DisplayPoint],
        topic: Option<&str>,
    ) -> Result<serde_json::Value, PredictionError>;
}

#[derive(Clone)]
pub struct PredictionService {
    backend: Option<Arc<dyn PredictionBackend>>,
    session: SharedSession,
    latest: Arc<Mutex<Option<serde_json::Value>>>,
}

impl PredictionService {
    pub fn new(backend: Option<Arc<dyn PredictionBackend>>, session: SharedSession) -> Self {
        Self {
            backend,
            session,
            latest: Arc::new(Mutex::new(None)),
        }
    }

    /// Reply of the last successful prediction, if any.
    pub fn latest_result(&self) -> Option<serde_json::Value> {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn readiness(&self) -> Readiness {
        lock_session(&self.session).readiness()
    }

    pub async fn predict(
        &self,
        kind: SeriesKind,
        topic: Option<&str>,
    ) -> Result<serde_json::Value, PredictionError> {
        let data = {
            let session = lock_session(&self.session);
            if !session.has_enough_data(kind) {
                return Err(PredictionError::NotReady {
                    kind,
                    available: session.archive_len(kind),
                    required: session.prediction_threshold(),
                });
            }
            session.archive(kind)
        };

        let backend = self.backend.as_ref().ok_or(PredictionError::Disabled)?;
        let reply = backend.predict(&data, topic).await?;

        tracing::info!("Saved prediction for {} ({} points)", kind, data.len());
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = Some(reply.clone());
        Ok(reply)
    }
}
