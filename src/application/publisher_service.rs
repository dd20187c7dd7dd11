// Publisher service - Starts, stops and reports the background publish job
use crate::application::publish_pipeline::{CancelFlag, PublishOutcome, PublishPipeline};
use crate::domain::error::PublishError;
use crate::domain::publish::PublishStatus;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;

#[derive(Clone)]
pub struct PublisherService {
    pipeline: Arc<PublishPipeline>,
    current: Arc<Mutex<Option<CancelFlag>>>,
}

impl PublisherService {
    pub fn new(pipeline: Arc<PublishPipeline>) -> Self {
        Self {
            pipeline,
            current: Arc::new(Mutex::new(None)),
        }
    }

    /// Parse `dataset` and run it in the background. Parse-time failures are returned
    /// directly; transport failures show up in the status.
    pub fn start(&self, dataset: &str, topic: &str) -> Result<PublishStatus, PublishError> {
        let job = self.pipeline.prepare(dataset.lines(), topic)?;
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(job.cancel_flag());

        let pipeline = self.pipeline.clone();
        tokio::spawn(async move {
            match pipeline.run(job).await {
                Ok(PublishOutcome::Completed { sent }) => {
                    tracing::info!("Publish job completed, {} records sent", sent);
                }
                Ok(PublishOutcome::Cancelled { sent }) => {
                    tracing::info!("Publish job stopped, {} records sent", sent);
                }
                Err(e) => {
                    tracing::error!("Publish job failed: {}", e);
                }
            }
        });

        Ok(self.pipeline.status())
    }

    /// Request a stop; the running batch still completes.
    pub fn stop(&self) -> PublishStatus {
        if let Some(flag) = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            flag.cancel();
            tracing::info!("Stop requested for publish job");
        }
        self.pipeline.status()
    }

    pub fn status(&self) -> PublishStatus {
        self.pipeline.status()
    }

    pub fn watch_status(&self) -> watch::Receiver<PublishStatus> {
        self.pipeline.watch_status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::publish_transport::{Pacer, PublishTransport};
    use crate::domain::error::TransportError;
    use crate::domain::publish::{PublishRecord, PublishState};
    use crate::infrastructure::config::PublisherSettings;
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::sync::Notify;

    struct OkTransport;

    #[async_trait]
    impl PublishTransport for OkTransport {
        async fn publish(&self, _record: &PublishRecord) -> Result<(), TransportError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct GatedPacer {
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl Pacer for GatedPacer {
        async fn pause(&self, _delay: Duration) {
            self.entered.notify_one();
            self.release.notified().await;
        }
    }

    fn dataset(count: usize) -> String {
        (0..count)
            .map(|i| format!("{{\"2024-01-01T00:00:{:02}\":{}}}", i, i))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn service(pacer: Arc<GatedPacer>) -> PublisherService {
        let pipeline = PublishPipeline::new(Arc::new(OkTransport), pacer, &PublisherSettings::default());
        PublisherService::new(Arc::new(pipeline))
    }

    #[tokio::test]
    async fn test_stop_after_first_batch() {
        let pacer = Arc::new(GatedPacer::default());
        let service = service(pacer.clone());
        let mut rx = service.watch_status();

        service.start(&dataset(25), "sensor/data").unwrap();
        pacer.entered.notified().await;
        service.stop();
        pacer.release.notify_one();

        let status = rx
            .wait_for(|status| !status.state.is_active())
            .await
            .unwrap()
            .clone();
        assert_eq!(status.state, PublishState::Cancelled);
        assert_eq!(status.sent, 10);
        assert_eq!(status.total, 25);
    }

    #[tokio::test]
    async fn test_start_rejects_empty_dataset() {
        let service = service(Arc::new(GatedPacer::default()));

        assert!(matches!(service.start("\n\n", "t"), Err(PublishError::NoInput)));
        assert_eq!(service.status().state, PublishState::Idle);
        // Nothing running, stop is harmless
        assert_eq!(service.stop().state, PublishState::Idle);
    }

    #[tokio::test]
    async fn test_second_start_while_running_is_refused() {
        let pacer = Arc::new(GatedPacer::default());
        let service = service(pacer.clone());

        service.start(&dataset(15), "t").unwrap();
        pacer.entered.notified().await;

        assert!(matches!(
            service.start(&dataset(3), "t"),
            Err(PublishError::AlreadyRunning)
        ));
        pacer.release.notify_one();
    }
}
