// Publish pipeline - Paced, cancellable batch upload of a parsed dataset
use crate::application::dataset_parser::parse_dataset;
use crate::application::publish_transport::{Pacer, PublishTransport};
use crate::domain::error::PublishError;
use crate::domain::publish::{PublishRecord, PublishState, PublishStatus};
use crate::infrastructure::config::PublisherSettings;
use futures::future::join_all;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::watch;

/// Shared stop request, checked by the pipeline between batches.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A parsed dataset ready to run. Owned by the pipeline while it runs.
#[derive(Debug)]
pub struct PublishJob {
    records: Vec<PublishRecord>,
    skipped_lines: usize,
    cancel: CancelFlag,
}

impl PublishJob {
    pub fn records(&self) -> &[PublishRecord] {
        &self.records
    }

    pub fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Completed { sent: usize },
    Cancelled { sent: usize },
}

pub struct PublishPipeline {
    transport: Arc<dyn PublishTransport>,
    pacer: Arc<dyn Pacer>,
    batch_size: usize,
    inter_batch_delay: Duration,
    default_topic: String,
    status: watch::Sender<PublishStatus>,
}

impl PublishPipeline {
    pub fn new(
        transport: Arc<dyn PublishTransport>,
        pacer: Arc<dyn Pacer>,
        settings: &PublisherSettings,
    ) -> Self {
        let (status, _) = watch::channel(PublishStatus::idle());
        Self {
            transport,
            pacer,
            batch_size: settings.batch_size.max(1),
            inter_batch_delay: settings.inter_batch_delay(),
            default_topic: settings.default_topic.clone(),
            status,
        }
    }

    pub fn status(&self) -> PublishStatus {
        self.status.borrow().clone()
    }

    pub fn watch_status(&self) -> watch::Receiver<PublishStatus> {
        self.status.subscribe()
    }

    /// Parse `lines` into a job for `topic` (the default topic when empty).
    ///
    /// Fails without touching the current status when nothing is left to parse or
    /// another job is still active.
    pub fn prepare<'a, I>(&self, lines: I, topic: &str) -> Result<PublishJob, PublishError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let lines: Vec<&str> = lines.into_iter().collect();
        if lines.iter().all(|line| line.trim().is_empty()) {
            return Err(PublishError::NoInput);
        }

        let mut busy = false;
        self.status.send_modify(|status| {
            if status.state.is_active() {
                busy = true;
            } else {
                *status = PublishStatus {
                    state: PublishState::Parsing,
                    ..PublishStatus::idle()
                };
            }
        });
        if busy {
            return Err(PublishError::AlreadyRunning);
        }

        let topic = match topic.trim() {
            "" => self.default_topic.as_str(),
            topic => topic,
        };
        let dataset = parse_dataset(lines, topic);

        tracing::info!(
            "Parsed {} records for {} ({} lines and {} entries skipped)",
            dataset.records.len(),
            topic,
            dataset.skipped_lines,
            dataset.skipped.len() - dataset.skipped_lines
        );

        let skipped_lines = dataset.skipped_lines;
        self.status.send_modify(|status| {
            status.total = dataset.records.len();
            status.skipped_lines = skipped_lines;
        });

        Ok(PublishJob {
            records: dataset.records,
            skipped_lines,
            cancel: CancelFlag::new(),
        })
    }

    /// Dispatch the job batch by batch. Each batch settles fully before the next one
    /// starts; a failed request stops the job.
    pub async fn run(&self, job: PublishJob) -> Result<PublishOutcome, PublishError> {
        let total = job.records.len();
        let batch_count = total.div_ceil(self.batch_size);
        self.status.send_modify(|status| {
            status.state = PublishState::Running;
            status.total = total;
        });

        tracing::info!(
            "Publishing {} records in {} batches of up to {}",
            total,
            batch_count,
            self.batch_size
        );

        let mut sent = 0;
        for (index, batch) in job.records.chunks(self.batch_size).enumerate() {
            if job.cancel.is_cancelled() {
                tracing::info!("Publish cancelled after {}/{} records", sent, total);
                self.finish(PublishState::Cancelled, None);
                return Ok(PublishOutcome::Cancelled { sent });
            }

            let results = join_all(batch.iter().map(|record| self.transport.publish(record))).await;

            let mut failure = None;
            for result in results {
                match result {
                    Ok(()) => sent += 1,
                    Err(e) if failure.is_none() => failure = Some(e),
                    Err(_) => {}
                }
            }

            self.status.send_modify(|status| {
                status.sent = sent;
                status.batches_dispatched = index + 1;
            });

            if let Some(source) = failure {
                tracing::error!("Batch {} failed, stopping publish: {}", index, source);
                self.finish(PublishState::Failed, Some(source.to_string()));
                return Err(PublishError::Transport { batch: index, source });
            }

            tracing::info!("Published {}/{} records", sent, total);

            if index + 1 < batch_count {
                self.pacer.pause(self.inter_batch_delay).await;
            }
        }

        self.finish(PublishState::Completed, None);
        Ok(PublishOutcome::Completed { sent })
    }

    fn finish(&self, state: PublishState, error: Option<String>) {
        self.status.send_modify(|status| {
            status.state = state;
            status.error = error;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::TransportError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeTransport {
        published: Mutex<Vec<String>>,
        fail_on: Option<String>,
        cancel_on: Mutex<Option<(String, CancelFlag)>>,
    }

    #[async_trait]
    impl PublishTransport for FakeTransport {
        async fn publish(&self, record: &PublishRecord) -> Result<(), TransportError> {
            if let Some((timestamp, flag)) = self.cancel_on.lock().unwrap().as_ref() {
                if *timestamp == record.timestamp {
                    flag.cancel();
                }
            }
            if self.fail_on.as_deref() == Some(record.timestamp.as_str()) {
                return Err(TransportError::Rejected {
                    status: 500,
                    body: "boom".to_string(),
                });
            }
            self.published.lock().unwrap().push(record.timestamp.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingPacer {
        pauses: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Pacer for RecordingPacer {
        async fn pause(&self, delay: Duration) {
            self.pauses.lock().unwrap().push(delay);
        }
    }

    fn dataset(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("{{\"t{i:03}\":{i}}}")).collect()
    }

    fn pipeline(transport: Arc<FakeTransport>, pacer: Arc<RecordingPacer>) -> PublishPipeline {
        PublishPipeline::new(transport, pacer, &PublisherSettings::default())
    }

    #[tokio::test]
    async fn test_batches_and_pacing() {
        let transport = Arc::new(FakeTransport::default());
        let pacer = Arc::new(RecordingPacer::default());
        let pipeline = pipeline(transport.clone(), pacer.clone());
        let lines = dataset(25);

        let job = pipeline.prepare(lines.iter().map(String::as_str), "sensor/data").unwrap();
        let outcome = pipeline.run(job).await.unwrap();

        assert_eq!(outcome, PublishOutcome::Completed { sent: 25 });
        let status = pipeline.status();
        assert_eq!(status.state, PublishState::Completed);
        assert_eq!(status.batches_dispatched, 3);
        assert_eq!(status.sent, 25);

        let pauses = pacer.pauses.lock().unwrap();
        assert_eq!(pauses.len(), 2);
        let paced: Duration = pauses.iter().sum();
        assert!(paced >= Duration::from_millis(2 * 500));
        assert_eq!(transport.published.lock().unwrap().len(), 25);
    }

    #[tokio::test]
    async fn test_batch_is_settled_before_next_starts() {
        let transport = Arc::new(FakeTransport::default());
        let pacer = Arc::new(RecordingPacer::default());
        let pipeline = pipeline(transport.clone(), pacer);
        let lines = dataset(30);

        let job = pipeline.prepare(lines.iter().map(String::as_str), "").unwrap();
        pipeline.run(job).await.unwrap();

        // Order inside a batch is free, but batches never interleave
        let published = transport.published.lock().unwrap();
        for (batch, chunk) in published.chunks(10).enumerate() {
            for timestamp in chunk {
                let index: usize = timestamp[1..].parse().unwrap();
                assert_eq!(index / 10, batch);
            }
        }
    }

    #[tokio::test]
    async fn test_requests_in_a_batch_run_concurrently() {
        struct BarrierTransport(tokio::sync::Barrier);

        #[async_trait]
        impl PublishTransport for BarrierTransport {
            async fn publish(&self, _record: &PublishRecord) -> Result<(), TransportError> {
                self.0.wait().await;
                Ok(())
            }
        }

        let pipeline = PublishPipeline::new(
            Arc::new(BarrierTransport(tokio::sync::Barrier::new(10))),
            Arc::new(RecordingPacer::default()),
            &PublisherSettings::default(),
        );
        let lines = dataset(10);

        let job = pipeline.prepare(lines.iter().map(String::as_str), "t").unwrap();
        let outcome = pipeline.run(job).await.unwrap();

        assert_eq!(outcome, PublishOutcome::Completed { sent: 10 });
    }

    #[tokio::test]
    async fn test_cancel_during_batch_finishes_that_batch_only() {
        let transport = Arc::new(FakeTransport::default());
        let pacer = Arc::new(RecordingPacer::default());
        let pipeline = pipeline(transport.clone(), pacer);
        let lines = dataset(40);

        let job = pipeline.prepare(lines.iter().map(String::as_str), "t").unwrap();
        *transport.cancel_on.lock().unwrap() = Some(("t015".to_string(), job.cancel_flag()));
        let outcome = pipeline.run(job).await.unwrap();

        assert_eq!(outcome, PublishOutcome::Cancelled { sent: 20 });
        assert_eq!(transport.published.lock().unwrap().len(), 20);
        let status = pipeline.status();
        assert_eq!(status.state, PublishState::Cancelled);
        assert_eq!(status.batches_dispatched, 2);
    }

    #[tokio::test]
    async fn test_failed_request_aborts_remaining_batches() {
        let transport = Arc::new(FakeTransport {
            fail_on: Some("t012".to_string()),
            ..Default::default()
        });
        let pacer = Arc::new(RecordingPacer::default());
        let pipeline = pipeline(transport.clone(), pacer);
        let lines = dataset(35);

        let job = pipeline.prepare(lines.iter().map(String::as_str), "t").unwrap();
        let err = pipeline.run(job).await.unwrap_err();

        assert!(matches!(err, PublishError::Transport { batch: 1, .. }));
        // Batch 0 plus the nine good requests of batch 1
        assert_eq!(transport.published.lock().unwrap().len(), 19);
        let status = pipeline.status();
        assert_eq!(status.state, PublishState::Failed);
        assert!(status.error.unwrap().contains("boom"));
    }

    #[tokio::test]
    async fn test_empty_input_stays_idle() {
        let pipeline = pipeline(
            Arc::new(FakeTransport::default()),
            Arc::new(RecordingPacer::default()),
        );

        let err = pipeline.prepare(["", "  "], "t").unwrap_err();

        assert!(matches!(err, PublishError::NoInput));
        assert_eq!(pipeline.status().state, PublishState::Idle);
        assert!(matches!(
            pipeline.prepare(std::iter::empty::<&str>(), "t"),
            Err(PublishError::NoInput)
        ));
    }

    #[tokio::test]
    async fn test_bad_line_is_skipped_and_job_completes() {
        let transport = Arc::new(FakeTransport::default());
        let pipeline = pipeline(transport.clone(), Arc::new(RecordingPacer::default()));

        let job = pipeline
            .prepare([r#"{"2024-01-01T00:00:00":"21.5"}"#, "not-json"], "")
            .unwrap();
        assert_eq!(job.records().len(), 1);
        assert_eq!(job.records()[0].topic, "sensor/data");
        assert_eq!(job.skipped_lines(), 1);

        let outcome = pipeline.run(job).await.unwrap();

        assert_eq!(outcome, PublishOutcome::Completed { sent: 1 });
        assert_eq!(pipeline.status().skipped_lines, 1);
    }

    #[tokio::test]
    async fn test_terminal_state_stays_until_next_prepare() {
        let pipeline = pipeline(
            Arc::new(FakeTransport::default()),
            Arc::new(RecordingPacer::default()),
        );

        let job = pipeline.prepare(["{\"t1\":1}", "{\"t2\":2}"], "t").unwrap();
        pipeline.run(job).await.unwrap();
        let status = pipeline.status();
        assert_eq!(status.state, PublishState::Completed);
        assert_eq!((status.sent, status.total), (2, 2));

        pipeline.prepare(["{\"t3\":3}"], "t").unwrap();
        let status = pipeline.status();
        assert_eq!(status.state, PublishState::Parsing);
        assert_eq!((status.sent, status.total), (0, 1));
    }

    #[tokio::test]
    async fn test_bad_entries_do_not_count_as_skipped_lines() {
        let pipeline = pipeline(
            Arc::new(FakeTransport::default()),
            Arc::new(RecordingPacer::default()),
        );

        let job = pipeline.prepare([r#"{"":1,"t":"x","u":2}"#], "t").unwrap();

        assert_eq!(job.records().len(), 1);
        assert_eq!(job.skipped_lines(), 0);
        assert_eq!(pipeline.status().skipped_lines, 0);
    }

    #[tokio::test]
    async fn test_all_lines_invalid_completes_immediately() {
        let pacer = Arc::new(RecordingPacer::default());
        let pipeline = pipeline(Arc::new(FakeTransport::default()), pacer.clone());

        let job = pipeline.prepare(["nope", "{\"t\":\"x\"}"], "t").unwrap();
        let outcome = pipeline.run(job).await.unwrap();

        assert_eq!(outcome, PublishOutcome::Completed { sent: 0 });
        assert!(pacer.pauses.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_second_prepare_while_running_is_refused() {
        let pipeline = pipeline(
            Arc::new(FakeTransport::default()),
            Arc::new(RecordingPacer::default()),
        );

        let _job = pipeline.prepare(["{\"t\":1}"], "t").unwrap();

        assert!(matches!(
            pipeline.prepare(["{\"t\":2}"], "t"),
            Err(PublishError::AlreadyRunning)
        ));
    }
}
