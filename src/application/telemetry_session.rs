// Telemetry session - Owns the ingestion state for one running service
use crate::application::display_coalescer::DisplayCoalescer;
use crate::application::prediction_gate::{PredictionGate, Readiness};
use crate::application::render_sink::RenderSink;
use crate::application::series_store::{IngestResult, SeriesStore};
use crate::application::subscription_registry::SubscriptionRegistry;
use crate::domain::series::{DisplayPoint, SeriesKind};
use crate::domain::telemetry::TelemetryEvent;
use crate::infrastructure::config::IngestSettings;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub type SharedSession = Arc<Mutex<TelemetrySession>>;

/// Lock the session, recovering the guard if a previous holder panicked.
pub fn lock_session(session: &Mutex<TelemetrySession>) -> MutexGuard<'_, TelemetrySession> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionCounters {
    pub accepted: u64,
    pub dropped: u64,
    pub rejected: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub counters: SessionCounters,
    pub archived: Vec<(SeriesKind, usize)>,
}

/// Registry, store, coalescer and gate behind a single synchronous ingestion entry point.
pub struct TelemetrySession {
    registry: SubscriptionRegistry,
    store: SeriesStore,
    coalescer: DisplayCoalescer,
    gate: PredictionGate,
    sink: Box<dyn RenderSink>,
    prediction_threshold: usize,
    counters: SessionCounters,
}

impl TelemetrySession {
    pub fn new(settings: &IngestSettings, sink: Box<dyn RenderSink>) -> Self {
        tracing::info!(
            "Starting telemetry session (window={}, coalesce={}, threshold={})",
            settings.max_data_points,
            settings.coalesce_buffer,
            settings.prediction_threshold
        );

        Self {
            registry: SubscriptionRegistry::new(),
            store: SeriesStore::new(settings.max_data_points),
            coalescer: DisplayCoalescer::new(settings.coalesce_buffer),
            gate: PredictionGate::new(),
            sink,
            prediction_threshold: settings.prediction_threshold,
            counters: SessionCounters::default(),
        }
    }

    pub fn ingest(&mut self, event: &TelemetryEvent) -> IngestResult {
        let result = self.store.ingest(event, &self.registry);

        match result {
            IngestResult::Accepted { kind, point } => {
                self.counters.accepted += 1;
                self.coalescer
                    .push(kind, point, &self.store, self.sink.as_mut());
                self.gate.recompute(&self.store);
                tracing::debug!("Accepted {} reading from {}", kind, event.topic);
            }
            IngestResult::Dropped => {
                self.counters.dropped += 1;
                tracing::debug!("Ignoring reading for unsubscribed topic {}", event.topic);
            }
            IngestResult::Rejected { kind } => {
                self.counters.rejected += 1;
                tracing::warn!(
                    "Reading on {} routed to {} but carries no {} value",
                    event.topic,
                    kind,
                    kind
                );
            }
        }

        result
    }

    pub fn subscribe(&mut self, topic: &str) -> bool {
        self.registry.subscribe(topic)
    }

    pub fn unsubscribe(&mut self, topic: &str) -> bool {
        self.registry.unsubscribe(topic)
    }

    pub fn is_subscribed(&self, topic: &str) -> bool {
        self.registry.is_subscribed(topic)
    }

    pub fn topics(&self) -> Vec<String> {
        self.registry.topics()
    }

    pub fn window(&self, kind: SeriesKind) -> Vec<DisplayPoint> {
        self.store.window_snapshot(kind)
    }

    pub fn archive(&self, kind: SeriesKind) -> Vec<DisplayPoint> {
        self.store.archive(kind).to_vec()
    }

    pub fn archive_len(&self, kind: SeriesKind) -> usize {
        self.store.archive_len(kind)
    }

    pub fn prediction_threshold(&self) -> usize {
        self.prediction_threshold
    }

    pub fn has_enough_data(&self, kind: SeriesKind) -> bool {
        self.gate.has_enough_data(kind, self.prediction_threshold)
    }

    pub fn readiness(&self) -> Readiness {
        self.gate.readiness(self.prediction_threshold)
    }

    pub fn counters(&self) -> SessionCounters {
        self.counters
    }

    /// Flush outstanding render notifications and report what the session saw.
    pub fn shutdown(&mut self) -> SessionSummary {
        self.coalescer
            .flush_pending(&self.store, self.sink.as_mut());

        let summary = SessionSummary {
            counters: self.counters,
            archived: SeriesKind::ALL
                .iter()
                .map(|kind| (*kind, self.store.archive_len(*kind)))
                .collect(),
        };

        tracing::info!(
            "Telemetry session closed: {} accepted, {} dropped, {} rejected",
            summary.counters.accepted,
            summary.counters.dropped,
            summary.counters.rejected
        );

        summary
    }
}
