// Series store - Bounded display windows and unbounded archives per series
use crate::application::subscription_registry::SubscriptionRegistry;
use crate::application::telemetry_router::classify;
use crate::domain::series::{DisplayPoint, SeriesKind};
use crate::domain::telemetry::TelemetryEvent;
use std::collections::VecDeque;

pub const DEFAULT_MAX_DATA_POINTS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IngestResult {
    Accepted { kind: SeriesKind, point: DisplayPoint },
    /// Topic is not subscribed; nothing was touched.
    Dropped,
    /// Routed to a series whose field the reading does not carry.
    Rejected { kind: SeriesKind },
}

#[derive(Debug, Clone, Default)]
pub struct SeriesBuffer {
    display_window: VecDeque<DisplayPoint>,
    archive: Vec<DisplayPoint>,
}

impl SeriesBuffer {
    fn push(&mut self, point: DisplayPoint, capacity: usize) {
        self.archive.push(point);
        self.display_window.push_back(point);
        while self.display_window.len() > capacity {
            self.display_window.pop_front();
        }
    }
}

#[derive(Debug, Clone)]
pub struct SeriesStore {
    buffers: [SeriesBuffer; 3],
    max_data_points: usize,
}

impl SeriesStore {
    pub fn new(max_data_points: usize) -> Self {
        Self {
            buffers: Default::default(),
            max_data_points: max_data_points.max(1),
        }
    }

    pub fn ingest(&mut self, event: &TelemetryEvent, registry: &SubscriptionRegistry) -> IngestResult {
        if !registry.is_subscribed(&event.topic) {
            return IngestResult::Dropped;
        }

        let kind = classify(&event.topic);
        let Some(value) = event.value_for(kind) else {
            return IngestResult::Rejected { kind };
        };

        let point = DisplayPoint::new(event.timestamp, value);
        self.buffers[kind.index()].push(point, self.max_data_points);

        IngestResult::Accepted { kind, point }
    }

    pub fn display_window(&self, kind: SeriesKind) -> &VecDeque<DisplayPoint> {
        &self.buffers[kind.index()].display_window
    }

    /// Ordered copy of the display window, oldest point first
    pub fn window_snapshot(&self, kind: SeriesKind) -> Vec<DisplayPoint> {
        self.display_window(kind).iter().copied().collect()
    }

    pub fn archive(&self, kind: SeriesKind) -> &[DisplayPoint] {
        &self.buffers[kind.index()].archive
    }

    pub fn archive_len(&self, kind: SeriesKind) -> usize {
        self.buffers[kind.index()].archive.len()
    }
}

impl Default for SeriesStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DATA_POINTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn subscribed(topics: &[&str]) -> SubscriptionRegistry {
        let mut registry = SubscriptionRegistry::new();
        for topic in topics {
            registry.subscribe(topic);
        }
        registry
    }

    fn reading(topic: &str, second: i64, value: f64) -> TelemetryEvent {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        TelemetryEvent::new(topic, base + Duration::seconds(second), value, value + 100.0, Some(value + 1000.0))
    }

    #[test]
    fn test_single_temperature_reading() {
        let registry = subscribed(&["sensor/temperature"]);
        let mut store = SeriesStore::default();
        let event = TelemetryEvent::new(
            "sensor/temperature",
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            21.5,
            0.0,
            None,
        );

        let result = store.ingest(&event, &registry);

        assert!(matches!(result, IngestResult::Accepted { kind: SeriesKind::Temperature, .. }));
        assert_eq!(
            store.window_snapshot(SeriesKind::Temperature),
            vec![DisplayPoint::new(event.timestamp, 21.5)]
        );
        assert_eq!(store.archive_len(SeriesKind::Temperature), 1);
    }

    #[test]
    fn test_window_keeps_most_recent_fifty() {
        let registry = subscribed(&["sensor/temperature"]);
        let mut store = SeriesStore::default();

        for i in 1..=60 {
            store.ingest(&reading("sensor/temperature", i, i as f64), &registry);
        }

        let window = store.window_snapshot(SeriesKind::Temperature);
        assert_eq!(window.len(), 50);
        let values: Vec<f64> = window.iter().map(|p| p.y).collect();
        let expected: Vec<f64> = (11..=60).map(|i| i as f64).collect();
        assert_eq!(values, expected);
        assert_eq!(store.archive_len(SeriesKind::Temperature), 60);
    }

    #[test]
    fn test_window_length_tracks_min_n_capacity() {
        for n in [0usize, 1, 49, 50, 51, 120] {
            let registry = subscribed(&["t/humidity"]);
            let mut store = SeriesStore::default();
            for i in 0..n {
                store.ingest(&reading("t/humidity", i as i64, i as f64), &registry);
            }

            assert_eq!(store.display_window(SeriesKind::Humidity).len(), n.min(50));
            assert_eq!(store.archive_len(SeriesKind::Humidity), n);
        }
    }

    #[test]
    fn test_window_agrees_with_archive_tail() {
        let registry = subscribed(&["s/pressure"]);
        let mut store = SeriesStore::new(5);
        for i in 0..12 {
            store.ingest(&reading("s/pressure", i, i as f64), &registry);
        }

        let archive = store.archive(SeriesKind::Pressure);
        let window = store.window_snapshot(SeriesKind::Pressure);
        assert_eq!(window.as_slice(), &archive[archive.len() - 5..]);
    }

    #[test]
    fn test_unsubscribed_reading_is_dropped() {
        let registry = subscribed(&["sensor/temperature"]);
        let mut store = SeriesStore::default();

        let result = store.ingest(&reading("sensor/humidity", 0, 1.0), &registry);

        assert_eq!(result, IngestResult::Dropped);
        for kind in SeriesKind::ALL {
            assert!(store.archive(kind).is_empty());
            assert!(store.display_window(kind).is_empty());
        }
    }

    #[test]
    fn test_fields_follow_routed_kind() {
        let registry = subscribed(&["a/humidity", "a/pressure", "a/data"]);
        let mut store = SeriesStore::default();

        store.ingest(&reading("a/humidity", 0, 1.0), &registry);
        store.ingest(&reading("a/pressure", 1, 2.0), &registry);
        store.ingest(&reading("a/data", 2, 3.0), &registry);

        assert_eq!(store.archive(SeriesKind::Humidity)[0].y, 101.0);
        assert_eq!(store.archive(SeriesKind::Pressure)[0].y, 1002.0);
        assert_eq!(store.archive(SeriesKind::Temperature)[0].y, 3.0);
    }

    #[test]
    fn test_pressure_reading_without_pressure_is_rejected() {
        let registry = subscribed(&["a/pressure"]);
        let mut store = SeriesStore::default();
        let event = TelemetryEvent::new("a/pressure", Utc::now(), 20.0, 30.0, None);

        let result = store.ingest(&event, &registry);

        assert_eq!(result, IngestResult::Rejected { kind: SeriesKind::Pressure });
        assert_eq!(store.archive_len(SeriesKind::Pressure), 0);
    }
}
