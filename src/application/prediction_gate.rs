// Prediction gate - Decides whether a series has enough history for prediction
use crate::application::series_store::SeriesStore;
use crate::domain::series::SeriesKind;
use serde::Serialize;

pub const DEFAULT_PREDICTION_THRESHOLD: usize = 50;

/// Per-kind readiness snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Readiness {
    pub threshold: usize,
    pub temperature: bool,
    pub humidity: bool,
    pub pressure: bool,
    pub any: bool,
}

/// Mirrors archive lengths from the store; it owns no data of its own.
#[derive(Debug, Clone, Default)]
pub struct PredictionGate {
    archived: [usize; 3],
}

impl PredictionGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recompute(&mut self, store: &SeriesStore) {
        for kind in SeriesKind::ALL {
            self.archived[kind.index()] = store.archive_len(kind);
        }
    }

    pub fn archived(&self, kind: SeriesKind) -> usize {
        self.archived[kind.index()]
    }

    pub fn has_enough_data(&self, kind: SeriesKind, threshold: usize) -> bool {
        self.archived(kind) >= threshold
    }

    pub fn any_ready(&self, threshold: usize) -> bool {
        SeriesKind::ALL
            .iter()
            .any(|kind| self.has_enough_data(*kind, threshold))
    }

    pub fn readiness(&self, threshold: usize) -> Readiness {
        Readiness {
            threshold,
            temperature: self.has_enough_data(SeriesKind::Temperature, threshold),
            humidity: self.has_enough_data(SeriesKind::Humidity, threshold),
            pressure: self.has_enough_data(SeriesKind::Pressure, threshold),
            any: self.any_ready(threshold),
        }
    }
}
