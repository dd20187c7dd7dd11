// Series domain model
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKind {
    Temperature,
    Humidity,
    Pressure,
}

impl SeriesKind {
    pub const ALL: [SeriesKind; 3] = [
        SeriesKind::Temperature,
        SeriesKind::Humidity,
        SeriesKind::Pressure,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SeriesKind::Temperature => "temperature",
            SeriesKind::Humidity => "humidity",
            SeriesKind::Pressure => "pressure",
        }
    }

    /// Strict lookup used by the HTTP layer. Topic routing has its own lenient rules.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "temperature" => Some(SeriesKind::Temperature),
            "humidity" => Some(SeriesKind::Humidity),
            "pressure" => Some(SeriesKind::Pressure),
            _ => None,
        }
    }

    pub fn index(&self) -> usize {
        match self {
            SeriesKind::Temperature => 0,
            SeriesKind::Humidity => 1,
            SeriesKind::Pressure => 2,
        }
    }
}

impl fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single chart point: `x` is the reading time, `y` the measured value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayPoint {
    pub x: DateTime<Utc>,
    pub y: f64,
}

impl DisplayPoint {
    pub fn new(x: DateTime<Utc>, y: f64) -> Self {
        Self { x, y }
    }
}
