// Telemetry reading domain models
use super::error::TelemetryDecodeError;
use super::series::SeriesKind;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Accepted naive layouts; readings without an offset are taken as UTC.
const NAIVE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Wire shape of a reading as it travels through the broker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryMessage {
    pub topic: String,
    pub time: String,
    pub temperature: f64,
    pub humidity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryEvent {
    pub topic: String,
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: Option<f64>,
}

impl TelemetryEvent {
    pub fn new(
        topic: impl Into<String>,
        timestamp: DateTime<Utc>,
        temperature: f64,
        humidity: f64,
        pressure: Option<f64>,
    ) -> Self {
        Self {
            topic: topic.into(),
            timestamp,
            temperature,
            humidity,
            pressure,
        }
    }

    /// The measurement that feeds the series of `kind`, if the reading carries it.
    pub fn value_for(&self, kind: SeriesKind) -> Option<f64> {
        match kind {
            SeriesKind::Temperature => Some(self.temperature),
            SeriesKind::Humidity => Some(self.humidity),
            SeriesKind::Pressure => self.pressure,
        }
    }
}

impl TryFrom<TelemetryMessage> for TelemetryEvent {
    type Error = TelemetryDecodeError;

    fn try_from(message: TelemetryMessage) -> Result<Self, Self::Error> {
        let timestamp = parse_timestamp(&message.time)?;
        Ok(Self {
            topic: message.topic,
            timestamp,
            temperature: message.temperature,
            humidity: message.humidity,
            pressure: message.pressure,
        })
    }
}

/// Decode a broker payload into a reading.
pub fn decode_payload(payload: &[u8]) -> Result<TelemetryEvent, TelemetryDecodeError> {
    let message: TelemetryMessage = serde_json::from_slice(payload)?;
    TelemetryEvent::try_from(message)
}

/// Parse an ISO-8601 timestamp, with or without an offset.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, TelemetryDecodeError> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    NAIVE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| TelemetryDecodeError::Timestamp(raw.to_string()))
}
