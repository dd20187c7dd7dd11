// Publish domain models
use super::telemetry::TelemetryMessage;
use serde::{Deserialize, Serialize};

/// One `(timestamp, value)` pair taken from a dataset line, bound to a topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishRecord {
    pub topic: String,
    pub timestamp: String,
    pub value: f64,
}

impl PublishRecord {
    pub fn new(topic: impl Into<String>, timestamp: impl Into<String>, value: f64) -> Self {
        Self {
            topic: topic.into(),
            timestamp: timestamp.into(),
            value,
        }
    }

    /// Outbound publish body. Dataset values are temperatures; humidity is sent as zero.
    pub fn to_message(&self) -> TelemetryMessage {
        TelemetryMessage {
            topic: self.topic.clone(),
            time: self.timestamp.clone(),
            temperature: self.value,
            humidity: 0.0,
            pressure: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishState {
    Idle,
    Parsing,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl PublishState {
    pub fn is_active(&self) -> bool {
        matches!(self, PublishState::Parsing | PublishState::Running)
    }
}

/// Progress snapshot of the current (or last) publish job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishStatus {
    pub state: PublishState,
    pub sent: usize,
    pub total: usize,
    pub batches_dispatched: usize,
    pub skipped_lines: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PublishStatus {
    pub fn idle() -> Self {
        Self {
            state: PublishState::Idle,
            sent: 0,
            total: 0,
            batches_dispatched: 0,
            skipped_lines: 0,
            error: None,
        }
    }
}

impl Default for PublishStatus {
    fn default() -> Self {
        Self::idle()
    }
}
