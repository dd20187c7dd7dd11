//! Error types shared across the ingestion and publish paths.

use thiserror::Error;

/// A dataset line or entry that could not be turned into a record.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("line {line}: invalid JSON: {source}")]
    InvalidJson {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("line {line}: expected an object of timestamp to value")]
    NotAnObject { line: usize },

    #[error("line {line}: empty timestamp")]
    EmptyTimestamp { line: usize },

    #[error("line {line}: value for {timestamp:?} is not numeric: {value}")]
    NonNumeric {
        line: usize,
        timestamp: String,
        value: String,
    },
}

#[derive(Error, Debug)]
pub enum TelemetryDecodeError {
    #[error("malformed telemetry payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("unrecognised timestamp: {0:?}")]
    Timestamp(String),
}

/// Failure of a single outbound publish request.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("publish rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("broker unavailable")]
    BrokerUnavailable,

    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("no input to publish")]
    NoInput,

    #[error("a publish job is already running")]
    AlreadyRunning,

    #[error("batch {batch} failed: {source}")]
    Transport {
        batch: usize,
        #[source]
        source: TransportError,
    },
}

#[derive(Error, Debug)]
pub enum SubscriptionError {
    #[error("invalid topic {0:?}")]
    InvalidTopic(String),

    #[error("broker error: {0}")]
    Broker(String),
}

#[derive(Error, Debug)]
pub enum PredictionError {
    #[error("not enough {kind} data: {available} of {required} points")]
    NotReady {
        kind: crate::domain::series::SeriesKind,
        available: usize,
        required: usize,
    },

    #[error("prediction endpoint not configured")]
    Disabled,

    #[error("prediction request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("prediction rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
}
