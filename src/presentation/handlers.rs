// HTTP request handlers
use crate::application::publish_transport::PublishTransport;
use crate::application::telemetry_router::classify;
use crate::application::telemetry_session::lock_session;
use crate::domain::error::{
    PredictionError, PublishError, SubscriptionError, TelemetryDecodeError, TransportError,
};
use crate::domain::publish::{PublishRecord, PublishStatus};
use crate::domain::series::{DisplayPoint, SeriesKind};
use crate::domain::telemetry::{TelemetryEvent, TelemetryMessage};
use crate::infrastructure::chunked_json::{ndjson_stream, stream_from_watch};
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::infrastructure::local_broker::validate_topic;
use crate::presentation::app_state::AppState;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn build_router(state: Arc<AppState>) -> Router {
    // Compression is handled per response in json_response
    Router::new()
        .route("/healthz", get(health_check))
        .route("/api/subscribe", post(subscribe))
        .route("/api/unsubscribe", post(unsubscribe))
        .route("/api/subscriptions", get(list_subscriptions))
        .route("/api/publish", post(publish))
        .route("/api/publish_batch", post(publish_batch))
        .route("/api/publisher/start", post(start_publisher))
        .route("/api/publisher/stop", post(stop_publisher))
        .route("/api/publisher/status", get(publisher_status))
        .route("/api/publisher/events", get(publisher_events))
        .route("/api/series/:kind", get(series_window))
        .route("/api/series/:kind/archive", get(series_archive))
        .route("/api/charts/stream", get(stream_charts))
        .route("/api/prediction/readiness", get(prediction_readiness))
        .route("/api/predict", post(predict))
        .route("/api/prediction_results", get(prediction_results))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct Ack {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Ack {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }
}

/// Error reply carrying `{success: false, message}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("Request failed ({}): {}", self.status, self.message);
        } else {
            tracing::warn!("Request rejected ({}): {}", self.status, self.message);
        }

        let body = Ack {
            success: false,
            message: Some(self.message),
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<SubscriptionError> for ApiError {
    fn from(e: SubscriptionError) -> Self {
        let status = match e {
            SubscriptionError::InvalidTopic(_) => StatusCode::BAD_REQUEST,
            SubscriptionError::Broker(_) => StatusCode::BAD_GATEWAY,
        };
        Self::new(status, e.to_string())
    }
}

impl From<TransportError> for ApiError {
    fn from(e: TransportError) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, e.to_string())
    }
}

impl From<TelemetryDecodeError> for ApiError {
    fn from(e: TelemetryDecodeError) -> Self {
        Self::new(StatusCode::BAD_REQUEST, e.to_string())
    }
}

impl From<PublishError> for ApiError {
    fn from(e: PublishError) -> Self {
        let status = match e {
            PublishError::NoInput => StatusCode::BAD_REQUEST,
            PublishError::AlreadyRunning => StatusCode::CONFLICT,
            PublishError::Transport { .. } => StatusCode::BAD_GATEWAY,
        };
        Self::new(status, e.to_string())
    }
}

impl From<PredictionError> for ApiError {
    fn from(e: PredictionError) -> Self {
        let status = match e {
            PredictionError::NotReady { .. } => StatusCode::CONFLICT,
            PredictionError::Disabled => StatusCode::SERVICE_UNAVAILABLE,
            PredictionError::Request(_) | PredictionError::Rejected { .. } => {
                StatusCode::BAD_GATEWAY
            }
        };
        Self::new(status, e.to_string())
    }
}

fn parse_kind(name: &str) -> Result<SeriesKind, ApiError> {
    SeriesKind::from_name(name)
        .ok_or_else(|| ApiError::new(StatusCode::BAD_REQUEST, format!("unknown series {name:?}")))
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

#[derive(Debug, Deserialize)]
pub struct TopicRequest {
    pub topic: String,
}

pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TopicRequest>,
) -> Result<Json<Ack>, ApiError> {
    state.subscription_service.subscribe(&request.topic).await?;
    Ok(Json(Ack::ok(format!("Subscribed to {}", request.topic))))
}

pub async fn unsubscribe(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TopicRequest>,
) -> Result<Json<Ack>, ApiError> {
    state.subscription_service.unsubscribe(&request.topic).await?;
    Ok(Json(Ack::ok(format!("Unsubscribed from {}", request.topic))))
}

#[derive(Debug, Serialize)]
pub struct TopicList {
    pub topics: Vec<String>,
}

pub async fn list_subscriptions(State(state): State<Arc<AppState>>) -> Json<TopicList> {
    Json(TopicList {
        topics: state.subscription_service.topics(),
    })
}

/// Publish one reading onto the broker
pub async fn publish(
    State(state): State<Arc<AppState>>,
    Json(message): Json<TelemetryMessage>,
) -> Result<Json<Ack>, ApiError> {
    validate_topic(&message.topic)?;
    TelemetryEvent::try_from(message.clone())?;

    state.broker.publish_message(&message)?;
    Ok(Json(Ack {
        success: true,
        message: None,
    }))
}

#[derive(Debug, Deserialize)]
pub struct PublishBatchRequest {
    pub data: Vec<PublishRecord>,
}

#[derive(Debug, Serialize)]
pub struct PublishBatchReply {
    pub success: bool,
    pub published: usize,
}

pub async fn publish_batch(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PublishBatchRequest>,
) -> Result<Json<PublishBatchReply>, ApiError> {
    let mut published = 0;
    for record in &request.data {
        PublishTransport::publish(state.broker.as_ref(), record).await?;
        published += 1;
    }

    tracing::info!("Published batch of {} records", published);
    Ok(Json(PublishBatchReply {
        success: true,
        published,
    }))
}

#[derive(Debug, Deserialize)]
pub struct StartPublisherRequest {
    pub dataset: String,
    pub topic: Option<String>,
}

pub async fn start_publisher(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StartPublisherRequest>,
) -> Result<Json<PublishStatus>, ApiError> {
    let topic = request
        .topic
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| state.default_topic.clone());

    let status = state.publisher_service.start(&request.dataset, &topic)?;
    Ok(Json(status))
}

pub async fn stop_publisher(State(state): State<Arc<AppState>>) -> Json<PublishStatus> {
    Json(state.publisher_service.stop())
}

pub async fn publisher_status(State(state): State<Arc<AppState>>) -> Json<PublishStatus> {
    Json(state.publisher_service.status())
}

/// Stream every publish status change as NDJSON
pub async fn publisher_events(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    stream_from_watch(
        state.publisher_service.watch_status(),
        state.shutdown.clone(),
    )
}

#[derive(Debug, Serialize)]
pub struct SeriesView {
    pub kind: SeriesKind,
    pub window: Vec<DisplayPoint>,
    pub archive_len: usize,
}

#[derive(Debug, Serialize)]
pub struct ArchiveView {
    pub kind: SeriesKind,
    pub data: Vec<DisplayPoint>,
}

pub async fn series_window(
    Path(kind): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let kind = parse_kind(&kind)?;
    let view = {
        let session = lock_session(&state.session);
        SeriesView {
            kind,
            window: session.window(kind),
            archive_len: session.archive_len(kind),
        }
    };

    Ok(json_response(&view, accepts_brotli(&headers))
        .await
        .into_response())
}

pub async fn series_archive(
    Path(kind): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let kind = parse_kind(&kind)?;
    let view = ArchiveView {
        kind,
        data: lock_session(&state.session).archive(kind),
    };

    Ok(json_response(&view, accepts_brotli(&headers))
        .await
        .into_response())
}

/// Stream chart frames (progressive redraws)
pub async fn stream_charts(State(state): State<Arc<AppState>>) -> Response {
    match ndjson_stream(state.chart_feed.frames(), state.shutdown.clone()) {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

pub async fn prediction_readiness(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.prediction_service.readiness())
}

#[derive(Debug, Default, Deserialize)]
pub struct PredictRequest {
    pub kind: Option<String>,
    pub topic: Option<String>,
}

pub async fn predict(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PredictRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    // Without an explicit kind the topic suffix decides, as for ingestion
    let kind = match (&request.kind, &request.topic) {
        (Some(name), _) => parse_kind(name)?,
        (None, Some(topic)) => classify(topic),
        (None, None) => SeriesKind::Temperature,
    };

    let reply = state
        .prediction_service
        .predict(kind, request.topic.as_deref())
        .await?;
    Ok(Json(reply))
}

/// Reply of the last successful prediction
pub async fn prediction_results(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .prediction_service
        .latest_result()
        .map(Json)
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "no prediction results available"))
}
