// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::{Arc, Mutex}};
use anyhow::Context;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use crate::application::prediction_service::{PredictionBackend, PredictionService};
use crate::application::publish_pipeline::PublishPipeline;
use crate::application::publish_transport::PublishTransport;
use crate::application::publisher_service::PublisherService;
use crate::application::subscription_service::SubscriptionService;
use crate::application::telemetry_session::{lock_session, TelemetrySession};
use crate::infrastructure::broker_bridge::run_bridge;
use crate::infrastructure::chart_feed::ChartFeed;
use crate::infrastructure::config::load_app_config;
use crate::infrastructure::http_publisher::HttpPublishTransport;
use crate::infrastructure::local_broker::LocalBroker;
use crate::infrastructure::pacer::TokioPacer;
use crate::infrastructure::prediction_client::HttpPredictionClient;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::build_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_app_config()?;

    // Broker and ingestion session
    let broker = Arc::new(LocalBroker::new(config.broker.capacity));
    let chart_feed = ChartFeed::new();
    let session = Arc::new(Mutex::new(TelemetrySession::new(
        &config.ingest,
        Box::new(chart_feed.clone()),
    )));
    let bridge = tokio::spawn(run_bridge(broker.receiver(), session.clone()));

    // Create services (application layer)
    let subscription_service = SubscriptionService::new(broker.clone(), session.clone());
    for topic in &config.ingest.initial_subscriptions {
        if let Err(e) = subscription_service.subscribe(topic).await {
            tracing::warn!("Skipping initial subscription {}: {}", topic, e);
        }
    }

    let transport: Arc<dyn PublishTransport> = match &config.publisher.target_url {
        Some(url) => {
            tracing::info!("Publishing jobs to {}", url);
            Arc::new(HttpPublishTransport::new(url, config.publisher.request_timeout())?)
        }
        None => broker.clone(),
    };
    let pipeline = PublishPipeline::new(transport, Arc::new(TokioPacer), &config.publisher);
    let publisher_service = PublisherService::new(Arc::new(pipeline));

    let backend: Option<Arc<dyn PredictionBackend>> = match &config.prediction.endpoint {
        Some(endpoint) => Some(Arc::new(HttpPredictionClient::new(
            endpoint.clone(),
            config.prediction.request_timeout(),
        )?)),
        None => {
            tracing::info!("No prediction endpoint configured, predictions disabled");
            None
        }
    };
    let prediction_service = PredictionService::new(backend, session.clone());

    // Create application state
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let state = Arc::new(AppState {
        subscription_service,
        publisher_service,
        prediction_service,
        session: session.clone(),
        chart_feed,
        broker,
        default_topic: config.publisher.default_topic.clone(),
        shutdown: shutdown_rx,
    });

    // Build router (presentation layer)
    let router = build_router(state);

    // Start server
    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.server.bind))?;
    tracing::info!("Starting sensor-telemetry service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await?;

    bridge.abort();
    let summary = lock_session(&session).shutdown();
    tracing::info!(
        "Session closed: {} accepted, {} dropped, {} rejected",
        summary.counters.accepted,
        summary.counters.dropped,
        summary.counters.rejected
    );

    Ok(())
}

/// Wait for Ctrl-C, then tell open streams to finish.
async fn shutdown_signal(shutdown: watch::Sender<bool>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
    shutdown.send_replace(true);
}
