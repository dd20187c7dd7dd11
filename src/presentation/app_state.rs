// Application state for HTTP handlers
use crate::application::prediction_service::PredictionService;
use crate::application::publisher_service::PublisherService;
use crate::application::subscription_service::SubscriptionService;
use crate::application::telemetry_session::SharedSession;
use crate::infrastructure::chart_feed::ChartFeed;
use crate::infrastructure::local_broker::LocalBroker;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Clone)]
pub struct AppState {
    pub subscription_service: SubscriptionService,
    pub publisher_service: PublisherService,
    pub prediction_service: PredictionService,
    pub session: SharedSession,
    pub chart_feed: ChartFeed,
    pub broker: Arc<LocalBroker>,
    pub default_topic: String,
    /// Flips to true when the server starts shutting down.
    pub shutdown: watch::Receiver<bool>,
}
