use serde::Deserialize;
use std::time::Duration;

use crate::application::display_coalescer::DEFAULT_COALESCE_BUFFER;
use crate::application::prediction_gate::DEFAULT_PREDICTION_THRESHOLD;
use crate::application::series_store::DEFAULT_MAX_DATA_POINTS;

pub const DEFAULT_TOPIC: &str = "sensor/data";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub ingest: IngestSettings,
    #[serde(default)]
    pub publisher: PublisherSettings,
    #[serde(default)]
    pub prediction: PredictionSettings,
    #[serde(default)]
    pub broker: BrokerSettings,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct IngestSettings {
    pub max_data_points: usize,
    pub coalesce_buffer: usize,
    pub prediction_threshold: usize,
    pub initial_subscriptions: Vec<String>,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            max_data_points: DEFAULT_MAX_DATA_POINTS,
            coalesce_buffer: DEFAULT_COALESCE_BUFFER,
            prediction_threshold: DEFAULT_PREDICTION_THRESHOLD,
            initial_subscriptions: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PublisherSettings {
    pub batch_size: usize,
    pub inter_batch_delay_ms: u64,
    pub default_topic: String,
    /// Remote service to publish to. Jobs publish to the local broker when unset.
    pub target_url: Option<String>,
    pub request_timeout_secs: u64,
}

impl PublisherSettings {
    pub fn inter_batch_delay(&self) -> Duration {
        Duration::from_millis(self.inter_batch_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for PublisherSettings {
    fn default() -> Self {
        Self {
            batch_size: 10,
            inter_batch_delay_ms: 500,
            default_topic: DEFAULT_TOPIC.to_string(),
            target_url: None,
            request_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PredictionSettings {
    pub endpoint: Option<String>,
    pub request_timeout_secs: u64,
}

impl PredictionSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for PredictionSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BrokerSettings {
    pub capacity: usize,
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self { capacity: 1024 }
    }
}

/// Load `config/telemetry.toml` (optional) overlaid with `TELEMETRY__SECTION__KEY` variables.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/telemetry").required(false))
        .add_source(
            config::Environment::with_prefix("TELEMETRY")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
