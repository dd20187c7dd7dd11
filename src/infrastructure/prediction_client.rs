// Prediction client - Forwards archived points to the external prediction service
use crate::application::prediction_service::PredictionBackend;
use crate::domain::error::PredictionError;
use crate::domain::series::DisplayPoint;
use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct PredictionRequest<'a> {
    data: &'a [DisplayPoint],
    #[serde(skip_serializing_if = "Option::is_none")]
    topic: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct HttpPredictionClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpPredictionClient {
    pub fn new(endpoint: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build prediction HTTP client")?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl PredictionBackend for HttpPredictionClient {
    async fn predict(
        &self,
        data: &[DisplayPoint],
        topic: Option<&str>,
    ) -> Result<serde_json::Value, PredictionError> {
        tracing::info!("Sending {} points to {}", data.len(), self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&PredictionRequest { data, topic })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(PredictionError::Rejected { status, body });
        }

        Ok(response.json::<serde_json::Value>().await?)
    }
}
