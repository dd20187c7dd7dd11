// HTTP publish transport - Posts records to a remote publish endpoint
use crate::application::publish_transport::PublishTransport;
use crate::domain::error::TransportError;
use crate::domain::publish::PublishRecord;
use async_trait::async_trait;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpPublishTransport {
    client: reqwest::Client,
    publish_url: String,
}

impl HttpPublishTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            publish_url: publish_url(base_url),
        })
    }
}

fn publish_url(base_url: &str) -> String {
    format!("{}/api/publish", base_url.trim_end_matches('/'))
}

#[async_trait]
impl PublishTransport for HttpPublishTransport {
    async fn publish(&self, record: &PublishRecord) -> Result<(), TransportError> {
        let response = self
            .client
            .post(&self.publish_url)
            .json(&record.to_message())
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Rejected { status, body });
        }

        tracing::debug!("Published {} to {}", record.timestamp, self.publish_url);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_url_trims_trailing_slash() {
        assert_eq!(publish_url("http://127.0.0.1:8080/"), "http://127.0.0.1:8080/api/publish");
        assert_eq!(publish_url("http://broker.local"), "http://broker.local/api/publish");
    }

    #[tokio::test]
    async fn test_unreachable_target_is_a_request_error() {
        let transport = HttpPublishTransport::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
        let record = PublishRecord::new("sensor/data", "2024-01-01T00:00:00", 1.0);

        let err = transport.publish(&record).await.unwrap_err();

        assert!(matches!(err, TransportError::Request(_)));
    }
}
