use async_trait::async_trait;
use furnace_common::{TelemetryConfig, TelemetryPoint};
use reqwest::Client;
use serde_json::json;

use crate::{
    clients::TelemetrySink,
    error::{BridgeError, BridgeResult},
};

/// Metrics feed service: one data point per `POST {api_url}/{user}/feeds/{channel}/data`.
pub struct FeedTelemetry {
    client: Client,
    api_url: String,
    username: String,
    key: String,
}

impl FeedTelemetry {
    pub fn new(client: Client, config: &TelemetryConfig) -> Self {
        Self {
            client,
            api_url: config.api_url.clone(),
            username: config.username.clone(),
            key: config.key.clone(),
        }
    }

    fn feed_url(&self, channel: &str) -> String {
        format!("{}/{}/feeds/{channel}/data", self.api_url, self.username)
    }
}

#[async_trait]
impl TelemetrySink for FeedTelemetry {
    async fn record(&self, point: &TelemetryPoint) -> BridgeResult<()> {
        if self.key.is_empty() {
            return Err(BridgeError::Telemetry("no feed key configured".to_string()));
        }

        self.client
            .post(self.feed_url(&point.channel))
            .header("X-AIO-Key", &self.key)
            .json(&json!({ "value": point.value }))
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map(|_| ())
            .map_err(|err| BridgeError::Telemetry(err.to_string()))
    }
}
