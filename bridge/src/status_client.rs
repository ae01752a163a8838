use async_trait::async_trait;
use furnace_common::{map_status, StatusPayload, StatusSourceConfig, ZoneStatus};
use reqwest::Client;

use crate::{
    clients::StatusSource,
    error::{BridgeError, BridgeResult},
};

pub struct HttpStatusSource {
    client: Client,
    url: String,
}

impl HttpStatusSource {
    pub fn new(client: Client, config: &StatusSourceConfig) -> Self {
        Self {
            client,
            url: format!("{}/api/status/1", config.base_url),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl StatusSource for HttpStatusSource {
    async fn fetch_status(&self) -> BridgeResult<ZoneStatus> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|err| BridgeError::fetch("thermostat status request", err))?;
        let body = response
            .bytes()
            .await
            .map_err(|err| BridgeError::fetch("thermostat status body", err))?;

        decode_status(&body)
    }
}

pub(crate) fn decode_status(body: &[u8]) -> BridgeResult<ZoneStatus> {
    let payload = StatusPayload::from_json(body)
        .map_err(|err| BridgeError::fetch("thermostat status json", err))?;
    map_status(&payload).map_err(|err| BridgeError::fetch("thermostat status", err))
}
