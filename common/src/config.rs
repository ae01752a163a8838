use serde::{Deserialize, Serialize};

use crate::{policy::TempBounds, types::VarAddress};

const MAX_ZONE_INDEX: u16 = 1_000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusSourceConfig {
    /// Empty means `http://localhost:{81 + zone_index}`.
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VariableStoreConfig {
    pub base_url: String,
    pub user: String,
    pub pass: String,
    pub update_flag: VarAddress,
    pub ack_flag: VarAddress,
    /// Heartbeat lives at `heartbeat_base + zone_index` in the state variables.
    pub heartbeat_base: u16,
}

impl Default for VariableStoreConfig {
    fn default() -> Self {
        Self {
            base_url: "http://10.0.1.10".to_string(),
            user: String::new(),
            pass: String::new(),
            update_flag: VarAddress::state(27),
            ack_flag: VarAddress::state(37),
            heartbeat_base: 45,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    pub api_url: String,
    pub api_key: String,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.prowlapp.com/publicapi".to_string(),
            api_key: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub api_url: String,
    pub username: String,
    pub key: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            api_url: "https://io.adafruit.com/api/v2".to_string(),
            username: String::new(),
            key: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub name: String,
    pub stream: String,
    pub zone_index: u16,
    pub lower_temp_f: f64,
    pub upper_temp_f: f64,
    pub poll_interval_secs: u64,
    pub retry_interval_secs: u64,
    pub retry_log_burst: u32,
    pub retry_log_every: u32,
    pub http_timeout_secs: u64,
    pub dry_run: bool,
    pub status_port: Option<u16>,
    pub status_source: StatusSourceConfig,
    pub variable_store: VariableStoreConfig,
    pub notifier: NotifierConfig,
    pub telemetry: TelemetryConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            name: "Furnace".to_string(),
            stream: "furnace".to_string(),
            zone_index: 0,
            lower_temp_f: 50.0,
            upper_temp_f: 90.0,
            poll_interval_secs: 60,
            retry_interval_secs: 30,
            retry_log_burst: 3,
            retry_log_every: 10,
            http_timeout_secs: 30,
            dry_run: false,
            status_port: Some(8090),
            status_source: StatusSourceConfig::default(),
            variable_store: VariableStoreConfig::default(),
            notifier: NotifierConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl BridgeConfig {
    pub fn sanitize(&mut self) {
        self.zone_index = self.zone_index.min(MAX_ZONE_INDEX);
        self.poll_interval_secs = self.poll_interval_secs.max(1);
        self.retry_interval_secs = self.retry_interval_secs.max(1);
        self.retry_log_every = self.retry_log_every.max(1);
        self.http_timeout_secs = self.http_timeout_secs.max(1);

        if !self.lower_temp_f.is_finite() {
            self.lower_temp_f = 50.0;
        }
        if !self.upper_temp_f.is_finite() {
            self.upper_temp_f = 90.0;
        }
        if self.lower_temp_f > self.upper_temp_f {
            std::mem::swap(&mut self.lower_temp_f, &mut self.upper_temp_f);
        }

        if self.status_source.base_url.trim().is_empty() {
            self.status_source.base_url = format!("http://localhost:{}", 81 + self.zone_index);
        }
        trim_trailing_slash(&mut self.status_source.base_url);
        trim_trailing_slash(&mut self.variable_store.base_url);
        trim_trailing_slash(&mut self.notifier.api_url);
        trim_trailing_slash(&mut self.telemetry.api_url);
    }

    pub fn temp_bounds(&self) -> TempBounds {
        TempBounds {
            lower: self.lower_temp_f,
            upper: self.upper_temp_f,
        }
    }

    pub fn heartbeat_address(&self) -> VarAddress {
        VarAddress::state(
            self.variable_store
                .heartbeat_base
                .saturating_add(self.zone_index),
        )
    }
}

fn trim_trailing_slash(url: &mut String) {
    while url.ends_with('/') {
        url.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VarKind;

    #[test]
    fn partial_file_fills_defaults() {
        let raw = r#"{"zone_index": 1, "variable_store": {"base_url": "http://isy.local/"}}"#;
        let mut config: BridgeConfig = serde_json::from_str(raw).unwrap();
        config.sanitize();

        assert_eq!(config.zone_index, 1);
        assert_eq!(config.poll_interval_secs, 60);
        assert_eq!(config.variable_store.base_url, "http://isy.local");
        assert_eq!(config.variable_store.update_flag, VarAddress::state(27));
        assert_eq!(config.status_source.base_url, "http://localhost:82");
        assert_eq!(config.heartbeat_address().id, 46);
        assert_eq!(config.heartbeat_address().kind, VarKind::State);
    }

    #[test]
    fn sanitize_repairs_bounds_and_intervals() {
        let mut config = BridgeConfig {
            lower_temp_f: 95.0,
            upper_temp_f: 55.0,
            poll_interval_secs: 0,
            retry_interval_secs: 0,
            zone_index: 9_999,
            ..BridgeConfig::default()
        };
        config.sanitize();

        assert_eq!(config.lower_temp_f, 55.0);
        assert_eq!(config.upper_temp_f, 95.0);
        assert_eq!(config.poll_interval_secs, 1);
        assert_eq!(config.retry_interval_secs, 1);
        assert_eq!(config.zone_index, MAX_ZONE_INDEX);
    }
}
