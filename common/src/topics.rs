pub const EVENT_FIRST_RUN: &str = "first run";
pub const EVENT_MODE_CHANGE: &str = "mode change";
pub const EVENT_TEMPERATURE: &str = "temp";

pub const CHANNEL_ACTIVITY: &str = "activity";
pub const CHANNEL_TEMPERATURE: &str = "temp";
pub const CHANNEL_HUMIDITY: &str = "rh";

/// Feed key for one zone's metric, e.g. `furnace0temp`.
pub fn telemetry_channel(stream: &str, zone_index: u16, metric: &str) -> String {
    format!("{stream}{zone_index}{metric}")
}
