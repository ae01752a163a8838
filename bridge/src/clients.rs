use async_trait::async_trait;
use furnace_common::{
    map_vars, MirroredVars, Notice, TelemetryPoint, VarAddress, VarTable, ZoneStatus,
};

use crate::error::{BridgeError, BridgeResult};

/// Thermostat status endpoint.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_status(&self) -> BridgeResult<ZoneStatus>;
}

/// Home-automation controller variables.
#[async_trait]
pub trait VariableStore: Send + Sync {
    /// Bulk listing of the integer variables, keyed by slot.
    async fn read_all(&self) -> BridgeResult<VarTable>;

    async fn read_var(&self, address: VarAddress) -> BridgeResult<i64>;

    async fn write_var(&self, address: VarAddress, value: i64) -> BridgeResult<()>;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn push(&self, notice: &Notice) -> BridgeResult<()>;
}

#[async_trait]
pub trait TelemetrySink: Send + Sync {
    async fn record(&self, point: &TelemetryPoint) -> BridgeResult<()>;
}

/// Reads one zone's mirrored fields plus the externally-requested update flag.
pub async fn fetch_mirror(
    store: &dyn VariableStore,
    zone_index: u16,
    update_flag: VarAddress,
) -> BridgeResult<(MirroredVars, bool)> {
    let table = store.read_all().await?;
    let vars = map_vars(&table, zone_index)
        .map_err(|err| BridgeError::fetch("controller listing", err))?;
    let update = store.read_var(update_flag).await?;
    Ok((vars, update != 0))
}
