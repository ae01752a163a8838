pub mod config;
pub mod diff;
pub mod mapper;
pub mod policy;
pub mod reconcile;
pub mod retry;
pub mod topics;
pub mod types;
pub mod writeback;

pub use config::{
    BridgeConfig, NotifierConfig, StatusSourceConfig, TelemetryConfig, VariableStoreConfig,
};
pub use diff::diff;
pub use mapper::{map_status, map_vars, MapError, StatusPayload, VarTable};
pub use policy::{classify, ModeLabel, Notice, NotificationState, TempBounds, LOW_PRIORITY};
pub use reconcile::{
    write_back, BridgeAction, CyclePhase, CycleReport, EngineSettings, Observation,
    ReconcileEngine, TelemetryPoint, TelemetryValue,
};
pub use retry::RetryLog;
pub use topics::*;
pub use types::{
    Activity, ChangeVector, Field, HeartbeatState, MirroredVars, OnOff, TempStatus, VarAddress,
    VarKind, VarSlot, ZoneStatus,
};
pub use writeback::{plan_writes, VarWrite};
