use serde::Serialize;

use crate::{
    config::BridgeConfig,
    diff::diff,
    policy::{classify, Notice, NotificationState, TempBounds},
    topics::{telemetry_channel, CHANNEL_ACTIVITY, CHANNEL_HUMIDITY, CHANNEL_TEMPERATURE},
    types::{ChangeVector, HeartbeatState, MirroredVars, TempStatus, ZoneStatus},
    writeback::{plan_writes, VarWrite},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePhase {
    /// First cycle after launch: mode notice always, temperature notice forced.
    Startup,
    /// Periodic cycles: notices only on change.
    Steady,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TelemetryValue {
    Code(i64),
    Reading(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryPoint {
    pub channel: String,
    pub value: TelemetryValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BridgeAction {
    WriteVar(VarWrite),
    ClearUpdateFlag,
    AckUpdate,
    Heartbeat(HeartbeatState),
    Notify(Notice),
    RecordTelemetry(TelemetryPoint),
}

/// Both systems of record as read at the start of a cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub status: ZoneStatus,
    pub vars: MirroredVars,
    pub update_requested: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    pub phase: CyclePhase,
    pub status: ZoneStatus,
    pub vars: MirroredVars,
    pub update_requested: bool,
    pub changes: ChangeVector,
    pub any_changed: bool,
    pub mode_changed: bool,
    pub temp_status: TempStatus,
}

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub zone_index: u16,
    pub bounds: TempBounds,
    pub stream: String,
    pub dry_run: bool,
}

impl EngineSettings {
    pub fn from_config(config: &BridgeConfig) -> Self {
        Self {
            zone_index: config.zone_index,
            bounds: config.temp_bounds(),
            stream: config.stream.clone(),
            dry_run: config.dry_run,
        }
    }
}

/// Writes for every changed field followed by the update-flag reset and acknowledgement.
/// The flag actions are emitted even when no field changed.
pub fn write_back(
    changes: &ChangeVector,
    status: &ZoneStatus,
    zone_index: u16,
) -> Vec<BridgeAction> {
    let mut actions: Vec<BridgeAction> = plan_writes(changes, status, zone_index)
        .into_iter()
        .map(BridgeAction::WriteVar)
        .collect();
    actions.push(BridgeAction::ClearUpdateFlag);
    actions.push(BridgeAction::AckUpdate);
    actions
}

#[derive(Debug, Clone)]
pub struct ReconcileEngine {
    settings: EngineSettings,
    notifications: NotificationState,
    heartbeat: HeartbeatState,
    cycles: u64,
}

impl ReconcileEngine {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            notifications: NotificationState::new(),
            heartbeat: HeartbeatState::default(),
            cycles: 0,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn notifications(&self) -> &NotificationState {
        &self.notifications
    }

    pub fn heartbeat(&self) -> HeartbeatState {
        self.heartbeat
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn toggle_heartbeat(&mut self) -> Vec<BridgeAction> {
        self.heartbeat = self.heartbeat.toggled();
        if self.settings.dry_run {
            Vec::new()
        } else {
            vec![BridgeAction::Heartbeat(self.heartbeat)]
        }
    }

    /// Runs one reconciliation pass. Actions come back in execution order: write-back,
    /// mode notice, temperature notice, telemetry.
    pub fn reconcile(
        &mut self,
        phase: CyclePhase,
        observation: &Observation,
    ) -> (CycleReport, Vec<BridgeAction>) {
        let Observation {
            status,
            vars,
            update_requested,
        } = *observation;

        let changes = diff(&status, &vars);
        let any_changed = changes.any_changed();
        let mode_changed = changes.mode_changed();
        let mut actions = Vec::new();

        if any_changed && !self.settings.dry_run {
            actions.extend(write_back(&changes, &status, self.settings.zone_index));
        }

        if phase == CyclePhase::Startup || mode_changed {
            let notice = self.notifications.mode_notice(&status, update_requested);
            actions.push(BridgeAction::Notify(notice));
        }

        let force = phase == CyclePhase::Startup;
        if let Some(notice) = self
            .notifications
            .temp_notice(&status, self.settings.bounds, force)
        {
            actions.push(BridgeAction::Notify(notice));
        }

        actions.extend(self.telemetry_points(&status).map(BridgeAction::RecordTelemetry));
        self.cycles = self.cycles.saturating_add(1);

        let report = CycleReport {
            phase,
            status,
            vars,
            update_requested,
            changes,
            any_changed,
            mode_changed,
            temp_status: classify(status.temperature, self.settings.bounds),
        };
        (report, actions)
    }

    fn telemetry_points(&self, status: &ZoneStatus) -> impl Iterator<Item = TelemetryPoint> {
        let channel = |metric: &str| {
            telemetry_channel(&self.settings.stream, self.settings.zone_index, metric)
        };
        [
            TelemetryPoint {
                channel: channel(CHANNEL_ACTIVITY),
                value: TelemetryValue::Code(status.activity.code()),
            },
            TelemetryPoint {
                channel: channel(CHANNEL_TEMPERATURE),
                value: TelemetryValue::Reading(status.temperature),
            },
            TelemetryPoint {
                channel: channel(CHANNEL_HUMIDITY),
                value: TelemetryValue::Reading(status.humidity),
            },
        ]
        .into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Activity, Field, OnOff, VarSlot};
    use pretty_assertions::assert_eq;

    fn settings(dry_run: bool) -> EngineSettings {
        EngineSettings {
            zone_index: 0,
            bounds: TempBounds {
                lower: 50.0,
                upper: 90.0,
            },
            stream: "furnace".to_string(),
            dry_run,
        }
    }

    fn observation(temperature: f64, vars_temperature: i64) -> Observation {
        Observation {
            status: ZoneStatus {
                run_state: OnOff::On,
                hold: OnOff::Off,
                activity: Activity::Home,
                temperature,
                humidity: 40.0,
            },
            vars: MirroredVars {
                run_state: 0,
                hold: 0,
                activity: 3,
                temperature: vars_temperature,
                humidity: 40,
            },
            update_requested: false,
        }
    }

    fn settled(observation: &Observation) -> Observation {
        let status = observation.status;
        Observation {
            vars: MirroredVars {
                run_state: status.encoded(Field::RunState),
                hold: status.encoded(Field::Hold),
                activity: status.encoded(Field::Activity),
                temperature: status.encoded(Field::Temperature),
                humidity: status.encoded(Field::Humidity),
            },
            ..*observation
        }
    }

    fn notices(actions: &[BridgeAction]) -> Vec<&str> {
        actions
            .iter()
            .filter_map(|action| match action {
                BridgeAction::Notify(notice) => Some(notice.event.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn startup_cycle_writes_run_state_and_temperature() {
        let mut engine = ReconcileEngine::new(settings(false));
        let (report, actions) = engine.reconcile(CyclePhase::Startup, &observation(68.0, 67));

        assert!(report.any_changed);
        assert!(report.mode_changed);
        assert_eq!(report.temp_status, TempStatus::Ok);

        assert_eq!(
            actions[..4].to_vec(),
            vec![
                BridgeAction::WriteVar(VarWrite {
                    field: Field::RunState,
                    slot: VarSlot(0),
                    value: 1,
                }),
                BridgeAction::WriteVar(VarWrite {
                    field: Field::Temperature,
                    slot: VarSlot(6),
                    value: 68,
                }),
                BridgeAction::ClearUpdateFlag,
                BridgeAction::AckUpdate,
            ]
        );
        assert_eq!(notices(&actions), vec!["first run", "temp"]);

        let channels: Vec<&str> = actions
            .iter()
            .filter_map(|action| match action {
                BridgeAction::RecordTelemetry(point) => Some(point.channel.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(channels, vec!["furnace0activity", "furnace0temp", "furnace0rh"]);
        assert_eq!(engine.cycles(), 1);
    }

    #[test]
    fn settled_steady_cycle_only_records_telemetry() {
        let mut engine = ReconcileEngine::new(settings(false));
        let first = observation(68.0, 67);
        engine.reconcile(CyclePhase::Startup, &first);

        let (report, actions) = engine.reconcile(CyclePhase::Steady, &settled(&first));

        assert!(!report.any_changed);
        assert_eq!(actions.len(), 3);
        assert!(actions
            .iter()
            .all(|action| matches!(action, BridgeAction::RecordTelemetry(_))));
    }

    #[test]
    fn steady_mode_change_is_labelled_mode_change() {
        let mut engine = ReconcileEngine::new(settings(false));
        let first = observation(68.0, 67);
        engine.reconcile(CyclePhase::Startup, &first);

        let mut next = settled(&first);
        next.status.hold = OnOff::On;
        next.update_requested = true;
        let (report, actions) = engine.reconcile(CyclePhase::Steady, &next);

        assert!(report.mode_changed);
        assert_eq!(notices(&actions), vec!["mode change"]);
        let priority = actions.iter().find_map(|action| match action {
            BridgeAction::Notify(notice) => Some(notice.priority),
            _ => None,
        });
        assert_eq!(priority, Some(Some(crate::policy::LOW_PRIORITY)));
    }

    #[test]
    fn sensor_only_change_skips_mode_notice() {
        let mut engine = ReconcileEngine::new(settings(false));
        let first = observation(68.0, 67);
        engine.reconcile(CyclePhase::Startup, &first);

        let mut next = settled(&first);
        next.status.temperature = 95.5;
        let (report, actions) = engine.reconcile(CyclePhase::Steady, &next);

        assert!(report.any_changed);
        assert!(!report.mode_changed);
        assert_eq!(notices(&actions), vec!["temp"]);
        assert_eq!(
            actions[0],
            BridgeAction::WriteVar(VarWrite {
                field: Field::Temperature,
                slot: VarSlot(6),
                value: 95,
            })
        );
    }

    #[test]
    fn dry_run_never_writes() {
        let mut engine = ReconcileEngine::new(settings(true));
        let (report, actions) = engine.reconcile(CyclePhase::Startup, &observation(68.0, 67));

        assert!(report.any_changed);
        assert!(!actions.iter().any(|action| matches!(
            action,
            BridgeAction::WriteVar(_) | BridgeAction::ClearUpdateFlag | BridgeAction::AckUpdate
        )));
        assert_eq!(notices(&actions), vec!["first run", "temp"]);
        assert!(engine.toggle_heartbeat().is_empty());
    }

    #[test]
    fn write_back_acknowledges_even_without_changes() {
        let status = observation(68.0, 68).status;
        assert_eq!(
            write_back(&ChangeVector::default(), &status, 0),
            vec![BridgeAction::ClearUpdateFlag, BridgeAction::AckUpdate]
        );
    }

    #[test]
    fn heartbeat_alternates_between_cycles() {
        let mut engine = ReconcileEngine::new(settings(false));
        assert_eq!(
            engine.toggle_heartbeat(),
            vec![BridgeAction::Heartbeat(HeartbeatState::Clear)]
        );
        assert_eq!(
            engine.toggle_heartbeat(),
            vec![BridgeAction::Heartbeat(HeartbeatState::Set)]
        );
        assert_eq!(engine.heartbeat(), HeartbeatState::Set);
    }
}
