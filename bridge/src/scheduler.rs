use std::{sync::Arc, time::Duration};

use chrono::Utc;
use furnace_common::{
    BridgeAction, BridgeConfig, CyclePhase, CycleReport, EngineSettings, Field, Observation,
    ReconcileEngine, RetryLog, VarAddress,
};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::{
    clients::{fetch_mirror, Notifier, StatusSource, TelemetrySink, VariableStore},
    error::{BridgeError, BridgeResult},
};

#[derive(Clone)]
pub struct Services {
    pub status: Arc<dyn StatusSource>,
    pub store: Arc<dyn VariableStore>,
    pub notifier: Arc<dyn Notifier>,
    pub telemetry: Arc<dyn TelemetrySink>,
}

#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    pub zone_index: u16,
    pub poll_interval: Duration,
    pub retry_interval: Duration,
    pub retry_log_burst: u32,
    pub retry_log_every: u32,
    pub update_flag: VarAddress,
    pub ack_flag: VarAddress,
    pub heartbeat: VarAddress,
    pub dry_run: bool,
}

impl SchedulerSettings {
    pub fn from_config(config: &BridgeConfig) -> Self {
        Self {
            zone_index: config.zone_index,
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            retry_interval: Duration::from_secs(config.retry_interval_secs),
            retry_log_burst: config.retry_log_burst,
            retry_log_every: config.retry_log_every,
            update_flag: config.variable_store.update_flag,
            ack_flag: config.variable_store.ack_flag,
            heartbeat: config.heartbeat_address(),
            dry_run: config.dry_run,
        }
    }
}

/// Read-only view of the loop, published after every cycle.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusSnapshot {
    pub heartbeat: String,
    pub cycles: u64,
    #[serde(rename = "lastCycleAt")]
    pub last_cycle_at: Option<String>,
    #[serde(rename = "lastReport")]
    pub last_report: Option<CycleReport>,
    #[serde(rename = "failedWrites")]
    pub failed_writes: Vec<Field>,
    #[serde(rename = "fetchFailures")]
    pub fetch_failures: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

pub struct Scheduler {
    services: Services,
    settings: SchedulerSettings,
    engine: ReconcileEngine,
    retry_log: RetryLog,
    shutdown: watch::Receiver<bool>,
    snapshot: watch::Sender<StatusSnapshot>,
}

impl Scheduler {
    pub fn new(
        services: Services,
        settings: SchedulerSettings,
        engine: EngineSettings,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        let retry_log = RetryLog::new(settings.retry_log_burst, settings.retry_log_every);
        let engine = ReconcileEngine::new(engine);
        let (snapshot, _) = watch::channel(StatusSnapshot {
            heartbeat: engine.heartbeat().marker().to_string(),
            ..StatusSnapshot::default()
        });

        Self {
            services,
            settings,
            engine,
            retry_log,
            shutdown,
            snapshot,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<StatusSnapshot> {
        self.snapshot.subscribe()
    }

    /// Startup cycle, then one steady-state cycle per polling interval until shutdown.
    /// Returns an error only for failures the loop cannot absorb.
    pub async fn run(mut self) -> BridgeResult<()> {
        if self.startup().await? == Flow::Stop {
            info!("shutdown requested before first cycle");
            return Ok(());
        }

        if self.settings.dry_run {
            info!("dry run done");
            return Ok(());
        }

        loop {
            if self.pause(self.settings.poll_interval).await == Flow::Stop {
                break;
            }
            if self.steady_cycle().await? == Flow::Stop {
                break;
            }
        }

        info!("reconciliation loop stopped after {} cycles", self.engine.cycles());
        Ok(())
    }

    pub async fn startup(&mut self) -> BridgeResult<Flow> {
        let Some(observation) = self.fetch_until_ready().await? else {
            return Ok(Flow::Stop);
        };
        self.cycle(CyclePhase::Startup, &observation).await?;
        Ok(Flow::Continue)
    }

    pub async fn steady_cycle(&mut self) -> BridgeResult<Flow> {
        let heartbeat = self.engine.toggle_heartbeat();
        self.execute(heartbeat).await?;
        debug!("heartbeat [{}]", self.engine.heartbeat().marker());

        let Some(observation) = self.fetch_until_ready().await? else {
            return Ok(Flow::Stop);
        };
        self.cycle(CyclePhase::Steady, &observation).await?;
        Ok(Flow::Continue)
    }

    async fn fetch_until_ready(&mut self) -> BridgeResult<Option<Observation>> {
        loop {
            match self.fetch_observation().await {
                Ok(observation) => {
                    if let Some(streak) = self.retry_log.record_success() {
                        info!("fetch recovered after {streak} failed attempts");
                    }
                    return Ok(Some(observation));
                }
                Err(err) if err.is_recoverable() => {
                    if self.retry_log.record_failure() {
                        error!(
                            failures = self.retry_log.failures(),
                            "repeat failure loading status or controller vars: {err}"
                        );
                    }
                    self.snapshot.send_modify(|snapshot| {
                        snapshot.fetch_failures = self.retry_log.failures();
                    });
                    if self.pause(self.settings.retry_interval).await == Flow::Stop {
                        return Ok(None);
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn fetch_observation(&self) -> BridgeResult<Observation> {
        let status = self.services.status.fetch_status().await?;
        let (vars, update_requested) = fetch_mirror(
            self.services.store.as_ref(),
            self.settings.zone_index,
            self.settings.update_flag,
        )
        .await?;
        info!("externally requested update: {update_requested}");

        Ok(Observation {
            status,
            vars,
            update_requested,
        })
    }

    async fn cycle(&mut self, phase: CyclePhase, observation: &Observation) -> BridgeResult<()> {
        let (report, actions) = self.engine.reconcile(phase, observation);
        info!(
            changemode = report.mode_changed,
            changeany = report.any_changed,
            "{phase:?} cycle for zone {}",
            self.settings.zone_index
        );
        info!(
            "status {:?} vars {:?} changes {:?}",
            report.status, report.vars, report.changes
        );

        let failed_writes = self.execute(actions).await?;
        if !failed_writes.is_empty() {
            warn!("{} field writes failed; retrying next cycle", failed_writes.len());
        }

        let heartbeat = self.engine.heartbeat().marker().to_string();
        let cycles = self.engine.cycles();
        self.snapshot.send_replace(StatusSnapshot {
            heartbeat,
            cycles,
            last_cycle_at: Some(Utc::now().to_rfc3339()),
            last_report: Some(report),
            failed_writes,
            fetch_failures: 0,
        });
        Ok(())
    }

    /// Runs actions in order. Failed pushes are logged and skipped; returns the fields
    /// whose writes failed.
    async fn execute(&self, actions: Vec<BridgeAction>) -> BridgeResult<Vec<Field>> {
        let mut failed_writes = Vec::new();

        for action in actions {
            match action {
                BridgeAction::WriteVar(write) => {
                    let address = VarAddress::for_slot(write.slot).ok_or_else(|| {
                        BridgeError::Invariant(format!("slot {} has no variable id", write.slot.0))
                    })?;
                    let result = self.services.store.write_var(address, write.value).await;
                    if let Err(err) = absorb(result)? {
                        error!(
                            field = write.field.as_str(),
                            value = write.value,
                            "controller update failed: {err}"
                        );
                        failed_writes.push(write.field);
                    }
                }
                BridgeAction::ClearUpdateFlag => {
                    self.write_flag("update flag reset", self.settings.update_flag, 0)
                        .await?;
                }
                BridgeAction::AckUpdate => {
                    self.write_flag("update acknowledge", self.settings.ack_flag, 1)
                        .await?;
                }
                BridgeAction::Heartbeat(state) => {
                    self.write_flag("heartbeat", self.settings.heartbeat, state.value())
                        .await?;
                }
                BridgeAction::Notify(notice) => {
                    info!("{}: {}", notice.event, notice.description);
                    if self.settings.dry_run {
                        debug!("dry run, notification not sent");
                        continue;
                    }
                    let result = self.services.notifier.push(&notice).await;
                    if let Err(err) = absorb(result)? {
                        error!(
                            event = %notice.event,
                            description = %notice.description,
                            priority = ?notice.priority,
                            "notification error: {err}"
                        );
                    }
                }
                BridgeAction::RecordTelemetry(point) => {
                    let result = self.services.telemetry.record(&point).await;
                    if let Err(err) = absorb(result)? {
                        error!(
                            channel = %point.channel,
                            value = ?point.value,
                            "telemetry error: {err}"
                        );
                    }
                }
            }
        }

        Ok(failed_writes)
    }

    async fn write_flag(&self, label: &str, address: VarAddress, value: i64) -> BridgeResult<()> {
        let result = self.services.store.write_var(address, value).await;
        if let Err(err) = absorb(result)? {
            error!("controller {label} failed: {err}");
        }
        Ok(())
    }

    /// Sleeps for `duration` unless shutdown is requested first.
    async fn pause(&mut self, duration: Duration) -> Flow {
        let sleep = tokio::time::sleep(duration);
        tokio::pin!(sleep);

        loop {
            if *self.shutdown.borrow_and_update() {
                return Flow::Stop;
            }
            tokio::select! {
                _ = &mut sleep => return Flow::Continue,
                changed = self.shutdown.changed() => {
                    if changed.is_err() {
                        (&mut sleep).await;
                        return Flow::Continue;
                    }
                }
            }
        }
    }
}

/// Splits a push result into "carry on" (possibly with a logged error) and fatal.
fn absorb(result: BridgeResult<()>) -> BridgeResult<Result<(), BridgeError>> {
    match result {
        Ok(()) => Ok(Ok(())),
        Err(err) if err.is_recoverable() => Ok(Err(err)),
        Err(err) => Err(err),
    }
}
