use std::{io::ErrorKind, path::PathBuf, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use chrono::Local;
use furnace_common::{BridgeConfig, EngineSettings};
use reqwest::Client;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::{
    notifier::PushNotifier,
    scheduler::{Scheduler, SchedulerSettings, Services},
    status_client::HttpStatusSource,
    status_server,
    telemetry::FeedTelemetry,
    var_store::RestVariableStore,
};

pub async fn run() -> anyhow::Result<()> {
    let store = ConfigStore::new();
    let loaded = store.load().await;
    let mut config = match &loaded {
        Ok(config) => config.clone(),
        Err(_) => BridgeConfig::default(),
    };
    apply_env_overrides(&mut config);
    config.sanitize();

    let default_level = if config.dry_run { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    if let Err(err) = loaded {
        warn!(
            "failed to load config from {}: {err:#}",
            store.path.display()
        );
    }

    info!("***start furnace bridge");
    info!("nowtime = {}", Local::now().format("%H:%M"));
    info!(
        zone = config.zone_index,
        dry_run = config.dry_run,
        lower = config.lower_temp_f,
        upper = config.upper_temp_f,
        "configuration loaded from {}",
        store.path.display()
    );
    info!("controller = {}", config.variable_store.base_url);

    let client = Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .build()
        .context("failed to build http client")?;

    let status_source = HttpStatusSource::new(client.clone(), &config.status_source);
    info!("thermostat status = {}", status_source.url());

    let services = Services {
        status: Arc::new(status_source),
        store: Arc::new(RestVariableStore::new(client.clone(), &config.variable_store)),
        notifier: Arc::new(PushNotifier::new(client.clone(), &config.notifier, &config.name)),
        telemetry: Arc::new(FeedTelemetry::new(client, &config.telemetry)),
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        info!("interrupt received, stopping after current cycle");
        let _ = shutdown_tx.send(true);
    });

    let scheduler = Scheduler::new(
        services,
        SchedulerSettings::from_config(&config),
        EngineSettings::from_config(&config),
        shutdown_rx,
    );

    let status_task = config.status_port.map(|port| {
        let snapshot = scheduler.subscribe();
        tokio::spawn(async move {
            if let Err(err) = status_server::serve(port, snapshot).await {
                warn!("status server stopped: {err:#}");
            }
        })
    });

    let outcome = scheduler.run().await;

    if let Some(task) = status_task {
        task.abort();
    }

    match outcome {
        Ok(()) => {
            info!("program end");
            Ok(())
        }
        Err(err) => {
            error!("program end on fatal error: {err}");
            Err(err).context("reconciliation loop failed")
        }
    }
}

struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    fn new() -> Self {
        let path = std::env::var("FURNACE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./.furnace/config.json"));
        Self { path }
    }

    async fn load(&self) -> anyhow::Result<BridgeConfig> {
        match tokio::fs::read(&self.path).await {
            Ok(raw) => serde_json::from_slice::<BridgeConfig>(&raw)
                .with_context(|| format!("invalid config json in {}", self.path.display())),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(BridgeConfig::default()),
            Err(err) => Err(err.into()),
        }
    }
}

fn apply_env_overrides(config: &mut BridgeConfig) {
    if let Some(index) = env_parse::<u16>("FURNACE_ZONE_INDEX") {
        config.zone_index = index;
    }
    if let Some(dry_run) = env_flag("FURNACE_DRY_RUN") {
        config.dry_run = dry_run;
    }
    if let Some(lower) = env_parse::<f64>("FURNACE_LOWER") {
        config.lower_temp_f = lower;
    }
    if let Some(upper) = env_parse::<f64>("FURNACE_UPPER") {
        config.upper_temp_f = upper;
    }
    if let Some(port) = env_parse::<u16>("FURNACE_STATUS_PORT") {
        config.status_port = (port != 0).then_some(port);
    }
    if let Ok(url) = std::env::var("ISY_URL") {
        config.variable_store.base_url = url;
    }
    if let Ok(user) = std::env::var("ISY_USER") {
        config.variable_store.user = user;
    }
    if let Ok(pass) = std::env::var("ISY_PASS") {
        config.variable_store.pass = pass;
    }
    if let Ok(key) = std::env::var("PROWL_API_KEY") {
        config.notifier.api_key = key;
    }
    if let Ok(username) = std::env::var("AIO_USERNAME") {
        config.telemetry.username = username;
    }
    if let Ok(key) = std::env::var("AIO_KEY") {
        config.telemetry.key = key;
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<T>().ok())
}

fn env_flag(key: &str) -> Option<bool> {
    let value = std::env::var(key).ok()?;
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    result = tokio::signal::ctrl_c() => {
                        if let Err(err) = result {
                            warn!("ctrl-c listener failed: {err}");
                        }
                    }
                    _ = terminate.recv() => {}
                }
                return;
            }
            Err(err) => warn!("SIGTERM listener failed: {err}"),
        }
    }

    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("ctrl-c listener failed: {err}");
        std::future::pending::<()>().await;
    }
}
