mod clients;
mod error;
mod host;
mod notifier;
mod scheduler;
mod status_client;
mod status_server;
mod telemetry;
mod var_store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    host::run().await
}
