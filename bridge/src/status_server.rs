use std::net::SocketAddr;

use anyhow::Context;
use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use tokio::{net::TcpListener, sync::watch};
use tracing::info;

use crate::scheduler::StatusSnapshot;

pub fn router(snapshot: watch::Receiver<StatusSnapshot>) -> Router {
    Router::new()
        .route("/api/status", get(handle_get_status))
        .with_state(snapshot)
}

pub async fn serve(port: u16, snapshot: watch::Receiver<StatusSnapshot>) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind status server at {addr}"))?;

    info!("status listening on http://{addr}/api/status");
    axum::serve(listener, router(snapshot)).await?;
    Ok(())
}

async fn handle_get_status(
    State(snapshot): State<watch::Receiver<StatusSnapshot>>,
) -> impl IntoResponse {
    let current = snapshot.borrow().clone();
    Json(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serves_latest_snapshot() {
        let (tx, rx) = watch::channel(StatusSnapshot::default());
        tx.send_replace(StatusSnapshot {
            heartbeat: "*".to_string(),
            cycles: 4,
            ..StatusSnapshot::default()
        });

        let response = handle_get_status(State(rx)).await.into_response();
        assert_eq!(response.status(), axum::http::StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["cycles"], 4);
        assert_eq!(json["heartbeat"], "*");
        assert!(json["lastReport"].is_null());
    }
}
