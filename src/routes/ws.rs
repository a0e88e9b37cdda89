// WebSocket stats stream

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use bytes::Bytes;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tokio::sync::{RwLock, broadcast};
use tokio::time::{Duration, timeout};

use super::AppState;
use crate::models::StatsSnapshot;
use crate::state::DashboardState;

pub(super) const WS_PING_INTERVAL: Duration = Duration::from_secs(30);
pub(super) const WS_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Decrements the stats connection count on drop (connect = +1, drop = -1).
struct WsStatsGuard(Arc<AtomicUsize>);

impl Drop for WsStatsGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, std::sync::atomic::Ordering::Relaxed);
    }
}

pub(super) async fn ws_stats(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let tx = state.stats_tx.clone();
    let conn_count = state.ws_connections.clone();
    let dashboard = state.dashboard.clone();
    ws.on_upgrade(move |socket| async move {
        let mut rx = tx.subscribe();
        if let Err(e) = stream_stats(socket, &mut rx, conn_count, dashboard).await {
            tracing::info!("Stats stream error: {}", e);
        }
    })
}

async fn stream_stats(
    mut socket: WebSocket,
    rx: &mut broadcast::Receiver<StatsSnapshot>,
    conn_count: Arc<AtomicUsize>,
    dashboard: Arc<RwLock<DashboardState>>,
) -> anyhow::Result<()> {
    conn_count.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    let _guard = WsStatsGuard(conn_count);
    tracing::info!("Client connected to stats stream");

    // Welcome frame carries the current status and the last snapshot so new
    // clients render immediately instead of waiting a full polling cycle.
    let welcome = {
        let dashboard = dashboard.read().await;
        serde_json::json!({
            "type": "welcome",
            "status": dashboard.status,
            "latest": dashboard.latest,
        })
    };
    let welcome_json = serde_json::to_string(&welcome)?;
    let r = timeout(
        WS_SEND_TIMEOUT,
        socket.send(Message::Text(welcome_json.into())),
    )
    .await;
    if r.is_err() || r.unwrap_or(Ok(())).is_err() {
        return Ok(());
    }

    let mut ping_interval = tokio::time::interval(WS_PING_INTERVAL);
    ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(snapshot) => {
                        let json = serde_json::to_string(&snapshot)?;
                        let r = timeout(WS_SEND_TIMEOUT, socket.send(Message::Text(json.into()))).await;
                        if r.is_err() || r.unwrap_or(Ok(())).is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("WebSocket /ws/stats client lagged, skipped {} messages", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            _ = ping_interval.tick() => {
                let r = timeout(WS_SEND_TIMEOUT, socket.send(Message::Ping(Bytes::new()))).await;
                if r.is_err() || r.unwrap_or(Ok(())).is_err() {
                    break;
                }
            }
        }
    }
    Ok(())
}
