// Polling worker: one fetch -> aggregate -> publish cycle per tick.
// The loop awaits the whole chain before the next tick, so ticks never
// overlap; a slow upstream skips ticks instead.

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;

use tokio::sync::{RwLock, broadcast};
use tokio::time::{Duration, interval};
use tracing::warn;

use crate::aggregator::aggregate;
use crate::api_client::{ApiClient, ApiError, HttpTransport};
use crate::models::StatsSnapshot;
use crate::state::DashboardState;

/// Client, shared state, channels, and shutdown for the poller.
pub struct PollerDeps<T: HttpTransport> {
    pub client: Arc<ApiClient<T>>,
    pub state: Arc<RwLock<DashboardState>>,
    pub stats_tx: broadcast::Sender<StatsSnapshot>,
    pub ws_connections: Arc<AtomicUsize>,
    pub shutdown_rx: tokio::sync::oneshot::Receiver<()>,
}

/// Poller timing and logging config.
pub struct PollerConfig {
    pub interval_secs: u64,
    /// How often to log app stats (real seconds).
    pub status_log_interval_secs: u64,
}

pub fn spawn<T: HttpTransport>(
    deps: PollerDeps<T>,
    config: PollerConfig,
) -> tokio::task::JoinHandle<()> {
    let PollerDeps {
        client,
        state,
        stats_tx,
        ws_connections,
        mut shutdown_rx,
    } = deps;

    tokio::spawn(async move {
        let mut tick = interval(Duration::from_secs(config.interval_secs));
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut status_log_tick =
            interval(Duration::from_secs(config.status_log_interval_secs));
        status_log_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut ticks_total: u64 = 0;
        let mut failed_ticks_total: u64 = 0;

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    ticks_total += 1;
                    match run_tick(&client).await {
                        Ok(snapshot) => {
                            {
                                let mut dashboard = state.write().await;
                                dashboard.apply(snapshot.clone());
                            }
                            if stats_tx.send(snapshot).is_err() {
                                tracing::debug!(
                                    operation = "broadcast_snapshot",
                                    "no active WebSocket clients; broadcast channel has no receivers"
                                );
                            }
                        }
                        Err(e) => {
                            failed_ticks_total += 1;
                            warn!(error = %e, operation = "poll_tick", "polling tick failed");
                            state.write().await.mark_disconnected(e.to_string());
                        }
                    }
                }
                _ = &mut shutdown_rx => {
                    tracing::debug!("Poller shutting down");
                    break;
                }
                _ = status_log_tick.tick() => {
                    tracing::info!(
                        ws_clients = ws_connections.load(std::sync::atomic::Ordering::Relaxed),
                        ticks_total,
                        failed_ticks_total,
                        "app stats"
                    );
                }
            }
        }
    })
}

/// One full cycle: account summary, room fan-out, aggregate. Individual
/// room failures are already swallowed inside the fan-out; anything else
/// surfaces here exactly once.
pub async fn run_tick<T: HttpTransport>(
    client: &ApiClient<T>,
) -> Result<StatsSnapshot, ApiError> {
    let user = client.get_user_summary().await?;
    let rooms = client.get_room_snapshots(&user.rooms).await;
    let stats = aggregate(&user, &rooms);
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_else(|e| {
            warn!(error = %e, operation = "get_timestamp", "system time error");
            0
        });
    Ok(StatsSnapshot { timestamp, stats })
}
