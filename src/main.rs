use anyhow::Result;
use screeps_monitor::*;
use std::sync::{Arc, Mutex};
use std::sync::atomic::AtomicUsize;
use tokio::sync::{RwLock, broadcast};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

use screeps_monitor::api_client::{ApiClient, ReqwestTransport, SharedStorage};
use screeps_monitor::credentials::{FileStorage, Session};
use screeps_monitor::state::DashboardState;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;

    let storage: SharedStorage = Arc::new(Mutex::new(Box::new(FileStorage::open(
        &app_config.storage.path,
    )?)));

    let (environment_config, mut session) = {
        let guard = storage
            .lock()
            .map_err(|e| anyhow::anyhow!("storage lock poisoned: {}", e))?;
        let env = environment::resolve(&app_config.environment.hostname, &**guard);
        let session = Session::load(&**guard, &app_config.screeps.base_url);
        (env, session)
    };
    tracing::info!(
        class = environment_config.class.as_str(),
        hostname = %app_config.environment.hostname,
        "environment resolved"
    );

    // A token in the config file seeds storage on first start.
    if session.token.is_none() {
        if let Some(token) = &app_config.screeps.token {
            session.token = Some(token.clone());
            let mut guard = storage
                .lock()
                .map_err(|e| anyhow::anyhow!("storage lock poisoned: {}", e))?;
            session.save(&mut **guard)?;
        }
    }

    let request_timeout =
        std::time::Duration::from_secs(app_config.polling.request_timeout_secs);
    let transport = ReqwestTransport::new(request_timeout)?;
    let client = Arc::new(ApiClient::new(
        transport,
        environment_config,
        session,
        storage.clone(),
        app_config.screeps.shard.clone(),
    ));

    let (tx, _) = broadcast::channel::<models::StatsSnapshot>(app_config.polling.broadcast_capacity);
    let dashboard = Arc::new(RwLock::new(DashboardState::new(app_config.charts.capacity)));
    let ws_connections = Arc::new(AtomicUsize::new(0));
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    let poller_handle = poller::spawn(
        poller::PollerDeps {
            client: client.clone(),
            state: dashboard.clone(),
            stats_tx: tx.clone(),
            ws_connections: ws_connections.clone(),
            shutdown_rx,
        },
        poller::PollerConfig {
            interval_secs: app_config.polling.interval_secs,
            status_log_interval_secs: app_config.polling.status_log_interval_secs,
        },
    );

    let relay_state = relay::RelayState::new(&app_config.relay.upstream_root, request_timeout)?;
    let app = routes::app(
        tx,
        dashboard,
        client,
        storage,
        ws_connections,
        relay_state,
    );
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    let in_container = std::path::Path::new("/.dockerenv").exists()
        || std::env::var("CONTAINER").as_deref() == Ok("1");

    if in_container {
        // In Docker: run server until error or SIGTERM (no signal handler; avoids immediate exit)
        axum::serve(listener, app).await?;
    } else {
        tokio::select! {
            result = axum::serve(listener, app) => {
                result?;
            }
            _ = async {
                #[cfg(unix)]
                {
                    let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                        Ok(s) => s,
                        Err(_) => {
                            let _ = tokio::signal::ctrl_c().await;
                            return;
                        }
                    };
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => {}
                        _ = sigterm.recv() => {}
                    }
                }
                #[cfg(not(unix))]
                {
                    tokio::signal::ctrl_c().await
                }
            } => {
                tracing::info!("Received shutdown signal");
                let _ = shutdown_tx.send(());
                let _ = poller_handle.await;
            }
        }
    }

    Ok(())
}
