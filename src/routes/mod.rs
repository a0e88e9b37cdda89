// HTTP + WebSocket routes

mod http;
mod ws;

use axum::{Router, routing::get};
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tokio::sync::{RwLock, broadcast};
use tower_http::cors::{Any, CorsLayer};

use crate::api_client::{ApiClient, ReqwestTransport, SharedStorage};
use crate::models::StatsSnapshot;
use crate::relay::{self, RelayState};
use crate::state::DashboardState;

pub type Client = ApiClient<ReqwestTransport>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) stats_tx: broadcast::Sender<StatsSnapshot>,
    pub(crate) dashboard: Arc<RwLock<DashboardState>>,
    pub(crate) client: Arc<Client>,
    pub(crate) storage: SharedStorage,
    pub(crate) ws_connections: Arc<AtomicUsize>,
}

pub fn app(
    stats_tx: broadcast::Sender<StatsSnapshot>,
    dashboard: Arc<RwLock<DashboardState>>,
    client: Arc<Client>,
    storage: SharedStorage,
    ws_connections: Arc<AtomicUsize>,
    relay_state: RelayState,
) -> Router {
    let state = AppState {
        stats_tx,
        dashboard,
        client,
        storage,
        ws_connections,
    };
    Router::new()
        .route("/", get(|| async { "Screeps monitor backend" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/stats", get(http::stats_handler)) // GET /api/stats
        .route("/api/charts", get(http::charts_handler)) // GET /api/charts
        .route("/api/status", get(http::status_handler)) // GET /api/status
        .route(
            "/api/environment",
            get(http::environment_handler).post(http::environment_override_handler),
        )
        .route(
            "/api/credentials",
            get(http::credentials_handler).post(http::set_credentials_handler),
        )
        .route(
            "/api/console",
            get(http::console_handler).post(http::console_submit_handler),
        )
        .route("/ws/stats", get(ws::ws_stats)) // WS /ws/stats
        .with_state(state)
        .nest("/relay", relay::router(relay_state))
        .layer(CorsLayer::new().allow_origin(Any))
}
