// Authenticated Screeps API access: session handling, request dispatch,
// error normalization, and the derived room/console queries.

mod transport;

pub use transport::{
    ApiRequest, ApiResponse, HttpTransport, ReqwestTransport, TOKEN_HEADER, TransportFailure,
};

use std::sync::{Arc, Mutex};

use futures_util::future::join_all;
use reqwest::Method;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::warn;

use crate::credentials::{Session, Storage};
use crate::environment::{EnvironmentClass, EnvironmentConfig, RelayStrategy};
use crate::models::{RoomSnapshot, UserSummary};

pub type SharedStorage = Arc<Mutex<Box<dyn Storage>>>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("no API token configured")]
    Authentication,
    #[error("upstream returned {status} {reason}")]
    Upstream { status: u16, reason: String },
    #[error("Screeps API reported an error: {0}")]
    Application(String),
    #[error("{hint}: {source}")]
    Transport {
        hint: &'static str,
        #[source]
        source: TransportFailure,
    },
}

/// User-facing remediation hint for a transport-level failure, keyed by
/// environment class. Fixed lookup table, not derived from the error text.
pub fn remediation_hint(class: EnvironmentClass) -> &'static str {
    match class {
        EnvironmentClass::Local => {
            "cannot reach the local relay; make sure the forwarding process is running"
        }
        EnvironmentClass::ManagedHosting => {
            "cannot reach the serverless relay; the hosting platform function may be down"
        }
        EnvironmentClass::StaticHosting => {
            "cannot reach the public forwarder; it may be down or rate limiting"
        }
        EnvironmentClass::Direct => "cannot reach screeps.com; check network connectivity",
    }
}

#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Value>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            body: None,
        }
    }
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post(body: Value) -> Self {
        Self {
            method: Method::POST,
            body: Some(body),
        }
    }
}

/// API client parameterized by the resolved environment and an injected
/// transport. One instance serves the whole process; credentials live in
/// the session behind a lock.
pub struct ApiClient<T: HttpTransport> {
    transport: T,
    environment: EnvironmentConfig,
    session: RwLock<Session>,
    storage: SharedStorage,
    shard: Option<String>,
}

impl<T: HttpTransport> ApiClient<T> {
    pub fn new(
        transport: T,
        environment: EnvironmentConfig,
        session: Session,
        storage: SharedStorage,
        shard: Option<String>,
    ) -> Self {
        Self {
            transport,
            environment,
            session: RwLock::new(session),
            storage,
            shard,
        }
    }

    pub fn environment(&self) -> &EnvironmentConfig {
        &self.environment
    }

    pub async fn session(&self) -> Session {
        self.session.read().await.clone()
    }

    /// Stores token and base URL in the session and persists both. No
    /// validation of the token format.
    pub async fn set_credentials(&self, token: &str, base_url: &str) -> anyhow::Result<()> {
        let session = {
            let mut session = self.session.write().await;
            session.token = Some(token.to_string());
            session.base_url = base_url.to_string();
            session.clone()
        };
        let mut storage = self
            .storage
            .lock()
            .map_err(|e| anyhow::anyhow!("storage lock poisoned: {}", e))?;
        session.save(&mut **storage)
    }

    /// Issues one authenticated call. Fails with `Authentication` before any
    /// transport activity when no token is stored.
    pub async fn request(&self, path: &str, options: RequestOptions) -> Result<Value, ApiError> {
        let (token, base_url) = {
            let session = self.session.read().await;
            (session.token.clone(), session.base_url.clone())
        };
        let Some(token) = token else {
            return Err(ApiError::Authentication);
        };

        let url = build_url(&self.environment.relay, &base_url, path);
        let response = self
            .transport
            .execute(ApiRequest {
                method: options.method,
                url,
                token: Some(token),
                body: options.body,
            })
            .await
            .map_err(|source| ApiError::Transport {
                hint: remediation_hint(self.environment.class),
                source,
            })?;

        if !(200..300).contains(&response.status) {
            return Err(ApiError::Upstream {
                status: response.status,
                reason: response.reason,
            });
        }
        if let Some(message) = application_error(&response.body) {
            return Err(ApiError::Application(message));
        }
        Ok(response.body)
    }

    pub async fn get_user_summary(&self) -> Result<UserSummary, ApiError> {
        let body = self.request("auth/me", RequestOptions::get()).await?;
        serde_json::from_value(body)
            .map_err(|e| ApiError::Application(format!("unexpected account summary shape: {e}")))
    }

    pub async fn get_room_snapshot(&self, room: &str) -> Result<RoomSnapshot, ApiError> {
        let path = match &self.shard {
            Some(shard) => format!("game/room-objects?room={room}&shard={shard}"),
            None => format!("game/room-objects?room={room}"),
        };
        let body = self.request(&path, RequestOptions::get()).await?;
        let objects = match body.get("objects") {
            Some(objects) => serde_json::from_value(objects.clone()).map_err(|e| {
                ApiError::Application(format!("unexpected room objects shape: {e}"))
            })?,
            None => Vec::new(),
        };
        Ok(RoomSnapshot {
            name: room.to_string(),
            objects,
        })
    }

    /// Concurrent per-room fan-out. A failed room is logged and omitted;
    /// partial results are expected.
    pub async fn get_room_snapshots(&self, rooms: &[String]) -> Vec<RoomSnapshot> {
        let fetches = rooms
            .iter()
            .map(|room| async move { (room, self.get_room_snapshot(room).await) });
        let mut snapshots = Vec::with_capacity(rooms.len());
        for (room, result) in join_all(fetches).await {
            match result {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(e) => warn!(
                    room = %room,
                    error = %e,
                    operation = "get_room_snapshot",
                    "room fetch failed; omitting from this cycle"
                ),
            }
        }
        snapshots
    }

    /// Discovers owned rooms from the account summary, then fans out one
    /// snapshot fetch per room.
    pub async fn get_all_owned_room_snapshots(&self) -> Result<Vec<RoomSnapshot>, ApiError> {
        let user = self.get_user_summary().await?;
        Ok(self.get_room_snapshots(&user.rooms).await)
    }

    pub async fn get_console_output(&self) -> Result<Value, ApiError> {
        self.request("user/console", RequestOptions::get()).await
    }

    pub async fn submit_console_expression(&self, expression: &str) -> Result<Value, ApiError> {
        let mut body = serde_json::json!({ "expression": expression });
        if let Some(shard) = &self.shard {
            body["shard"] = Value::String(shard.clone());
        }
        self.request("user/console", RequestOptions::post(body))
            .await
    }
}

fn application_error(body: &Value) -> Option<String> {
    match body.get("error") {
        Some(Value::String(message)) => Some(message.clone()),
        Some(Value::Null) | None => None,
        Some(other) => Some(other.to_string()),
    }
}

/// Builds the target URL for one endpoint path under the active relay
/// strategy.
fn build_url(relay: &RelayStrategy, base_url: &str, path: &str) -> String {
    let path = path.trim_start_matches('/');
    match relay {
        RelayStrategy::Direct => format!("{}/{}", base_url.trim_end_matches('/'), path),
        RelayStrategy::LocalRelay { relay_url } | RelayStrategy::ServerlessRelay { relay_url } => {
            match reqwest::Url::parse_with_params(relay_url, &[("path", path)]) {
                Ok(url) => url.to_string(),
                Err(_) => format!("{relay_url}?path={path}"),
            }
        }
        RelayStrategy::PublicRelay { forward_url } => {
            let target = format!("{}/{}", base_url.trim_end_matches('/'), path);
            match reqwest::Url::parse_with_params(forward_url, &[("url", target.as_str())]) {
                Ok(url) => url.to_string(),
                Err(_) => format!("{forward_url}?url={target}"),
            }
        }
    }
}
