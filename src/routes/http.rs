// JSON handlers: version, stats, charts, status, environment,
// credentials, console pass-through

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::json;

use super::AppState;
use crate::api_client::ApiError;
use crate::charts::render;
use crate::credentials::{self, KEY_SEALED_CREDENTIALS, SealedCredentials, Session};
use crate::environment::{self, EnvironmentClass};
use crate::version::{NAME, VERSION};

/// GET /version: returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// GET /api/stats: latest snapshot, connection status, and the derived
/// view model.
pub(super) async fn stats_handler(State(state): State<AppState>) -> impl IntoResponse {
    let dashboard = state.dashboard.read().await;
    let view = dashboard.latest.as_ref().map(|s| render(&s.stats));
    Json(json!({
        "status": dashboard.status,
        "latest": dashboard.latest,
        "view": view,
    }))
}

/// GET /api/charts: per-metric sliding windows for the front-end charts.
pub(super) async fn charts_handler(State(state): State<AppState>) -> impl IntoResponse {
    let dashboard = state.dashboard.read().await;
    Json(dashboard.charts.clone())
}

pub(super) async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let dashboard = state.dashboard.read().await;
    Json(dashboard.status.clone())
}

/// GET /api/environment: the environment the client was built with.
pub(super) async fn environment_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.client.environment().clone())
}

#[derive(Debug, Deserialize)]
pub(super) struct EnvironmentOverrideBody {
    class: String,
}

/// POST /api/environment: persist a manual environment override. The
/// running client keeps its resolved environment; the override applies on
/// the next start.
pub(super) async fn environment_override_handler(
    State(state): State<AppState>,
    Json(body): Json<EnvironmentOverrideBody>,
) -> Response {
    let Some(class) = EnvironmentClass::parse(&body.class) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": format!("unknown environment class: {}", body.class) })),
        )
            .into_response();
    };
    let Ok(mut storage) = state.storage.lock() else {
        return storage_lock_error();
    };
    if let Err(e) = environment::set_override(class, &mut **storage) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        )
            .into_response();
    }
    tracing::info!(class = class.as_str(), "environment override persisted");
    Json(json!({ "note": "override persisted; applies on next start" })).into_response()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CredentialsBody {
    token: String,
    base_url: Option<String>,
    passphrase: Option<String>,
}

/// POST /api/credentials: update the session; when a passphrase is given,
/// also store a sealed copy of the credentials.
pub(super) async fn set_credentials_handler(
    State(state): State<AppState>,
    Json(body): Json<CredentialsBody>,
) -> Response {
    let base_url = match body.base_url {
        Some(url) => url,
        None => state.client.session().await.base_url,
    };
    if let Err(e) = state.client.set_credentials(&body.token, &base_url).await {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        )
            .into_response();
    }

    if let Some(passphrase) = body.passphrase.as_deref() {
        let session = Session {
            token: Some(body.token),
            base_url,
        };
        let sealed = match credentials::seal(&session, Some(passphrase))
            .and_then(|sealed| serde_json::to_string(&sealed).map_err(Into::into))
        {
            Ok(sealed) => sealed,
            Err(e) => {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": e.to_string() })),
                )
                    .into_response();
            }
        };
        let Ok(mut storage) = state.storage.lock() else {
            return storage_lock_error();
        };
        if let Err(e) = storage.set(KEY_SEALED_CREDENTIALS, &sealed) {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response();
        }
    }

    StatusCode::NO_CONTENT.into_response()
}

#[derive(Debug, Deserialize)]
pub(super) struct UnsealQuery {
    passphrase: Option<String>,
}

/// GET /api/credentials: unseal the stored credential blob. Never echoes
/// the token itself.
pub(super) async fn credentials_handler(
    State(state): State<AppState>,
    Query(query): Query<UnsealQuery>,
) -> Response {
    let stored = {
        let Ok(storage) = state.storage.lock() else {
            return storage_lock_error();
        };
        storage.get(KEY_SEALED_CREDENTIALS)
    };
    let Some(stored) = stored else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "no stored credentials" })),
        )
            .into_response();
    };
    let Ok(sealed) = serde_json::from_str::<SealedCredentials>(&stored) else {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": credentials::CredentialError::Decryption.to_string() })),
        )
            .into_response();
    };
    match credentials::unseal(&sealed, query.passphrase.as_deref()) {
        Ok(session) => Json(json!({
            "baseUrl": session.base_url,
            "hasToken": session.token.is_some(),
            "protected": sealed.protected,
        }))
        .into_response(),
        Err(e) => (StatusCode::FORBIDDEN, Json(json!({ "error": e.to_string() }))).into_response(),
    }
}

/// GET /api/console: pass-through to the game console log.
pub(super) async fn console_handler(State(state): State<AppState>) -> Response {
    match state.client.get_console_output().await {
        Ok(body) => Json(body).into_response(),
        Err(e) => api_error_response(e),
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ConsoleBody {
    expression: String,
}

/// POST /api/console: submit one console expression.
pub(super) async fn console_submit_handler(
    State(state): State<AppState>,
    Json(body): Json<ConsoleBody>,
) -> Response {
    match state.client.submit_console_expression(&body.expression).await {
        Ok(body) => Json(body).into_response(),
        Err(e) => api_error_response(e),
    }
}

fn api_error_response(error: ApiError) -> Response {
    let status = match &error {
        ApiError::Authentication => StatusCode::UNAUTHORIZED,
        ApiError::Upstream { .. } | ApiError::Application(_) => StatusCode::BAD_GATEWAY,
        ApiError::Transport { .. } => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, Json(json!({ "error": error.to_string() }))).into_response()
}

fn storage_lock_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "storage lock poisoned" })),
    )
        .into_response()
}
