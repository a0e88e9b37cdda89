// Stateless relay: forwards browser requests to the Screeps API so
// deployments blocked by cross-origin rules can still reach it. Copies
// method, auth and content-type headers, and body; mirrors the upstream
// response verbatim.

use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::api_client::TOKEN_HEADER;

#[derive(Clone)]
pub struct RelayState {
    http: reqwest::Client,
    upstream_root: String,
}

impl RelayState {
    pub fn new(upstream_root: impl Into<String>, request_timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            http,
            upstream_root: upstream_root.into(),
        })
    }
}

pub fn router(state: RelayState) -> Router {
    Router::new()
        .route("/", any(relay_handler))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct RelayQuery {
    /// Upstream endpoint, appended to the fixed upstream root.
    path: Option<String>,
}

async fn relay_handler(
    State(state): State<RelayState>,
    method: Method,
    Query(query): Query<RelayQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if method == Method::OPTIONS {
        return with_cors(StatusCode::OK.into_response());
    }

    let Some(path) = query.path else {
        return with_cors(
            (
                StatusCode::BAD_REQUEST,
                axum::Json(json!({ "error": "missing path parameter" })),
            )
                .into_response(),
        );
    };

    let upstream_url = format!(
        "{}/{}",
        state.upstream_root.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    let url = match reqwest::Url::parse(&upstream_url) {
        Ok(url) => url,
        Err(_) => {
            return with_cors(
                (
                    StatusCode::BAD_REQUEST,
                    axum::Json(json!({ "error": "invalid path parameter" })),
                )
                    .into_response(),
            );
        }
    };

    let mut builder = state.http.request(method.clone(), url);
    if let Some(token) = headers.get(TOKEN_HEADER) {
        builder = builder.header(TOKEN_HEADER, token.clone());
    }
    if let Some(content_type) = headers.get(header::CONTENT_TYPE) {
        builder = builder.header(header::CONTENT_TYPE, content_type.clone());
    }
    if matches!(method, Method::POST | Method::PUT | Method::PATCH) && !body.is_empty() {
        builder = builder.body(body);
    }

    match builder.send().await {
        Ok(upstream) => {
            let status = StatusCode::from_u16(upstream.status().as_u16())
                .unwrap_or(StatusCode::BAD_GATEWAY);
            let content_type = upstream
                .headers()
                .get(header::CONTENT_TYPE)
                .cloned()
                .unwrap_or_else(|| HeaderValue::from_static("application/json"));
            match upstream.bytes().await {
                Ok(bytes) => with_cors(
                    (status, [(header::CONTENT_TYPE, content_type)], bytes).into_response(),
                ),
                Err(e) => relay_failure(&upstream_url, e),
            }
        }
        Err(e) => relay_failure(&upstream_url, e),
    }
}

fn relay_failure(upstream_url: &str, e: reqwest::Error) -> Response {
    warn!(
        error = %e,
        upstream = %upstream_url,
        operation = "relay_forward",
        "relay could not reach upstream"
    );
    with_cors(
        (
            StatusCode::BAD_GATEWAY,
            axum::Json(json!({ "error": "relay could not reach the upstream API" })),
        )
            .into_response(),
    )
}

/// Permissive cross-origin headers; applied to every relay response.
fn with_cors(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, X-Token"),
    );
    response
}
