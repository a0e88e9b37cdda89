// Transport seam: the client issues requests through this trait so tests
// can count calls and script responses without a network.

use std::future::Future;
use std::time::Duration;

use reqwest::Method;
use serde_json::Value;

/// Auth header the Screeps API expects.
pub const TOKEN_HEADER: &str = "X-Token";

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub token: Option<String>,
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub reason: String,
    pub body: Value,
}

/// Network-level failure, classified by the transport's own error kind
/// rather than by message inspection.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportFailure {
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("transport error: {0}")]
    Other(String),
}

pub trait HttpTransport: Send + Sync + 'static {
    fn execute(
        &self,
        request: ApiRequest,
    ) -> impl Future<Output = Result<ApiResponse, TransportFailure>> + Send;
}

pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(request_timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        Ok(Self { http })
    }
}

impl HttpTransport for ReqwestTransport {
    fn execute(
        &self,
        request: ApiRequest,
    ) -> impl Future<Output = Result<ApiResponse, TransportFailure>> + Send {
        let http = self.http.clone();
        async move {
            let ApiRequest {
                method,
                url,
                token,
                body,
            } = request;
            let mut builder = http.request(method, url.as_str());
            if let Some(token) = &token {
                builder = builder.header(TOKEN_HEADER, token);
            }
            if let Some(body) = &body {
                builder = builder.json(body);
            }
            let response = builder.send().await.map_err(classify_error)?;
            let status = response.status();
            let reason = status.canonical_reason().unwrap_or("").to_string();
            let bytes = response.bytes().await.map_err(classify_error)?;
            let body = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                    tracing::debug!(error = %e, url = %url, "response body is not JSON");
                    Value::Null
                })
            };
            Ok(ApiResponse {
                status: status.as_u16(),
                reason,
                body,
            })
        }
    }
}

fn classify_error(e: reqwest::Error) -> TransportFailure {
    if e.is_timeout() {
        TransportFailure::Timeout(e.to_string())
    } else if e.is_connect() {
        TransportFailure::Connect(e.to_string())
    } else {
        TransportFailure::Other(e.to_string())
    }
}
