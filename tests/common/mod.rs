// Shared test helpers
#![allow(dead_code)]

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{Value, json};

use screeps_monitor::api_client::{
    ApiClient, ApiRequest, ApiResponse, HttpTransport, SharedStorage, TransportFailure,
};
use screeps_monitor::credentials::{MemoryStorage, Session};
use screeps_monitor::environment;
use screeps_monitor::models::{GameObject, RoomSnapshot, UserSummary};

pub fn game_object(kind: &str, energy: Option<u64>, capacity: Option<u64>) -> GameObject {
    let mut value = json!({ "type": kind });
    if let Some(energy) = energy {
        value["store"] = json!({ "energy": energy });
    }
    if let Some(capacity) = capacity {
        value["storeCapacity"] = json!(capacity);
    }
    serde_json::from_value(value).unwrap()
}

pub fn spawn_object(energy: u64) -> GameObject {
    game_object("spawn", Some(energy), None)
}

pub fn extension_object(energy: u64) -> GameObject {
    game_object("extension", Some(energy), None)
}

pub fn creep_object() -> GameObject {
    game_object("creep", None, None)
}

pub fn room(name: &str, objects: Vec<GameObject>) -> RoomSnapshot {
    RoomSnapshot {
        name: name.to_string(),
        objects,
    }
}

pub fn user_with_rooms(rooms: &[&str]) -> UserSummary {
    UserSummary {
        username: Some("tester".to_string()),
        cpu: Some(20.0),
        cpu_used: Some(4.2),
        rooms: rooms.iter().map(|r| r.to_string()).collect(),
        ..Default::default()
    }
}

struct MockInner {
    calls: AtomicUsize,
    rules: Mutex<Vec<(String, Result<ApiResponse, TransportFailure>)>>,
    requests: Mutex<Vec<ApiRequest>>,
}

/// Scripted transport: each rule matches a URL substring and yields a
/// canned response or failure. Unmatched URLs get a 404.
#[derive(Clone)]
pub struct MockTransport {
    inner: Arc<MockInner>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MockInner {
                calls: AtomicUsize::new(0),
                rules: Mutex::new(Vec::new()),
                requests: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn respond(self, url_fragment: &str, status: u16, body: Value) -> Self {
        self.inner.rules.lock().unwrap().push((
            url_fragment.to_string(),
            Ok(ApiResponse {
                status,
                reason: reason_for(status).to_string(),
                body,
            }),
        ));
        self
    }

    pub fn fail(self, url_fragment: &str, message: &str) -> Self {
        self.inner.rules.lock().unwrap().push((
            url_fragment.to_string(),
            Err(TransportFailure::Connect(message.to_string())),
        ));
        self
    }

    pub fn call_count(&self) -> usize {
        self.inner.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.inner.requests.lock().unwrap().clone()
    }
}

fn reason_for(status: u16) -> &'static str {
    match status {
        200 => "OK",
        401 => "Unauthorized",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

impl HttpTransport for MockTransport {
    fn execute(
        &self,
        request: ApiRequest,
    ) -> impl Future<Output = Result<ApiResponse, TransportFailure>> + Send {
        let inner = self.inner.clone();
        async move {
            inner.calls.fetch_add(1, Ordering::SeqCst);
            inner.requests.lock().unwrap().push(request.clone());
            let rules = inner.rules.lock().unwrap();
            // Relay strategies percent-encode the path query value, so match
            // fragments against the decoded URL as well.
            let decoded = request.url.replace("%2F", "/").replace("%2f", "/");
            for (fragment, outcome) in rules.iter() {
                if request.url.contains(fragment.as_str()) || decoded.contains(fragment.as_str()) {
                    return outcome.clone();
                }
            }
            Ok(ApiResponse {
                status: 404,
                reason: "Not Found".to_string(),
                body: Value::Null,
            })
        }
    }
}

pub fn shared_memory_storage() -> SharedStorage {
    Arc::new(Mutex::new(Box::new(MemoryStorage::new())))
}

/// Client against a direct-connection environment with a token in place.
pub fn client_with(transport: MockTransport, token: Option<&str>) -> ApiClient<MockTransport> {
    ApiClient::new(
        transport,
        environment::classify("example.com"),
        Session {
            token: token.map(|t| t.to_string()),
            base_url: "https://screeps.com/api".to_string(),
        },
        shared_memory_storage(),
        None,
    )
}
