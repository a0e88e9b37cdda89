// API client behavior: auth gating, error taxonomy, fan-out, URL building

mod common;

use common::*;
use reqwest::Method;
use serde_json::json;

use screeps_monitor::api_client::{ApiClient, ApiError, RequestOptions};
use screeps_monitor::credentials::Session;
use screeps_monitor::environment;

#[tokio::test]
async fn missing_token_fails_before_any_network_activity() {
    let transport = MockTransport::new();
    let client = client_with(transport.clone(), None);

    let err = client.get_user_summary().await.unwrap_err();
    assert!(matches!(err, ApiError::Authentication));
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn non_2xx_status_maps_to_upstream_error() {
    let transport = MockTransport::new().respond("auth/me", 500, json!({}));
    let client = client_with(transport, Some("tok"));

    let err = client.get_user_summary().await.unwrap_err();
    match err {
        ApiError::Upstream { status, .. } => assert_eq!(status, 500),
        other => panic!("expected Upstream, got {other:?}"),
    }
}

#[tokio::test]
async fn error_field_in_ok_body_maps_to_application_error() {
    let transport =
        MockTransport::new().respond("auth/me", 200, json!({ "error": "invalid token" }));
    let client = client_with(transport, Some("tok"));

    let err = client.get_user_summary().await.unwrap_err();
    match err {
        ApiError::Application(message) => assert_eq!(message, "invalid token"),
        other => panic!("expected Application, got {other:?}"),
    }
}

#[tokio::test]
async fn transport_failure_carries_environment_specific_hint() {
    let transport = MockTransport::new().fail("auth/me", "connection refused");
    let client = ApiClient::new(
        transport,
        environment::classify("localhost"),
        Session {
            token: Some("tok".to_string()),
            base_url: "https://screeps.com/api".to_string(),
        },
        shared_memory_storage(),
        None,
    );

    let err = client.get_user_summary().await.unwrap_err();
    match err {
        ApiError::Transport { hint, .. } => {
            assert!(hint.contains("local relay"), "hint was: {hint}");
        }
        other => panic!("expected Transport, got {other:?}"),
    }
}

#[tokio::test]
async fn room_fan_out_omits_failed_rooms_and_keeps_order() {
    let transport = MockTransport::new()
        .respond(
            "room=W1N1",
            200,
            json!({ "objects": [{ "type": "creep" }] }),
        )
        .fail("room=W2N2", "connection refused")
        .respond("room=W3N3", 200, json!({ "objects": [] }));
    let client = client_with(transport, Some("tok"));

    let rooms: Vec<String> = ["W1N1", "W2N2", "W3N3"]
        .iter()
        .map(|r| r.to_string())
        .collect();
    let snapshots = client.get_room_snapshots(&rooms).await;

    let names: Vec<&str> = snapshots.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["W1N1", "W3N3"]);
    assert_eq!(snapshots[0].objects.len(), 1);
}

#[tokio::test]
async fn owned_room_discovery_drives_the_fan_out() {
    let transport = MockTransport::new()
        .respond("auth/me", 200, json!({ "rooms": ["W1N1", "W2N2"] }))
        .respond("room=W1N1", 200, json!({ "objects": [] }))
        .respond("room=W2N2", 200, json!({ "objects": [] }));
    let client = client_with(transport.clone(), Some("tok"));

    let snapshots = client.get_all_owned_room_snapshots().await.unwrap();
    assert_eq!(snapshots.len(), 2);
    // One summary call plus one per room.
    assert_eq!(transport.call_count(), 3);
}

#[tokio::test]
async fn console_submission_posts_the_expression() {
    let transport = MockTransport::new().respond("user/console", 200, json!({ "ok": 1 }));
    let client = client_with(transport.clone(), Some("tok"));

    let body = client.submit_console_expression("Game.time").await.unwrap();
    assert_eq!(body, json!({ "ok": 1 }));

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, Method::POST);
    assert_eq!(
        requests[0].body.as_ref().unwrap()["expression"],
        json!("Game.time")
    );
    assert_eq!(requests[0].token.as_deref(), Some("tok"));
}

#[tokio::test]
async fn console_read_returns_body_verbatim() {
    let expected = json!({ "messages": { "log": ["hello"] } });
    let transport = MockTransport::new().respond("user/console", 200, expected.clone());
    let client = client_with(transport, Some("tok"));

    let body = client.get_console_output().await.unwrap();
    assert_eq!(body, expected);
}

#[tokio::test]
async fn account_summary_decodes_leniently() {
    let transport = MockTransport::new().respond(
        "auth/me",
        200,
        json!({
            "username": "alice",
            "cpu": 100,
            "cpuUsed": 12.5,
            "rooms": ["W1N1"],
            "gcl": 42,
            "badge": { "color": "red" }
        }),
    );
    let client = client_with(transport, Some("tok"));

    let user = client.get_user_summary().await.unwrap();
    assert_eq!(user.username.as_deref(), Some("alice"));
    assert_eq!(user.cpu, Some(100.0));
    assert_eq!(user.cpu_used, Some(12.5));
    assert_eq!(user.rooms, vec!["W1N1"]);
}

#[tokio::test]
async fn direct_environment_hits_the_base_url() {
    let transport = MockTransport::new().respond("auth/me", 200, json!({}));
    let client = client_with(transport.clone(), Some("tok"));

    let _ = client.request("auth/me", RequestOptions::get()).await;
    let requests = transport.requests();
    assert_eq!(requests[0].url, "https://screeps.com/api/auth/me");
}

#[tokio::test]
async fn local_environment_routes_through_the_relay_path_query() {
    let transport = MockTransport::new().respond("auth/me", 200, json!({}));
    let client = ApiClient::new(
        transport.clone(),
        environment::classify("127.0.0.1"),
        Session {
            token: Some("tok".to_string()),
            base_url: "https://screeps.com/api".to_string(),
        },
        shared_memory_storage(),
        None,
    );

    let _ = client.request("auth/me", RequestOptions::get()).await;
    let requests = transport.requests();
    assert!(requests[0].url.starts_with("http://127.0.0.1:3080/relay?"));
    assert!(requests[0].url.contains("path=auth%2Fme") || requests[0].url.contains("path=auth/me"));
}

#[tokio::test]
async fn static_hosting_routes_through_the_public_forwarder() {
    let transport = MockTransport::new().respond("allorigins", 200, json!({}));
    let client = ApiClient::new(
        transport.clone(),
        environment::classify("alice.github.io"),
        Session {
            token: Some("tok".to_string()),
            base_url: "https://screeps.com/api".to_string(),
        },
        shared_memory_storage(),
        None,
    );

    let _ = client.request("auth/me", RequestOptions::get()).await;
    let requests = transport.requests();
    assert!(requests[0].url.starts_with("https://api.allorigins.win/raw?url="));
    assert!(requests[0].url.contains("screeps.com"));
}

#[tokio::test]
async fn set_credentials_persists_token_and_base_url() {
    let transport = MockTransport::new();
    let storage = shared_memory_storage();
    let client = ApiClient::new(
        transport,
        environment::classify("example.com"),
        Session {
            token: None,
            base_url: "https://screeps.com/api".to_string(),
        },
        storage.clone(),
        None,
    );

    client
        .set_credentials("fresh-token", "https://screeps.com/api")
        .await
        .unwrap();

    let session = client.session().await;
    assert_eq!(session.token.as_deref(), Some("fresh-token"));

    let guard = storage.lock().unwrap();
    assert_eq!(guard.get("token").as_deref(), Some("fresh-token"));
    assert_eq!(
        guard.get("base_url").as_deref(),
        Some("https://screeps.com/api")
    );
}
