//! Integration tests for the guarded request path and token refresh

#![cfg(feature = "client")]

use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use turnstile_core::{CredentialPair, SessionState};
use turnstile_http::client::store::{CredentialStore, MemoryCredentialStore};
use turnstile_http::client::{OutboundRequest, SessionClient, error::ClientError};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_with(server: &MockServer, pair: Option<CredentialPair>) -> (SessionClient, Arc<MemoryCredentialStore>) {
    let store = Arc::new(match pair {
        Some(pair) => MemoryCredentialStore::with_pair(&pair),
        None => MemoryCredentialStore::new(),
    });
    let client = SessionClient::builder()
        .base_url(server.uri())
        .store(store.clone())
        .build()
        .unwrap();
    (client, store)
}

async fn mount_refresh_ok(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(header("authorization", "Bearer r1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "a2",
            "refresh_token": "r2",
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_attaches_access_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/profile"))
        .and(header("authorization", "Bearer a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_with(&server, Some(CredentialPair::new("a1", "r1")));
    let body: Value = client.execute(OutboundRequest::get("/profile")).await.unwrap();
    assert_eq!(body["id"], 1);
}

#[tokio::test]
async fn test_anonymous_request_has_no_authorization_header() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/public"))
        .respond_with(move |req: &wiremock::Request| {
            if req.headers.contains_key("authorization") {
                ResponseTemplate::new(400)
            } else {
                ResponseTemplate::new(200).set_body_json(json!([]))
            }
        })
        .mount(&server)
        .await;

    let (client, _) = client_with(&server, None);
    let body: Value = client.execute(OutboundRequest::get("/public")).await.unwrap();
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_unauthorized_refreshes_once_and_retries_with_new_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/orders"))
        .and(header("authorization", "Bearer a1"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Unauthorized"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/orders"))
        .and(header("authorization", "Bearer a2"))
        .and(query_param("draft", "true"))
        .and(body_json(json!({"item": "book"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 42})))
        .expect(1)
        .mount(&server)
        .await;

    mount_refresh_ok(&server, 1).await;

    let (client, store) = client_with(&server, Some(CredentialPair::new("a1", "r1")));
    let request = OutboundRequest::post("/orders")
        .query("draft", "true")
        .json(&json!({"item": "book"}))
        .unwrap();

    let body: Value = client.execute(request).await.unwrap();
    assert_eq!(body["id"], 42);
    assert_eq!(store.access_token().await.as_deref(), Some("a2"));
    assert_eq!(store.refresh_token().await.as_deref(), Some("r2"));
}

#[tokio::test]
async fn test_expired_literal_in_bad_request_triggers_refresh() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/items"))
        .and(header("authorization", "Bearer a1"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"message": "jwt expired"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/items"))
        .and(header("authorization", "Bearer a2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .expect(1)
        .mount(&server)
        .await;

    mount_refresh_ok(&server, 1).await;

    let (client, _) = client_with(&server, Some(CredentialPair::new("a1", "r1")));
    let body: Value = client.execute(OutboundRequest::get("/items")).await.unwrap();
    assert_eq!(body["items"], json!([]));
}

#[tokio::test]
async fn test_retried_request_is_not_retried_again() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/admin"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Unauthorized"})))
        .expect(2)
        .mount(&server)
        .await;

    mount_refresh_ok(&server, 1).await;

    let (client, _) = client_with(&server, Some(CredentialPair::new("a1", "r1")));
    let err = client
        .execute::<Value>(OutboundRequest::get("/admin"))
        .await
        .unwrap_err();
    assert!(err.is_auth_expired());
}

#[tokio::test]
async fn test_expired_refresh_clears_store_and_returns_original_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/profile"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "jwt must be provided"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "jwt expired"})))
        .expect(1)
        .mount(&server)
        .await;

    let (client, store) = client_with(&server, Some(CredentialPair::new("a1", "r1")));
    let err = client
        .execute::<Value>(OutboundRequest::get("/profile"))
        .await
        .unwrap_err();

    assert_eq!(err.message(), "jwt must be provided");
    assert_eq!(store.access_token().await, None);
    assert_eq!(store.refresh_token().await, None);
    assert_eq!(client.state().await, SessionState::Anonymous);
}

#[tokio::test]
async fn test_transient_refresh_failure_keeps_store() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/profile"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Unauthorized"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "db unavailable"})))
        .expect(1)
        .mount(&server)
        .await;

    let (client, store) = client_with(&server, Some(CredentialPair::new("a1", "r1")));
    let err = client
        .execute::<Value>(OutboundRequest::get("/profile"))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert_eq!(err.message(), "Unauthorized");
    assert_eq!(store.access_token().await.as_deref(), Some("a1"));
    assert_eq!(store.refresh_token().await.as_deref(), Some("r1"));
}

#[tokio::test]
async fn test_missing_refresh_token_skips_exchange() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/profile"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (client, _) = client_with(&server, None);
    let err = client
        .execute::<Value>(OutboundRequest::get("/profile"))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(401));

    let err = client.refresh().await.unwrap_err();
    assert!(matches!(err, ClientError::NoRefreshToken));
}

#[tokio::test]
async fn test_non_auth_errors_pass_through() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "No such order"})))
        .expect(1)
        .mount(&server)
        .await;

    mount_refresh_ok(&server, 0).await;

    let (client, _) = client_with(&server, Some(CredentialPair::new("a1", "r1")));
    let err = client
        .execute::<Value>(OutboundRequest::get("/missing"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::NotFound(ref m) if m == "No such order"));
}

#[tokio::test]
async fn test_concurrent_failures_share_one_refresh() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/feed"))
        .and(header("authorization", "Bearer a1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(4)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/feed"))
        .and(header("authorization", "Bearer a2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(4)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(header("authorization", "Bearer r1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "a2", "refresh_token": "r2"}))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_with(&server, Some(CredentialPair::new("a1", "r1")));
    let call = || client.execute::<Value>(OutboundRequest::get("/feed"));

    let (a, b, c, d) = tokio::join!(call(), call(), call(), call());
    for result in [a, b, c, d] {
        assert_eq!(result.unwrap()["ok"], true);
    }
}

#[tokio::test]
async fn test_late_rejection_reuses_refreshed_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/fast"))
        .and(header("authorization", "Bearer a1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    // Rejected only after the first refresh has settled
    Mock::given(method("GET"))
        .and(path("/slow"))
        .and(header("authorization", "Bearer a1"))
        .respond_with(ResponseTemplate::new(401).set_delay(Duration::from_millis(400)))
        .expect(1)
        .mount(&server)
        .await;

    for route in ["/fast", "/slow"] {
        Mock::given(method("GET"))
            .and(path(route))
            .and(header("authorization", "Bearer a2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"route": route})))
            .expect(1)
            .mount(&server)
            .await;
    }

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(header("authorization", "Bearer r1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "a2", "refresh_token": "r2"}))
                .set_delay(Duration::from_millis(50)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (client, store) = client_with(&server, Some(CredentialPair::new("a1", "r1")));
    let (fast, slow) = tokio::join!(
        client.execute::<Value>(OutboundRequest::get("/fast")),
        client.execute::<Value>(OutboundRequest::get("/slow")),
    );

    assert_eq!(fast.unwrap()["route"], "/fast");
    assert_eq!(slow.unwrap()["route"], "/slow");
    assert_eq!(store.access_token().await.as_deref(), Some("a2"));
    assert_eq!(store.refresh_token().await.as_deref(), Some("r2"));
}
