mod common;

use axum::body::Body;
use common::{create_table, setup};
use dine_server::api::build_app;
use http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

async fn call(app: &axum::Router, req: Request<Body>) -> (StatusCode, Option<String>, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, cookie, body)
}

fn post(uri: &str) -> http::request::Builder {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
}

fn token_from_cookie(cookie: &str) -> String {
    cookie
        .split(';')
        .next()
        .and_then(|kv| kv.split_once('='))
        .map(|(_, v)| v.to_string())
        .unwrap()
}

#[tokio::test]
async fn scan_order_complete_flow() {
    let (_dir, state) = setup().await;
    let table = create_table(&state, 1, "T1").await;
    let app = build_app(state.clone());

    // Scan
    let (status, cookie, body) = call(
        &app,
        post(&format!("/api/tables/{}/session", table.id))
            .header("x-device-id", "phone-a")
            .body(Body::from(json!({"branch_id": 1}).to_string()))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_new"], true);
    assert!(body["session"].get("session_token").is_none());
    let cookie = cookie.unwrap();
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    let token = token_from_cookie(&cookie);
    let session_id = body["session"]["id"].as_i64().unwrap();

    // Order via cookie, then via header
    let (status, _, body) = call(
        &app,
        post(&format!("/api/tables/{}/orders", table.id))
            .header(header::COOKIE, format!("table_session={token}"))
            .body(Body::from(json!({"order_id": "o1", "amount": 25.5}).to_string()))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_amount"], 25.5);

    let (status, _, body) = call(
        &app,
        post(&format!("/api/tables/{}/orders", table.id))
            .header("x-session-token", &token)
            .body(Body::from(json!({"order_id": "o2", "amount": 10.0}).to_string()))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_amount"], 35.5);

    // Complete
    let (status, _, body) = call(
        &app,
        post(&format!("/api/sessions/{session_id}/complete"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "COMPLETED");

    // Token is dead now
    let (status, _, body) = call(
        &app,
        post(&format!("/api/tables/{}/orders", table.id))
            .header("x-session-token", &token)
            .body(Body::from(json!({"order_id": "o3", "amount": 5.0}).to_string()))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1104);

    // Completing again is a state error
    let (status, _, body) = call(
        &app,
        post(&format!("/api/sessions/{session_id}/complete"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 1102);
}

#[tokio::test]
async fn stranger_gets_occupied_with_start_time() {
    let (_dir, state) = setup().await;
    let table = create_table(&state, 1, "T1").await;
    let app = build_app(state.clone());

    let (status, _, body) = call(
        &app,
        post(&format!("/api/tables/{}/session", table.id))
            .header("x-device-id", "owner")
            .body(Body::from(json!({"branch_id": 1}).to_string()))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let started_at = body["session"]["started_at"].as_i64().unwrap();

    let (status, cookie, body) = call(
        &app,
        post(&format!("/api/tables/{}/session", table.id))
            .header("x-device-id", "stranger")
            .body(Body::from(json!({"branch_id": 1}).to_string()))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(cookie.is_none());
    assert_eq!(body["code"], 7002);
    assert_eq!(body["details"]["started_at"], started_at);
    assert_eq!(body["details"]["can_notify"], true);

    // Access check for the owner returns the session
    let (status, _, body) = call(
        &app,
        Request::builder()
            .uri(format!("/api/access?table_id={}", table.id))
            .header("x-device-id", "owner")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["access"], "owned");

    // Owner scanning again is handed the same session
    let (status, cookie, body) = call(
        &app,
        post(&format!("/api/tables/{}/session", table.id))
            .header("x-device-id", "owner")
            .body(Body::from(json!({"branch_id": 1}).to_string()))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_new"], false);
    assert!(cookie.is_some());
}

#[tokio::test]
async fn access_check_for_browse_and_unknown_table() {
    let (_dir, state) = setup().await;
    let app = build_app(state);

    let (status, _, body) = call(
        &app,
        Request::builder().uri("/api/access").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["access"], "browse");

    let (status, _, body) = call(
        &app,
        Request::builder()
            .uri("/api/access?table_id=424242")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 7005);
}

#[tokio::test]
async fn order_without_token_is_unauthorized() {
    let (_dir, state) = setup().await;
    let table = create_table(&state, 1, "T1").await;
    let app = build_app(state);

    let (status, _, body) = call(
        &app,
        post(&format!("/api/tables/{}/orders", table.id))
            .body(Body::from(json!({"order_id": "o1", "amount": 1.0}).to_string()))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1104);
}

#[tokio::test]
async fn manual_cleanup_endpoint() {
    let (_dir, state) = setup().await;
    let app = build_app(state);

    let (status, _, body) = call(
        &app,
        post("/api/sessions/cleanup")
            .body(Body::from(json!({}).to_string()))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cleaned"], 0);

    let (status, _, body) = call(
        &app,
        post("/api/sessions/cleanup")
            .body(Body::from(json!({"hours_inactive": 0}).to_string()))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 2);
}

#[tokio::test]
async fn table_crud_and_reservation() {
    let (_dir, state) = setup().await;
    let app = build_app(state);

    let (status, _, body) = call(
        &app,
        post("/api/tables")
            .body(Body::from(json!({"branch_id": 3, "name": "Patio 1"}).to_string()))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = body["id"].as_i64().unwrap();
    assert_eq!(body["availability"], "AVAILABLE");

    let (status, _, body) = call(
        &app,
        post("/api/tables")
            .body(Body::from(json!({"branch_id": 3, "name": "Patio 1"}).to_string()))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 7007);

    let (status, _, body) = call(
        &app,
        post(&format!("/api/tables/{id}/reserve"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["availability"], "RESERVED");

    let (status, _, body) = call(
        &app,
        post(&format!("/api/tables/{id}/reserve"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 7006);

    let (status, _, body) = call(
        &app,
        post(&format!("/api/tables/{id}/release"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["availability"], "AVAILABLE");

    let (status, _, body) = call(
        &app,
        Request::builder()
            .uri("/api/tables?branch_id=3")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn rescan_with_only_the_cookie_returns_own_session() {
    let (_dir, state) = setup().await;
    let table = create_table(&state, 1, "T1").await;
    let app = build_app(state);

    let (status, cookie, body) = call(
        &app,
        post(&format!("/api/tables/{}/session", table.id))
            .header("x-device-id", "phone-a")
            .body(Body::from(json!({"branch_id": 1}).to_string()))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = token_from_cookie(&cookie.unwrap());
    let session_id = body["session"]["id"].as_i64().unwrap();

    // Page reload: no device header, just the cookie
    let (status, cookie, body) = call(
        &app,
        post(&format!("/api/tables/{}/session", table.id))
            .header(header::COOKIE, format!("table_session={token}"))
            .body(Body::from(json!({"branch_id": 1}).to_string()))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_new"], false);
    assert_eq!(body["session"]["id"], session_id);
    assert_eq!(token_from_cookie(&cookie.unwrap()), token);
}

#[tokio::test]
async fn opening_a_table_without_identity_is_rejected() {
    let (_dir, state) = setup().await;
    let table = create_table(&state, 1, "T1").await;
    let app = build_app(state);

    let (status, cookie, body) = call(
        &app,
        post(&format!("/api/tables/{}/session", table.id))
            .body(Body::from(json!({"branch_id": 1}).to_string()))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(cookie.is_none());
    assert_eq!(body["code"], 2);
}
