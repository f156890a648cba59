//! HTTP surface driven through the router without a socket.

use super::support::{memory_state, scenario_events, FakeLedgerSource, ADDRESS_A, ADDRESS_B};
use crate::api::create_router;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app(source: Arc<FakeLedgerSource>) -> Router {
    let (_, state) = memory_state(source);
    create_router(Arc::new(state))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    app.clone().oneshot(request).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = app(Arc::new(FakeLedgerSource::new()));

    let response = send(&app, "GET", "/health", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "healthy");
}

#[tokio::test]
async fn test_add_address_syncs_and_reports_balance() {
    let source = Arc::new(FakeLedgerSource::new());
    source.set_events(ADDRESS_A, scenario_events());
    let app = app(source);

    let response = send(
        &app,
        "POST",
        "/addresses",
        Some(json!({"address": ADDRESS_A, "label": "cold storage"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["data"]["address"], ADDRESS_A);
    assert_eq!(body["data"]["label"], "cold storage");
    assert!(!body["data"]["last_synced"].is_null());

    let response = send(&app, "GET", &format!("/addresses/{}/balance", ADDRESS_A), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["confirmed_balance"], 300_000_000);
    assert_eq!(body["data"]["unconfirmed_balance"], 100_000_000);
    assert_eq!(body["data"]["total_balance"], 400_000_000);

    let response = send(&app, "GET", "/addresses", None).await;
    let body = json_body(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["balance"]["total_balance"], 400_000_000);
}

#[tokio::test]
async fn test_add_address_errors() {
    let app = app(Arc::new(FakeLedgerSource::new()));

    let response = send(&app, "POST", "/addresses", Some(json!({"address": "xyz"}))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["success"], false);

    let response = send(&app, "POST", "/addresses", Some(json!({}))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/addresses")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, "POST", "/addresses", Some(json!({"address": ADDRESS_B}))).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let response = send(&app, "POST", "/addresses", Some(json!({"address": ADDRESS_B}))).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_transactions_paging_and_total_header() {
    let source = Arc::new(FakeLedgerSource::new());
    source.set_events(ADDRESS_A, scenario_events());
    let app = app(source);
    send(&app, "POST", "/addresses", Some(json!({"address": ADDRESS_A}))).await;

    let uri = format!("/addresses/{}/transactions?limit=2&offset=0", ADDRESS_A);
    let response = send(&app, "GET", &uri, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-total-count"], "3");
    let body = json_body(response).await;
    let hashes: Vec<_> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|tx| tx["hash"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(hashes, vec!["h1", "h2"]);
    assert_eq!(body["data"][1]["type"], "sent");

    let uri = format!("/addresses/{}/transactions?limit=2&offset=2", ADDRESS_A);
    let body = json_body(send(&app, "GET", &uri, None).await).await;
    assert_eq!(body["data"][0]["hash"], "h3");
    assert_eq!(body["data"][0]["confirmations"], 0);

    let uri = format!("/addresses/{}/transactions?offset=-1", ADDRESS_A);
    let response = send(&app, "GET", &uri, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let uri = format!("/addresses/{}/transactions?limit=abc", ADDRESS_A);
    let response = send(&app, "GET", &uri, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let uri = format!("/addresses/{}/transactions", ADDRESS_B);
    let response = send(&app, "GET", &uri, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_removes_address_and_history() {
    let source = Arc::new(FakeLedgerSource::new());
    source.set_events(ADDRESS_A, scenario_events());
    let app = app(source);
    send(&app, "POST", "/addresses", Some(json!({"address": ADDRESS_A}))).await;

    let uri = format!("/addresses/{}", ADDRESS_A);
    let response = send(&app, "DELETE", &uri, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await["message"],
        "Address removed successfully"
    );

    assert_eq!(send(&app, "GET", &uri, None).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(send(&app, "DELETE", &uri, None).await.status(), StatusCode::NOT_FOUND);
    let balance_uri = format!("/addresses/{}/balance", ADDRESS_A);
    assert_eq!(
        send(&app, "GET", &balance_uri, None).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_manual_sync_endpoints() {
    let source = Arc::new(FakeLedgerSource::new());
    let app = app(source.clone());
    send(&app, "POST", "/addresses", Some(json!({"address": ADDRESS_A}))).await;
    send(&app, "POST", "/addresses", Some(json!({"address": ADDRESS_B}))).await;

    source.set_events(ADDRESS_A, scenario_events());
    let uri = format!("/addresses/{}/sync", ADDRESS_A);
    let response = send(&app, "POST", &uri, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["inserted"], 3);

    source.fail(ADDRESS_A);
    let response = send(&app, "POST", &uri, None).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let response = send(&app, "POST", "/sync", None).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("1 errors"));

    source.set_events(ADDRESS_A, scenario_events());
    let response = send(&app, "POST", "/sync", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["data"]["synced"], 2);

    let unknown = "/addresses/1BoatSLRHtKNngkdXEeobR76b53LETtpyT/sync";
    assert_eq!(
        send(&app, "POST", unknown, None).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_cors_preflight() {
    let app = app(Arc::new(FakeLedgerSource::new()));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/addresses")
                .header("origin", "http://localhost:3000")
                .header("access-control-request-method", "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
}
