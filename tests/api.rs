//! API router behaviour against a mock device.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceExt;

use hardware_wallet_daemon::http::{router, ApiConfig, ApiServer, Gateway, HttpServer};

mod common;
use common::MockDevice;

const HOST: &str = "127.0.0.1:9510";

fn bound() -> SocketAddr {
    HOST.parse().unwrap()
}

fn app(config: ApiConfig, device: MockDevice) -> Router {
    router(bound(), config, Gateway::new(Arc::new(device)))
}

fn no_csrf() -> ApiConfig {
    ApiConfig {
        enable_csrf: false,
        ..Default::default()
    }
}

fn get(path: &str) -> Request<Body> {
    Request::get(path)
        .header(header::HOST, HOST)
        .body(Body::empty())
        .unwrap()
}

fn post_json(path: &str, body: Value) -> Request<Body> {
    Request::post(path)
        .header(header::HOST, HOST)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_version_reports_build_info() {
    let resp = app(no_csrf(), MockDevice::connected())
        .oneshot(get("/api/v1/version"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));

    let json = body_json(resp).await;
    assert_eq!(json["data"]["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_foreign_host_is_forbidden() {
    let req = Request::get("/api/v1/version")
        .header(header::HOST, "attacker.example:9510")
        .body(Body::empty())
        .unwrap();
    let resp = app(no_csrf(), MockDevice::connected()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_header_check_can_be_disabled() {
    let config = ApiConfig {
        disable_header_check: true,
        ..no_csrf()
    };
    let req = Request::get("/api/v1/version")
        .header(header::HOST, "attacker.example:9510")
        .body(Body::empty())
        .unwrap();
    let resp = app(config, MockDevice::connected()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_csrf_token_required_for_post() {
    let app = app(ApiConfig::default(), MockDevice::connected());
    let body = json!({"address_index": 0, "message": "hello"});

    let resp = app
        .clone()
        .oneshot(post_json("/api/v1/sign_message", body.clone()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(resp).await["error"]["message"], "invalid CSRF token");

    let resp = app.clone().oneshot(get("/api/v1/csrf")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let token = body_json(resp).await["data"]["csrf_token"]
        .as_str()
        .unwrap()
        .to_string();

    let mut req = post_json("/api/v1/sign_message", body);
    req.headers_mut()
        .insert("x-csrf-token", token.parse().unwrap());
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["data"]["signature"], "sig:0:hello");
}

#[tokio::test]
async fn test_csrf_endpoint_missing_when_disabled() {
    let resp = app(no_csrf(), MockDevice::connected())
        .oneshot(get("/api/v1/csrf"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_nested_field_is_unprocessable() {
    let body = json!({
        "transaction_inputs": [{"index": 0}],
        "transaction_outputs": [{"address": "2M9", "coins": "1000000", "hours": "2"}]
    });
    let resp = app(no_csrf(), MockDevice::connected())
        .oneshot(post_json("/api/v1/transaction_sign", body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let json = body_json(resp).await;
    assert_eq!(json["error"]["code"], 422);
    assert_eq!(
        json["error"]["message"],
        "transaction_inputs.0.hash in body is required"
    );
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let req = Request::post("/api/v1/generate_addresses")
        .header(header::HOST, HOST)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"address_n\": "))
        .unwrap();
    let resp = app(no_csrf(), MockDevice::connected()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_transaction_sign_returns_signatures() {
    let body = json!({
        "transaction_inputs": [
            {"hash": "aa", "index": 0},
            {"hash": "bb", "index": 1}
        ],
        "transaction_outputs": [{"address": "2M9", "coins": "1000000", "hours": "2"}]
    });
    let resp = app(no_csrf(), MockDevice::connected())
        .oneshot(post_json("/api/v1/transaction_sign", body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        body_json(resp).await["data"]["signatures"],
        json!(["sig:aa", "sig:bb"])
    );
}

#[tokio::test]
async fn test_generate_addresses() {
    let body = json!({"address_n": 2, "start_index": 5});
    let resp = app(no_csrf(), MockDevice::connected())
        .oneshot(post_json("/api/v1/generate_addresses", body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        body_json(resp).await["data"]["addresses"],
        json!(["addr5", "addr6"])
    );
}

#[tokio::test]
async fn test_check_message_signature_returns_signer() {
    let app = app(no_csrf(), MockDevice::connected());
    let body = json!({"address": "2M9", "message": "hello", "signature": "sig:0:hello"});

    let resp = app
        .clone()
        .oneshot(post_json("/api/v1/check_message_signature", body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["data"]["address"], "2M9");

    let body = json!({"address": "2M9", "message": "hello"});
    let resp = app
        .oneshot(post_json("/api/v1/check_message_signature", body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body_json(resp).await["error"]["message"],
        "signature in body is required"
    );
}

#[tokio::test]
async fn test_cancel_acknowledged() {
    let req = Request::builder()
        .method(Method::PUT)
        .uri("/api/v1/cancel")
        .header(header::HOST, HOST)
        .body(Body::empty())
        .unwrap();
    let resp = app(no_csrf(), MockDevice::connected()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["data"]["message"], "operation cancelled");
}

#[tokio::test]
async fn test_disconnected_device_is_unavailable() {
    let app = app(no_csrf(), MockDevice::default());

    let resp = app.clone().oneshot(get("/api/v1/available")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["data"]["available"], false);

    let resp = app.clone().oneshot(get("/api/v1/features")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let req = Request::builder()
        .method(Method::DELETE)
        .uri("/api/v1/wipe")
        .header(header::HOST, HOST)
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_server_serves_until_shutdown() {
    let server = Arc::new(
        HttpServer::create(
            "127.0.0.1:0",
            no_csrf(),
            Gateway::new(Arc::new(MockDevice::connected())),
        )
        .await
        .unwrap(),
    );
    let addr = server.local_addr();

    let worker = {
        let server = server.clone();
        tokio::spawn(async move { server.serve().await })
    };

    let json: Value = reqwest::get(format!("http://{}/api/v1/features", addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(json["data"]["device_id"], "mock-0001");

    server.shutdown().await;
    assert_eq!(worker.await.unwrap(), Ok(()));
}

#[tokio::test]
async fn test_shutdown_before_serve() {
    let server = HttpServer::create(
        "127.0.0.1:0",
        no_csrf(),
        Gateway::new(Arc::new(MockDevice::connected())),
    )
    .await
    .unwrap();

    server.shutdown().await;
    assert_eq!(server.serve().await, Ok(()));
}

#[tokio::test]
async fn test_port_in_use_is_construction_error() {
    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let host = taken.local_addr().unwrap().to_string();

    let err = HttpServer::create(
        &host,
        no_csrf(),
        Gateway::new(Arc::new(MockDevice::connected())),
    )
    .await
    .err()
    .unwrap();
    assert!(err.to_string().starts_with("listen on"));
}
