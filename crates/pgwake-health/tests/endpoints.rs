//! Health endpoint tests.

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use pgwake_core::SyncGate;
use pgwake_health::{build_router, serve};

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn health_is_ok_with_empty_body() {
    let router = build_router(SyncGate::new());

    let resp = router.oneshot(get("/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = axum::body::to_bytes(resp.into_body(), 1024).await.unwrap();
    assert!(body.is_empty());
}

#[tokio::test]
async fn ready_tracks_the_gate() {
    let gate = SyncGate::new();
    let router = build_router(gate.clone());

    let resp = router.clone().oneshot(get("/ready")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    gate.arm();
    let resp = router.oneshot(get("/ready")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_path_is_not_found() {
    let router = build_router(SyncGate::new());
    let resp = router.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn server_stops_on_shutdown() {
    let (tx, rx) = tokio::sync::watch::channel(false);
    let addr = "127.0.0.1:0".parse().unwrap();

    let server = tokio::spawn(serve(addr, SyncGate::new(), rx));

    tokio::time::sleep(Duration::from_millis(50)).await;
    tx.send(true).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(2), server)
        .await
        .expect("server did not stop")
        .unwrap();
    assert!(result.is_ok());
}
