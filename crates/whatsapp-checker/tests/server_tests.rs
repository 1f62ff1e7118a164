//! Integration tests for listener shutdown.

use axum::{routing::get, Router};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use whatsapp_checker::server::{Server, ShutdownOutcome};

/// A router whose `/slow` handler signals `started` and then takes `delay`.
fn slow_router(started: Arc<Notify>, delay: Duration) -> Router {
    Router::new()
        .route("/fast", get(|| async { "fast" }))
        .route(
            "/slow",
            get(move || {
                let started = started.clone();
                async move {
                    started.notify_one();
                    tokio::time::sleep(delay).await;
                    "slow"
                }
            }),
        )
}

async fn start(router: Router) -> whatsapp_checker::RunningServer {
    let server = Server::bind("127.0.0.1:0".parse().unwrap(), router)
        .await
        .unwrap();
    server.spawn()
}

#[tokio::test]
async fn test_serves_requests() {
    let running = start(slow_router(Arc::new(Notify::new()), Duration::ZERO)).await;
    let url = format!("http://{}/fast", running.local_addr());

    let body = reqwest::get(&url).await.unwrap().text().await.unwrap();
    assert_eq!(body, "fast");

    let outcome = running.shutdown(Duration::from_secs(5)).await.unwrap();
    assert_eq!(outcome, ShutdownOutcome::Graceful);
}

#[tokio::test]
async fn test_in_flight_request_completes() {
    let started = Arc::new(Notify::new());
    let running = start(slow_router(started.clone(), Duration::from_millis(300))).await;
    let addr = running.local_addr();

    let request = tokio::spawn(async move {
        reqwest::get(format!("http://{}/slow", addr))
            .await?
            .text()
            .await
    });
    started.notified().await;

    let outcome = running.shutdown(Duration::from_secs(5)).await.unwrap();

    assert_eq!(outcome, ShutdownOutcome::Graceful);
    assert_eq!(request.await.unwrap().unwrap(), "slow");
}

#[tokio::test]
async fn test_refuses_connections_after_shutdown() {
    let running = start(slow_router(Arc::new(Notify::new()), Duration::ZERO)).await;
    let addr = running.local_addr();

    running.shutdown(Duration::from_secs(5)).await.unwrap();

    assert!(tokio::net::TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn test_deadline_closes_slow_requests() {
    let started = Arc::new(Notify::new());
    let running = start(slow_router(started.clone(), Duration::from_secs(30))).await;
    let addr = running.local_addr();

    let request = tokio::spawn(async move {
        reqwest::get(format!("http://{}/slow", addr))
            .await?
            .text()
            .await
    });
    started.notified().await;

    let outcome = running.shutdown(Duration::from_millis(200)).await.unwrap();
    assert_eq!(outcome, ShutdownOutcome::TimedOut);

    let result = tokio::time::timeout(Duration::from_secs(5), request)
        .await
        .expect("request should end once its connection is closed")
        .unwrap();
    assert!(result.is_err());
}
