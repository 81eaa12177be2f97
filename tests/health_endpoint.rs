//! End-to-end tests for the health endpoint and admin shutdown trigger.

use serde_json::Value;

use service_lifecycle::config::{DependencyConfig, DependencyKind};
use service_lifecycle::lifecycle::startup::launch;
use service_lifecycle::lifecycle::{ReleaseOutcome, ShutdownCause, ShutdownResult};

mod common;

fn tcp_dependency(name: &str, address: std::net::SocketAddr) -> DependencyConfig {
    DependencyConfig {
        name: name.into(),
        kind: DependencyKind::Tcp,
        address: address.to_string(),
        path: "/health".into(),
    }
}

#[tokio::test]
async fn healthy_dependencies_report_up() {
    let db = common::start_tcp_dependency().await;
    let cache = common::start_tcp_dependency().await;

    let mut config = common::test_config();
    config.dependencies.push(tcp_dependency("db", db));
    config.dependencies.push(tcp_dependency("cache", cache));
    let service = launch(&config).await.unwrap();

    let res = common::http_client()
        .get(format!("http://{}/health", service.local_addr))
        .send()
        .await
        .expect("service unreachable");
    assert_eq!(res.status(), 200);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "UP");
    for name in ["listener", "memory", "db", "cache"] {
        assert_eq!(body["checks"][name]["status"], "UP", "check {name}");
    }
    assert!(body["uptime"].is_f64());
    assert!(body["timestamp"].as_i64().unwrap() > 0);

    service
        .orchestrator
        .shutdown(service.shutdown_deadline, ShutdownCause::Api)
        .await;
}

#[tokio::test]
async fn failing_database_reports_down_with_503() {
    let db = common::closed_address().await;
    let cache = common::start_tcp_dependency().await;

    let mut config = common::test_config();
    config.dependencies.push(tcp_dependency("db", db));
    config.dependencies.push(tcp_dependency("cache", cache));
    let service = launch(&config).await.unwrap();

    let res = common::http_client()
        .get(format!("http://{}/health", service.local_addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 503);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "DOWN");
    assert_eq!(body["checks"]["db"]["status"], "DOWN");
    assert!(body["checks"]["db"]["details"].is_string());
    assert_eq!(body["checks"]["cache"]["status"], "UP");
    assert_eq!(body["checks"]["listener"]["status"], "UP");

    service
        .orchestrator
        .shutdown(service.shutdown_deadline, ShutdownCause::Api)
        .await;
}

#[tokio::test]
async fn unknown_route_is_404() {
    let service = launch(&common::test_config()).await.unwrap();

    let res = common::http_client()
        .get(format!("http://{}/nope", service.local_addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Resource not found");

    service
        .orchestrator
        .shutdown(service.shutdown_deadline, ShutdownCause::Api)
        .await;
}

#[tokio::test]
async fn admin_shutdown_drains_every_resource() {
    let db = common::start_tcp_dependency().await;
    let mut config = common::test_config();
    config.dependencies.push(tcp_dependency("db", db));
    let service = launch(&config).await.unwrap();
    let client = common::http_client();

    let status: Value = client
        .get(format!("http://{}/admin/status", service.local_addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["state"], "idle");

    let res = client
        .post(format!("http://{}/admin/shutdown", service.local_addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 202);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["accepted"], true);

    let report = service.orchestrator.completed().await;
    assert_eq!(report.result, ShutdownResult::Clean);
    assert_eq!(report.cause, ShutdownCause::Api);
    assert_eq!(report.outcomes["listener"], ReleaseOutcome::Closed);
    assert_eq!(report.outcomes["db"], ReleaseOutcome::Closed);
    assert_eq!(report.outcomes["memory"], ReleaseOutcome::Closed);
    assert_eq!(report.exit_code(), 0);

    let after = client
        .get(format!("http://{}/health", service.local_addr))
        .send()
        .await;
    assert!(after.is_err(), "listener should be closed after shutdown");
}

#[tokio::test]
async fn admin_routes_are_absent_when_disabled() {
    let mut config = common::test_config();
    config.admin.enabled = false;
    let service = launch(&config).await.unwrap();

    let res = common::http_client()
        .post(format!("http://{}/admin/shutdown", service.local_addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
    assert!(service.orchestrator.state().is_idle());

    service
        .orchestrator
        .shutdown(service.shutdown_deadline, ShutdownCause::Api)
        .await;
}
