//! Integration tests for the health monitor against a mock review service
//!
//! Runs the real `ReviewsApiClient` as the probe, so status transitions go
//! through HTTP, classification and retry exactly as in production.

use std::sync::Arc;
use std::time::Duration;

use reviewdesk_domain::{ApiConfig, ConnectivityStatus};
use reviewdesk_infra::api::{HealthMonitor, HealthProbe};
use reviewdesk_infra::ReviewsApiClient;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WAIT: Duration = Duration::from_secs(5);

fn probe_for(server: &MockServer) -> Arc<dyn HealthProbe> {
    let config = ApiConfig {
        base_url: server.uri(),
        api_key: "monitor-key".into(),
        max_retries: 0,
        backoff_base_ms: 1,
        ..ApiConfig::default()
    };
    Arc::new(ReviewsApiClient::new(&config).expect("client should build"))
}

async fn mount_health(server: &MockServer, status: u16) {
    let reported = if status == 200 { "healthy" } else { "unhealthy" };
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({ "status": reported })))
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_monitor_tracks_service_through_outage_and_recovery() {
    let server = MockServer::start().await;
    mount_health(&server, 500).await;

    let mut monitor = HealthMonitor::with_interval(probe_for(&server), Duration::from_secs(30));
    let mut rx = monitor.subscribe();
    assert_eq!(monitor.status(), ConnectivityStatus::Checking);

    monitor.start().await.expect("monitor should start");
    tokio::time::timeout(WAIT, rx.wait_for(|s| *s == ConnectivityStatus::Offline))
        .await
        .expect("should go offline")
        .unwrap();

    // Service comes back; the platform signals connectivity
    server.reset().await;
    mount_health(&server, 200).await;

    monitor.came_back_online().await;
    tokio::time::timeout(WAIT, rx.wait_for(|s| *s == ConnectivityStatus::Online))
        .await
        .expect("should come back online well before the next scheduled poll")
        .unwrap();

    monitor.stop().await.expect("monitor should stop");
    assert!(!monitor.is_running().await);
}

#[tokio::test]
async fn test_offline_signal_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let monitor = HealthMonitor::with_interval(probe_for(&server), Duration::from_secs(30));
    monitor.went_offline();

    assert_eq!(monitor.status(), ConnectivityStatus::Offline);
}

#[tokio::test]
async fn test_unreachable_service_is_offline() {
    let server = MockServer::start().await;
    let probe = probe_for(&server);
    drop(server);

    let monitor = HealthMonitor::with_interval(probe, Duration::from_secs(30));

    assert_eq!(monitor.poll_now().await, ConnectivityStatus::Offline);
    assert_eq!(monitor.status(), ConnectivityStatus::Offline);
}
