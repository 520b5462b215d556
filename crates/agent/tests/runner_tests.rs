//! End-to-end tests for the agent commands: a real xDrip+-shaped HTTP
//! server on loopback and a mock bulb.

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use axum::routing::get;
use axum::Router;
use diabuddy_agent::config::AgentConfig;
use diabuddy_agent::runner;
use diabuddy_bulb::mock::MockConnector;
use diabuddy_core::{AlertBand, ConnectionCredentials};
use diabuddy_events::{MonitorEvent, Notification};
use diabuddy_monitor::{BulbOutcome, CompositeResult, MonitorError, MonitorState};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

async fn serve_sgv(body: &'static str) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");
    let router = Router::new().route("/sgv.json", get(move || async move { body }));
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("test server");
    });
    format!("http://{addr}")
}

fn closed_port() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind probe");
    let addr = listener.local_addr().expect("probe address");
    drop(listener);
    format!("http://{addr}")
}

fn config(xdrip_url: String, credentials: ConnectionCredentials) -> AgentConfig {
    AgentConfig {
        credentials,
        check_interval: Duration::from_secs(100),
        xdrip_urls: vec![xdrip_url],
        xdrip_timeout: Duration::from_secs(2),
    }
}

fn credentials() -> ConnectionCredentials {
    ConnectionCredentials::new("192.168.1.100", "parent@example.com", "hunter2")
}

fn drain(rx: &mut broadcast::Receiver<Notification>) -> Vec<MonitorEvent> {
    let mut events = Vec::new();
    while let Ok(notification) = rx.try_recv() {
        events.push(notification.event);
    }
    events
}

const HIGH_READING: &str =
    r#"[{"sgv": 240, "date": 1700000000000, "dateString": "2023-11-14T22:13:20.000Z", "direction": "SingleUp"}]"#;

// ---------------------------------------------------------------------------
// Test: check
// ---------------------------------------------------------------------------

#[tokio::test]
async fn check_reads_classifies_and_colours_the_bulb() {
    let url = serve_sgv(HIGH_READING).await;
    let mock = MockConnector::new();
    let config = config(url, credentials());
    let controller = runner::build_with_connector(&config, Arc::new(mock.clone()));
    let mut rx = controller.bus().subscribe();

    let outcome = runner::run_check(&controller, &config).await.expect("check");

    assert_eq!(outcome.reading.value(), 240);
    assert_eq!(outcome.band, AlertBand::High);
    assert_eq!(outcome.bulb, BulbOutcome::Updated);
    assert!(mock.colors().iter().any(|t| t.hue_degrees == 270));
    assert_eq!(controller.state().await, MonitorState::Stopped);

    let events = drain(&mut rx);
    assert!(events.contains(&MonitorEvent::info("Check complete: 240")));
    assert!(events.contains(&MonitorEvent::error("Glucose Alert: 240 (HIGH)")));
}

#[tokio::test]
async fn check_without_reading_reports_data_unavailable() {
    let mock = MockConnector::new();
    let config = config(closed_port(), credentials());
    let controller = runner::build_with_connector(&config, Arc::new(mock.clone()));

    let err = runner::run_check(&controller, &config).await.unwrap_err();

    assert_matches!(err, MonitorError::DataUnavailable);
    assert!(!controller.is_running().await);
}

#[tokio::test]
async fn check_without_credentials_refuses_to_start() {
    let mock = MockConnector::new();
    let config = config(closed_port(), ConnectionCredentials::default());
    let controller = runner::build_with_connector(&config, Arc::new(mock.clone()));

    let err = runner::run_check(&controller, &config).await.unwrap_err();

    assert_matches!(err, MonitorError::Configuration(_));
    assert!(mock.commands().is_empty());
}

// ---------------------------------------------------------------------------
// Test: monitor
// ---------------------------------------------------------------------------

#[tokio::test]
async fn monitor_runs_until_shutdown_resolves() {
    let url = serve_sgv(HIGH_READING).await;
    let mock = MockConnector::new();
    let config = config(url, credentials());
    let controller = runner::build_with_connector(&config, Arc::new(mock.clone()));
    let mut rx = controller.bus().subscribe();

    runner::run_monitor(&controller, &config, tokio::time::sleep(Duration::from_millis(500)))
        .await
        .expect("monitor");

    assert_eq!(controller.state().await, MonitorState::Stopped);
    assert_eq!(mock.connect_count(), 1, "first iteration actuates once");

    let events = drain(&mut rx);
    assert_eq!(events.first(), Some(&MonitorEvent::MonitoringStarted { interval_secs: 100 }));
    assert_eq!(events.last(), Some(&MonitorEvent::status("Monitoring Stopped")));
}

// ---------------------------------------------------------------------------
// Test: connection test
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_command_reports_bulb_only_when_source_is_down() {
    let mock = MockConnector::new();
    let config = config(closed_port(), credentials());
    let controller = runner::build_with_connector(&config, Arc::new(mock.clone()));

    let report = runner::run_test(&controller, &config).await;

    assert_eq!(report.result, CompositeResult::ActuatorOnly);
    assert!(!report.result.is_success());
    assert!(!report.monitoring_paused);
}

// ---------------------------------------------------------------------------
// Test: event logger
// ---------------------------------------------------------------------------

#[tokio::test]
async fn event_logger_drains_then_exits_on_cancel() {
    let config = config(closed_port(), credentials());
    let controller = runner::build(&config);
    let rx = controller.bus().subscribe();
    let cancel = CancellationToken::new();

    controller.bus().publish(MonitorEvent::info("queued before cancel"));
    cancel.cancel();

    tokio::time::timeout(Duration::from_secs(1), runner::log_events(rx, cancel))
        .await
        .expect("logger exits after cancel");
}
