//! Wiring and the three agent commands.
//!
//! [`build`] assembles the controller from an [`AgentConfig`];
//! [`log_events`] renders bus notifications as log lines; the `run_*`
//! functions implement `monitor`, `check` and `test`.

use std::future::Future;
use std::sync::Arc;

use diabuddy_bulb::{BulbActuator, BulbConnector, DryRunConnector};
use diabuddy_events::{EventBus, MessageLevel, MonitorEvent, Notification};
use diabuddy_monitor::{
    CheckOutcome, ConnectionTestReport, ConnectionTester, MonitorError, MonitoringController,
};
use diabuddy_xdrip::XDripClient;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::config::AgentConfig;

/// Build a controller using the configured xDrip+ candidates and
/// `connector` for the bulb.
pub fn build_with_connector(
    config: &AgentConfig,
    connector: Arc<dyn BulbConnector>,
) -> MonitoringController {
    let source =
        XDripClient::with_base_urls(config.xdrip_urls.clone()).with_timeout(config.xdrip_timeout);
    let bus = Arc::new(EventBus::default());
    MonitoringController::new(Arc::new(source), BulbActuator::new(connector), bus)
}

/// Build a controller with the dry-run bulb connector.
pub fn build(config: &AgentConfig) -> MonitoringController {
    build_with_connector(config, Arc::new(DryRunConnector::new()))
}

/// Log every notification until `cancel` fires or the bus closes.
///
/// On cancellation, notifications already queued are still logged.
pub async fn log_events(mut rx: broadcast::Receiver<Notification>, cancel: CancellationToken) {
    loop {
        tokio::select! {
            biased;
            received = rx.recv() => match received {
                Ok(notification) => log_notification(&notification),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event logger lagged behind");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            _ = cancel.cancelled() => {
                while let Ok(notification) = rx.try_recv() {
                    log_notification(&notification);
                }
                break;
            }
        }
    }
}

fn log_notification(notification: &Notification) {
    match &notification.event {
        MonitorEvent::Message {
            level: MessageLevel::Error,
            text,
        } => tracing::warn!(message = %text, "Alert"),
        MonitorEvent::Message {
            level: MessageLevel::Info,
            text,
        } => tracing::info!(message = %text, "Info"),
        MonitorEvent::Status { text } => tracing::info!(status = %text, "Status"),
        _ => match serde_json::to_string(notification) {
            Ok(json) => tracing::debug!(event = %json, "Notification"),
            Err(e) => tracing::warn!(error = %e, "Unserializable notification"),
        },
    }
}

/// Start monitoring and keep it running until `shutdown` resolves.
pub async fn run_monitor(
    controller: &MonitoringController,
    config: &AgentConfig,
    shutdown: impl Future<Output = ()>,
) -> Result<(), MonitorError> {
    controller
        .start(config.credentials.clone(), config.check_interval)
        .await?;

    shutdown.await;
    tracing::info!("Shutdown requested");
    controller.stop().await;
    Ok(())
}

/// Start monitoring, run one manual check, stop.
pub async fn run_check(
    controller: &MonitoringController,
    config: &AgentConfig,
) -> Result<CheckOutcome, MonitorError> {
    controller
        .start(config.credentials.clone(), config.check_interval)
        .await?;
    let outcome = controller.check_now().await;
    controller.stop().await;
    outcome
}

/// Run the connection test once.
pub async fn run_test(
    controller: &MonitoringController,
    config: &AgentConfig,
) -> ConnectionTestReport {
    ConnectionTester::new(controller.clone())
        .run(&config.credentials)
        .await
}
