//! One-shot connection diagnostic.
//!
//! Pauses monitoring if it is running, fetches one reading, then connects
//! to the bulb and cycles it through every band colour so someone in the
//! room can confirm each one. The outcome of both checks is published as
//! a single message.

use std::time::Duration;

use diabuddy_bulb::{BulbError, DeviceError};
use diabuddy_core::{classify, AlertBand, ConnectionCredentials, Reading, StatusIndicator};
use diabuddy_events::{BulbStatus, MonitorEvent};
use serde::Serialize;

use crate::controller::MonitoringController;

/// Pause after stopping the loop so its in-flight iteration can settle.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(1);

/// How long each demo colour is held.
pub const DEFAULT_DWELL: Duration = Duration::from_millis(1500);

/// Suffix appended to the status text when monitoring was paused.
const RESTART_HINT: &str = " - Restart";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TesterConfig {
    pub settle_delay: Duration,
    pub dwell: Duration,
}

impl Default for TesterConfig {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
            dwell: DEFAULT_DWELL,
        }
    }
}

/// Combined outcome of the source and bulb checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositeResult {
    BothOk,
    SourceOnly,
    ActuatorOnly,
    BothFailed,
}

impl CompositeResult {
    pub fn from_checks(source_ok: bool, actuator_ok: bool) -> Self {
        match (source_ok, actuator_ok) {
            (true, true) => Self::BothOk,
            (true, false) => Self::SourceOnly,
            (false, true) => Self::ActuatorOnly,
            (false, false) => Self::BothFailed,
        }
    }

    pub fn is_success(self) -> bool {
        self == Self::BothOk
    }

    /// Short status-line text.
    pub fn label(self) -> &'static str {
        match self {
            Self::BothOk => "Connections working",
            Self::SourceOnly => "Glucose source only",
            Self::ActuatorOnly => "Bulb only",
            Self::BothFailed => "Connection failed",
        }
    }

    /// Body of the single result message.
    pub fn message(self) -> &'static str {
        match self {
            Self::BothOk => "Connections working! xDrip+ and the bulb are both reachable.",
            Self::SourceOnly => "Partial connection: xDrip+ is working but the bulb failed to connect.",
            Self::ActuatorOnly => "Partial connection: the bulb is connected but xDrip+ failed.",
            Self::BothFailed => "Connection failed: neither xDrip+ nor the bulb could be reached.",
        }
    }
}

/// Everything the caller needs to render the test result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTestReport {
    pub result: CompositeResult,
    /// Reading fetched during the test, if any.
    pub reading: Option<Reading>,
    /// Monitoring was running and has been stopped. It is not restarted.
    pub monitoring_paused: bool,
}

pub struct ConnectionTester {
    controller: MonitoringController,
    config: TesterConfig,
}

impl ConnectionTester {
    pub fn new(controller: MonitoringController) -> Self {
        Self::with_config(controller, TesterConfig::default())
    }

    pub fn with_config(controller: MonitoringController, config: TesterConfig) -> Self {
        Self { controller, config }
    }

    /// Run the diagnostic once.
    ///
    /// Sub-check failures never escape; they are folded into the report
    /// and a single message on the bus.
    pub async fn run(&self, credentials: &ConnectionCredentials) -> ConnectionTestReport {
        let inner = self.controller.inner();
        let bus = &inner.bus;

        let monitoring_paused = self.controller.is_running().await;
        if monitoring_paused {
            self.controller.stop().await;
            tokio::time::sleep(self.config.settle_delay).await;
        }

        bus.publish(MonitorEvent::status("Testing connections..."));

        let reading = inner.source.fetch_latest().await;
        match &reading {
            Some(r) => inner.show_reading(r, classify(r.value()), false),
            None => tracing::warn!("Connection test: no glucose reading"),
        }

        let actuator_ok = match self.exercise_bulb(credentials, reading.as_ref()).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Connection test: bulb check failed");
                false
            }
        };

        let result = CompositeResult::from_checks(reading.is_some(), actuator_ok);
        tracing::info!(?result, monitoring_paused, "Connection test finished");

        if result.is_success() {
            bus.publish(MonitorEvent::info(result.message()));
        } else {
            bus.publish(MonitorEvent::error(result.message()));
        }
        if result == CompositeResult::BothFailed {
            bus.publish(MonitorEvent::indicator(StatusIndicator::Ready));
        }

        let mut status = result.label().to_string();
        if monitoring_paused {
            status.push_str(RESTART_HINT);
        }
        bus.publish(MonitorEvent::status(status));

        ConnectionTestReport {
            result,
            reading,
            monitoring_paused,
        }
    }

    /// Connect, cycle every band colour, then settle on the colour for
    /// `reading` (or normal when there is none).
    async fn exercise_bulb(
        &self,
        credentials: &ConnectionCredentials,
        reading: Option<&Reading>,
    ) -> Result<(), BulbError> {
        let inner = self.controller.inner();
        let bus = &inner.bus;

        if let Err(e) = credentials.validate() {
            bus.publish(MonitorEvent::Bulb {
                status: BulbStatus::ConnectionFailed,
            });
            return Err(BulbError::Connection(DeviceError::Rejected(e.to_string())));
        }

        let mut session = match inner.actuator.connect(credentials).await {
            Ok(session) => {
                bus.publish(MonitorEvent::Bulb {
                    status: BulbStatus::Connected,
                });
                session
            }
            Err(e) => {
                bus.publish(MonitorEvent::Bulb {
                    status: BulbStatus::ConnectionFailed,
                });
                return Err(e);
            }
        };

        let demo = async {
            session.power_on().await?;

            for band in AlertBand::ALL {
                session.apply(band.target()).await?;
                bus.publish(MonitorEvent::indicator(band));
                tokio::time::sleep(self.config.dwell).await;
            }

            let restore = reading.map_or(AlertBand::Normal, |r| classify(r.value()));
            session.apply(restore.target()).await?;
            bus.publish(MonitorEvent::indicator(restore));
            Ok::<(), BulbError>(())
        };

        let outcome = demo.await;
        if outcome.is_err() {
            bus.publish(MonitorEvent::indicator(StatusIndicator::Ready));
        }
        outcome
    }
}
