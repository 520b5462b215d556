//! Start/stop state machine and the periodic monitoring task.
//!
//! While running, one background task repeats: fetch the latest reading,
//! classify it, publish the status, and, when the value moved by more
//! than [`DEBOUNCE_DELTA`](crate::session::DEBOUNCE_DELTA), connect to the
//! bulb and set the band colour. Each iteration runs in its own task so a
//! panic inside it is logged and the loop carries on after the normal
//! sleep. [`MonitoringController::stop`] cancels both the sleep and any
//! in-flight network call.

use std::sync::Arc;
use std::time::Duration;

use diabuddy_bulb::{BulbActuator, BulbError};
use diabuddy_core::{classify, AlertBand, ConnectionCredentials, Reading};
use diabuddy_events::{BulbStatus, EventBus, MonitorEvent, ReadingStatus};
use diabuddy_xdrip::GlucoseSource;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::error::MonitorError;
use crate::session::{needs_actuation, ActiveRun, MonitorState, MonitoringSession};

/// How long `stop` waits for the loop task to exit after cancelling it.
const STOP_JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// What a single loop iteration did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationOutcome {
    /// No candidate endpoint produced a reading.
    NoData,
    /// Reading shown; change too small to touch the bulb.
    Debounced(AlertBand),
    Actuated(AlertBand),
    /// Bulb call failed. The baseline still advanced.
    ActuationFailed(AlertBand),
    /// Stop was requested before the bulb call.
    Cancelled,
}

/// What happened to the bulb during a manual check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulbOutcome {
    Updated,
    NotConnected,
    UpdateFailed,
}

/// Result of [`MonitoringController::check_now`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub reading: Reading,
    pub band: AlertBand,
    pub bulb: BulbOutcome,
}

pub(crate) struct Inner {
    pub(crate) source: Arc<dyn GlucoseSource>,
    pub(crate) actuator: BulbActuator,
    pub(crate) bus: Arc<EventBus>,
    session: Mutex<MonitoringSession>,
}

/// Owns the monitoring session and its periodic task.
///
/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct MonitoringController {
    inner: Arc<Inner>,
}

impl MonitoringController {
    pub fn new(
        source: Arc<dyn GlucoseSource>,
        actuator: BulbActuator,
        bus: Arc<EventBus>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                actuator,
                bus,
                session: Mutex::new(MonitoringSession::default()),
            }),
        }
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.inner.bus
    }

    pub(crate) fn inner(&self) -> &Arc<Inner> {
        &self.inner
    }

    pub async fn state(&self) -> MonitorState {
        self.inner.session.lock().await.state()
    }

    pub async fn is_running(&self) -> bool {
        self.state().await == MonitorState::Running
    }

    /// Current debounce baseline.
    pub async fn last_reading(&self) -> Option<Reading> {
        self.inner.session.lock().await.last_reading().cloned()
    }

    /// Stopped → Running.
    ///
    /// Refused with [`MonitorError::AlreadyRunning`] while running, and
    /// with [`MonitorError::Configuration`] (state unchanged) when any
    /// credential field is blank or `interval` is zero.
    pub async fn start(
        &self,
        credentials: ConnectionCredentials,
        interval: Duration,
    ) -> Result<(), MonitorError> {
        let mut session = self.inner.session.lock().await;
        if session.is_active() {
            return Err(MonitorError::AlreadyRunning);
        }

        if let Err(e) = credentials.validate() {
            tracing::warn!(error = %e, "Refusing to start monitoring");
            self.inner
                .bus
                .publish(MonitorEvent::error("Configure bulb settings first"));
            return Err(MonitorError::Configuration(e.to_string()));
        }
        if interval.is_zero() {
            return Err(MonitorError::Configuration(
                "check interval must be at least one second".into(),
            ));
        }

        let cancel = CancellationToken::new();
        session.begin(ActiveRun {
            cancel: cancel.clone(),
            task: None,
            credentials: credentials.clone(),
            interval,
        });

        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            run_loop(inner, credentials, interval, cancel).await;
        });
        session.attach_task(task);
        drop(session);

        let interval_secs = interval.as_secs();
        tracing::info!(interval_secs, "Monitoring started");
        self.inner
            .bus
            .publish(MonitorEvent::MonitoringStarted { interval_secs });
        self.inner.bus.publish(MonitorEvent::status("Monitoring Active"));
        self.inner.bus.publish(MonitorEvent::info(format!(
            "Monitoring started - checking every {interval_secs}s"
        )));

        Ok(())
    }

    /// Running → Stopped. A no-op when already stopped.
    ///
    /// Cancels the periodic task without waiting for its sleep to expire.
    pub async fn stop(&self) {
        let run = self.inner.session.lock().await.end();
        let Some(run) = run else {
            return;
        };

        run.cancel.cancel();
        if let Some(task) = run.task {
            if tokio::time::timeout(STOP_JOIN_TIMEOUT, task).await.is_err() {
                tracing::warn!("Monitoring task did not exit in time");
            }
        }

        tracing::info!("Monitoring stopped");
        self.inner.bus.publish(MonitorEvent::MonitoringStopped);
        self.inner.bus.publish(MonitorEvent::status("Monitoring Stopped"));
    }

    /// Fetch and display a reading immediately and push its colour to
    /// the bulb. Only allowed while running; does not move the loop's
    /// debounce baseline.
    pub async fn check_now(&self) -> Result<CheckOutcome, MonitorError> {
        let credentials = self.inner.session.lock().await.credentials().cloned();
        let Some(credentials) = credentials else {
            self.inner
                .bus
                .publish(MonitorEvent::error("Please start monitoring first"));
            return Err(MonitorError::NotMonitoring);
        };

        self.inner.bus.publish(MonitorEvent::status("Checking..."));

        let Some(reading) = self.inner.source.fetch_latest().await else {
            self.inner.bus.publish(MonitorEvent::status("Check Failed"));
            self.inner
                .bus
                .publish(MonitorEvent::error("Could not get glucose reading"));
            return Err(MonitorError::DataUnavailable);
        };

        let band = classify(reading.value());
        self.inner.show_reading(&reading, band, true);

        let value = reading.value();
        let (bulb, message) = match self.inner.actuate(&credentials, band).await {
            Ok(()) => (BulbOutcome::Updated, format!("Check complete: {value}")),
            Err(BulbError::Connection(_)) => (
                BulbOutcome::NotConnected,
                format!("Glucose: {value} (Bulb not connected)"),
            ),
            Err(BulbError::Actuation { .. }) => (
                BulbOutcome::UpdateFailed,
                format!("Glucose: {value} (Bulb update failed)"),
            ),
        };
        self.inner.bus.publish(MonitorEvent::info(message));

        Ok(CheckOutcome {
            reading,
            band,
            bulb,
        })
    }
}

impl Inner {
    /// Publish the status updates for a classified reading. With
    /// `raise_alert`, non-normal bands also get a one-shot alert.
    pub(crate) fn show_reading(&self, reading: &Reading, band: AlertBand, raise_alert: bool) {
        self.bus.publish(MonitorEvent::Reading {
            reading: Some(ReadingStatus::new(reading, band)),
        });
        self.bus.publish(MonitorEvent::status(band.label()));
        self.bus.publish(MonitorEvent::indicator(band));

        if raise_alert && band.is_alerting() {
            self.bus.publish(MonitorEvent::error(format!(
                "Glucose Alert: {} ({})",
                reading.value(),
                band.label()
            )));
        }
    }

    /// Connect and set the colour for `band`, publishing the bulb status.
    pub(crate) async fn actuate(
        &self,
        credentials: &ConnectionCredentials,
        band: AlertBand,
    ) -> Result<(), BulbError> {
        let mut session = match self.actuator.connect(credentials).await {
            Ok(session) => {
                self.bus.publish(MonitorEvent::Bulb {
                    status: BulbStatus::Connected,
                });
                session
            }
            Err(e) => {
                tracing::warn!(error = %e, "Bulb connection failed");
                self.bus.publish(MonitorEvent::Bulb {
                    status: BulbStatus::ConnectionFailed,
                });
                return Err(e);
            }
        };

        self.actuator
            .set_color(&mut session, band.target())
            .await
            .inspect_err(|e| tracing::warn!(error = %e, band = %band, "Bulb colour change failed"))
    }

    /// One pass of the periodic task.
    async fn poll_once(
        self: Arc<Self>,
        credentials: ConnectionCredentials,
        cancel: CancellationToken,
    ) -> IterationOutcome {
        let Some(reading) = self.source.fetch_latest().await else {
            tracing::debug!("No glucose data this cycle");
            self.bus.publish(MonitorEvent::Reading { reading: None });
            return IterationOutcome::NoData;
        };

        let band = classify(reading.value());
        tracing::info!(value = reading.value(), band = %band, trend = %reading.trend(), "Glucose reading");
        self.show_reading(&reading, band, true);

        let baseline = self.session.lock().await.last_reading().cloned();
        if !needs_actuation(baseline.as_ref(), &reading) {
            return IterationOutcome::Debounced(band);
        }

        if cancel.is_cancelled() {
            return IterationOutcome::Cancelled;
        }

        let result = self.actuate(&credentials, band).await;

        // The baseline moves even when the bulb call failed.
        self.session.lock().await.record_baseline(reading, &cancel);

        match result {
            Ok(()) => IterationOutcome::Actuated(band),
            Err(_) => IterationOutcome::ActuationFailed(band),
        }
    }
}

/// Body of the periodic task. Exits only when `cancel` fires.
async fn run_loop(
    inner: Arc<Inner>,
    credentials: ConnectionCredentials,
    interval: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(interval_secs = interval.as_secs(), "Monitoring loop started");

    loop {
        if cancel.is_cancelled() {
            break;
        }

        let iteration = tokio::spawn(Arc::clone(&inner).poll_once(credentials.clone(), cancel.clone()));
        let abort = iteration.abort_handle();

        tokio::select! {
            _ = cancel.cancelled() => {
                abort.abort();
                break;
            }
            joined = iteration => match joined {
                Ok(outcome) => tracing::debug!(?outcome, "Monitoring iteration finished"),
                Err(e) => tracing::error!(error = %e, "Monitoring iteration failed"),
            },
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    tracing::info!("Monitoring loop exited");
}
