//! State guarded by the controller.

use std::time::Duration;

use diabuddy_core::{ConnectionCredentials, Reading};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Readings within this many mg/dL of the baseline do not move the bulb.
pub const DEBOUNCE_DELTA: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Stopped,
    Running,
}

/// Whether `current` differs enough from the debounce baseline to be sent
/// to the bulb.
pub fn needs_actuation(baseline: Option<&Reading>, current: &Reading) -> bool {
    match baseline {
        None => true,
        Some(last) => current.delta(last) > DEBOUNCE_DELTA,
    }
}

/// Book-keeping for the periodic task while it runs.
pub(crate) struct ActiveRun {
    pub(crate) cancel: CancellationToken,
    pub(crate) task: Option<JoinHandle<()>>,
    pub(crate) credentials: ConnectionCredentials,
    pub(crate) interval: Duration,
}

/// Monitoring state: whether the loop is active, its cancel token, and the
/// debounce baseline.
#[derive(Default)]
pub struct MonitoringSession {
    active: Option<ActiveRun>,
    last_reading: Option<Reading>,
}

impl MonitoringSession {
    pub fn state(&self) -> MonitorState {
        if self.active.is_some() {
            MonitorState::Running
        } else {
            MonitorState::Stopped
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Debounce baseline: the last reading that was sent to the bulb.
    pub fn last_reading(&self) -> Option<&Reading> {
        self.last_reading.as_ref()
    }

    /// Poll interval of the active run.
    pub fn interval(&self) -> Option<Duration> {
        self.active.as_ref().map(|run| run.interval)
    }

    pub(crate) fn credentials(&self) -> Option<&ConnectionCredentials> {
        self.active.as_ref().map(|run| &run.credentials)
    }

    /// Enter the running state with a fresh baseline.
    pub(crate) fn begin(&mut self, run: ActiveRun) {
        self.last_reading = None;
        self.active = Some(run);
    }

    pub(crate) fn attach_task(&mut self, task: JoinHandle<()>) {
        if let Some(run) = self.active.as_mut() {
            run.task = Some(task);
        }
    }

    /// Leave the running state, handing back the run so the caller can
    /// cancel and join it outside the lock.
    pub(crate) fn end(&mut self) -> Option<ActiveRun> {
        self.active.take()
    }

    /// Advance the baseline, unless the run that produced `reading` has
    /// since been cancelled.
    pub(crate) fn record_baseline(&mut self, reading: Reading, run: &CancellationToken) {
        if run.is_cancelled() {
            return;
        }
        self.last_reading = Some(reading);
    }
}
