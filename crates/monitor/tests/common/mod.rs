//! Shared fixtures for the monitor integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use diabuddy_bulb::mock::MockConnector;
use diabuddy_bulb::BulbActuator;
use diabuddy_core::{ConnectionCredentials, Reading, TrendDirection};
use diabuddy_events::{EventBus, MonitorEvent, Notification};
use diabuddy_monitor::MonitoringController;
use diabuddy_xdrip::GlucoseSource;
use tokio::sync::broadcast;

/// Source that replays a fixed script of values, then a fallback.
pub struct ScriptedSource {
    script: Mutex<VecDeque<Option<i32>>>,
    fallback: Option<i32>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    /// Replays `script`, then returns nothing.
    pub fn new(script: impl IntoIterator<Item = Option<i32>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            fallback: None,
            calls: AtomicUsize::new(0),
        })
    }

    /// Always returns `value`.
    pub fn constant(value: i32) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Some(value),
            calls: AtomicUsize::new(0),
        })
    }

    /// Never returns a reading.
    pub fn offline() -> Arc<Self> {
        Self::new([])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GlucoseSource for ScriptedSource {
    async fn fetch_latest(&self) -> Option<Reading> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.fallback);
        next.map(reading)
    }
}

/// Source whose every call panics.
pub struct PanickingSource {
    calls: AtomicUsize,
}

impl PanickingSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GlucoseSource for PanickingSource {
    async fn fetch_latest(&self) -> Option<Reading> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        panic!("source exploded");
    }
}

pub fn reading(value: i32) -> Reading {
    Reading::new(value, TrendDirection::Flat, 1_700_000_000_000, "2023-11-14T22:13:20.000Z")
}

pub fn credentials() -> ConnectionCredentials {
    ConnectionCredentials::new("192.168.1.100", "parent@example.com", "hunter2")
}

/// Controller wired to `source` and `mock`, plus a subscription taken
/// before anything is published.
pub fn controller(
    source: Arc<dyn GlucoseSource>,
    mock: &MockConnector,
) -> (MonitoringController, broadcast::Receiver<Notification>) {
    let bus = Arc::new(EventBus::default());
    let rx = bus.subscribe();
    let controller = MonitoringController::new(source, BulbActuator::new(Arc::new(mock.clone())), bus);
    (controller, rx)
}

/// Every event published so far.
pub fn drain(rx: &mut broadcast::Receiver<Notification>) -> Vec<MonitorEvent> {
    let mut events = Vec::new();
    while let Ok(notification) = rx.try_recv() {
        events.push(notification.event);
    }
    events
}

pub fn messages(events: &[MonitorEvent]) -> Vec<&MonitorEvent> {
    events.iter().filter(|e| e.is_message()).collect()
}
