//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is shared via `Arc<EventBus>` between the controller, the
//! connection tester and whatever renders their output.

use chrono::{DateTime, Utc};
use diabuddy_core::{arrow_glyph, AlertBand, Reading, StatusIndicator};
use serde::Serialize;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// Payload types
// ---------------------------------------------------------------------------

/// Severity of a one-shot message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Info,
    Error,
}

/// Connection state of the bulb as last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BulbStatus {
    Connected,
    ConnectionFailed,
}

/// Display-ready summary of a classified reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadingStatus {
    pub value: i32,
    pub glyph: &'static str,
    pub band: AlertBand,
    pub timestamp_text: String,
}

impl ReadingStatus {
    pub fn new(reading: &Reading, band: AlertBand) -> Self {
        Self {
            value: reading.value(),
            glyph: arrow_glyph(reading.trend()),
            band,
            timestamp_text: reading.timestamp_text().to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// MonitorEvent
// ---------------------------------------------------------------------------

/// Something the presentation layer may want to show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MonitorEvent {
    MonitoringStarted { interval_secs: u64 },
    MonitoringStopped,
    /// Replaces the one-line status text.
    Status { text: String },
    /// Latest poll result; `None` means the poll produced no data.
    Reading { reading: Option<ReadingStatus> },
    /// Coarse severity used to pick an icon.
    Indicator { indicator: StatusIndicator },
    Bulb { status: BulbStatus },
    /// One-shot dialog-style message.
    Message { level: MessageLevel, text: String },
}

impl MonitorEvent {
    pub fn status(text: impl Into<String>) -> Self {
        Self::Status { text: text.into() }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::Message {
            level: MessageLevel::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::Message {
            level: MessageLevel::Error,
            text: text.into(),
        }
    }

    pub fn indicator(indicator: impl Into<StatusIndicator>) -> Self {
        Self::Indicator {
            indicator: indicator.into(),
        }
    }

    /// Whether this is a one-shot message (as opposed to a state update).
    pub fn is_message(&self) -> bool {
        matches!(self, Self::Message { .. })
    }
}

/// A [`MonitorEvent`] stamped with the time it was published.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    #[serde(flatten)]
    pub event: MonitorEvent,
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out event bus.
///
/// # Usage
///
/// ```rust
/// use diabuddy_events::{EventBus, MonitorEvent};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(MonitorEvent::status("Ready"));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<Notification>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest unread notifications are dropped
    /// and slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: MonitorEvent) {
        // A SendError only means there are no receivers right now.
        let _ = self.sender.send(Notification {
            event,
            timestamp: Utc::now(),
        });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
