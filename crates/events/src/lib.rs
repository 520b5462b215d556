//! Notifications emitted by the monitor.
//!
//! Presentation layers (the agent's log sink, a GUI, a tray icon) subscribe
//! to the [`EventBus`] and render [`MonitorEvent`]s however they like. The
//! events are data only; nothing in the monitor waits on a subscriber.

pub mod bus;

pub use bus::{BulbStatus, EventBus, MessageLevel, MonitorEvent, Notification, ReadingStatus};
