/// Errors surfaced by the controller's public operations.
///
/// Bulb failures inside the periodic loop are not here: they are reported
/// as notifications and never stop monitoring.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MonitorError {
    /// Start was refused because settings are incomplete or invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Monitoring is already running")]
    AlreadyRunning,

    /// A manual check was requested while monitoring is stopped.
    #[error("Monitoring is not running")]
    NotMonitoring,

    /// No candidate endpoint produced a reading.
    #[error("No glucose data available")]
    DataUnavailable,
}
