use async_trait::async_trait;
use diabuddy_core::ConnectionCredentials;

/// Failure reported by a bulb driver.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    /// The device or vendor service could not be reached.
    #[error("Device unreachable: {0}")]
    Unreachable(String),

    /// The device answered but refused the request (bad credentials,
    /// unsupported command, ...).
    #[error("Device rejected request: {0}")]
    Rejected(String),
}

/// Opens a device handle for a set of credentials.
#[async_trait]
pub trait BulbConnector: Send + Sync {
    async fn connect(
        &self,
        credentials: &ConnectionCredentials,
    ) -> Result<Box<dyn BulbDevice>, DeviceError>;
}

/// An open handle to one bulb. Every command may fail independently.
#[async_trait]
pub trait BulbDevice: Send {
    /// Pull the current device state (required before the first command
    /// by most vendor protocols).
    async fn refresh(&mut self) -> Result<(), DeviceError>;

    async fn turn_on(&mut self) -> Result<(), DeviceError>;

    /// `hue` in degrees `0..360`, `saturation` in percent `0..=100`.
    async fn set_hue_saturation(&mut self, hue: u16, saturation: u8) -> Result<(), DeviceError>;
}
