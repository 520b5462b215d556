//! Connector that logs commands instead of talking to hardware.
//!
//! Used by the agent when no vendor driver is compiled in, and handy for
//! checking the monitor's behaviour on a desk without a bulb.

use async_trait::async_trait;
use diabuddy_core::ConnectionCredentials;

use crate::device::{BulbConnector, BulbDevice, DeviceError};

#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunConnector;

impl DryRunConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BulbConnector for DryRunConnector {
    async fn connect(
        &self,
        credentials: &ConnectionCredentials,
    ) -> Result<Box<dyn BulbDevice>, DeviceError> {
        tracing::info!(endpoint = %credentials.endpoint_address(), "[dry-run] connect");
        Ok(Box::new(DryRunBulb {
            endpoint: credentials.endpoint_address().to_string(),
        }))
    }
}

struct DryRunBulb {
    endpoint: String,
}

#[async_trait]
impl BulbDevice for DryRunBulb {
    async fn refresh(&mut self) -> Result<(), DeviceError> {
        tracing::debug!(endpoint = %self.endpoint, "[dry-run] refresh");
        Ok(())
    }

    async fn turn_on(&mut self) -> Result<(), DeviceError> {
        tracing::info!(endpoint = %self.endpoint, "[dry-run] turn on");
        Ok(())
    }

    async fn set_hue_saturation(&mut self, hue: u16, saturation: u8) -> Result<(), DeviceError> {
        tracing::info!(endpoint = %self.endpoint, hue, saturation, "[dry-run] set hue/saturation");
        Ok(())
    }
}
