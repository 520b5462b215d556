//! Connect-then-colour wrapper over a [`BulbConnector`].

use std::sync::Arc;

use diabuddy_core::{ActuationTarget, ConnectionCredentials};

use crate::device::{BulbConnector, BulbDevice, DeviceError};

/// Which sub-step of a colour change failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuationStep {
    PowerOn,
    SetHueSaturation,
}

impl std::fmt::Display for ActuationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActuationStep::PowerOn => f.write_str("power-on"),
            ActuationStep::SetHueSaturation => f.write_str("set hue/saturation"),
        }
    }
}

/// Errors from the actuator layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BulbError {
    /// Opening or refreshing the device failed. No session exists.
    #[error("Bulb connection failed: {0}")]
    Connection(DeviceError),

    /// A command on an open session failed. Not retried.
    #[error("Bulb {step} failed: {source}")]
    Actuation {
        step: ActuationStep,
        source: DeviceError,
    },
}

/// An established, reusable connection to one bulb.
///
/// Only [`BulbActuator::connect`] can produce one, so a failed connect
/// never leaves a half-open session behind.
pub struct BulbSession {
    device: Box<dyn BulbDevice>,
    endpoint: String,
}

impl BulbSession {
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn power_on(&mut self) -> Result<(), BulbError> {
        self.device
            .turn_on()
            .await
            .map_err(|source| BulbError::Actuation {
                step: ActuationStep::PowerOn,
                source,
            })
    }

    /// Apply hue/saturation without touching power state.
    pub async fn apply(&mut self, target: ActuationTarget) -> Result<(), BulbError> {
        self.device
            .set_hue_saturation(target.hue_degrees, target.saturation_percent)
            .await
            .map_err(|source| BulbError::Actuation {
                step: ActuationStep::SetHueSaturation,
                source,
            })
    }
}

impl std::fmt::Debug for BulbSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BulbSession")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

/// Drives a bulb through a pluggable [`BulbConnector`].
#[derive(Clone)]
pub struct BulbActuator {
    connector: Arc<dyn BulbConnector>,
}

impl BulbActuator {
    pub fn new(connector: Arc<dyn BulbConnector>) -> Self {
        Self { connector }
    }

    /// Open a session and refresh device state.
    pub async fn connect(
        &self,
        credentials: &ConnectionCredentials,
    ) -> Result<BulbSession, BulbError> {
        let endpoint = credentials.endpoint_address().to_string();

        let mut device = self
            .connector
            .connect(credentials)
            .await
            .map_err(BulbError::Connection)?;
        device.refresh().await.map_err(BulbError::Connection)?;

        tracing::debug!(endpoint = %endpoint, "Bulb session established");
        Ok(BulbSession { device, endpoint })
    }

    /// Power the bulb on, then apply `target`.
    ///
    /// The first failing sub-step is returned; nothing is retried here.
    pub async fn set_color(
        &self,
        session: &mut BulbSession,
        target: ActuationTarget,
    ) -> Result<(), BulbError> {
        session.power_on().await?;
        session.apply(target).await?;

        tracing::info!(
            endpoint = %session.endpoint,
            hue = target.hue_degrees,
            saturation = target.saturation_percent,
            "Bulb colour set",
        );
        Ok(())
    }
}
