//! Smart-bulb actuation.
//!
//! The vendor protocol is hidden behind two capability traits:
//! [`BulbConnector`] opens a device handle from credentials and
//! [`BulbDevice`] issues individual commands. [`BulbActuator`] builds on
//! them to provide the two operations the monitor needs: connect once,
//! then set a colour (power-on followed by hue/saturation).

pub mod actuator;
pub mod device;
pub mod dry_run;
#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use actuator::{ActuationStep, BulbActuator, BulbError, BulbSession};
pub use device::{BulbConnector, BulbDevice, DeviceError};
pub use dry_run::DryRunConnector;
