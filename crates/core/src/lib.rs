//! Domain types shared by every Diabuddy crate.
//!
//! - [`Reading`] and [`TrendDirection`]: one glucose sample.
//! - [`AlertBand`], [`ActuationTarget`], [`StatusIndicator`]: severity
//!   classification and the bulb colour each band maps to.
//! - [`ConnectionCredentials`]: bulb account details, redacted in `Debug`.

pub mod alert;
pub mod credentials;
pub mod error;
pub mod reading;

pub use alert::{arrow_glyph, classify, ActuationTarget, AlertBand, StatusIndicator};
pub use credentials::ConnectionCredentials;
pub use error::CoreError;
pub use reading::{Reading, TrendDirection};
