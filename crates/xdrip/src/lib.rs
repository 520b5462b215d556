//! Glucose reading source backed by the xDrip+ local web service.
//!
//! [`XDripClient`] polls an ordered list of candidate base URLs for the
//! most recent sample and returns the first one that parses. Callers see
//! only `Some(reading)` or `None`; per-candidate failures are logged and
//! skipped.

pub mod api;
pub mod messages;
pub mod source;

pub use api::XDripClient;
pub use source::GlucoseSource;
