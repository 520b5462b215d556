//! Wire types for the xDrip+ `/sgv.json` endpoint.
//!
//! The endpoint returns a JSON array ordered most-recent-first. Only the
//! fields the monitor uses are modelled; everything else is ignored.

use diabuddy_core::{Reading, TrendDirection};
use serde::Deserialize;

/// Direction reported when the entry carries none.
pub const MISSING_DIRECTION: &str = "Unknown";

/// One entry of the `/sgv.json` array.
#[derive(Debug, Clone, Deserialize)]
pub struct SgvEntry {
    /// Sensor glucose value in mg/dL.
    pub sgv: i32,
    /// Sample time, milliseconds since the Unix epoch.
    pub date: i64,
    #[serde(rename = "dateString")]
    pub date_string: String,
    #[serde(default)]
    pub direction: Option<String>,
}

impl From<SgvEntry> for Reading {
    fn from(entry: SgvEntry) -> Self {
        let trend = TrendDirection::from(entry.direction.as_deref().unwrap_or(MISSING_DIRECTION));
        Reading::new(entry.sgv, trend, entry.date, entry.date_string)
    }
}
