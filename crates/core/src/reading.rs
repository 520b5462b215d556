//! Glucose readings as reported by the local xDrip+ endpoint.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

// ---------------------------------------------------------------------------
// TrendDirection
// ---------------------------------------------------------------------------

/// Direction of change reported alongside a reading.
///
/// Values outside the known vocabulary are kept verbatim in
/// [`TrendDirection::Unknown`] rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TrendDirection {
    DoubleUp,
    SingleUp,
    FortyFiveUp,
    Flat,
    FortyFiveDown,
    SingleDown,
    DoubleDown,
    /// The literal `NONE` sent when the sensor has no slope.
    NoSlope,
    NotComputable,
    RateOutOfRange,
    Unknown(String),
}

impl TrendDirection {
    /// Wire spelling of the direction.
    pub fn as_str(&self) -> &str {
        match self {
            Self::DoubleUp => "DoubleUp",
            Self::SingleUp => "SingleUp",
            Self::FortyFiveUp => "FortyFiveUp",
            Self::Flat => "Flat",
            Self::FortyFiveDown => "FortyFiveDown",
            Self::SingleDown => "SingleDown",
            Self::DoubleDown => "DoubleDown",
            Self::NoSlope => "NONE",
            Self::NotComputable => "NOT COMPUTABLE",
            Self::RateOutOfRange => "RATE OUT OF RANGE",
            Self::Unknown(raw) => raw,
        }
    }
}

impl From<&str> for TrendDirection {
    fn from(raw: &str) -> Self {
        match raw {
            "DoubleUp" => Self::DoubleUp,
            "SingleUp" => Self::SingleUp,
            "FortyFiveUp" => Self::FortyFiveUp,
            "Flat" => Self::Flat,
            "FortyFiveDown" => Self::FortyFiveDown,
            "SingleDown" => Self::SingleDown,
            "DoubleDown" => Self::DoubleDown,
            "NONE" => Self::NoSlope,
            "NOT COMPUTABLE" => Self::NotComputable,
            "RATE OUT OF RANGE" => Self::RateOutOfRange,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TrendDirection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// One glucose sample. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reading {
    value: i32,
    trend: TrendDirection,
    /// Milliseconds since the Unix epoch.
    timestamp_epoch: i64,
    timestamp_text: String,
}

impl Reading {
    pub fn new(
        value: i32,
        trend: TrendDirection,
        timestamp_epoch: i64,
        timestamp_text: impl Into<String>,
    ) -> Self {
        Self {
            value,
            trend,
            timestamp_epoch,
            timestamp_text: timestamp_text.into(),
        }
    }

    /// Glucose value in mg/dL.
    pub fn value(&self) -> i32 {
        self.value
    }

    pub fn trend(&self) -> &TrendDirection {
        &self.trend
    }

    pub fn timestamp_epoch(&self) -> i64 {
        self.timestamp_epoch
    }

    /// Timestamp exactly as the source formatted it.
    pub fn timestamp_text(&self) -> &str {
        &self.timestamp_text
    }

    /// Sample time as a UTC instant, or `None` if the epoch value is out
    /// of chrono's representable range.
    pub fn recorded_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp_epoch)
    }

    /// Absolute difference in mg/dL between two readings.
    pub fn delta(&self, other: &Reading) -> u32 {
        self.value.abs_diff(other.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_directions_parse_to_variants() {
        assert_eq!(TrendDirection::from("DoubleUp"), TrendDirection::DoubleUp);
        assert_eq!(TrendDirection::from("NONE"), TrendDirection::NoSlope);
        assert_eq!(
            TrendDirection::from("RATE OUT OF RANGE"),
            TrendDirection::RateOutOfRange
        );
    }

    #[test]
    fn unknown_direction_keeps_raw_text() {
        let trend = TrendDirection::from("Sideways");
        assert_eq!(trend, TrendDirection::Unknown("Sideways".into()));
        assert_eq!(trend.as_str(), "Sideways");
    }

    #[test]
    fn reading_serializes_trend_as_wire_string() {
        let reading = Reading::new(
            120,
            TrendDirection::FortyFiveDown,
            1_700_000_000_000,
            "2023-11-14T22:13:20.000Z",
        );
        let json = serde_json::to_value(&reading).unwrap();
        assert_eq!(json["value"], 120);
        assert_eq!(json["trend"], "FortyFiveDown");
        assert_eq!(json["timestamp_epoch"], 1_700_000_000_000i64);
    }

    #[test]
    fn recorded_at_converts_epoch_millis() {
        let reading = Reading::new(90, TrendDirection::Flat, 1_700_000_000_000, "");
        let at = reading.recorded_at().unwrap();
        assert_eq!(at.timestamp(), 1_700_000_000);
    }

    #[test]
    fn delta_is_symmetric() {
        let a = Reading::new(100, TrendDirection::Flat, 0, "");
        let b = Reading::new(103, TrendDirection::Flat, 0, "");
        assert_eq!(a.delta(&b), 3);
        assert_eq!(b.delta(&a), 3);
    }

    #[test]
    fn delta_spans_the_full_value_range() {
        let low = Reading::new(i32::MIN, TrendDirection::Flat, 0, "");
        let high = Reading::new(i32::MAX, TrendDirection::Flat, 0, "");
        assert_eq!(low.delta(&high), u32::MAX);
    }
}
