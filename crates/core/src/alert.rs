//! Glucose severity bands and the bulb colour assigned to each.
//!
//! Thresholds (mg/dL): below 50 is [`AlertBand::Critical`], 50..70 is
//! [`AlertBand::Low`], 70..=180 is [`AlertBand::Normal`], above 180 is
//! [`AlertBand::High`].

use serde::Serialize;

use crate::reading::TrendDirection;

/// Lowest value that is no longer critical.
pub const CRITICAL_BELOW: i32 = 50;

/// Lowest value that is no longer low.
pub const LOW_BELOW: i32 = 70;

/// Highest value still considered normal.
pub const NORMAL_UP_TO: i32 = 180;

/// Glyph shown for any direction without a dedicated arrow.
pub const UNKNOWN_GLYPH: &str = "?";

// ---------------------------------------------------------------------------
// ActuationTarget
// ---------------------------------------------------------------------------

/// Hue/saturation pair sent to the bulb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ActuationTarget {
    /// Hue in degrees, `0..360`.
    pub hue_degrees: u16,
    /// Saturation in percent, `0..=100`.
    pub saturation_percent: u8,
}

impl ActuationTarget {
    const fn fixed(hue_degrees: u16, saturation_percent: u8) -> Self {
        Self {
            hue_degrees,
            saturation_percent,
        }
    }
}

// ---------------------------------------------------------------------------
// AlertBand
// ---------------------------------------------------------------------------

/// Severity classification of a glucose value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertBand {
    Critical,
    Low,
    Normal,
    High,
}

impl AlertBand {
    /// Every band in ascending glucose order.
    pub const ALL: [AlertBand; 4] = [
        AlertBand::Critical,
        AlertBand::Low,
        AlertBand::Normal,
        AlertBand::High,
    ];

    /// Bulb colour for this band.
    pub const fn target(self) -> ActuationTarget {
        match self {
            AlertBand::Critical => ActuationTarget::fixed(0, 100),
            AlertBand::Low => ActuationTarget::fixed(60, 100),
            AlertBand::Normal => ActuationTarget::fixed(120, 100),
            AlertBand::High => ActuationTarget::fixed(270, 100),
        }
    }

    /// Human-readable label used in status text and alerts.
    pub fn label(self) -> &'static str {
        match self {
            AlertBand::Critical => "CRITICAL LOW",
            AlertBand::Low => "LOW",
            AlertBand::Normal => "NORMAL",
            AlertBand::High => "HIGH",
        }
    }

    /// Whether a reading in this band should raise an alert.
    pub fn is_alerting(self) -> bool {
        self != AlertBand::Normal
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AlertBand::Critical => "critical",
            AlertBand::Low => "low",
            AlertBand::Normal => "normal",
            AlertBand::High => "high",
        }
    }
}

impl std::fmt::Display for AlertBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a glucose value (mg/dL) to its severity band.
pub fn classify(value: i32) -> AlertBand {
    if value < CRITICAL_BELOW {
        AlertBand::Critical
    } else if value < LOW_BELOW {
        AlertBand::Low
    } else if value <= NORMAL_UP_TO {
        AlertBand::Normal
    } else {
        AlertBand::High
    }
}

/// Arrow glyph for a trend direction. Unmapped directions get
/// [`UNKNOWN_GLYPH`].
pub fn arrow_glyph(trend: &TrendDirection) -> &'static str {
    match trend {
        TrendDirection::DoubleUp => "↑↑",
        TrendDirection::SingleUp => "↑",
        TrendDirection::FortyFiveUp => "↗",
        TrendDirection::Flat => "→",
        TrendDirection::FortyFiveDown => "↘",
        TrendDirection::SingleDown => "↓",
        TrendDirection::DoubleDown => "↓↓",
        TrendDirection::NoSlope => "→",
        TrendDirection::NotComputable
        | TrendDirection::RateOutOfRange
        | TrendDirection::Unknown(_) => UNKNOWN_GLYPH,
    }
}

// ---------------------------------------------------------------------------
// StatusIndicator
// ---------------------------------------------------------------------------

/// Coarse severity signal used by presentation layers to pick an icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusIndicator {
    /// No classified reading is being shown.
    Ready,
    Band(AlertBand),
}

impl StatusIndicator {
    /// Icon key: `ready` or the band name.
    pub fn icon_key(self) -> &'static str {
        match self {
            StatusIndicator::Ready => "ready",
            StatusIndicator::Band(band) => band.as_str(),
        }
    }
}

impl From<AlertBand> for StatusIndicator {
    fn from(band: AlertBand) -> Self {
        StatusIndicator::Band(band)
    }
}
