//! Status classification and gauge positions for soil readings.
//!
//! Every breakpoint the dashboard uses is declared once in [`bands`]. The
//! classifiers below are pure lookups: deterministic, no side effects.

use serde::{Deserialize, Serialize};

use crate::model::RiskLevel;

/// Fixed display breakpoints shared by every classifier call site.
pub mod bands {
    /// Moisture below this is critically dry (%).
    pub const MOISTURE_CRITICAL_LOW: f64 = 30.0;
    /// Lower edge of the optimal moisture band (%), inclusive.
    pub const MOISTURE_OPTIMAL_MIN: f64 = 40.0;
    /// Upper edge of the optimal moisture band (%), inclusive.
    pub const MOISTURE_OPTIMAL_MAX: f64 = 60.0;
    /// Moisture above this is critically wet (%).
    pub const MOISTURE_CRITICAL_HIGH: f64 = 80.0;
    /// Crop stress line drawn on the moisture forecast (%).
    pub const MOISTURE_STRESS: f64 = 30.0;

    /// Below this pH the soil is strongly acidic.
    pub const PH_STRONGLY_ACIDIC: f64 = 5.5;
    /// Lower edge of the optimal pH band, inclusive.
    pub const PH_OPTIMAL_MIN: f64 = 6.0;
    /// Upper edge of the optimal pH band, inclusive.
    pub const PH_OPTIMAL_MAX: f64 = 7.0;
    /// Above this pH the soil is alkaline.
    pub const PH_ALKALINE: f64 = 7.5;
    /// Left end of the overview pH slider.
    pub const PH_SLIDER_MIN: f64 = 4.0;
    /// Right end of the overview pH slider.
    pub const PH_SLIDER_MAX: f64 = 10.0;

    /// WFPS at which waterlogging becomes critical (%).
    pub const WFPS_CRITICAL: f64 = 90.0;

    /// Minimum adequate nitrogen (mg/kg).
    pub const NITROGEN_ADEQUATE: f64 = 150.0;
    /// Minimum adequate phosphorus (mg/kg).
    pub const PHOSPHORUS_ADEQUATE: f64 = 30.0;
    /// Minimum adequate potassium (mg/kg).
    pub const POTASSIUM_ADEQUATE: f64 = 200.0;

    /// Availability drop (percentage points) above which the impact is critical.
    pub const AVAILABILITY_CRITICAL_DROP: i64 = 30;
    /// Availability drop (percentage points) above which the impact is moderate.
    pub const AVAILABILITY_MODERATE_DROP: i64 = 10;
}

/// Display tier attached to every classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Within the optimal band.
    Success,
    /// Outside the optimal band but not yet harmful.
    Warning,
    /// Drifting toward a harmful range.
    Caution,
    /// Harmful range.
    Danger,
}

impl Tier {
    /// Display color for this tier.
    pub fn color(&self) -> &'static str {
        match self {
            Tier::Success => "green",
            Tier::Warning => "yellow",
            Tier::Caution => "orange",
            Tier::Danger => "red",
        }
    }

    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Tier::Success => "Success",
            Tier::Warning => "Warning",
            Tier::Caution => "Caution",
            Tier::Danger => "Danger",
        }
    }
}

/// Soil moisture band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoistureBand {
    CriticalLow,
    Low,
    Optimal,
    High,
    CriticalHigh,
}

impl MoistureBand {
    /// Classify a moisture percentage.
    ///
    /// # Thresholds
    ///
    /// - `critical_low`: v < 30
    /// - `low`: 30 <= v < 40
    /// - `optimal`: 40 <= v <= 60
    /// - `high`: 60 < v <= 80
    /// - `critical_high`: v > 80
    pub fn classify(value: f64) -> Self {
        if value < bands::MOISTURE_CRITICAL_LOW {
            MoistureBand::CriticalLow
        } else if value < bands::MOISTURE_OPTIMAL_MIN {
            MoistureBand::Low
        } else if value <= bands::MOISTURE_OPTIMAL_MAX {
            MoistureBand::Optimal
        } else if value <= bands::MOISTURE_CRITICAL_HIGH {
            MoistureBand::High
        } else {
            MoistureBand::CriticalHigh
        }
    }

    pub fn tier(&self) -> Tier {
        match self {
            MoistureBand::Optimal => Tier::Success,
            MoistureBand::Low | MoistureBand::High => Tier::Warning,
            MoistureBand::CriticalLow | MoistureBand::CriticalHigh => Tier::Danger,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MoistureBand::CriticalLow => "critical-low",
            MoistureBand::Low => "low",
            MoistureBand::Optimal => "optimal",
            MoistureBand::High => "high",
            MoistureBand::CriticalHigh => "critical-high",
        }
    }
}

/// Soil pH band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhBand {
    StronglyAcidic,
    Acidic,
    Optimal,
    SlightlyAlkaline,
    Alkaline,
}

impl PhBand {
    /// Classify a pH reading.
    ///
    /// `< 5.5` red, `< 6.0` orange, `6.0..=7.0` green, `<= 7.5` yellow,
    /// anything above orange.
    pub fn classify(ph: f64) -> Self {
        if ph < bands::PH_STRONGLY_ACIDIC {
            PhBand::StronglyAcidic
        } else if ph < bands::PH_OPTIMAL_MIN {
            PhBand::Acidic
        } else if ph <= bands::PH_OPTIMAL_MAX {
            PhBand::Optimal
        } else if ph <= bands::PH_ALKALINE {
            PhBand::SlightlyAlkaline
        } else {
            PhBand::Alkaline
        }
    }

    pub fn tier(&self) -> Tier {
        match self {
            PhBand::StronglyAcidic => Tier::Danger,
            PhBand::Acidic | PhBand::Alkaline => Tier::Caution,
            PhBand::Optimal => Tier::Success,
            PhBand::SlightlyAlkaline => Tier::Warning,
        }
    }

    pub fn is_optimal(&self) -> bool {
        matches!(self, PhBand::Optimal)
    }
}

impl RiskLevel {
    /// Display tier for an API-provided risk level.
    pub fn tier(&self) -> Tier {
        match self {
            RiskLevel::High => Tier::Danger,
            RiskLevel::Medium => Tier::Warning,
            RiskLevel::Low => Tier::Success,
        }
    }
}

/// Macronutrients tracked by the NPK card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Nutrient {
    Nitrogen,
    Phosphorus,
    Potassium,
}

impl Nutrient {
    pub const ALL: [Nutrient; 3] = [Nutrient::Nitrogen, Nutrient::Phosphorus, Nutrient::Potassium];

    /// Minimum adequate level in mg/kg.
    pub fn adequate_level(&self) -> f64 {
        match self {
            Nutrient::Nitrogen => bands::NITROGEN_ADEQUATE,
            Nutrient::Phosphorus => bands::PHOSPHORUS_ADEQUATE,
            Nutrient::Potassium => bands::POTASSIUM_ADEQUATE,
        }
    }

    pub fn is_adequate(&self, level: f64) -> bool {
        level >= self.adequate_level()
    }

    pub fn label(&self) -> &'static str {
        match self {
            Nutrient::Nitrogen => "Nitrogen (N)",
            Nutrient::Phosphorus => "Phosphorus (P)",
            Nutrient::Potassium => "Potassium (K)",
        }
    }
}

/// Impact of a projected availability drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityImpact {
    Minimal,
    Moderate,
    Critical,
}

impl AvailabilityImpact {
    /// Classify a drop in percentage points: `> 30` critical, `> 10` moderate.
    pub fn from_drop(drop: i64) -> Self {
        if drop > bands::AVAILABILITY_CRITICAL_DROP {
            AvailabilityImpact::Critical
        } else if drop > bands::AVAILABILITY_MODERATE_DROP {
            AvailabilityImpact::Moderate
        } else {
            AvailabilityImpact::Minimal
        }
    }

    pub fn tier(&self) -> Tier {
        match self {
            AvailabilityImpact::Minimal => Tier::Success,
            AvailabilityImpact::Moderate => Tier::Warning,
            AvailabilityImpact::Critical => Tier::Danger,
        }
    }
}

/// Parse the leading integer of a share like `"95%"`.
///
/// Mirrors the lenient parsing the dashboard has always used: leading
/// whitespace and an optional sign are accepted, anything after the digits
/// is ignored, and a string without digits yields `None`.
pub fn parse_share(share: &str) -> Option<i64> {
    let trimmed = share.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    let value: i64 = digits.parse().ok()?;
    Some(if negative { -value } else { value })
}

/// Direction of a reported trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Falling,
    Rising,
    Steady,
}

impl TrendDirection {
    /// Read a free-form trend string such as `"slowly_decreasing"`.
    pub fn from_trend(trend: &str) -> Self {
        if trend.contains("decreasing") {
            TrendDirection::Falling
        } else if trend.contains("increasing") {
            TrendDirection::Rising
        } else {
            TrendDirection::Steady
        }
    }
}

/// Project `value` onto a 0-100 % position within `[min, max]`.
///
/// With `inverted` the position grows as the value falls toward `min`.
/// A zero-width or non-finite domain yields `0.0`. The result is always
/// clamped to `[0, 100]`.
pub fn linear_position(value: f64, min: f64, max: f64, inverted: bool) -> f64 {
    let span = max - min;
    if !span.is_finite() || span == 0.0 || !value.is_finite() {
        return 0.0;
    }
    let raw = if inverted {
        (max - value) / span * 100.0
    } else {
        (value - min) / span * 100.0
    };
    raw.clamp(0.0, 100.0)
}

/// Progress of acidification from pH 7.0 (0 %) toward the critical pH 6.0 (100 %).
pub fn acidification_progress(ph: f64) -> f64 {
    linear_position(ph, bands::PH_OPTIMAL_MIN, bands::PH_OPTIMAL_MAX, true)
}

/// Marker position of a pH reading on the 4-10 overview slider.
pub fn ph_slider_position(ph: f64) -> f64 {
    linear_position(ph, bands::PH_SLIDER_MIN, bands::PH_SLIDER_MAX, false)
}

/// Fill level for a moisture percentage gauge.
pub fn moisture_gauge(moisture: f64) -> f64 {
    linear_position(moisture, 0.0, 100.0, false)
}
