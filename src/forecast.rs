//! Chart series assembled from prediction horizons.
//!
//! Two kinds of series live here: direct lookups that order the named
//! horizons an endpoint returns, and the synthetic 48-hour waterlogging
//! curve built from three scalars.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{HistoryPoint, NpkLevels, NpkPrediction, PhHistoryPoint};
use crate::thresholds::bands;

/// Moisture horizons in display order.
pub const MOISTURE_HORIZONS: [&str; 5] = ["1h", "6h", "24h", "3d", "7d"];

/// pH horizons and their offset in days.
pub const PH_HORIZONS: [(&str, i64); 3] = [("7d", 7), ("30d", 30), ("90d", 90)];

/// Length of the synthetic waterlogging forecast (hours).
const WATERLOGGING_HORIZON_HOURS: u32 = 48;

/// Spacing between waterlogging samples (hours).
const WATERLOGGING_STEP_HOURS: u32 = 4;

/// Hour at which forecast rainfall starts.
const RAIN_ONSET_HOUR: u32 = 46;

/// Hours over which rainfall ramps to full intensity.
const RAIN_RAMP_HOURS: f64 = 2.0;

/// WFPS gained per millimetre of rain (percentage points).
const WFPS_PER_MM: f64 = 2.0;

/// A labelled point on a categorical axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub label: String,
    pub value: f64,
}

/// Build the moisture forecast: "Now" followed by each horizon.
///
/// "Now" reuses the 1h value. Horizons missing from the response are
/// skipped rather than plotted as zero.
pub fn moisture_forecast(predictions: &BTreeMap<String, f64>) -> Vec<SeriesPoint> {
    let mut series = Vec::with_capacity(MOISTURE_HORIZONS.len() + 1);

    if let Some(first) = predictions.get("1h") {
        series.push(SeriesPoint {
            label: "Now".to_string(),
            value: *first,
        });
    }

    for horizon in MOISTURE_HORIZONS {
        if let Some(value) = predictions.get(horizon) {
            series.push(SeriesPoint {
                label: horizon.to_string(),
                value: *value,
            });
        }
    }

    series
}

/// Whether a pH timeline point was observed or projected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointKind {
    Observed,
    Prediction,
}

/// A point on the pH timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhTimelinePoint {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "pH")]
    pub ph: f64,
    pub kind: PointKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
}

/// Project pH horizons onto absolute dates counted from `today`.
pub fn ph_projection(
    predictions: &BTreeMap<String, f64>,
    today: DateTime<Utc>,
) -> Vec<PhTimelinePoint> {
    PH_HORIZONS
        .iter()
        .filter_map(|(horizon, days)| {
            predictions.get(*horizon).map(|ph| PhTimelinePoint {
                timestamp: today + Duration::days(*days),
                ph: *ph,
                kind: PointKind::Prediction,
                event_type: None,
            })
        })
        .collect()
}

/// Observed pH history followed by the projected horizons.
pub fn ph_timeline(
    history: &[PhHistoryPoint],
    predictions: &BTreeMap<String, f64>,
    today: DateTime<Utc>,
) -> Vec<PhTimelinePoint> {
    let mut timeline: Vec<PhTimelinePoint> = history
        .iter()
        .map(|point| PhTimelinePoint {
            timestamp: point.timestamp,
            ph: point.ph,
            kind: PointKind::Observed,
            event_type: point.event_type.clone(),
        })
        .collect();
    timeline.extend(ph_projection(predictions, today));
    timeline
}

/// A point on the NPK forecast or history chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpkChartPoint {
    pub label: String,
    #[serde(flatten)]
    pub levels: NpkLevels,
}

/// Current, day 7 and day 14 levels.
pub fn npk_forecast(prediction: &NpkPrediction) -> Vec<NpkChartPoint> {
    [
        ("Current", prediction.current),
        ("Day 7", prediction.seven_days),
        ("Day 14", prediction.fourteen_days),
    ]
    .into_iter()
    .map(|(label, levels)| NpkChartPoint {
        label: label.to_string(),
        levels,
    })
    .collect()
}

/// A combined NPK history sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpkHistoryRow {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub levels: NpkLevels,
}

/// Zip three nutrient series index by index, truncated to the shortest.
///
/// Timestamps come from the nitrogen series.
pub fn merge_npk_history(
    nitrogen: &[HistoryPoint],
    phosphorus: &[HistoryPoint],
    potassium: &[HistoryPoint],
) -> Vec<NpkHistoryRow> {
    nitrogen
        .iter()
        .zip(phosphorus)
        .zip(potassium)
        .map(|((n, p), k)| NpkHistoryRow {
            timestamp: n.timestamp,
            levels: NpkLevels {
                n: n.value,
                p: p.value,
                k: k.value,
            },
        })
        .collect()
}

/// One sample of the 48-hour waterlogging forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterloggingSample {
    pub hour: u32,
    /// Axis label such as `"48h"`.
    pub label: String,
    /// Water-filled pore space (%), one decimal.
    pub wfps: f64,
    /// Rainfall (mm), one decimal.
    pub rainfall: f64,
    /// WFPS exceeds the critical line.
    pub critical: bool,
}

/// Synthesize the 48-hour WFPS and rainfall forecast.
///
/// Thirteen samples at 4-hour steps from hour 0 to 48. Before hour 46 WFPS
/// stays at `current_wfps` with no rain; from hour 46 the rain ramps with
/// `intensity = (hour - 46) / 2` and every millimetre adds two points of
/// WFPS. This is a display ramp, not a soil-physics model.
pub fn waterlogging_forecast(
    current_wfps: f64,
    rainfall_forecast_mm: f64,
) -> Vec<WaterloggingSample> {
    (0..=WATERLOGGING_HORIZON_HOURS)
        .step_by(WATERLOGGING_STEP_HOURS as usize)
        .map(|hour| {
            let (wfps, rainfall) = if hour >= RAIN_ONSET_HOUR {
                let intensity = f64::from(hour - RAIN_ONSET_HOUR) / RAIN_RAMP_HOURS;
                let rainfall = rainfall_forecast_mm * intensity;
                (current_wfps + rainfall * WFPS_PER_MM, rainfall)
            } else {
                (current_wfps, 0.0)
            };
            let wfps = round1(wfps);

            WaterloggingSample {
                hour,
                label: format!("{hour}h"),
                wfps,
                rainfall: round1(rainfall),
                critical: wfps > bands::WFPS_CRITICAL,
            }
        })
        .collect()
}

/// Round to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn moisture_predictions() -> BTreeMap<String, f64> {
        [("7d", 28.4), ("1h", 44.1), ("3d", 32.4), ("24h", 37.8), ("6h", 42.3)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn test_moisture_forecast_order() {
        let series = moisture_forecast(&moisture_predictions());
        let labels: Vec<&str> = series.iter().map(|p| p.label.as_str()).collect();

        assert_eq!(labels, ["Now", "1h", "6h", "24h", "3d", "7d"]);
        assert_eq!(series[0].value, series[1].value);
        assert_eq!(series[5].value, 28.4);
    }

    #[test]
    fn test_moisture_forecast_skips_missing_horizons() {
        let mut predictions = moisture_predictions();
        predictions.remove("1h");
        predictions.remove("3d");

        let series = moisture_forecast(&predictions);
        let labels: Vec<&str> = series.iter().map(|p| p.label.as_str()).collect();

        assert_eq!(labels, ["6h", "24h", "7d"]);
    }

    #[test]
    fn test_ph_projection_dates() {
        let today = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        let predictions: BTreeMap<String, f64> =
            [("7d", 6.75), ("30d", 6.5), ("90d", 6.2)]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect();

        let points = ph_projection(&predictions, today);

        assert_eq!(points.len(), 3);
        assert_eq!(points[0].timestamp, today + Duration::seconds(7 * 86_400));
        assert_eq!(points[1].timestamp, today + Duration::seconds(30 * 86_400));
        assert_eq!(points[2].timestamp, today + Duration::seconds(90 * 86_400));
        assert_eq!(points[2].ph, 6.2);
        assert!(points.iter().all(|p| p.kind == PointKind::Prediction));
    }

    #[test]
    fn test_ph_timeline_appends_projection() {
        let today = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let history = vec![
            PhHistoryPoint {
                timestamp: today - Duration::days(12),
                ph: 6.84,
                event_type: Some("fertilization".to_string()),
            },
            PhHistoryPoint {
                timestamp: today,
                ph: 6.8,
                event_type: None,
            },
        ];
        let predictions: BTreeMap<String, f64> = [("30d".to_string(), 6.5)].into_iter().collect();

        let timeline = ph_timeline(&history, &predictions, today);

        assert_eq!(timeline.len(), 3);
        assert_eq!(timeline[0].kind, PointKind::Observed);
        assert_eq!(timeline[0].event_type.as_deref(), Some("fertilization"));
        assert_eq!(timeline[2].kind, PointKind::Prediction);
    }

    #[test]
    fn test_waterlogging_forecast_shape() {
        let samples = waterlogging_forecast(40.0, 25.0);

        assert_eq!(samples.len(), 13);
        assert_eq!(samples[0].hour, 0);
        assert_eq!(samples[12].hour, 48);
        assert_eq!(samples[12].label, "48h");
    }

    #[test]
    fn test_waterlogging_forecast_ramp() {
        let samples = waterlogging_forecast(40.0, 25.0);

        let hour_44 = &samples[11];
        assert_eq!(hour_44.hour, 44);
        assert_eq!(hour_44.rainfall, 0.0);
        assert_eq!(hour_44.wfps, 40.0);

        let hour_48 = &samples[12];
        assert_eq!(hour_48.rainfall, 25.0);
        assert_eq!(hour_48.wfps, 90.0);
        assert!(!hour_48.critical);
    }

    #[test]
    fn test_waterlogging_forecast_rounds_and_flags_critical() {
        let samples = waterlogging_forecast(88.44, 12.33);

        assert_eq!(samples[0].wfps, 88.4);
        assert_eq!(samples[12].rainfall, 12.3);
        assert_eq!(samples[12].wfps, 113.1);
        assert!(samples[12].critical);
        assert!(!samples[0].critical);
    }

    #[test]
    fn test_npk_forecast_and_merge() {
        let prediction = NpkPrediction {
            current: NpkLevels { n: 180.0, p: 45.0, k: 300.0 },
            seven_days: NpkLevels { n: 152.0, p: 32.4, k: 277.6 },
            fourteen_days: NpkLevels { n: 124.0, p: 30.0, k: 255.2 },
            recommendation: Default::default(),
        };
        let chart = npk_forecast(&prediction);
        assert_eq!(chart[1].label, "Day 7");
        assert_eq!(chart[2].levels.n, 124.0);

        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let series = |values: &[f64]| -> Vec<HistoryPoint> {
            values
                .iter()
                .enumerate()
                .map(|(i, v)| HistoryPoint {
                    timestamp: at + Duration::hours(i as i64),
                    value: *v,
                })
                .collect()
        };
        let rows = merge_npk_history(
            &series(&[200.0, 199.8, 199.7]),
            &series(&[50.0, 49.9]),
            &series(&[350.0, 349.9, 349.7]),
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].levels.p, 49.9);
        assert_eq!(rows[1].timestamp, at + Duration::hours(1));
    }
}
