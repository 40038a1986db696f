//! CSV export of a parameter's history.
//!
//! The file has a two-column header (`Timestamp` and the quoted parameter
//! label with its unit) followed by one row per sample. Timestamps are
//! written as `YYYY-MM-DD HH:MM:SS` in UTC; values keep their plain
//! numeric form.

use crate::model::{HistoryPoint, Parameter};

/// Timestamp layout of the export rows.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render a history series as CSV. Lines are separated by `\n` with no
/// trailing newline.
pub fn history_csv(parameter: Parameter, points: &[HistoryPoint]) -> String {
    let mut lines = Vec::with_capacity(points.len() + 1);
    lines.push(format!(
        "Timestamp,{}",
        quote(&format!("{} ({})", parameter.label(), parameter.unit()))
    ));

    for point in points {
        let timestamp = point.timestamp.format(TIMESTAMP_FORMAT).to_string();
        lines.push(format!(
            "{},{}",
            field(&timestamp),
            field(&point.value.to_string())
        ));
    }

    lines.join("\n")
}

/// Download name for an export, e.g. `pH_history_30days.csv`.
pub fn export_filename(parameter: Parameter, days: u32) -> String {
    format!("{}_history_{}days.csv", parameter.key(), days)
}

/// Quote a field only when it would otherwise break the row.
fn field(value: &str) -> String {
    if value.contains([',', '"', '\r', '\n']) {
        quote(value)
    } else {
        value.to_string()
    }
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn ph_points() -> Vec<HistoryPoint> {
        [(1, 6.8), (2, 6.75), (3, 6.7)]
            .into_iter()
            .map(|(day, value)| HistoryPoint {
                timestamp: Utc.with_ymd_and_hms(2025, 3, day, 8, 30, 5).unwrap(),
                value,
            })
            .collect()
    }

    #[test]
    fn test_ph_export_has_header_and_three_rows() {
        let csv = history_csv(Parameter::Ph, &ph_points());
        let lines: Vec<&str> = csv.split('\n').collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "Timestamp,\"pH Level (pH)\"");
        assert_eq!(lines[1], "2025-03-01 08:30:05,6.8");
        assert_eq!(lines[2], "2025-03-02 08:30:05,6.75");
        assert_eq!(lines[3], "2025-03-03 08:30:05,6.7");
        assert!(!csv.ends_with('\n'));
    }

    #[test]
    fn test_empty_series_is_header_only() {
        let csv = history_csv(Parameter::SoilTemp, &[]);
        assert_eq!(csv, "Timestamp,\"Soil Temperature (°C)\"");
    }

    #[test]
    fn test_value_keeps_plain_numeric_form() {
        let points = vec![HistoryPoint {
            timestamp: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            value: 210.0,
        }];

        let csv = history_csv(Parameter::Nitrogen, &points);

        assert!(csv.ends_with("2025-01-01 00:00:00,210"));
    }

    #[test]
    fn test_field_quoting() {
        assert_eq!(field("plain"), "plain");
        assert_eq!(field("a,b"), "\"a,b\"");
        assert_eq!(field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_export_filename() {
        assert_eq!(export_filename(Parameter::Ph, 30), "pH_history_30days.csv");
        assert_eq!(
            export_filename(Parameter::SoilMoisture, 7),
            "soil_moisture_history_7days.csv"
        );
    }
}
