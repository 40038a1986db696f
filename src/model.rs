//! Data models for the soil monitoring API.
//!
//! Every record here is a plain value decoded from the upstream JSON exactly
//! as the soil API sends it. Nothing is cached or mutated locally: each
//! page cycle fetches fresh copies and derives its display data from them.
//!
//! Field names follow the upstream wire format, so a few of them keep their
//! wire spelling through `#[serde(rename)]` (`pH`, `7_days`, `type`).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Risk or severity level reported by the API.
///
/// The status endpoint spells these in lowercase (`"high"`) while the
/// waterlogging endpoint uses uppercase (`"HIGH"`); both are accepted.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum RiskLevel {
    #[default]
    #[serde(rename = "LOW", alias = "low", alias = "Low")]
    Low,
    #[serde(rename = "MEDIUM", alias = "medium", alias = "Medium")]
    Medium,
    #[serde(rename = "HIGH", alias = "high", alias = "High")]
    High,
}

impl RiskLevel {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

/// Per-nutrient adequacy as judged by the API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NutrientStatus {
    Adequate,
    #[default]
    Low,
}

/// NPK adequacy block of the status snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NpkStatus {
    #[serde(default)]
    pub nitrogen: NutrientStatus,
    #[serde(default)]
    pub phosphorus: NutrientStatus,
    #[serde(default)]
    pub potassium: NutrientStatus,
}

/// Current sensor snapshot returned by `GET /status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorStatus {
    /// Nitrogen (mg/kg).
    pub nitrogen: f64,
    /// Phosphorus (mg/kg).
    pub phosphorus: f64,
    /// Potassium (mg/kg).
    pub potassium: f64,
    /// Volumetric soil moisture (%).
    pub soil_moisture: f64,
    /// Soil pH on the 0-14 scale.
    #[serde(rename = "pH")]
    pub ph: f64,
    /// Electrical conductivity (dS/m).
    #[serde(default)]
    pub ec: f64,
    #[serde(default)]
    pub soil_temp: f64,
    #[serde(default)]
    pub air_temp: f64,
    #[serde(default)]
    pub humidity: f64,
    #[serde(default)]
    pub npk_status: NpkStatus,
    #[serde(default)]
    pub waterlogging_risk: RiskLevel,
    /// Water-filled pore space (%).
    #[serde(default)]
    pub wfps: f64,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

/// An active alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    /// Alert category such as `waterlogging_risk` or `npk_level`.
    #[serde(default, rename = "type")]
    pub kind: String,
    pub severity: RiskLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Envelope of `GET /alerts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertsResponse {
    #[serde(default)]
    pub alerts: Vec<Alert>,
}

// ============================================================================
// Irrigation
// ============================================================================

/// Moisture status block of the irrigation prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoistureStatus {
    pub soil_moisture: f64,
    /// Status string computed upstream ("optimal", "low", "high").
    #[serde(default)]
    pub status: String,
    /// Display range, e.g. "40-60%".
    #[serde(default)]
    pub range: String,
}

/// Irrigation recommendation with volume and cost figures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IrrigationRecommendation {
    /// "irrigate" or "monitor".
    pub action: String,
    #[serde(default)]
    pub timing: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub water_volume_per_m2: f64,
    #[serde(default)]
    pub water_volume_hectare: f64,
    #[serde(default)]
    pub optimal_time: String,
    #[serde(default)]
    pub cost_traditional: f64,
    #[serde(default)]
    pub cost_optimized: f64,
    #[serde(default)]
    pub savings: f64,
}

impl IrrigationRecommendation {
    /// Whether the API asks for irrigation now.
    pub fn needs_irrigation(&self) -> bool {
        self.action == "irrigate"
    }
}

/// Cross-subsystem check between irrigation and waterlogging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IrrigationCoordination {
    #[serde(default)]
    pub waterlogging_safe: bool,
    #[serde(default)]
    pub message: String,
}

/// Response of `GET /irrigation-predictions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrrigationPrediction {
    pub current_status: MoistureStatus,
    /// Moisture forecast keyed by horizon label ("1h", "6h", "24h", "3d", "7d").
    pub predictions: BTreeMap<String, f64>,
    #[serde(default)]
    pub trend: String,
    #[serde(default)]
    pub confidence: String,
    pub recommendation: IrrigationRecommendation,
    #[serde(default)]
    pub coordination: IrrigationCoordination,
}

/// A logged irrigation event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrrigationEvent {
    pub id: String,
    pub date: DateTime<Utc>,
    pub volume_liters: f64,
    #[serde(default)]
    pub moisture_before: f64,
    #[serde(default)]
    pub moisture_after: f64,
    #[serde(default)]
    pub cost: f64,
}

/// Envelope of `GET /irrigation-history`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrrigationHistoryResponse {
    #[serde(default)]
    pub events: Vec<IrrigationEvent>,
}

/// Request body for `POST /irrigation/log`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrrigationLogRequest {
    /// Volume applied, in liters. Defaults to a standard 35 000 L pass.
    #[serde(default = "default_volume_liters")]
    pub volume_liters: f64,
}

fn default_volume_liters() -> f64 {
    35_000.0
}

impl Default for IrrigationLogRequest {
    fn default() -> Self {
        Self {
            volume_liters: default_volume_liters(),
        }
    }
}

/// Acknowledgement returned by `POST /irrigation/log`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrrigationLogAck {
    pub status: String,
    pub event: IrrigationEvent,
}

// ============================================================================
// NPK
// ============================================================================

/// N/P/K levels in mg/kg.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NpkLevels {
    #[serde(rename = "N")]
    pub n: f64,
    #[serde(rename = "P")]
    pub p: f64,
    #[serde(rename = "K")]
    pub k: f64,
}

/// Fertilization recommendation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FertilizationRecommendation {
    /// "fertilize" or "monitor".
    pub action: String,
    #[serde(default)]
    pub timing: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub fertilizer_type: String,
    #[serde(default)]
    pub amount_kg: f64,
    #[serde(default)]
    pub cost_savings: f64,
}

/// Response of `GET /npk-predictions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpkPrediction {
    pub current: NpkLevels,
    #[serde(rename = "7_days")]
    pub seven_days: NpkLevels,
    #[serde(rename = "14_days")]
    pub fourteen_days: NpkLevels,
    pub recommendation: FertilizationRecommendation,
}

/// A past fertilization event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FertilizationEvent {
    pub id: String,
    pub date: DateTime<Utc>,
    /// Product, e.g. "NPK 20-10-10".
    #[serde(default, rename = "type")]
    pub fertilizer_type: String,
    #[serde(default)]
    pub amount_kg: f64,
    #[serde(default)]
    pub cost: f64,
}

/// Envelope of `GET /fertilization-history`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FertilizationHistoryResponse {
    #[serde(default)]
    pub events: Vec<FertilizationEvent>,
}

// ============================================================================
// pH
// ============================================================================

/// Current pH block of the pH prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhStatus {
    #[serde(rename = "pH")]
    pub ph: f64,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub range: String,
    #[serde(default)]
    pub trend: String,
    #[serde(default)]
    pub buffer_capacity: String,
}

/// Drift analysis of the pH trend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriftAnalysis {
    /// Drift rate, negative when acidifying.
    #[serde(default)]
    pub rate: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub cause: String,
    #[serde(default)]
    pub time_to_critical: String,
}

/// Availability shares per nutrient, as percentage strings ("95%").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutrientShares {
    #[serde(default)]
    pub nitrogen: String,
    #[serde(default)]
    pub phosphorus: String,
    #[serde(default)]
    pub potassium: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Nutrient availability now versus at pH 5.5.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutrientAvailability {
    #[serde(rename = "current_pH_6_8")]
    pub current: NutrientShares,
    #[serde(rename = "if_pH_drops_to_5_5")]
    pub projected: NutrientShares,
}

/// One structured pH recommendation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhAction {
    pub action: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_kg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Short, medium and long term pH recommendations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhRecommendations {
    #[serde(default)]
    pub short_term: PhAction,
    #[serde(default)]
    pub medium_term: PhAction,
    #[serde(default)]
    pub long_term: PhAction,
}

/// Cross-subsystem alert strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhCoordination {
    #[serde(default)]
    pub alert_to_npk: String,
    #[serde(default)]
    pub alert_to_irrigation: String,
    #[serde(default)]
    pub fertilizer_recommendation: String,
}

/// Response of `GET /ph-predictions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhPrediction {
    pub current_status: PhStatus,
    /// Projected pH keyed by horizon ("7d", "30d", "90d").
    pub predictions: BTreeMap<String, f64>,
    #[serde(default)]
    pub drift_analysis: DriftAnalysis,
    #[serde(default)]
    pub nutrient_availability: NutrientAvailability,
    #[serde(default)]
    pub recommendations: PhRecommendations,
    #[serde(default)]
    pub coordination: PhCoordination,
}

/// A pH observation, optionally marking a field event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhHistoryPoint {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "pH")]
    pub ph: f64,
    /// "fertilization", "lime_application" or absent.
    #[serde(default)]
    pub event_type: Option<String>,
}

/// Envelope of `GET /ph-history`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhHistoryResponse {
    #[serde(default)]
    pub history: Vec<PhHistoryPoint>,
}

// ============================================================================
// Waterlogging and history
// ============================================================================

/// Response of `GET /waterlogging-risk`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterloggingRisk {
    pub current_wfps: f64,
    #[serde(default)]
    pub current_moisture: f64,
    pub peak_wfps_predicted: f64,
    pub rainfall_forecast_mm: f64,
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub time_to_event_hours: f64,
    #[serde(default)]
    pub duration_hours: f64,
    #[serde(default)]
    pub cause: String,
    /// Ordered action plan.
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default)]
    pub potential_loss: f64,
}

/// A single time-series sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Envelope of `GET /history`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub parameter: Option<String>,
    #[serde(default)]
    pub days: Option<u32>,
    #[serde(default)]
    pub data: Vec<HistoryPoint>,
}

/// Sensor parameters that have a history series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Parameter {
    #[serde(rename = "nitrogen")]
    Nitrogen,
    #[serde(rename = "phosphorus")]
    Phosphorus,
    #[serde(rename = "potassium")]
    Potassium,
    #[serde(rename = "soil_moisture")]
    SoilMoisture,
    #[serde(rename = "pH")]
    Ph,
    #[serde(rename = "soil_temp")]
    SoilTemp,
    #[serde(rename = "air_temp")]
    AirTemp,
    #[serde(rename = "humidity")]
    Humidity,
}

impl Parameter {
    /// Every parameter, in display order.
    pub const ALL: [Parameter; 8] = [
        Parameter::Nitrogen,
        Parameter::Phosphorus,
        Parameter::Potassium,
        Parameter::SoilMoisture,
        Parameter::Ph,
        Parameter::SoilTemp,
        Parameter::AirTemp,
        Parameter::Humidity,
    ];

    /// Parse a parameter from its wire key.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.key() == key)
    }

    /// Wire key used in `?parameter=` and in export filenames.
    pub fn key(&self) -> &'static str {
        match self {
            Parameter::Nitrogen => "nitrogen",
            Parameter::Phosphorus => "phosphorus",
            Parameter::Potassium => "potassium",
            Parameter::SoilMoisture => "soil_moisture",
            Parameter::Ph => "pH",
            Parameter::SoilTemp => "soil_temp",
            Parameter::AirTemp => "air_temp",
            Parameter::Humidity => "humidity",
        }
    }

    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Parameter::Nitrogen => "Nitrogen (N)",
            Parameter::Phosphorus => "Phosphorus (P)",
            Parameter::Potassium => "Potassium (K)",
            Parameter::SoilMoisture => "Soil Moisture",
            Parameter::Ph => "pH Level",
            Parameter::SoilTemp => "Soil Temperature",
            Parameter::AirTemp => "Air Temperature",
            Parameter::Humidity => "Humidity",
        }
    }

    /// Display unit.
    pub fn unit(&self) -> &'static str {
        match self {
            Parameter::Nitrogen | Parameter::Phosphorus | Parameter::Potassium => "mg/kg",
            Parameter::SoilMoisture | Parameter::Humidity => "%",
            Parameter::Ph => "pH",
            Parameter::SoilTemp | Parameter::AirTemp => "°C",
        }
    }
}
