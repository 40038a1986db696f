//! Page view models assembled from the soil API.
//!
//! Each dashboard page fetches a fixed batch of independent resources
//! concurrently and turns them into a view model that carries both the raw
//! records and the derived display data (bands, tiers, gauge positions,
//! chart series).
//!
//! Resources are merged independently: a failed request leaves that
//! resource's previously displayed value in place, marked stale, while the
//! rest of the page updates. Failures are collected per cycle so the caller
//! can raise a single notice for the whole batch.
//!
//! # Usage
//!
//! ```ignore
//! let pages = Pages::new(SoilApiClient::new("http://localhost:8000/api"));
//! let cycle = pages.dashboard(None).await;
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::client::SoilApiClient;
use crate::error::ClientError;
use crate::forecast::{
    NpkChartPoint, NpkHistoryRow, PhTimelinePoint, SeriesPoint, WaterloggingSample,
    merge_npk_history, moisture_forecast, npk_forecast, ph_timeline, round2,
    waterlogging_forecast,
};
use crate::model::{
    Alert, DriftAnalysis, FertilizationEvent, HistoryPoint, IrrigationCoordination,
    IrrigationEvent, IrrigationPrediction, IrrigationRecommendation, MoistureStatus,
    NpkPrediction, NutrientStatus, Parameter, PhCoordination, PhHistoryPoint, PhPrediction,
    PhRecommendations, PhStatus, RiskLevel, SensorStatus, WaterloggingRisk,
};
use crate::thresholds::{
    AvailabilityImpact, MoistureBand, Nutrient, PhBand, Tier, TrendDirection,
    acidification_progress, bands, moisture_gauge, parse_share, ph_slider_position,
};

/// History window of the NPK page (days).
const NPK_HISTORY_DAYS: u32 = 30;

/// History window of the irrigation page (days).
const IRRIGATION_HISTORY_DAYS: u32 = 30;

/// History window of the pH page (days).
const PH_HISTORY_DAYS: u32 = 90;

// ============================================================================
// Per-resource state
// ============================================================================

/// Load state of one resource on a page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Resource<T> {
    /// Never fetched successfully, first request still pending.
    Loading,
    /// Fresh from the latest cycle.
    Loaded { value: T, fetched_at: DateTime<Utc> },
    /// Never fetched successfully; the latest attempt failed.
    Failed { error: String },
    /// Showing an older value because the latest attempt failed.
    Stale {
        value: T,
        fetched_at: DateTime<Utc>,
        error: String,
    },
}

impl<T> Default for Resource<T> {
    fn default() -> Self {
        Resource::Loading
    }
}

impl<T> Resource<T> {
    /// Build a resource from a single fetch result.
    pub fn from_result<E: ToString>(result: Result<T, E>, now: DateTime<Utc>) -> Self {
        Resource::Loading.merge(result, now)
    }

    /// Fold a new fetch result into this resource.
    ///
    /// Success replaces whatever was shown. Failure keeps the last good
    /// value (now stale) or records the error if there never was one.
    pub fn merge<E: ToString>(self, result: Result<T, E>, now: DateTime<Utc>) -> Self {
        match result {
            Ok(value) => Resource::Loaded {
                value,
                fetched_at: now,
            },
            Err(e) => {
                let error = e.to_string();
                match self {
                    Resource::Loaded { value, fetched_at }
                    | Resource::Stale {
                        value, fetched_at, ..
                    } => Resource::Stale {
                        value,
                        fetched_at,
                        error,
                    },
                    Resource::Loading | Resource::Failed { .. } => Resource::Failed { error },
                }
            }
        }
    }

    /// The value to display, fresh or stale.
    pub fn value(&self) -> Option<&T> {
        match self {
            Resource::Loaded { value, .. } | Resource::Stale { value, .. } => Some(value),
            Resource::Loading | Resource::Failed { .. } => None,
        }
    }

    /// The error of the latest attempt, if it failed.
    pub fn error(&self) -> Option<&str> {
        match self {
            Resource::Failed { error } | Resource::Stale { error, .. } => Some(error),
            Resource::Loading | Resource::Loaded { .. } => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Resource::Loaded { .. })
    }
}

/// A request that failed during a cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceFailure {
    /// Resource name within the page, e.g. `"alerts"`.
    pub resource: &'static str,
    pub error: String,
}

/// Result of one page refresh.
#[derive(Debug, Clone)]
pub struct Cycle<V> {
    pub view: V,
    pub failures: Vec<ResourceFailure>,
}

impl<V> Cycle<V> {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Collects failures while a page merges its results.
#[derive(Default)]
struct Failures(Vec<ResourceFailure>);

impl Failures {
    fn note<T, E: ToString>(&mut self, resource: &'static str, result: &Result<T, E>) {
        if let Err(e) = result {
            self.0.push(ResourceFailure {
                resource,
                error: e.to_string(),
            });
        }
    }
}

/// Combine three nutrient history results; the first failure wins.
fn all_three<T>(
    a: Result<T, ClientError>,
    b: Result<T, ClientError>,
    c: Result<T, ClientError>,
) -> Result<(T, T, T), ClientError> {
    Ok((a?, b?, c?))
}

// ============================================================================
// Dashboard page
// ============================================================================

/// One nutrient on the NPK card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NutrientReading {
    pub nutrient: Nutrient,
    pub label: &'static str,
    /// Level in mg/kg.
    pub level: f64,
    /// Minimum adequate level in mg/kg.
    pub threshold: f64,
    pub adequate: bool,
}

/// NPK card of the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NpkCard {
    pub nutrients: Vec<NutrientReading>,
    pub all_adequate: bool,
    pub tier: Tier,
}

impl NpkCard {
    /// Adequacy follows the flags the API computed for this snapshot.
    pub fn from_status(status: &SensorStatus) -> Self {
        let nutrients: Vec<NutrientReading> = Nutrient::ALL
            .into_iter()
            .map(|nutrient| {
                let (level, flag) = match nutrient {
                    Nutrient::Nitrogen => (status.nitrogen, status.npk_status.nitrogen),
                    Nutrient::Phosphorus => (status.phosphorus, status.npk_status.phosphorus),
                    Nutrient::Potassium => (status.potassium, status.npk_status.potassium),
                };
                NutrientReading {
                    nutrient,
                    label: nutrient.label(),
                    level,
                    threshold: nutrient.adequate_level(),
                    adequate: flag == NutrientStatus::Adequate,
                }
            })
            .collect();

        let all_adequate = nutrients.iter().all(|n| n.adequate);

        Self {
            nutrients,
            all_adequate,
            tier: if all_adequate {
                Tier::Success
            } else {
                Tier::Warning
            },
        }
    }
}

/// Status-derived cards of the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusCard {
    pub snapshot: SensorStatus,
    pub npk: NpkCard,
    pub waterlogging_risk: RiskLevel,
    pub waterlogging_tier: Tier,
    pub moisture_band: MoistureBand,
    pub ph_band: PhBand,
}

impl StatusCard {
    pub fn build(snapshot: SensorStatus) -> Self {
        Self {
            npk: NpkCard::from_status(&snapshot),
            waterlogging_risk: snapshot.waterlogging_risk,
            waterlogging_tier: snapshot.waterlogging_risk.tier(),
            moisture_band: MoistureBand::classify(snapshot.soil_moisture),
            ph_band: PhBand::classify(snapshot.ph),
            snapshot,
        }
    }
}

/// Active alerts card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertsCard {
    pub alerts: Vec<Alert>,
    /// Red as soon as one alert is high severity.
    pub tier: Tier,
}

impl AlertsCard {
    pub fn build(alerts: Vec<Alert>) -> Self {
        let tier = if alerts.iter().any(|a| a.severity == RiskLevel::High) {
            Tier::Danger
        } else {
            Tier::Warning
        };
        Self { alerts, tier }
    }
}

/// Irrigation overview card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IrrigationSummary {
    /// Real-time moisture (%): the status snapshot shown on the dashboard, if any.
    pub current_moisture: f64,
    pub moisture_band: MoistureBand,
    pub prediction_7d: Option<f64>,
    pub needs_irrigation: bool,
    pub next_action: String,
}

impl IrrigationSummary {
    pub fn build(prediction: &IrrigationPrediction, status: Option<&SensorStatus>) -> Self {
        let current_moisture = status
            .map(|s| s.soil_moisture)
            .unwrap_or(prediction.current_status.soil_moisture);
        let needs_irrigation = prediction.recommendation.needs_irrigation();

        Self {
            current_moisture,
            moisture_band: MoistureBand::classify(current_moisture),
            prediction_7d: prediction.predictions.get("7d").copied(),
            needs_irrigation,
            next_action: if needs_irrigation {
                "Irrigate within 24h".to_string()
            } else {
                "No irrigation needed".to_string()
            },
        }
    }
}

/// pH overview card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhSummary {
    pub current: f64,
    pub prediction_30d: Option<f64>,
    pub trend: String,
    pub direction: TrendDirection,
    pub band: PhBand,
    pub optimal: bool,
    /// Marker position on the 4-10 slider (%).
    pub slider_position: f64,
}

impl PhSummary {
    pub fn build(prediction: &PhPrediction) -> Self {
        let current = prediction.current_status.ph;
        let band = PhBand::classify(current);

        Self {
            current,
            prediction_30d: prediction.predictions.get("30d").copied(),
            trend: prediction.current_status.trend.clone(),
            direction: TrendDirection::from_trend(&prediction.current_status.trend),
            band,
            optimal: band.is_optimal(),
            slider_position: ph_slider_position(current),
        }
    }
}

/// The main dashboard page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardView {
    pub status: Resource<StatusCard>,
    pub alerts: Resource<AlertsCard>,
    pub irrigation: Resource<IrrigationSummary>,
    pub ph: Resource<PhSummary>,
    /// When any resource was last refreshed successfully.
    pub last_updated: Option<DateTime<Utc>>,
}

// ============================================================================
// NPK page
// ============================================================================

/// Adequacy lines drawn on the NPK charts (mg/kg).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NpkThresholds {
    #[serde(rename = "N")]
    pub n: f64,
    #[serde(rename = "P")]
    pub p: f64,
    #[serde(rename = "K")]
    pub k: f64,
}

impl Default for NpkThresholds {
    fn default() -> Self {
        Self {
            n: bands::NITROGEN_ADEQUATE,
            p: bands::PHOSPHORUS_ADEQUATE,
            k: bands::POTASSIUM_ADEQUATE,
        }
    }
}

/// NPK forecast card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NpkForecastCard {
    pub prediction: NpkPrediction,
    pub chart: Vec<NpkChartPoint>,
    pub fertilize: bool,
    /// Nutrients forecast below their adequate level at day 7.
    pub deficient_in_7_days: Vec<Nutrient>,
}

impl NpkForecastCard {
    pub fn build(prediction: NpkPrediction) -> Self {
        let day7 = prediction.seven_days;
        let deficient_in_7_days = Nutrient::ALL
            .into_iter()
            .filter(|nutrient| {
                let level = match nutrient {
                    Nutrient::Nitrogen => day7.n,
                    Nutrient::Phosphorus => day7.p,
                    Nutrient::Potassium => day7.k,
                };
                !nutrient.is_adequate(level)
            })
            .collect();

        Self {
            chart: npk_forecast(&prediction),
            fertilize: prediction.recommendation.action == "fertilize",
            deficient_in_7_days,
            prediction,
        }
    }
}

/// The NPK management page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NpkView {
    pub forecast: Resource<NpkForecastCard>,
    pub history: Resource<Vec<NpkHistoryRow>>,
    pub fertilization: Resource<Vec<FertilizationEvent>>,
    pub thresholds: NpkThresholds,
}

// ============================================================================
// Irrigation page
// ============================================================================

/// Reference lines of the moisture forecast (%).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MoistureReference {
    pub optimal_min: f64,
    pub optimal_max: f64,
    pub stress: f64,
}

impl Default for MoistureReference {
    fn default() -> Self {
        Self {
            optimal_min: bands::MOISTURE_OPTIMAL_MIN,
            optimal_max: bands::MOISTURE_OPTIMAL_MAX,
            stress: bands::MOISTURE_STRESS,
        }
    }
}

/// Irrigation status, forecast and recommendation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IrrigationCard {
    pub status: MoistureStatus,
    pub band: MoistureBand,
    pub tier: Tier,
    /// Fill level of the moisture gauge (%).
    pub gauge: f64,
    pub forecast: Vec<SeriesPoint>,
    pub trend: String,
    pub confidence: String,
    pub recommendation: IrrigationRecommendation,
    pub coordination: IrrigationCoordination,
    /// Scheduling is offered only while no waterlogging risk is reported.
    pub can_schedule: bool,
    pub reference: MoistureReference,
}

impl IrrigationCard {
    pub fn build(prediction: IrrigationPrediction) -> Self {
        let band = MoistureBand::classify(prediction.current_status.soil_moisture);

        Self {
            band,
            tier: band.tier(),
            gauge: moisture_gauge(prediction.current_status.soil_moisture),
            forecast: moisture_forecast(&prediction.predictions),
            can_schedule: prediction.coordination.waterlogging_safe,
            reference: MoistureReference::default(),
            status: prediction.current_status,
            trend: prediction.trend,
            confidence: prediction.confidence,
            recommendation: prediction.recommendation,
            coordination: prediction.coordination,
        }
    }
}

/// The irrigation page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IrrigationView {
    pub prediction: Resource<IrrigationCard>,
    pub events: Resource<Vec<IrrigationEvent>>,
    pub moisture_history: Resource<Vec<HistoryPoint>>,
}

// ============================================================================
// pH page
// ============================================================================

/// Availability of one nutrient now versus at pH 5.5.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NutrientAvailabilityRow {
    pub nutrient: Nutrient,
    pub label: &'static str,
    pub current: Option<i64>,
    pub projected: Option<i64>,
    /// Percentage points lost if pH drops to 5.5.
    pub drop: Option<i64>,
    pub impact: AvailabilityImpact,
}

/// pH status, drift and recommendations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhCard {
    pub status: PhStatus,
    pub band: PhBand,
    pub tier: Tier,
    pub direction: TrendDirection,
    /// Progress from pH 7.0 toward the critical pH 6.0 (%).
    pub acidification_progress: f64,
    pub drift: DriftAnalysis,
    pub nutrients: Vec<NutrientAvailabilityRow>,
    pub availability_warning: Option<String>,
    pub recommendations: PhRecommendations,
    pub coordination: PhCoordination,
    pub critical_ph: f64,
}

impl PhCard {
    pub fn build(prediction: PhPrediction) -> Self {
        let ph = prediction.current_status.ph;
        let band = PhBand::classify(ph);
        let availability = &prediction.nutrient_availability;

        let nutrients = Nutrient::ALL
            .into_iter()
            .map(|nutrient| {
                let (current, projected) = match nutrient {
                    Nutrient::Nitrogen => (
                        &availability.current.nitrogen,
                        &availability.projected.nitrogen,
                    ),
                    Nutrient::Phosphorus => (
                        &availability.current.phosphorus,
                        &availability.projected.phosphorus,
                    ),
                    Nutrient::Potassium => (
                        &availability.current.potassium,
                        &availability.projected.potassium,
                    ),
                };
                let current = parse_share(current);
                let projected = parse_share(projected);
                let drop = current.zip(projected).map(|(c, p)| c - p);

                NutrientAvailabilityRow {
                    nutrient,
                    label: nutrient.label(),
                    current,
                    projected,
                    drop,
                    impact: drop
                        .map(AvailabilityImpact::from_drop)
                        .unwrap_or(AvailabilityImpact::Minimal),
                }
            })
            .collect();

        Self {
            band,
            tier: band.tier(),
            direction: TrendDirection::from_trend(&prediction.current_status.trend),
            acidification_progress: acidification_progress(ph),
            nutrients,
            availability_warning: prediction.nutrient_availability.projected.warning.clone(),
            critical_ph: bands::PH_OPTIMAL_MIN,
            status: prediction.current_status,
            drift: prediction.drift_analysis,
            recommendations: prediction.recommendations,
            coordination: prediction.coordination,
        }
    }
}

/// The pH management page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PhView {
    pub prediction: Resource<PhCard>,
    pub history: Resource<Vec<PhHistoryPoint>>,
    /// Observed history followed by the projected horizons.
    pub timeline: Vec<PhTimelinePoint>,
}

// ============================================================================
// Waterlogging page
// ============================================================================

/// Waterlogging risk with its 48-hour forecast.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaterloggingCard {
    pub risk: WaterloggingRisk,
    pub tier: Tier,
    pub forecast: Vec<WaterloggingSample>,
    /// Peak WFPS exceeds the critical line.
    pub peak_critical: bool,
    pub critical_wfps: f64,
}

impl WaterloggingCard {
    pub fn build(risk: WaterloggingRisk) -> Self {
        Self {
            tier: risk.risk_level.tier(),
            forecast: waterlogging_forecast(risk.current_wfps, risk.rainfall_forecast_mm),
            peak_critical: risk.peak_wfps_predicted > bands::WFPS_CRITICAL,
            critical_wfps: bands::WFPS_CRITICAL,
            risk,
        }
    }
}

/// The waterlogging monitor page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WaterloggingView {
    pub risk: Resource<WaterloggingCard>,
}

// ============================================================================
// History page
// ============================================================================

/// Display metadata of a history parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParameterInfo {
    pub key: &'static str,
    pub label: &'static str,
    pub unit: &'static str,
}

impl From<Parameter> for ParameterInfo {
    fn from(parameter: Parameter) -> Self {
        Self {
            key: parameter.key(),
            label: parameter.label(),
            unit: parameter.unit(),
        }
    }
}

/// Summary statistics of a history series, rounded to two decimals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct HistoryStats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub latest: f64,
}

impl HistoryStats {
    /// Compute statistics; an empty series yields zeros.
    pub fn from_points(points: &[HistoryPoint]) -> Self {
        let Some(last) = points.last() else {
            return Self::default();
        };

        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for point in points {
            min = min.min(point.value);
            max = max.max(point.value);
            sum += point.value;
        }

        Self {
            min: round2(min),
            max: round2(max),
            avg: round2(sum / points.len() as f64),
            latest: round2(last.value),
        }
    }
}

/// The history page for one parameter and window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryView {
    pub parameter: ParameterInfo,
    pub days: u32,
    pub points: Vec<HistoryPoint>,
    pub stats: HistoryStats,
}

// ============================================================================
// Page loader
// ============================================================================

/// Fetches and assembles every dashboard page.
#[derive(Clone)]
pub struct Pages {
    client: SoilApiClient,
}

impl Pages {
    pub fn new(client: SoilApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &SoilApiClient {
        &self.client
    }

    /// Refresh the dashboard: status, alerts, irrigation and pH, concurrently.
    pub async fn dashboard(&self, previous: Option<DashboardView>) -> Cycle<DashboardView> {
        let previous = previous.unwrap_or_default();

        let (status, alerts, irrigation, ph) = tokio::join!(
            self.client.get_status(),
            self.client.get_alerts(),
            self.client.get_irrigation_predictions(),
            self.client.get_ph_predictions(),
        );

        let now = Utc::now();
        let mut failures = Failures::default();
        failures.note("status", &status);
        failures.note("alerts", &alerts);
        failures.note("irrigation", &irrigation);
        failures.note("ph", &ph);

        let any_success = status.is_ok() || alerts.is_ok() || irrigation.is_ok() || ph.is_ok();

        // The summary reads the same snapshot the status card shows, stale or not.
        let shown_status = status
            .as_ref()
            .ok()
            .or_else(|| previous.status.value().map(|card| &card.snapshot));
        let irrigation = irrigation.map(|p| IrrigationSummary::build(&p, shown_status));
        let view = DashboardView {
            status: previous.status.merge(status.map(StatusCard::build), now),
            alerts: previous
                .alerts
                .merge(alerts.map(|a| AlertsCard::build(a.alerts)), now),
            irrigation: previous.irrigation.merge(irrigation, now),
            ph: previous.ph.merge(ph.map(|p| PhSummary::build(&p)), now),
            last_updated: if any_success {
                Some(now)
            } else {
                previous.last_updated
            },
        };

        Cycle {
            view,
            failures: failures.0,
        }
    }

    /// Refresh the waterlogging monitor.
    pub async fn waterlogging(
        &self,
        previous: Option<WaterloggingView>,
    ) -> Cycle<WaterloggingView> {
        let previous = previous.unwrap_or_default();
        let risk = self.client.get_waterlogging_risk().await;

        let mut failures = Failures::default();
        failures.note("waterlogging", &risk);

        Cycle {
            view: WaterloggingView {
                risk: previous
                    .risk
                    .merge(risk.map(WaterloggingCard::build), Utc::now()),
            },
            failures: failures.0,
        }
    }

    /// Load the NPK page: forecast, three nutrient histories and fertilization log.
    pub async fn npk(&self) -> Cycle<NpkView> {
        let (prediction, nitrogen, phosphorus, potassium, fertilization) = tokio::join!(
            self.client.get_npk_predictions(),
            self.client.get_history(Parameter::Nitrogen, NPK_HISTORY_DAYS),
            self.client.get_history(Parameter::Phosphorus, NPK_HISTORY_DAYS),
            self.client.get_history(Parameter::Potassium, NPK_HISTORY_DAYS),
            self.client.get_fertilization_history(),
        );

        let now = Utc::now();
        let mut failures = Failures::default();
        failures.note("npk_predictions", &prediction);
        failures.note("nitrogen_history", &nitrogen);
        failures.note("phosphorus_history", &phosphorus);
        failures.note("potassium_history", &potassium);
        failures.note("fertilization", &fertilization);

        let history = all_three(nitrogen, phosphorus, potassium)
            .map(|(n, p, k)| merge_npk_history(&n.data, &p.data, &k.data));

        Cycle {
            view: NpkView {
                forecast: Resource::from_result(prediction.map(NpkForecastCard::build), now),
                history: Resource::from_result(history, now),
                fertilization: Resource::from_result(fertilization.map(|f| f.events), now),
                thresholds: NpkThresholds::default(),
            },
            failures: failures.0,
        }
    }

    /// Load the irrigation page: predictions, events and moisture history.
    pub async fn irrigation(&self) -> Cycle<IrrigationView> {
        let (prediction, events, moisture) = tokio::join!(
            self.client.get_irrigation_predictions(),
            self.client.get_irrigation_history(IRRIGATION_HISTORY_DAYS),
            self.client
                .get_history(Parameter::SoilMoisture, IRRIGATION_HISTORY_DAYS),
        );

        let now = Utc::now();
        let mut failures = Failures::default();
        failures.note("irrigation_predictions", &prediction);
        failures.note("irrigation_history", &events);
        failures.note("moisture_history", &moisture);

        Cycle {
            view: IrrigationView {
                prediction: Resource::from_result(prediction.map(IrrigationCard::build), now),
                events: Resource::from_result(events.map(|e| e.events), now),
                moisture_history: Resource::from_result(moisture.map(|m| m.data), now),
            },
            failures: failures.0,
        }
    }

    /// Load the pH page: predictions and 90-day history.
    pub async fn ph(&self) -> Cycle<PhView> {
        let (prediction, history) = tokio::join!(
            self.client.get_ph_predictions(),
            self.client.get_ph_history(PH_HISTORY_DAYS),
        );

        let now = Utc::now();
        let mut failures = Failures::default();
        failures.note("ph_predictions", &prediction);
        failures.note("ph_history", &history);

        let history = history.map(|h| h.history);
        let timeline = match (&prediction, &history) {
            (Ok(p), Ok(h)) => ph_timeline(h, &p.predictions, now),
            (Ok(p), Err(_)) => ph_timeline(&[], &p.predictions, now),
            (Err(_), Ok(h)) => ph_timeline(h, &Default::default(), now),
            (Err(_), Err(_)) => Vec::new(),
        };

        Cycle {
            view: PhView {
                prediction: Resource::from_result(prediction.map(PhCard::build), now),
                history: Resource::from_result(history, now),
                timeline,
            },
            failures: failures.0,
        }
    }

    /// Load one parameter's history for the history page and CSV export.
    pub async fn history(
        &self,
        parameter: Parameter,
        days: u32,
    ) -> Result<HistoryView, ClientError> {
        let response = self.client.get_history(parameter, days).await?;
        let stats = HistoryStats::from_points(&response.data);

        Ok(HistoryView {
            parameter: parameter.into(),
            days,
            points: response.data,
            stats,
        })
    }
}
