//! In-process stand-in for the soil monitoring API.
//!
//! Serves fixed fixtures on an ephemeral loopback port. Individual
//! endpoints can be switched to answer HTTP 500 to exercise partial
//! failures.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use tokio::net::TcpListener;

#[derive(Clone, Default)]
pub struct MockSoilApi {
    failing: Arc<Mutex<HashSet<&'static str>>>,
    logged_volumes: Arc<Mutex<Vec<f64>>>,
}

impl MockSoilApi {
    /// Make `endpoint` (e.g. `"/alerts"`) answer HTTP 500.
    pub fn fail(&self, endpoint: &'static str) {
        self.failing.lock().unwrap().insert(endpoint);
    }

    /// Make `endpoint` answer normally again.
    pub fn recover(&self, endpoint: &'static str) {
        self.failing.lock().unwrap().remove(endpoint);
    }

    pub fn logged_volumes(&self) -> Vec<f64> {
        self.logged_volumes.lock().unwrap().clone()
    }

    fn respond(&self, endpoint: &'static str, body: Value) -> Response {
        if self.failing.lock().unwrap().contains(endpoint) {
            return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
        }
        Json(body).into_response()
    }

    /// Bind to `127.0.0.1:0` and return the API base URL.
    pub async fn start(&self) -> String {
        let app = Router::new()
            .route(
                "/api/status",
                get(|State(m): State<MockSoilApi>| async move { m.respond("/status", status()) }),
            )
            .route(
                "/api/alerts",
                get(|State(m): State<MockSoilApi>| async move { m.respond("/alerts", alerts()) }),
            )
            .route(
                "/api/npk-predictions",
                get(|State(m): State<MockSoilApi>| async move {
                    m.respond("/npk-predictions", npk_predictions())
                }),
            )
            .route(
                "/api/waterlogging-risk",
                get(|State(m): State<MockSoilApi>| async move {
                    m.respond("/waterlogging-risk", waterlogging_risk())
                }),
            )
            .route(
                "/api/history",
                get(
                    |State(m): State<MockSoilApi>,
                     Query(query): Query<HashMap<String, String>>| async move {
                        m.respond("/history", history(&query))
                    },
                ),
            )
            .route(
                "/api/fertilization-history",
                get(|State(m): State<MockSoilApi>| async move {
                    m.respond("/fertilization-history", fertilization_history())
                }),
            )
            .route(
                "/api/irrigation-predictions",
                get(|State(m): State<MockSoilApi>| async move {
                    m.respond("/irrigation-predictions", irrigation_predictions())
                }),
            )
            .route(
                "/api/irrigation-history",
                get(|State(m): State<MockSoilApi>| async move {
                    m.respond("/irrigation-history", irrigation_history())
                }),
            )
            .route(
                "/api/irrigation/log",
                post(
                    |State(m): State<MockSoilApi>, Json(body): Json<Value>| async move {
                        let volume = body["volume_liters"].as_f64().unwrap_or_default();
                        m.logged_volumes.lock().unwrap().push(volume);
                        m.respond(
                            "/irrigation/log",
                            json!({
                                "status": "success",
                                "event": {
                                    "id": "irr-new",
                                    "date": "2025-03-01T10:00:00+00:00",
                                    "volume_liters": volume,
                                    "moisture_before": 38.0,
                                    "moisture_after": 52.0,
                                    "cost": 31.5
                                }
                            }),
                        )
                    },
                ),
            )
            .route(
                "/api/ph-predictions",
                get(|State(m): State<MockSoilApi>| async move {
                    m.respond("/ph-predictions", ph_predictions())
                }),
            )
            .route(
                "/api/ph-history",
                get(|State(m): State<MockSoilApi>| async move {
                    m.respond("/ph-history", ph_history())
                }),
            )
            .with_state(self.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{addr}/api")
    }
}

pub fn status() -> Value {
    json!({
        "nitrogen": 140.2, "phosphorus": 45.0, "potassium": 310.0,
        "soil_moisture": 33.0, "pH": 6.8, "ec": 1.2,
        "soil_temp": 26.0, "air_temp": 28.0, "humidity": 75.0,
        "npk_status": {"nitrogen": "low", "phosphorus": "adequate", "potassium": "adequate"},
        "waterlogging_risk": "medium", "wfps": 88.0,
        "last_updated": "2025-03-01T10:00:00+00:00"
    })
}

pub fn alerts() -> Value {
    json!({
        "alerts": [{
            "id": "1",
            "type": "waterlogging_risk",
            "severity": "high",
            "message": "Heavy rain expected in 48 hours",
            "timestamp": "2025-03-01T10:00:00+00:00"
        }]
    })
}

pub fn npk_predictions() -> Value {
    json!({
        "current": {"N": 140.2, "P": 45.0, "K": 310.0},
        "7_days": {"N": 112.2, "P": 32.4, "K": 287.6},
        "14_days": {"N": 84.2, "P": 19.8, "K": 265.2},
        "recommendation": {
            "action": "fertilize", "timing": "within 3 days",
            "fertilizer_type": "Urea", "amount_kg": 120,
            "reason": "Nitrogen below threshold", "cost_savings": 1050
        }
    })
}

pub fn waterlogging_risk() -> Value {
    json!({
        "current_wfps": 40.0, "current_moisture": 33.0,
        "peak_wfps_predicted": 90.0, "rainfall_forecast_mm": 25.0,
        "risk_level": "MEDIUM", "time_to_event_hours": 48, "duration_hours": 12,
        "cause": "Heavy rain (25mm) forecasted",
        "actions": ["Prepare drainage channels"], "potential_loss": 20000
    })
}

pub fn history(query: &HashMap<String, String>) -> Value {
    let parameter = query.get("parameter").cloned().unwrap_or_default();
    let days: u32 = query.get("days").and_then(|d| d.parse().ok()).unwrap_or(7);
    let values: [f64; 3] = match parameter.as_str() {
        "nitrogen" => [150.0, 145.5, 140.2],
        "phosphorus" => [46.0, 45.5, 45.0],
        "potassium" => [312.0, 311.0, 310.0],
        "soil_moisture" => [41.0, 37.5, 33.0],
        "pH" => [6.9, 6.85, 6.8],
        _ => [1.0, 2.0, 3.0],
    };
    let data: Vec<Value> = values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            json!({
                "timestamp": format!("2025-03-0{}T08:30:00+00:00", i + 1),
                "value": v
            })
        })
        .collect();
    json!({"parameter": parameter, "days": days, "data": data})
}

pub fn fertilization_history() -> Value {
    json!({
        "events": [{
            "id": "fert-1", "date": "2025-02-17T10:00:00+00:00",
            "type": "NPK 20-10-10", "amount_kg": 150, "cost": 2250
        }]
    })
}

pub fn irrigation_predictions() -> Value {
    json!({
        "current_status": {"soil_moisture": 45.0, "status": "optimal", "range": "40-60%"},
        "predictions": {"1h": 44.8, "6h": 43.9, "24h": 41.2, "3d": 36.5, "7d": 29.0},
        "trend": "decreasing",
        "confidence": "±2.1%",
        "recommendation": {
            "action": "irrigate", "timing": "within 24 hours", "reason": "Moisture falling",
            "water_volume_per_m2": 3.5, "water_volume_hectare": 35000,
            "optimal_time": "06:00", "cost_traditional": 45, "cost_optimized": 31.5, "savings": 13.5
        },
        "coordination": {"waterlogging_safe": true, "message": "No waterlogging risk"}
    })
}

pub fn irrigation_history() -> Value {
    json!({
        "events": [{
            "id": "irr-1", "date": "2025-02-25T06:00:00+00:00", "volume_liters": 35000,
            "moisture_before": 36.0, "moisture_after": 50.0, "cost": 31.5
        }]
    })
}

pub fn ph_predictions() -> Value {
    json!({
        "current_status": {
            "pH": 6.8, "status": "optimal", "range": "6.0-7.0",
            "trend": "slowly_decreasing", "buffer_capacity": "moderate"
        },
        "predictions": {"7d": 6.75, "30d": 6.6, "90d": 6.3},
        "drift_analysis": {
            "rate": -0.025, "unit": "pH units per week",
            "cause": "Recent urea fertilization", "time_to_critical": "120 days until pH 6.0"
        },
        "nutrient_availability": {
            "current_pH_6_8": {"nitrogen": "95%", "phosphorus": "98%", "potassium": "100%"},
            "if_pH_drops_to_5_5": {
                "nitrogen": "90%", "phosphorus": "60%", "potassium": "85%",
                "warning": "40% phosphorus loss"
            }
        },
        "recommendations": {
            "short_term": {"action": "Monitor", "description": "Weekly pH checks", "frequency": "weekly"},
            "medium_term": {"action": "Lime", "description": "Apply agricultural lime", "amount_kg": 500, "cost": 200},
            "long_term": {"action": "Switch fertilizer", "description": "Use ammonium-free nitrogen"}
        },
        "coordination": {
            "alert_to_npk": "Avoid ammonium fertilizers",
            "alert_to_irrigation": "Irrigation water pH 7.2 is fine",
            "fertilizer_recommendation": "Calcium nitrate"
        }
    })
}

pub fn ph_history() -> Value {
    json!({
        "history": [
            {"timestamp": "2025-01-01T00:00:00+00:00", "pH": 6.95, "event_type": null},
            {"timestamp": "2025-02-01T00:00:00+00:00", "pH": 6.9, "event_type": "fertilization"},
            {"timestamp": "2025-03-01T00:00:00+00:00", "pH": 6.8, "event_type": null}
        ]
    })
}
