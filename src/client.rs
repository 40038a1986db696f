//! Client for the upstream soil monitoring REST API.
//!
//! A thin one-to-one wrapper: each method issues a single request against
//! `{base_url}/...` and decodes the JSON body. There is no retry, batching
//! or caching here; page controllers decide what to do with failures.
//!
//! # API Reference
//!
//! | Endpoint | Method |
//! |---|---|
//! | `/status` | [`SoilApiClient::get_status`] |
//! | `/alerts` | [`SoilApiClient::get_alerts`] |
//! | `/npk-predictions` | [`SoilApiClient::get_npk_predictions`] |
//! | `/waterlogging-risk` | [`SoilApiClient::get_waterlogging_risk`] |
//! | `/history` | [`SoilApiClient::get_history`] |
//! | `/fertilization-history` | [`SoilApiClient::get_fertilization_history`] |
//! | `/irrigation-predictions` | [`SoilApiClient::get_irrigation_predictions`] |
//! | `/irrigation-history` | [`SoilApiClient::get_irrigation_history`] |
//! | `/irrigation/log` | [`SoilApiClient::log_irrigation`] |
//! | `/ph-predictions` | [`SoilApiClient::get_ph_predictions`] |
//! | `/ph-history` | [`SoilApiClient::get_ph_history`] |

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ClientError;
use crate::model::{
    AlertsResponse, FertilizationHistoryResponse, HistoryResponse, IrrigationHistoryResponse,
    IrrigationLogAck, IrrigationLogRequest, IrrigationPrediction, NpkPrediction, Parameter,
    PhHistoryResponse, PhPrediction, SensorStatus, WaterloggingRisk,
};

/// Default base URL of the soil API.
pub const DEFAULT_API_BASE: &str = "http://localhost:8000/api";

/// Client for the soil monitoring API.
#[derive(Clone)]
pub struct SoilApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl Default for SoilApiClient {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE)
    }
}

impl SoilApiClient {
    /// Create a client against `base_url` (e.g. `http://localhost:8000/api`).
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create a client whose requests give up after `timeout`.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Current sensor snapshot.
    pub async fn get_status(&self) -> Result<SensorStatus, ClientError> {
        self.get_json("/status", "").await
    }

    /// Active alerts.
    pub async fn get_alerts(&self) -> Result<AlertsResponse, ClientError> {
        self.get_json("/alerts", "").await
    }

    /// NPK forecast and fertilization recommendation.
    pub async fn get_npk_predictions(&self) -> Result<NpkPrediction, ClientError> {
        self.get_json("/npk-predictions", "").await
    }

    /// Waterlogging prediction and action plan.
    pub async fn get_waterlogging_risk(&self) -> Result<WaterloggingRisk, ClientError> {
        self.get_json("/waterlogging-risk", "").await
    }

    /// History of one parameter over the last `days` days.
    pub async fn get_history(
        &self,
        parameter: Parameter,
        days: u32,
    ) -> Result<HistoryResponse, ClientError> {
        let query = format!(
            "?parameter={}&days={}",
            urlencoding::encode(parameter.key()),
            days
        );
        self.get_json("/history", &query).await
    }

    /// Past fertilization events.
    pub async fn get_fertilization_history(
        &self,
    ) -> Result<FertilizationHistoryResponse, ClientError> {
        self.get_json("/fertilization-history", "").await
    }

    /// Moisture forecast and irrigation recommendation.
    pub async fn get_irrigation_predictions(&self) -> Result<IrrigationPrediction, ClientError> {
        self.get_json("/irrigation-predictions", "").await
    }

    /// Irrigation events over the last `days` days.
    pub async fn get_irrigation_history(
        &self,
        days: u32,
    ) -> Result<IrrigationHistoryResponse, ClientError> {
        self.get_json("/irrigation-history", &format!("?days={days}"))
            .await
    }

    /// Record an irrigation event.
    pub async fn log_irrigation(
        &self,
        request: &IrrigationLogRequest,
    ) -> Result<IrrigationLogAck, ClientError> {
        self.post_json("/irrigation/log", request).await
    }

    /// pH forecast, drift analysis and recommendations.
    pub async fn get_ph_predictions(&self) -> Result<PhPrediction, ClientError> {
        self.get_json("/ph-predictions", "").await
    }

    /// pH history with field event markers.
    pub async fn get_ph_history(&self, days: u32) -> Result<PhHistoryResponse, ClientError> {
        self.get_json("/ph-history", &format!("?days={days}")).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &str,
    ) -> Result<T, ClientError> {
        let url = format!("{}{}{}", self.base_url, endpoint, query);
        debug!(endpoint, "GET");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                endpoint: endpoint.to_string(),
                source,
            })?;
        decode(endpoint, response).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!(endpoint, "POST");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                endpoint: endpoint.to_string(),
                source,
            })?;
        decode(endpoint, response).await
    }
}

async fn decode<T: DeserializeOwned>(
    endpoint: &str,
    response: reqwest::Response,
) -> Result<T, ClientError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ClientError::Status {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|source| ClientError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash() {
        let client = SoilApiClient::new("http://soil.test/api/");
        assert_eq!(client.base_url(), "http://soil.test/api");
    }

    #[test]
    fn test_default_base_url() {
        assert_eq!(SoilApiClient::default().base_url(), DEFAULT_API_BASE);
    }

    #[tokio::test]
    async fn test_unreachable_api_is_transport_error() {
        // Port 9 (discard) on loopback is not expected to accept HTTP.
        let client =
            SoilApiClient::with_timeout("http://127.0.0.1:9/api", Duration::from_millis(500))
                .unwrap();

        let err = client.get_status().await.unwrap_err();

        assert!(matches!(err, ClientError::Transport { .. }));
        assert_eq!(err.endpoint(), "/status");
    }
}
