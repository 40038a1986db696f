//! HTTP API handlers for the soil dashboard.
//!
//! # Routes
//!
//! Open:
//! - `GET /health` - Health check
//! - `GET /session` - Whether the session flag is set
//! - `POST /login` - Set the session flag
//! - `POST /logout` - Clear the session flag
//!
//! Behind the login gate (`401 {"error": "login_required"}` otherwise):
//! - `GET /nav` - Navigation entries
//! - `GET /dashboard` - Polled dashboard snapshot
//! - `GET /waterlogging` - Polled waterlogging snapshot
//! - `GET /npk`, `GET /irrigation`, `GET /ph` - Pages loaded per request
//! - `POST /irrigation/log` - Record an irrigation event upstream
//! - `GET /history` - One parameter's history with statistics
//! - `GET /history/export` - The same series as a CSV download

use std::time::Duration;

use axum::{
    Json, Router,
    extract::{FromRequest, FromRequestParts, Query, Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{info, instrument, warn};

use crate::client::SoilApiClient;
use crate::dashboard::{
    Cycle, DashboardView, HistoryView, IrrigationView, NpkView, Pages, PhView, WaterloggingView,
};
use crate::error::ApiError;
use crate::export::{export_filename, history_csv};
use crate::model::{IrrigationLogAck, IrrigationLogRequest, Parameter};
use crate::poller::{self, PageCache, PageSnapshot, PollHandle};
use crate::session::{LoginRequest, Session, SessionState, SessionStore};

/// Default history parameter.
const DEFAULT_PARAMETER: Parameter = Parameter::Nitrogen;

/// Default history window in days.
const DEFAULT_HISTORY_DAYS: u32 = 7;

/// Longest history window that may be requested.
const MAX_HISTORY_DAYS: u32 = 365;

/// JSON body extractor whose rejections answer with an [`ApiError`] body.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor whose rejections answer with an [`ApiError`] body.
#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState<S> {
    pub session: Session<S>,
    pub pages: Pages,
    pub dashboard: PageCache<DashboardView>,
    pub waterlogging: PageCache<WaterloggingView>,
}

impl<S: SessionStore> AppState<S> {
    pub fn new(store: S, client: SoilApiClient) -> Self {
        Self {
            session: Session::new(store),
            pages: Pages::new(client),
            dashboard: PageCache::new("dashboard"),
            waterlogging: PageCache::new("waterlogging"),
        }
    }

    /// Start refreshing the dashboard and waterlogging pages every `period`.
    pub fn start_polling(&self, period: Duration) -> Pollers {
        let pages = self.pages.clone();
        let dashboard = poller::spawn(self.dashboard.clone(), period, move |previous| {
            let pages = pages.clone();
            async move { pages.dashboard(previous).await }
        });

        let pages = self.pages.clone();
        let waterlogging = poller::spawn(self.waterlogging.clone(), period, move |previous| {
            let pages = pages.clone();
            async move { pages.waterlogging(previous).await }
        });

        Pollers {
            handles: vec![dashboard, waterlogging],
        }
    }
}

/// The running page pollers.
pub struct Pollers {
    handles: Vec<PollHandle>,
}

impl Pollers {
    /// Stop every poller and wait for them to finish.
    pub async fn shutdown(self) {
        for handle in self.handles {
            handle.shutdown().await;
        }
    }
}

/// Build the application router.
pub fn router<S: SessionStore>(state: AppState<S>) -> Router {
    let gated = Router::new()
        .route("/nav", get(get_nav))
        .route("/dashboard", get(get_dashboard::<S>))
        .route("/waterlogging", get(get_waterlogging::<S>))
        .route("/npk", get(get_npk::<S>))
        .route("/irrigation", get(get_irrigation::<S>))
        .route("/irrigation/log", post(post_irrigation_log::<S>))
        .route("/ph", get(get_ph::<S>))
        .route("/history", get(get_history::<S>))
        .route("/history/export", get(export_history::<S>))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_login::<S>,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/session", get(get_session::<S>))
        .route("/login", post(post_login::<S>))
        .route("/logout", post(post_logout::<S>))
        .merge(gated)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Reject requests while the session flag is unset.
async fn require_login<S: SessionStore>(
    State(state): State<AppState<S>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !state.session.is_authenticated().await? {
        return Err(ApiError::LoginRequired);
    }
    Ok(next.run(request).await)
}

/// GET /health - Simple health check endpoint.
pub async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

// ============================================================================
// Session shell
// ============================================================================

/// GET /session - Report whether the user is logged in.
#[instrument(skip(state))]
pub async fn get_session<S: SessionStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<SessionState>, ApiError> {
    Ok(Json(state.session.state().await?))
}

/// POST /login - Accept any non-blank username and password.
///
/// # Request Body
///
/// ```json
/// {
///     "username": "farmer",
///     "password": "anything"
/// }
/// ```
#[instrument(skip_all)]
pub async fn post_login<S: SessionStore>(
    State(state): State<AppState<S>>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<SessionState>, ApiError> {
    Ok(Json(state.session.login(&request).await?))
}

/// POST /logout - Clear the session flag.
#[instrument(skip(state))]
pub async fn post_logout<S: SessionStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<SessionState>, ApiError> {
    Ok(Json(state.session.logout().await?))
}

/// A navigation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub label: &'static str,
    /// Client-side route.
    pub route: &'static str,
    /// API path serving the page's view model.
    pub view: &'static str,
}

/// Navigation entries, in display order.
pub static NAV_ITEMS: [NavItem; 6] = [
    NavItem {
        label: "Dashboard",
        route: "/",
        view: "/dashboard",
    },
    NavItem {
        label: "NPK",
        route: "/npk",
        view: "/npk",
    },
    NavItem {
        label: "Irrigation",
        route: "/irrigation",
        view: "/irrigation",
    },
    NavItem {
        label: "pH",
        route: "/ph-management",
        view: "/ph",
    },
    NavItem {
        label: "Water",
        route: "/waterlogging",
        view: "/waterlogging",
    },
    NavItem {
        label: "History",
        route: "/history",
        view: "/history",
    },
];

/// GET /nav - Navigation entries of the logged-in shell.
pub async fn get_nav() -> Json<&'static [NavItem]> {
    Json(NAV_ITEMS.as_slice())
}

// ============================================================================
// Pages
// ============================================================================

/// GET /dashboard - Latest polled dashboard.
///
/// `view` is `null` until the first refresh completes; `notice` is set when
/// the last refresh had failed requests.
#[instrument(skip(state))]
pub async fn get_dashboard<S: SessionStore>(
    State(state): State<AppState<S>>,
) -> Json<PageSnapshot<DashboardView>> {
    Json(state.dashboard.snapshot().await)
}

/// GET /waterlogging - Latest polled waterlogging risk.
#[instrument(skip(state))]
pub async fn get_waterlogging<S: SessionStore>(
    State(state): State<AppState<S>>,
) -> Json<PageSnapshot<WaterloggingView>> {
    Json(state.waterlogging.snapshot().await)
}

/// GET /npk - NPK forecast, history and fertilization log.
#[instrument(skip(state))]
pub async fn get_npk<S: SessionStore>(
    State(state): State<AppState<S>>,
) -> Json<PageSnapshot<NpkView>> {
    Json(loaded_page("npk", state.pages.npk().await))
}

/// GET /irrigation - Irrigation forecast, events and moisture history.
#[instrument(skip(state))]
pub async fn get_irrigation<S: SessionStore>(
    State(state): State<AppState<S>>,
) -> Json<PageSnapshot<IrrigationView>> {
    Json(loaded_page("irrigation", state.pages.irrigation().await))
}

/// GET /ph - pH forecast, nutrient availability and timeline.
#[instrument(skip(state))]
pub async fn get_ph<S: SessionStore>(
    State(state): State<AppState<S>>,
) -> Json<PageSnapshot<PhView>> {
    Json(loaded_page("ph", state.pages.ph().await))
}

fn loaded_page<V>(page: &'static str, outcome: Cycle<V>) -> PageSnapshot<V> {
    if outcome.is_complete() {
        info!(page, "Page loaded");
    } else {
        warn!(
            page,
            failed = outcome.failures.len(),
            "Page loaded with failed requests"
        );
    }
    PageSnapshot::single(page, outcome)
}

/// POST /irrigation/log - Record an irrigation event.
///
/// # Request Body
///
/// ```json
/// {
///     "volume_liters": 35000
/// }
/// ```
///
/// `volume_liters` is optional and defaults to 35000.
#[instrument(skip(state))]
pub async fn post_irrigation_log<S: SessionStore>(
    State(state): State<AppState<S>>,
    ApiJson(request): ApiJson<IrrigationLogRequest>,
) -> Result<Json<IrrigationLogAck>, ApiError> {
    if !request.volume_liters.is_finite() || request.volume_liters <= 0.0 {
        return Err(ApiError::BadRequest(
            "volume_liters must be a positive number".to_string(),
        ));
    }

    let ack = state.pages.client().log_irrigation(&request).await?;
    info!(
        volume_liters = request.volume_liters,
        event_id = %ack.event.id,
        "Irrigation logged"
    );
    Ok(Json(ack))
}

// ============================================================================
// History
// ============================================================================

/// Query parameters of the history endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    /// Parameter key (default: nitrogen).
    pub parameter: Option<String>,
    /// Window in days, 1 to 365 (default: 7).
    pub days: Option<u32>,
}

impl HistoryQuery {
    fn resolve(&self) -> Result<(Parameter, u32), ApiError> {
        let parameter = match &self.parameter {
            Some(key) => Parameter::from_key(key)
                .ok_or_else(|| ApiError::BadRequest(format!("unknown parameter '{key}'")))?,
            None => DEFAULT_PARAMETER,
        };

        let days = self.days.unwrap_or(DEFAULT_HISTORY_DAYS);
        if !(1..=MAX_HISTORY_DAYS).contains(&days) {
            return Err(ApiError::BadRequest(format!(
                "days must be between 1 and {MAX_HISTORY_DAYS}"
            )));
        }

        Ok((parameter, days))
    }
}

/// GET /history - One parameter's history with min/max/avg/latest.
///
/// # Query Parameters
///
/// - `parameter` (optional): nitrogen, phosphorus, potassium, soil_moisture,
///   pH, soil_temp, air_temp or humidity (default: nitrogen)
/// - `days` (optional): Window in days (default: 7)
#[instrument(skip(state))]
pub async fn get_history<S: SessionStore>(
    State(state): State<AppState<S>>,
    ApiQuery(query): ApiQuery<HistoryQuery>,
) -> Result<Json<HistoryView>, ApiError> {
    let (parameter, days) = query.resolve()?;

    let view = state.pages.history(parameter, days).await?;
    info!(
        parameter = parameter.key(),
        days,
        points = view.points.len(),
        "History queried"
    );
    Ok(Json(view))
}

/// GET /history/export - Download the history series as CSV.
#[instrument(skip(state))]
pub async fn export_history<S: SessionStore>(
    State(state): State<AppState<S>>,
    ApiQuery(query): ApiQuery<HistoryQuery>,
) -> Result<Response, ApiError> {
    let (parameter, days) = query.resolve()?;

    let view = state.pages.history(parameter, days).await?;
    let filename = export_filename(parameter, days);
    info!(
        parameter = parameter.key(),
        days,
        rows = view.points.len(),
        filename = %filename,
        "History exported"
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        history_csv(parameter, &view.points),
    )
        .into_response())
}
