//! Soilwatch - backend for a soil health monitoring dashboard.
//!
//! # Overview
//!
//! The soil monitoring API exposes raw readings, forecasts and
//! recommendations for one field. Soilwatch turns those into page view
//! models: every number is classified into a display band, forecasts are
//! turned into chart series, and each page's requests are fetched
//! concurrently with per-resource failure handling.
//!
//! The dashboard and waterlogging pages are refreshed by background
//! pollers; the NPK, irrigation, pH and history pages are assembled per
//! request. Access is gated by a session flag kept in SQLite.
//!
//! # Modules
//!
//! - [`model`]: Upstream API records
//! - [`thresholds`]: Display bands, tiers and gauge positions
//! - [`forecast`]: Chart series built from predictions
//! - [`client`]: HTTP client for the soil API
//! - [`dashboard`]: Page view models and their loaders
//! - [`poller`]: Cancellable periodic refresh of polled pages
//! - [`export`]: CSV export of history series
//! - [`session`]: Session flag storage and login gate
//! - [`api`]: HTTP API handlers
//! - [`config`]: Environment configuration
//! - [`error`]: Error types

pub mod api;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod forecast;
pub mod model;
pub mod poller;
pub mod session;
pub mod thresholds;
