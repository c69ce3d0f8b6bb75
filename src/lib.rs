//! Client library for the WindBorne Data and Forecasts APIs.
//!
//! The Data API serves balloon telemetry (observations, super observations,
//! missions); the Forecasts API serves model output (point and gridded
//! forecasts, tropical cyclones, degree days). Both are authenticated with
//! a short-lived signed token derived from `WB_CLIENT_ID` / `WB_API_KEY`.

pub mod auth;
pub mod buckets;
pub mod cli;
pub mod client;
pub mod config;
pub mod data_api;
pub mod display;
pub mod error;
pub mod forecasts_api;
pub mod formats;
pub mod models;
pub mod times;

// Re-export the core types for library callers
pub use auth::Credentials;
pub use client::ApiClient;
pub use data_api::{DataApi, ObservationKind, ObservationsQuery};
pub use error::WindborneError;
pub use forecasts_api::{DegreeDayKind, ForecastsApi, ModelSelection, PointForecastOptions};
pub use models::{Observation, ObservationsPage};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, WindborneError>;
