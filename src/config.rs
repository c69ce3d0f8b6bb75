//! API endpoints and shared constants.

use std::env;

/// Current Data API version and link
pub const DATA_API_BASE_URL: &str = "https://sensor-data.windbornesystems.com/api/v1";

/// Current Forecasts API version and link
pub const FORECASTS_API_BASE_URL: &str = "https://forecasts.windbornesystems.com/api/v1";

/// File extensions the observation writers understand
pub const OBSERVATION_SUPPORTED_FORMATS: &[&str] = &[".csv", ".json", ".little_r", ".nc"];

/// File extensions the track writers (cyclones, flight paths) understand
pub const TRACK_SUPPORTED_FORMATS: &[&str] =
    &[".csv", ".json", ".geojson", ".gpx", ".kml", ".little_r"];

/// Tropical cyclone basin identifiers accepted by the Forecasts API
pub const CYCLONE_BASINS: &[&str] = &["NA", "EP", "WP", "NI", "SI", "AU", "SP"];

/// Where to send people who need credentials
pub const CREDENTIALS_HELP: &str = "You may refer to https://windbornesystems.com/docs/api/cli#introduction\n\
for instructions on how to set your credentials as environment variables for CLI usage\n\n\
and to https://windbornesystems.com/docs/api/pip_data#introduction\n\
for instructions on how to set your credentials for code usage.\n\
--------------------------------------\n\
To get an API key, email data@windbornesystems.com.";

/// Base URL of the Data API, honoring the `WB_DATA_API_URL` override.
#[must_use]
pub fn data_api_base_url() -> String {
    env::var("WB_DATA_API_URL").unwrap_or_else(|_| DATA_API_BASE_URL.to_string())
}

/// Base URL of the Forecasts API, honoring the `WB_FORECASTS_API_URL` override.
#[must_use]
pub fn forecasts_api_base_url() -> String {
    env::var("WB_FORECASTS_API_URL").unwrap_or_else(|_| FORECASTS_API_BASE_URL.to_string())
}
