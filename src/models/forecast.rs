//! Forecasts API models: point forecasts, run metadata, tropical cyclones
//! and population-weighted degree days.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::mission::TrackPoint;

/// Hourly forecast values at one coordinate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointForecast {
    /// Valid time of this record (ISO-8601)
    pub time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_2m: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dewpoint_2m: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_u_10m: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_v_10m: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure_msl: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precipitation: Option<f64>,
    /// Anything else the model run exposes at this point
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Envelope of the point forecast endpoints: one series per requested
/// coordinate, in request order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointForecastResponse {
    #[serde(default)]
    pub forecasts: Vec<Vec<PointForecast>>,
}

/// Available initialization (or calculation) times for a model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializationTimes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest: Option<String>,
    #[serde(default)]
    pub available: Vec<String>,
}

/// Forecast hours available for one model run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunInformation {
    pub initialization_time: String,
    #[serde(default)]
    pub forecast_hours: Vec<u32>,
}

/// Variables and pressure levels a model publishes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variables {
    #[serde(default)]
    pub surface_variables: Vec<String>,
    #[serde(default)]
    pub upper_variables: Vec<String>,
    #[serde(default)]
    pub levels: Vec<u32>,
}

/// Forecast hours per initialization time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastHours {
    #[serde(default)]
    pub forecast_hours: BTreeMap<String, Vec<u32>>,
}

/// When each forecast hour of each run finished generating.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationTimes {
    #[serde(default)]
    pub generation_times: BTreeMap<String, BTreeMap<u32, String>>,
}

/// Tropical cyclone tracks keyed by cyclone id. An empty map means no
/// active cyclones for the requested initialization time.
pub type CycloneMap = BTreeMap<String, Vec<TrackPoint>>;

/// Population-weighted degree days per region and date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DegreeDays {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default)]
    pub regions: BTreeMap<String, BTreeMap<String, f64>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_forecast_keeps_extra_variables() {
        let forecast: PointForecast = serde_json::from_str(
            r#"{"time": "2025-08-01T06:00:00", "temperature_2m": 292.4, "cape": 120.0}"#,
        )
        .unwrap();
        assert_eq!(forecast.temperature_2m, Some(292.4));
        assert_eq!(forecast.extra["cape"], 120.0);
    }

    #[test]
    fn test_cyclone_map_shape() {
        let cyclones: CycloneMap = serde_json::from_str(
            r#"{"WP_90": [{"latitude": 13.4, "longitude": 130.1, "time": "2025-08-01T06:00:00Z"}]}"#,
        )
        .unwrap();
        assert_eq!(cyclones.len(), 1);
        assert_eq!(cyclones["WP_90"][0].longitude, 130.1);
    }

    #[test]
    fn test_generation_times_integer_hour_keys() {
        let times: GenerationTimes = serde_json::from_str(
            r#"{"generation_times": {"2025-08-01T00:00:00+00:00": {"0": "2025-08-01T08:17:16.505002+00:00", "12": "2025-08-01T08:40:00+00:00"}}}"#,
        )
        .unwrap();
        let hours = &times.generation_times["2025-08-01T00:00:00+00:00"];
        assert_eq!(hours.keys().copied().collect::<Vec<_>>(), vec![0, 12]);
    }

    #[test]
    fn test_degree_days_regions() {
        let dd: DegreeDays = serde_json::from_str(
            r#"{"created_at": "2025-08-01T12:00:00.000Z", "regions": {"Alabama": {"2025-08-01": 0.0, "2025-08-02": 1.5}}}"#,
        )
        .unwrap();
        assert_eq!(dd.regions["Alabama"]["2025-08-02"], 1.5);
    }
}
