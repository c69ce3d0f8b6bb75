//! Missions and per-mission lookups: launch sites, predicted paths,
//! current locations and flown paths.

use serde::{Deserialize, Serialize};

use super::de;

/// A single balloon flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mission {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl Mission {
    /// Display name, falling back for missions the API has not named.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unnamed Mission")
    }
}

/// Envelope of the currently-flying missions endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionsResponse {
    #[serde(default)]
    pub missions: Vec<Mission>,
}

/// Launch site details for a mission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchSite {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Envelope of the launch site endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchSiteResponse {
    pub launch_site: LaunchSite,
}

/// Latest reported position of a flying mission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentLocation {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub altitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

/// One point on a track (predicted path, flown path, cyclone track).
///
/// Latitude and longitude tolerate the string encoding some endpoints use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackPoint {
    #[serde(deserialize_with = "de::lenient_f64")]
    pub latitude: f64,
    #[serde(deserialize_with = "de::lenient_f64")]
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    /// ISO-8601 timestamp of the point
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

impl TrackPoint {
    /// The point's time, or an empty string for timeless tracks.
    #[must_use]
    pub fn time_str(&self) -> &str {
        self.time.as_deref().unwrap_or("")
    }
}

/// Envelope of the predicted flight path endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    #[serde(default)]
    pub prediction: Vec<TrackPoint>,
}

/// Envelope of the flown path endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightDataResponse {
    #[serde(default)]
    pub flight_data: Vec<TrackPoint>,
}
