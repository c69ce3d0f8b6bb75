//! Balloon observation records and the paginated envelope they arrive in.

use serde::{Deserialize, Serialize};

/// A single telemetry reading from a mission at a point in time.
///
/// Measurement fields are optional: sensors drop in and out over a flight,
/// and the API sends `null` for anything it has no value for. The id,
/// mission name and update time only appear when the corresponding
/// `include_*` query parameter was sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Observation time, seconds since the Unix epoch (UTC)
    pub timestamp: i64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Meters above sea level
    pub altitude: Option<f64>,
    /// Relative humidity, percent
    pub humidity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mission_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mission_id: Option<String>,
    /// Atmospheric pressure, hPa
    pub pressure: Option<f64>,
    /// Specific humidity, mg/kg
    pub specific_humidity: Option<f64>,
    /// Zonal wind component, m/s
    pub speed_u: Option<f64>,
    /// Meridional wind component, m/s
    pub speed_v: Option<f64>,
    /// Air temperature, degrees Celsius
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

impl Observation {
    /// The label used to group observations into per-mission output files:
    /// the mission name when known, else the mission id.
    #[must_use]
    pub fn mission_key(&self) -> &str {
        self.mission_name
            .as_deref()
            .or(self.mission_id.as_deref())
            .unwrap_or("unknown")
    }
}

/// One page of the observations (or super observations) endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationsPage {
    #[serde(default)]
    pub observations: Vec<Observation>,
    /// Whether another page exists past `next_since`
    #[serde(default)]
    pub has_next_page: bool,
    /// Cursor for the next page, when `has_next_page` is set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_since: Option<i64>,
}
