//! Response models for the Data and Forecasts APIs.

pub mod forecast;
pub mod mission;
pub mod observation;

pub use forecast::{
    CycloneMap, DegreeDays, ForecastHours, GenerationTimes, InitializationTimes, PointForecast,
    PointForecastResponse, RunInformation, Variables,
};
pub use mission::{
    CurrentLocation, FlightDataResponse, LaunchSite, LaunchSiteResponse, Mission,
    MissionsResponse, PredictionResponse, TrackPoint,
};
pub use observation::{Observation, ObservationsPage};

pub(crate) mod de {
    //! Deserialization helpers for fields the API sometimes sends as strings.

    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        String(String),
    }

    /// Accept a float either as a JSON number or as a numeric string.
    pub fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match NumberOrString::deserialize(deserializer)? {
            NumberOrString::Number(n) => Ok(n),
            NumberOrString::String(s) => s.parse::<f64>().map_err(serde::de::Error::custom),
        }
    }
}
