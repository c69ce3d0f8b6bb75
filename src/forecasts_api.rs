//! Forecasts API: point and gridded forecasts, run metadata, tropical
//! cyclones and population-weighted degree days.
//!
//! One `gridded_forecast` call serves every output variable (including the
//! level-scoped `500/temperature` style), and model scoping is a URL
//! prefix, so there is exactly one function per endpoint shape.

use crate::client::{ApiClient, QueryParams};
use crate::config::{self, CYCLONE_BASINS};
use crate::error::WindborneError;
use crate::models::{
    CycloneMap, DegreeDays, ForecastHours, GenerationTimes, InitializationTimes,
    PointForecastResponse, RunInformation, Variables,
};
use crate::times::parse_time;
use crate::Result;

/// Model scoping shared by most Forecasts API endpoints.
#[derive(Debug, Default, Clone)]
pub struct ModelSelection {
    /// Model slug (`wm4`, `wm4-ens`, ...); unset uses the API default
    pub model: Option<String>,
    /// Ensemble member (`1`, `mean`, ...)
    pub ens_member: Option<String>,
    /// Ask for the intracycle run
    pub intracycle: bool,
}

impl ModelSelection {
    fn apply(&self, params: &mut QueryParams) {
        params.push_opt("ens_member", self.ens_member.as_deref());
        params.push_flag("intracycle", self.intracycle);
    }
}

/// Parameters for the point forecast endpoints.
#[derive(Debug, Default, Clone)]
pub struct PointForecastOptions {
    /// `lat,lon` pairs separated by `;`
    pub coordinates: String,
    pub min_forecast_time: Option<String>,
    pub max_forecast_time: Option<String>,
    pub min_forecast_hour: Option<u32>,
    pub max_forecast_hour: Option<u32>,
    pub initialization_time: Option<String>,
}

/// The two population-weighted degree day products.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegreeDayKind {
    Heating,
    Cooling,
}

impl DegreeDayKind {
    fn path(self) -> &'static str {
        match self {
            Self::Heating => "hdd.json",
            Self::Cooling => "cdd.json",
        }
    }

    /// Label for progress messages.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Heating => "heating degree days",
            Self::Cooling => "cooling degree days",
        }
    }
}

/// Parse and validate a `lat,lon;lat,lon` coordinate list, returning the
/// cleaned string to send and the pairs for display.
pub fn parse_coordinates(input: &str) -> Result<(String, Vec<(f64, f64)>)> {
    let cleaned: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return Err(WindborneError::validation(
            "to get point forecasts you must provide coordinates",
        ));
    }

    let mut pairs = Vec::new();
    for pair in cleaned.split(';').filter(|p| !p.is_empty()) {
        let (lat, lon) = pair.split_once(',').ok_or_else(|| {
            WindborneError::validation(format!(
                "coordinates must be 'latitude,longitude' pairs separated by ';', got '{pair}'"
            ))
        })?;
        let lat: f64 = lat
            .parse()
            .map_err(|_| WindborneError::validation(format!("invalid latitude: {lat}")))?;
        let lon: f64 = lon
            .parse()
            .map_err(|_| WindborneError::validation(format!("invalid longitude: {lon}")))?;
        if !(-90.0..=90.0).contains(&lat) {
            return Err(WindborneError::validation(format!(
                "latitude must be between -90 and 90, got {lat}"
            )));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(WindborneError::validation(format!(
                "longitude must be between -180 and 180, got {lon}"
            )));
        }
        pairs.push((lat, lon));
    }

    if pairs.is_empty() {
        return Err(WindborneError::validation(
            "to get point forecasts you must provide coordinates",
        ));
    }

    Ok((cleaned, pairs))
}

/// Check a gridded variable name: `temperature_2m` or level-scoped
/// `500/temperature`.
pub fn validate_gridded_variable(variable: &str) -> Result<()> {
    let segments: Vec<&str> = variable.split('/').collect();
    let valid = match segments.as_slice() {
        [name] => is_variable_slug(name),
        [level, name] => {
            level.bytes().all(|b| b.is_ascii_digit()) && !level.is_empty() && is_variable_slug(name)
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(WindborneError::validation(format!(
            "invalid gridded variable '{variable}'; expected a name like 'temperature_2m' \
             or 'level/name' like '500/temperature'"
        )))
    }
}

fn is_variable_slug(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}

/// Client for the Forecasts API.
pub struct ForecastsApi<'a> {
    client: &'a ApiClient,
    base_url: String,
}

impl<'a> ForecastsApi<'a> {
    #[must_use]
    pub fn new(client: &'a ApiClient) -> Self {
        Self {
            client,
            base_url: config::forecasts_api_base_url(),
        }
    }

    fn url(&self, model: Option<&str>, path: &str) -> String {
        match model {
            Some(model) => format!("{}/{}/{}", self.base_url, model, path),
            None => format!("{}/{}", self.base_url, path),
        }
    }

    fn point_params(&self, options: &PointForecastOptions) -> Result<QueryParams> {
        let (coordinates, _) = parse_coordinates(&options.coordinates)?;
        let mut params = QueryParams::new();
        params.push("coordinates", coordinates);
        if let Some(t) = &options.min_forecast_time {
            params.push("min_forecast_time", parse_time(t, false)?);
        }
        if let Some(t) = &options.max_forecast_time {
            params.push("max_forecast_time", parse_time(t, false)?);
        }
        params.push_opt("min_forecast_hour", options.min_forecast_hour);
        params.push_opt("max_forecast_hour", options.max_forecast_hour);
        if let Some(t) = &options.initialization_time {
            params.push("initialization_time", parse_time(t, true)?);
        }
        Ok(params)
    }

    /// Forecast series at one or more points.
    pub fn point_forecasts(
        &self,
        selection: &ModelSelection,
        options: &PointForecastOptions,
    ) -> Result<PointForecastResponse> {
        let mut params = self.point_params(options)?;
        selection.apply(&mut params);
        self.client
            .get_json(&self.url(selection.model.as_deref(), "points"), &params)
    }

    /// Time-interpolated forecast series at one or more points.
    pub fn point_forecasts_interpolated(
        &self,
        selection: &ModelSelection,
        options: &PointForecastOptions,
    ) -> Result<PointForecastResponse> {
        let mut params = self.point_params(options)?;
        selection.apply(&mut params);
        self.client.get_json(
            &self.url(selection.model.as_deref(), "points_interpolated"),
            &params,
        )
    }

    /// Initialization times currently available.
    pub fn initialization_times(&self, selection: &ModelSelection) -> Result<InitializationTimes> {
        let mut params = QueryParams::new();
        selection.apply(&mut params);
        self.client.get_json(
            &self.url(selection.model.as_deref(), "initialization_times.json"),
            &params,
        )
    }

    /// Archived initialization times, optionally bounded from above.
    pub fn archived_initialization_times(
        &self,
        selection: &ModelSelection,
        page_end: Option<&str>,
    ) -> Result<InitializationTimes> {
        let mut params = QueryParams::new();
        selection.apply(&mut params);
        params.push_opt("page_end", page_end);
        self.client.get_json(
            &self.url(
                selection.model.as_deref(),
                "initialization_times/archived.json",
            ),
            &params,
        )
    }

    /// Forecast hours available for one run.
    pub fn run_information(
        &self,
        selection: &ModelSelection,
        initialization_time: &str,
    ) -> Result<RunInformation> {
        let mut params = QueryParams::new();
        params.push("initialization_time", parse_time(initialization_time, true)?);
        selection.apply(&mut params);
        self.client.get_json(
            &self.url(selection.model.as_deref(), "run_information.json"),
            &params,
        )
    }

    /// Variables and levels the model publishes.
    pub fn variables(&self, selection: &ModelSelection) -> Result<Variables> {
        let mut params = QueryParams::new();
        selection.apply(&mut params);
        self.client.get_json(
            &self.url(selection.model.as_deref(), "variables.json"),
            &params,
        )
    }

    /// Forecast hours per initialization time.
    pub fn forecast_hours(&self, selection: &ModelSelection) -> Result<ForecastHours> {
        let mut params = QueryParams::new();
        selection.apply(&mut params);
        self.client.get_json(
            &self.url(selection.model.as_deref(), "forecast_hours.json"),
            &params,
        )
    }

    /// When each forecast hour finished generating.
    pub fn generation_times(&self, selection: &ModelSelection) -> Result<GenerationTimes> {
        let mut params = QueryParams::new();
        selection.apply(&mut params);
        self.client.get_json(
            &self.url(selection.model.as_deref(), "generation_times.json"),
            &params,
        )
    }

    /// Gridded forecast for one variable at a valid time; the payload is
    /// the netCDF file itself.
    pub fn gridded_forecast(
        &self,
        selection: &ModelSelection,
        variable: &str,
        valid_time: &str,
    ) -> Result<Vec<u8>> {
        validate_gridded_variable(variable)?;
        let mut params = QueryParams::new();
        params.push("time", parse_time(valid_time, false)?);
        selection.apply(&mut params);
        self.client.get_bytes(
            &self.url(selection.model.as_deref(), &format!("gridded/{variable}")),
            &params,
        )
    }

    /// Historical gridded forecast addressed by run and forecast hour.
    pub fn historical_gridded_forecast(
        &self,
        selection: &ModelSelection,
        variable: &str,
        initialization_time: &str,
        forecast_hour: u32,
    ) -> Result<Vec<u8>> {
        validate_gridded_variable(variable)?;
        let mut params = QueryParams::new();
        params.push("initialization_time", parse_time(initialization_time, true)?);
        params.push("forecast_hour", forecast_hour);
        selection.apply(&mut params);
        self.client.get_bytes(
            &self.url(
                selection.model.as_deref(),
                &format!("gridded/historical/{variable}"),
            ),
            &params,
        )
    }

    /// Active tropical cyclone tracks. An empty map means none are active.
    pub fn tropical_cyclones(
        &self,
        selection: &ModelSelection,
        initialization_time: Option<&str>,
        basin: Option<&str>,
    ) -> Result<CycloneMap> {
        let mut params = QueryParams::new();
        if let Some(t) = initialization_time {
            params.push("initialization_time", parse_time(t, true)?);
        }
        if let Some(basin) = basin {
            if !CYCLONE_BASINS.contains(&basin) {
                return Err(WindborneError::validation(format!(
                    "basin should be one of: {}",
                    CYCLONE_BASINS.join(", ")
                )));
            }
            params.push("basin", basin);
        }
        selection.apply(&mut params);
        self.client.get_json(
            &self.url(selection.model.as_deref(), "tropical_cyclones"),
            &params,
        )
    }

    /// Population-weighted degree days per region.
    pub fn degree_days(
        &self,
        selection: &ModelSelection,
        kind: DegreeDayKind,
        initialization_time: &str,
    ) -> Result<DegreeDays> {
        let mut params = QueryParams::new();
        params.push("initialization_time", parse_time(initialization_time, true)?);
        selection.apply(&mut params);
        self.client
            .get_json(&self.url(selection.model.as_deref(), kind.path()), &params)
    }

    /// Calculation times for a derived product (e.g. `degree_days`).
    pub fn calculation_times(
        &self,
        selection: &ModelSelection,
        kind: &str,
    ) -> Result<InitializationTimes> {
        let mut params = QueryParams::new();
        selection.apply(&mut params);
        self.client.get_json(
            &self.url(
                selection.model.as_deref(),
                &format!("calculation_times/{kind}.json"),
            ),
            &params,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_parse_coordinates_strips_whitespace() {
        let (cleaned, pairs) = parse_coordinates("37.7749, -122.4194; 40.7128, -74.0060").unwrap();
        assert_eq!(cleaned, "37.7749,-122.4194;40.7128,-74.0060");
        assert_eq!(pairs, vec![(37.7749, -122.4194), (40.7128, -74.0060)]);
    }

    #[rstest]
    #[case("")]
    #[case("  ")]
    #[case("37.7749")]
    #[case("91.0,0.0")]
    #[case("0.0,181.0")]
    #[case("abc,def")]
    fn test_parse_coordinates_rejects(#[case] input: &str) {
        assert!(parse_coordinates(input).is_err());
    }

    #[rstest]
    #[case("temperature_2m", true)]
    #[case("500/temperature", true)]
    #[case("850/geopotential", true)]
    #[case("wind_u_10m", true)]
    #[case("500/temperature/extra", false)]
    #[case("Temperature", false)]
    #[case("", false)]
    #[case("abc/temperature", false)]
    fn test_gridded_variable_validation(#[case] variable: &str, #[case] valid: bool) {
        assert_eq!(validate_gridded_variable(variable).is_ok(), valid);
    }

    #[test]
    fn test_degree_day_paths() {
        assert_eq!(DegreeDayKind::Heating.path(), "hdd.json");
        assert_eq!(DegreeDayKind::Cooling.path(), "cdd.json");
    }
}
