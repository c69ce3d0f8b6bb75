//! netCDF output for observation batches, following the WMO UASDC / ISARRA
//! style guide: one `obs` dimension, CF-ish variable names and attributes,
//! and a handful of quantities derived from the raw telemetry.

use std::path::Path;

use crate::error::WindborneError;
use crate::models::Observation;
use crate::Result;

/// Conversion from specific humidity in mg/kg to a dimensionless fraction
const MG_PER_KG: f64 = 1_000_000.0;

/// Wind speed from u/v components, m/s.
fn wind_speed(u: f64, v: f64) -> f64 {
    (u * u + v * v).sqrt()
}

/// Meteorological wind direction (degrees the wind blows *from*, clockwise
/// from north) from u/v components.
fn wind_direction(u: f64, v: f64) -> f64 {
    (180.0 + u.atan2(v).to_degrees()).rem_euclid(360.0)
}

/// Mixing ratio (kg/kg) from specific humidity (mg/kg).
fn mixing_ratio(specific_humidity_mg: f64) -> f64 {
    let q = specific_humidity_mg / MG_PER_KG;
    q / (1.0 - q)
}

fn collect(observations: &[Observation], field: impl Fn(&Observation) -> Option<f64>) -> Vec<f64> {
    observations
        .iter()
        .map(|o| field(o).unwrap_or(f64::NAN))
        .collect()
}

/// Write one batch of observations to `path` as netCDF.
///
/// Single-mission batches are tagged as a trajectory with a `flight_id`;
/// multi-mission batches skip the per-flight global attributes.
pub fn save_observations(path: &Path, observations: &[Observation]) -> Result<()> {
    if observations.is_empty() {
        return Err(WindborneError::EmptyResponse);
    }

    let times: Vec<f64> = observations.iter().map(|o| o.timestamp as f64).collect();
    let latitudes = collect(observations, |o| o.latitude);
    let longitudes = collect(observations, |o| o.longitude);
    let altitudes = collect(observations, |o| o.altitude);
    let pressures = collect(observations, |o| o.pressure.map(|hpa| hpa * 100.0));
    let temperatures = collect(observations, |o| o.temperature.map(|c| c + 273.15));
    let speed_u = collect(observations, |o| o.speed_u);
    let speed_v = collect(observations, |o| o.speed_v);
    let specific_humidity = collect(observations, |o| o.specific_humidity);

    let mixing_ratios: Vec<f64> = specific_humidity.iter().map(|&q| mixing_ratio(q)).collect();
    let wind_speeds: Vec<f64> = speed_u
        .iter()
        .zip(&speed_v)
        .map(|(&u, &v)| wind_speed(u, v))
        .collect();
    let wind_directions: Vec<f64> = speed_u
        .iter()
        .zip(&speed_v)
        .map(|(&u, &v)| wind_direction(u, v))
        .collect();

    let mission_names: Vec<&str> = observations.iter().map(Observation::mission_key).collect();
    let first_mission = mission_names[0];
    let is_multi_mission = mission_names.iter().any(|&name| name != first_mission);

    if path.exists() {
        std::fs::remove_file(path)?;
    }
    let mut file = netcdf::create(path)?;
    file.add_dimension("obs", observations.len())?;

    add_float_variable(
        &mut file,
        "time",
        &times,
        "seconds since 1970-01-01T00:00:00",
        "Time",
    )?;
    add_float_variable(&mut file, "lat", &latitudes, "degrees_north", "Latitude")?;
    add_float_variable(&mut file, "lon", &longitudes, "degrees_east", "Longitude")?;
    add_float_variable(
        &mut file,
        "altitude",
        &altitudes,
        "meters_above_sea_level",
        "Altitude",
    )?;
    add_float_variable(
        &mut file,
        "air_pressure",
        &pressures,
        "Pa",
        "Atmospheric Pressure",
    )?;
    add_float_variable(
        &mut file,
        "air_temperature",
        &temperatures,
        "Kelvin",
        "Air Temperature",
    )?;
    add_float_variable(
        &mut file,
        "speed_u",
        &speed_u,
        "m/s",
        "Wind speed in direction of increasing longitude",
    )?;
    add_float_variable(
        &mut file,
        "speed_v",
        &speed_v,
        "m/s",
        "Wind speed in direction of increasing latitude",
    )?;
    {
        let mut var = file.add_variable::<f64>("specific_humidity", &["obs"])?;
        var.put_attribute("units", "mg/kg")?;
        var.put_attribute("long_name", "Specific Humidity")?;
        var.put_attribute("_FillValue", f64::NAN)?;
        var.put_attribute("processing_level", "")?;
        var.put_attribute("Conventions", "CF-1.8, WMO-CF-1.0")?;
        var.put_values(&specific_humidity, ..)?;
    }
    add_float_variable(
        &mut file,
        "humidity_mixing_ratio",
        &mixing_ratios,
        "kg/kg",
        "Humidity Mixing Ratio",
    )?;
    add_float_variable(&mut file, "wind_speed", &wind_speeds, "m/s", "Wind Speed")?;
    add_float_variable(
        &mut file,
        "wind_direction",
        &wind_directions,
        "degrees",
        "Wind Direction",
    )?;

    {
        let mut var = file.add_variable_with_type("mission_name", &["obs"], &netcdf::types::NcVariableType::String)?;
        var.put_attribute("long_name", "Mission name")?;
        var.put_attribute("description", "Which balloon collected the data")?;
        for (i, name) in mission_names.iter().enumerate() {
            var.put_string(name, i)?;
        }
    }

    if !is_multi_mission {
        file.add_attribute("wmo__cf_profile", "FM 303-2024")?;
        file.add_attribute("featureType", "trajectory")?;
        file.add_attribute("flight_id", first_mission)?;
    }
    file.add_attribute("platform_name", "WindBorne Global Sounding Balloon")?;
    file.add_attribute("site_terrain_elevation_height", "not applicable")?;
    file.add_attribute("processing_level", "b1")?;

    Ok(())
}

fn add_float_variable(
    file: &mut netcdf::FileMut,
    name: &str,
    data: &[f64],
    units: &str,
    long_name: &str,
) -> Result<()> {
    let mut var = file.add_variable::<f64>(name, &["obs"])?;
    var.put_attribute("units", units)?;
    var.put_attribute("long_name", long_name)?;
    var.put_attribute("_FillValue", f64::NAN)?;
    var.put_attribute("processing_level", "")?;
    var.put_values(data, ..)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, 10.0, 180.0)] // wind from the south blows northward: u=0, v>0
    #[case(0.0, -10.0, 0.0)]
    #[case(10.0, 0.0, 270.0)]
    #[case(-10.0, 0.0, 90.0)]
    fn test_wind_direction(#[case] u: f64, #[case] v: f64, #[case] expected: f64) {
        assert!((wind_direction(u, v) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_wind_speed() {
        assert!((wind_speed(3.0, 4.0) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_mixing_ratio() {
        // 10 g/kg specific humidity -> ~0.0101 kg/kg mixing ratio
        let mr = mixing_ratio(10_000.0);
        assert!((mr - 0.010101).abs() < 1e-5);
    }

    fn observation(timestamp: i64, mission: &str) -> Observation {
        Observation {
            id: None,
            timestamp,
            latitude: Some(45.0),
            longitude: Some(-122.5),
            altitude: Some(15240.0),
            humidity: Some(31.5),
            mission_name: Some(mission.to_string()),
            mission_id: None,
            pressure: Some(118.5),
            specific_humidity: Some(25.6),
            speed_u: Some(11.9),
            speed_v: Some(-6.1),
            temperature: Some(-51.2),
            updated_at: None,
        }
    }

    #[test]
    fn test_single_mission_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("obs.nc");
        let observations = vec![
            observation(1733032800, "W-1958"),
            observation(1733033400, "W-1958"),
        ];
        save_observations(&path, &observations).unwrap();

        let file = netcdf::open(&path).unwrap();
        let time = file.variable("time").unwrap();
        let values = time.get_values::<f64, _>(..).unwrap();
        assert_eq!(values, vec![1733032800.0, 1733033400.0]);

        // Temperature stored in Kelvin
        let temperature = file.variable("air_temperature").unwrap();
        let kelvin = temperature.get_values::<f64, _>(..).unwrap();
        assert!((kelvin[0] - 221.95).abs() < 1e-9);

        // Pressure stored in Pa
        let pressure = file.variable("air_pressure").unwrap();
        let pa = pressure.get_values::<f64, _>(..).unwrap();
        assert!((pa[0] - 11850.0).abs() < 1e-9);

        let flight_id = file.attribute("flight_id").unwrap();
        assert!(matches!(
            flight_id.value().unwrap(),
            netcdf::AttributeValue::Str(s) if s == "W-1958"
        ));
    }

    #[test]
    fn test_multi_mission_file_skips_flight_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("obs.nc");
        let observations = vec![
            observation(1733032800, "W-1958"),
            observation(1733033400, "W-1960"),
        ];
        save_observations(&path, &observations).unwrap();

        let file = netcdf::open(&path).unwrap();
        assert!(file.attribute("flight_id").is_none());
        assert!(file.attribute("platform_name").is_some());
    }

    #[test]
    fn test_empty_batch_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("obs.nc");
        assert!(matches!(
            save_observations(&path, &[]),
            Err(WindborneError::EmptyResponse)
        ));
    }
}
