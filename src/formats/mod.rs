//! Output format detection and the writers shared by every command.

pub mod little_r;
pub mod netcdf;
pub mod track;

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::config::{OBSERVATION_SUPPORTED_FORMATS, TRACK_SUPPORTED_FORMATS};
use crate::error::WindborneError;
use crate::models::Observation;
use crate::times::format_timestamp;
use crate::Result;

pub use track::TrackMap;

/// CSV column order for observation output
pub const OBSERVATION_CSV_HEADERS: [&str; 12] = [
    "timestamp",
    "time",
    "latitude",
    "longitude",
    "altitude",
    "humidity",
    "mission_name",
    "pressure",
    "specific_humidity",
    "speed_u",
    "speed_v",
    "temperature",
];

/// Every file format the writers know about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Csv,
    LittleR,
    NetCdf,
    Gpx,
    Kml,
    GeoJson,
}

impl OutputFormat {
    /// Detect the format from a file name's extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .ok_or_else(|| {
                WindborneError::unsupported_format(
                    "you have to provide a file type for your filename",
                )
            })?;
        Self::from_token(&extension)
    }

    /// Detect the format from a bare token (`json`, `csv`, `little_r`,
    /// `netcdf`), as used for directory output.
    pub fn from_token(token: &str) -> Result<Self> {
        match token.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "little_r" => Ok(Self::LittleR),
            "nc" | "netcdf" => Ok(Self::NetCdf),
            "gpx" => Ok(Self::Gpx),
            "kml" => Ok(Self::Kml),
            "geojson" => Ok(Self::GeoJson),
            other => Err(WindborneError::unsupported_format(format!(
                "unsupported file format '{other}'; supported formats are: \
                 json, csv, little_r, netcdf, gpx, kml, geojson"
            ))),
        }
    }

    /// The extension used when this crate names files itself.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::LittleR => "little_r",
            Self::NetCdf => "nc",
            Self::Gpx => "gpx",
            Self::Kml => "kml",
            Self::GeoJson => "geojson",
        }
    }
}

/// Create the target's parent directory when it does not exist yet.
fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Write any serializable value as indented JSON (4 spaces, matching the
/// files this tool has always produced).
pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent_dir(path)?;
    let file = fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
    value.serialize(&mut serializer)?;
    writer.flush()?;
    Ok(())
}

fn float_cell(value: Option<f64>) -> String {
    value.map_or_else(|| "None".to_string(), |v| v.to_string())
}

/// Append observation rows to a CSV writer, optionally with the header.
pub fn write_observations_csv<W: Write>(
    writer: W,
    observations: &[Observation],
    write_header: bool,
) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    if write_header {
        csv_writer.write_record(OBSERVATION_CSV_HEADERS)?;
    }
    for obs in observations {
        csv_writer.write_record([
            obs.timestamp.to_string(),
            format_timestamp(obs.timestamp),
            float_cell(obs.latitude),
            float_cell(obs.longitude),
            float_cell(obs.altitude),
            float_cell(obs.humidity),
            obs.mission_name.clone().unwrap_or_else(|| "None".into()),
            float_cell(obs.pressure),
            float_cell(obs.specific_humidity),
            float_cell(obs.speed_u),
            float_cell(obs.speed_v),
            float_cell(obs.temperature),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write a batch of observations to one file, dispatching on extension.
pub fn save_observations(path: &Path, observations: &[Observation]) -> Result<()> {
    if observations.is_empty() {
        return Err(WindborneError::EmptyResponse);
    }
    ensure_parent_dir(path)?;
    match OutputFormat::from_path(path)? {
        OutputFormat::Json => write_json_pretty(path, &observations)?,
        OutputFormat::Csv => {
            let file = fs::File::create(path)?;
            write_observations_csv(file, observations, true)?;
        }
        OutputFormat::LittleR => {
            fs::write(path, little_r::format_observations(observations)?)?;
        }
        OutputFormat::NetCdf => netcdf::save_observations(path, observations)?,
        _ => {
            return Err(WindborneError::unsupported_format(format!(
                "unsupported file format for observations; supported formats are: {}",
                OBSERVATION_SUPPORTED_FORMATS.join(", ")
            )))
        }
    }
    Ok(())
}

/// Write a track map to one file, dispatching on extension.
pub fn save_track(path: &Path, tracks: &TrackMap, require_ids: bool) -> Result<()> {
    if tracks.is_empty() {
        return Err(WindborneError::EmptyResponse);
    }
    ensure_parent_dir(path)?;
    match OutputFormat::from_path(path)? {
        OutputFormat::Json => write_json_pretty(path, tracks)?,
        OutputFormat::Csv => track::save_as_csv(path, tracks, require_ids)?,
        OutputFormat::GeoJson => track::save_as_geojson(path, tracks)?,
        OutputFormat::Gpx => track::save_as_gpx(path, tracks)?,
        OutputFormat::Kml => track::save_as_kml(path, tracks)?,
        OutputFormat::LittleR => fs::write(path, little_r::format_track(tracks)?)?,
        OutputFormat::NetCdf => {
            return Err(WindborneError::unsupported_format(format!(
                "unsupported file format for tracks; supported formats are: {}",
                TRACK_SUPPORTED_FORMATS.join(", ")
            )))
        }
    }
    Ok(())
}

/// Save an arbitrary JSON response as `.json` or `.csv`.
///
/// CSV extraction follows the shape of the Data API envelopes: when
/// `csv_data_key` points at a list of objects that list becomes the rows;
/// otherwise the first embedded list of objects is used, and a flat object
/// becomes a single row.
pub fn save_response(
    path: &Path,
    response: &serde_json::Value,
    csv_data_key: Option<&str>,
) -> Result<()> {
    if response.is_null() {
        return Err(WindborneError::EmptyResponse);
    }
    ensure_parent_dir(path)?;
    match OutputFormat::from_path(path)? {
        OutputFormat::Json => write_json_pretty(path, response)?,
        OutputFormat::Csv => {
            let rows = csv_rows_from_value(response, csv_data_key)?;
            let mut writer = csv::Writer::from_path(path)?;
            writer.write_record(&rows.headers)?;
            for row in &rows.rows {
                let record: Vec<String> = rows
                    .headers
                    .iter()
                    .map(|h| value_cell(row.get(h).unwrap_or(&serde_json::Value::Null)))
                    .collect();
                writer.write_record(&record)?;
            }
            writer.flush()?;
        }
        _ => {
            return Err(WindborneError::unsupported_format(
                "unsupported file format; please use either .json or .csv",
            ))
        }
    }
    Ok(())
}

/// Write degree days as CSV: a `Region` column followed by one column per
/// date (union of all regions' dates, sorted), blank where a region has no
/// value for a date.
pub fn save_degree_days_csv(path: &Path, degree_days: &crate::models::DegreeDays) -> Result<()> {
    if degree_days.regions.is_empty() {
        return Err(WindborneError::EmptyResponse);
    }
    ensure_parent_dir(path)?;

    let dates: std::collections::BTreeSet<&String> = degree_days
        .regions
        .values()
        .flat_map(|by_date| by_date.keys())
        .collect();

    let mut writer = csv::Writer::from_path(path)?;
    let mut header = vec!["Region".to_string()];
    header.extend(dates.iter().map(|d| (*d).clone()));
    writer.write_record(&header)?;

    for (region, by_date) in &degree_days.regions {
        let mut record = vec![region.clone()];
        record.extend(
            dates
                .iter()
                .map(|date| by_date.get(*date).map_or_else(String::new, f64::to_string)),
        );
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

struct CsvRows {
    headers: Vec<String>,
    rows: Vec<serde_json::Map<String, serde_json::Value>>,
}

fn as_object_rows(value: &serde_json::Value) -> Option<Vec<serde_json::Map<String, serde_json::Value>>> {
    let array = value.as_array()?;
    // Forecast responses nest one list per coordinate; flatten the first
    let array = match array.first() {
        Some(serde_json::Value::Array(inner)) => inner,
        _ => array,
    };
    let rows: Option<Vec<_>> = array
        .iter()
        .map(|item| item.as_object().cloned())
        .collect();
    rows.filter(|r| !r.is_empty())
}

fn csv_rows_from_value(response: &serde_json::Value, csv_data_key: Option<&str>) -> Result<CsvRows> {
    let keyed = csv_data_key.and_then(|key| response.get(key));
    if keyed.and_then(serde_json::Value::as_array).is_some_and(Vec::is_empty) {
        return Err(WindborneError::EmptyResponse);
    }
    let rows = keyed
        .and_then(as_object_rows)
        .or_else(|| as_object_rows(response))
        .or_else(|| {
            response.as_object().and_then(|map| {
                map.values()
                    .find_map(as_object_rows)
                    .or_else(|| Some(vec![map.clone()]))
            })
        })
        .ok_or_else(|| {
            WindborneError::unsupported_format("unsupported data structure for CSV output")
        })?;

    let headers: Vec<String> = rows
        .first()
        .map(|first| first.keys().cloned().collect())
        .unwrap_or_default();
    if headers.is_empty() {
        return Err(WindborneError::EmptyResponse);
    }
    Ok(CsvRows { headers, rows })
}

fn value_cell(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "None".to_string(),
        serde_json::Value::String(s) if s.is_empty() => "None".to_string(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn observation(timestamp: i64) -> Observation {
        Observation {
            id: None,
            timestamp,
            latitude: Some(45.0),
            longitude: Some(-122.5),
            altitude: Some(15240.0),
            humidity: None,
            mission_name: Some("W-1958".to_string()),
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
    fn test_format_detection_from_path() {
        let cases = [
            ("out.json", OutputFormat::Json),
            ("out.CSV", OutputFormat::Csv),
            ("out.little_r", OutputFormat::LittleR),
            ("out.nc", OutputFormat::NetCdf),
            ("out.gpx", OutputFormat::Gpx),
            ("out.kml", OutputFormat::Kml),
            ("out.geojson", OutputFormat::GeoJson),
        ];
        for (name, expected) in cases {
            assert_eq!(OutputFormat::from_path(Path::new(name)).unwrap(), expected);
        }
    }

    #[test]
    fn test_extensionless_path_rejected() {
        let err = OutputFormat::from_path(Path::new("output")).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_unknown_token_rejected() {
        assert!(OutputFormat::from_token("parquet").is_err());
        assert_eq!(OutputFormat::from_token("netcdf").unwrap(), OutputFormat::NetCdf);
    }

    #[test]
    fn test_observation_csv_layout() {
        let mut buffer = Vec::new();
        write_observations_csv(&mut buffer, &[observation(1733032800)], true).unwrap();
        let csv = String::from_utf8(buffer).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "timestamp,time,latitude,longitude,altitude,humidity,mission_name,pressure,\
             specific_humidity,speed_u,speed_v,temperature"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("1733032800,2024-12-01 06:00:00,45,-122.5"));
        // Missing humidity renders as None
        assert!(row.contains(",None,W-1958,"));
    }

    #[test]
    fn test_json_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("observations.json");
        let original = vec![observation(1733032800), observation(1733033400)];
        save_observations(&path, &original).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("[\n    {"));
        let decoded: Vec<Observation> = serde_json::from_str(&text).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_save_response_csv_extracts_embedded_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missions.csv");
        let response = json!({
            "missions": [
                {"id": "a", "name": "W-1958"},
                {"id": "b", "name": null},
            ]
        });
        save_response(&path, &response, Some("missions")).unwrap();

        let csv = fs::read_to_string(&path).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next().unwrap(), "id,name");
        assert_eq!(lines.next().unwrap(), "a,W-1958");
        assert_eq!(lines.next().unwrap(), "b,None");
    }

    #[test]
    fn test_save_response_csv_flat_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("location.csv");
        let response = json!({"latitude": 37.4, "longitude": -122.2});
        save_response(&path, &response, None).unwrap();

        let csv = fs::read_to_string(&path).unwrap();
        assert!(csv.starts_with("latitude,longitude"));
        assert!(csv.contains("37.4,-122.2"));
    }

    #[test]
    fn test_save_response_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missions.parquet");
        let err = save_response(&path, &json!({"a": 1}), None).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_degree_days_csv_layout() {
        use crate::models::DegreeDays;
        let dd: DegreeDays = serde_json::from_value(json!({
            "created_at": "2025-08-01T12:00:00.000Z",
            "regions": {
                "Alabama": {"2025-08-01": 0.0, "2025-08-02": 1.5},
                "Wyoming": {"2025-08-02": 3.25},
            }
        }))
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hdd.csv");
        save_degree_days_csv(&path, &dd).unwrap();

        let csv = fs::read_to_string(&path).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next().unwrap(), "Region,2025-08-01,2025-08-02");
        assert_eq!(lines.next().unwrap(), "Alabama,0,1.5");
        // Missing date renders blank
        assert_eq!(lines.next().unwrap(), "Wyoming,,3.25");
    }

    #[test]
    fn test_empty_observations_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("observations.json");
        assert!(matches!(
            save_observations(&path, &[]),
            Err(WindborneError::EmptyResponse)
        ));
        assert!(!path.exists());
    }
}
