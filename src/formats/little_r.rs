//! little_R encoding: the fixed-column sounding format consumed by WRF's
//! obsproc and friends.
//!
//! Field widths follow the published format: `F20.5`-style floats, `A40`
//! strings, `I10` integers, `L10` logicals, with `-888888` as the missing
//! sentinel and `-777777` as the end-of-record marker.

use chrono::{DateTime, Datelike, Timelike};

use crate::error::WindborneError;
use crate::models::{Observation, TrackPoint};
use crate::Result;

/// Missing-value sentinel
const MISSING: f64 = -888888.0;
/// End-of-record marker value
const END_OF_RECORD: f64 = -777777.0;

const END_RECORD: &str = "-777777.00000      0-777777.00000      0-888888.00000      0-888888.00000      0-888888.00000      0-888888.00000      0-888888.00000      0-888888.00000      0-888888.00000      0-888888.00000      0";
const TAIL_RECORD: &str = "     39      0      0";

/// `Fw.d`: right-aligned fixed-point float, blank when absent.
fn fmt_f(value: Option<f64>, width: usize, precision: usize) -> String {
    match value {
        None => " ".repeat(width),
        Some(v) => clip(format!("{v:>width$.precision$}"), width),
    }
}

/// `Iw`: right-aligned integer, blank when absent.
fn fmt_i(value: Option<i64>, width: usize) -> String {
    match value {
        None => " ".repeat(width),
        Some(v) => clip(format!("{v:>width$}"), width),
    }
}

/// `Aw`: string padded to width, left-aligned unless `right`.
fn fmt_a(value: Option<&str>, width: usize, right: bool) -> String {
    match value {
        None => " ".repeat(width),
        Some(s) => {
            let s: String = s.chars().take(width).collect();
            if right {
                format!("{s:>width$}")
            } else {
                format!("{s:<width$}")
            }
        }
    }
}

/// `Lw`: Fortran logical, right-aligned `T`/`F`.
fn fmt_l(value: bool, width: usize) -> String {
    let s = if value { "T" } else { "F" };
    format!("{s:>width$}")
}

fn clip(s: String, width: usize) -> String {
    if s.len() > width {
        s.chars().take(width).collect()
    } else {
        s
    }
}

/// A measured value with its quality-control flag (`F13.5` + `I7`).
fn data_field(value: f64) -> String {
    format!("{}{}", fmt_f(Some(value), 13, 5), fmt_i(Some(0), 7))
}

/// Encode observations as little_R sounding records, one record (header,
/// data line, end line, tail line) per observation.
pub fn format_observations(observations: &[Observation]) -> Result<String> {
    let mut records = String::new();

    for point in observations {
        let observed_at = DateTime::from_timestamp(point.timestamp, 0).ok_or_else(|| {
            WindborneError::validation(format!("timestamp {} is out of range", point.timestamp))
        })?;

        let pressure_pa = point.pressure.map(|hpa| hpa * 100.0).unwrap_or(MISSING);
        let temperature_k = point.temperature.map(|c| c + 273.15).unwrap_or(MISSING);
        let altitude = point.altitude.unwrap_or(MISSING);
        let humidity = point.humidity.unwrap_or(MISSING);
        let speed_u = point.speed_u.unwrap_or(MISSING);
        let speed_v = point.speed_v.unwrap_or(MISSING);

        let mut header = String::new();
        header.push_str(&fmt_f(point.latitude, 20, 5));
        header.push_str(&fmt_f(point.longitude, 20, 5));
        header.push_str(&fmt_a(point.id.as_deref(), 40, false));
        header.push_str(&fmt_a(point.mission_name.as_deref(), 40, false));
        header.push_str(&fmt_a(Some("FM-35 TEMP"), 40, false));
        header.push_str(&fmt_a(Some("WindBorne"), 40, false));
        // Elevation is unknown for a free-flying balloon
        header.push_str(&fmt_f(None, 20, 5));
        // Valid fields, errors, warnings, sequence number, duplicates
        header.push_str(&fmt_i(Some(-888888), 10));
        header.push_str(&fmt_i(Some(0), 10));
        header.push_str(&fmt_i(Some(0), 10));
        header.push_str(&fmt_i(Some(0), 10));
        header.push_str(&fmt_i(Some(0), 10));
        // Is sounding / is bogus / discard
        header.push_str(&fmt_l(true, 10));
        header.push_str(&fmt_l(false, 10));
        header.push_str(&fmt_l(false, 10));
        // Unix time and julian day are left to the preprocessor
        header.push_str(&fmt_i(Some(-888888), 10));
        header.push_str(&fmt_i(Some(-888888), 10));
        header.push_str(&fmt_a(
            Some(&observed_at.format("%Y%m%d%H%M%S").to_string()),
            20,
            true,
        ));
        // SLP, ref pressure, ground temp, SST, sfc pressure, precip,
        // daily max/min T, night min T, 3h/24h pressure change, cloud
        // cover, ceiling, precipitable water: all unmeasured
        for _ in 0..14 {
            header.push_str(&data_field(MISSING));
        }

        let mut data = String::new();
        data.push_str(&data_field(pressure_pa));
        data.push_str(&data_field(altitude));
        data.push_str(&data_field(temperature_k));
        data.push_str(&data_field(MISSING)); // dew point
        data.push_str(&data_field(MISSING)); // wind speed
        data.push_str(&data_field(MISSING)); // wind direction
        data.push_str(&data_field(speed_u));
        data.push_str(&data_field(speed_v));
        data.push_str(&data_field(humidity));
        data.push_str(&data_field(MISSING)); // thickness

        records.push_str(&header);
        records.push('\n');
        records.push_str(&data);
        records.push('\n');
        records.push_str(END_RECORD);
        records.push('\n');
        records.push_str(TAIL_RECORD);
        records.push('\n');
    }

    Ok(records)
}

/// Encode a track map (cyclones, flight paths) as position-only little_R
/// records.
pub fn format_track(tracks: &std::collections::BTreeMap<String, Vec<TrackPoint>>) -> Result<String> {
    let mut records = String::new();

    for (track_id, points) in tracks {
        for point in points {
            let time = point.time.as_deref().ok_or_else(|| {
                WindborneError::validation(format!("track {track_id} has a point without a time"))
            })?;
            let parsed = DateTime::parse_from_rfc3339(time).map_err(|_| {
                WindborneError::validation(format!("track {track_id} has unparseable time {time}"))
            })?;

            records.push_str(&fmt_f(Some(point.latitude), 20, 5));
            records.push_str(&fmt_f(Some(point.longitude), 20, 5));
            records.push_str(&fmt_a(Some("HMS"), 40, false));
            records.push_str(&fmt_i(Some(0), 10));
            records.push_str(&fmt_i(Some(0), 10));
            records.push_str(&fmt_i(Some(0), 10));
            records.push_str(&fmt_i(Some(i64::from(parsed.year())), 10));
            records.push_str(&fmt_i(Some(i64::from(parsed.month())), 10));
            records.push_str(&fmt_i(Some(i64::from(parsed.day())), 10));
            records.push_str(&fmt_i(Some(i64::from(parsed.hour())), 10));
            records.push_str(&fmt_i(Some(0), 10));
            records.push_str(&fmt_i(Some(0), 10));
            records.push_str(&fmt_f(Some(0.0), 10, 3));
            records.push_str(&fmt_a(Some(track_id), 40, false));
            records.push('\n');

            records.push_str(&fmt_f(Some(0.0), 20, 5));
            records.push_str(&fmt_i(Some(1), 10));
            records.push_str(&fmt_f(Some(0.0), 10, 3));
            records.push('\n');

            records.push_str(&fmt_f(Some(MISSING), 13, 5));
            records.push_str(&fmt_f(Some(point.latitude), 13, 5));
            records.push_str(&fmt_f(Some(MISSING), 13, 5));
            records.push_str(&fmt_f(Some(MISSING), 13, 5));
            records.push_str(&fmt_f(Some(MISSING), 13, 5));
            records.push_str(&fmt_f(Some(point.longitude), 13, 5));
            records.push_str(&fmt_i(Some(0), 7));
            records.push('\n');

            records.push_str(&fmt_f(Some(END_OF_RECORD), 13, 5));
            records.push('\n');
        }
    }

    Ok(records)
}
