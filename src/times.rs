//! Time parsing for the two API families.
//!
//! The Data API takes Unix timestamps; the Forecasts API takes ISO-8601
//! hours. Both accept a handful of human-friendly spellings on the CLI.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike, Utc};

use crate::error::WindborneError;
use crate::Result;

/// Date formats accepted for Data API times
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",     // e.g. 2024-12-05 14:48:00
    "%Y-%m-%d_%H:%M",        // e.g. 2024-12-05_14:48
    "%Y-%m-%dT%H:%M:%S%.fZ", // e.g. 2024-12-05T14:48:00.000Z
];

/// Convert a date string to a Unix timestamp.
///
/// Accepts an integer timestamp as-is, otherwise one of the supported
/// formats, all interpreted as UTC. Times in the future are rejected.
pub fn to_unix_timestamp(input: &str) -> Result<i64> {
    if let Ok(ts) = input.parse::<i64>() {
        return Ok(ts);
    }

    for fmt in TIMESTAMP_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, fmt) {
            let dt = naive.and_utc();
            reject_future(dt)?;
            return Ok(dt.timestamp());
        }
    }

    Err(WindborneError::validation(format!(
        "invalid date format '{input}'; please use one of the supported formats:\n\
         - YYYY-MM-DD HH:MM:SS\n\
         - YYYY-MM-DD_HH:MM\n\
         - YYYY-MM-DDTHH:MM:SS.fffZ"
    )))
}

/// Convenience wrapper for optional CLI arguments.
pub fn to_unix_timestamp_opt(input: Option<&str>) -> Result<Option<i64>> {
    input.map(to_unix_timestamp).transpose()
}

/// Parse and validate a forecast time, returning the canonical
/// `YYYY-MM-DDTHH:00:00` form the Forecasts API expects.
///
/// Accepts the compact `YYYYMMDDHH` form or ISO-8601 prefixes. With
/// `init_time` set, the hour must be a model cycle (00, 06, 12 or 18).
pub fn parse_time(input: &str, init_time: bool) -> Result<String> {
    let parsed = parse_forecast_datetime(input)?;

    if init_time && !matches!(parsed.hour(), 0 | 6 | 12 | 18) {
        return Err(WindborneError::validation(
            "initialization time hour must be 00, 06, 12, or 18",
        ));
    }

    reject_future(parsed.and_utc())?;

    Ok(parsed.format("%Y-%m-%dT%H:00:00").to_string())
}

fn parse_forecast_datetime(input: &str) -> Result<NaiveDateTime> {
    // Compact format first (YYYYMMDDHH)
    if input.len() == 10 && input.bytes().all(|b| b.is_ascii_digit()) {
        let date = NaiveDate::parse_from_str(&input[..8], "%Y%m%d");
        let hour: std::result::Result<u32, _> = input[8..].parse();
        if let (Ok(date), Ok(hour)) = (date, hour) {
            if let Some(dt) = date.and_hms_opt(hour, 0, 0) {
                return Ok(dt);
            }
        }
        return Err(WindborneError::validation(format!(
            "invalid date values in '{input}'"
        )));
    }

    // ISO prefixes, optionally with a trailing Z
    let trimmed = input.trim_end_matches('Z');
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(dt);
        }
    }
    // Bare hour prefix (YYYY-MM-DDTHH)
    if trimmed.len() == 13 {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&format!("{trimmed}:00"), "%Y-%m-%dT%H:%M") {
            return Ok(dt);
        }
    }

    Err(WindborneError::validation(format!(
        "invalid date format '{input}'; please use one of these formats:\n\
         - compact: 'YYYYMMDDHH' (e.g. 2024073112)\n\
         - ISO: 'YYYY-MM-DDTHH' or 'YYYY-MM-DDTHH:00:00'"
    )))
}

fn reject_future(dt: DateTime<Utc>) -> Result<()> {
    if dt > Utc::now() {
        return Err(WindborneError::validation(format!(
            "time {dt} is in the future"
        )));
    }
    Ok(())
}

/// Render a Unix timestamp as `YYYY-MM-DD HH:MM:SS` UTC (the CSV `time`
/// column), or an empty string when out of range.
#[must_use]
pub fn format_timestamp(ts: i64) -> String {
    match DateTime::<Utc>::from_timestamp(ts, 0) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("2024-12-05 14:48:00", 1733410080)]
    #[case("2024-12-05_14:48", 1733410080)]
    #[case("2024-12-05T14:48:00.000Z", 1733410080)]
    #[case("1733410080", 1733410080)]
    fn test_to_unix_timestamp_formats(#[case] input: &str, #[case] expected: i64) {
        assert_eq!(to_unix_timestamp(input).unwrap(), expected);
    }

    #[test]
    fn test_to_unix_timestamp_rejects_garbage() {
        let err = to_unix_timestamp("05/12/2024").unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("YYYY-MM-DD_HH:MM"));
    }

    #[test]
    fn test_to_unix_timestamp_rejects_future() {
        let err = to_unix_timestamp("2124-01-01 00:00:00").unwrap_err();
        assert!(err.to_string().contains("future"));
    }

    #[rstest]
    #[case("2024073112", "2024-07-31T12:00:00")]
    #[case("2024-07-31T12", "2024-07-31T12:00:00")]
    #[case("2024-07-31T12:00:00", "2024-07-31T12:00:00")]
    #[case("2024-07-31T12:00:00Z", "2024-07-31T12:00:00")]
    fn test_parse_time_formats(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(parse_time(input, false).unwrap(), expected);
    }

    #[test]
    fn test_parse_time_truncates_to_hour() {
        assert_eq!(
            parse_time("2024-07-31T12:30", false).unwrap(),
            "2024-07-31T12:00:00"
        );
    }

    #[test]
    fn test_parse_time_init_hour_validation() {
        assert!(parse_time("2024073106", true).is_ok());
        let err = parse_time("2024073107", true).unwrap_err();
        assert!(err.to_string().contains("00, 06, 12, or 18"));
    }

    #[test]
    fn test_parse_time_rejects_bad_hour() {
        assert!(parse_time("2024073125", false).is_err());
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(1733032800), "2024-12-01 06:00:00");
    }

    #[test]
    fn test_optional_passthrough() {
        assert_eq!(to_unix_timestamp_opt(None).unwrap(), None);
        assert_eq!(
            to_unix_timestamp_opt(Some("1733032800")).unwrap(),
            Some(1733032800)
        );
    }
}
