//! Human-readable stdout rendering for CLI commands.
//!
//! File output goes through [`crate::formats`]; everything here prints.

use crate::models::{
    CurrentLocation, CycloneMap, DegreeDays, ForecastHours, GenerationTimes, InitializationTimes,
    LaunchSite, MissionsResponse, PointForecastResponse, RunInformation, TrackPoint, Variables,
};

/// Render rows as space-aligned columns, headers underlined by a dash rule.
#[must_use]
pub fn format_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.len());
            }
        }
    }
    // Two spaces of gutter between columns
    for width in &mut widths {
        *width += 2;
    }

    let mut out = String::new();
    for (i, header) in headers.iter().enumerate() {
        out.push_str(&format!("{:<width$}", header, width = widths[i]));
    }
    let header_len = out.trim_end().len();
    out = out.trim_end().to_string();
    out.push('\n');
    out.push_str(&"-".repeat(header_len));
    out.push('\n');

    for row in rows {
        let mut line = String::new();
        for (i, cell) in row.iter().enumerate() {
            line.push_str(&format!("{:<width$}", cell, width = widths[i]));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

fn optional_cell(value: Option<f64>) -> String {
    value.map_or_else(String::new, |v| v.to_string())
}

/// The currently-flying missions table.
pub fn print_flying_missions(response: &MissionsResponse) {
    if response.missions.is_empty() {
        println!("No missions are currently flying.");
        return;
    }

    println!("Currently flying missions:\n");
    let rows: Vec<Vec<String>> = response
        .missions
        .iter()
        .enumerate()
        .map(|(i, mission)| {
            vec![
                (i + 1).to_string(),
                mission.id.clone(),
                mission.display_name().to_string(),
            ]
        })
        .collect();
    print!(
        "{}",
        format_table(&["Index", "Mission ID", "Mission Name"], &rows)
    );
}

/// Launch site details as label/value lines.
pub fn print_launch_site(site: &LaunchSite) {
    println!("Mission launch site\n");
    let mut rows = vec![
        ("ID", site.id.clone().unwrap_or_default()),
        ("Latitude", optional_cell(site.latitude)),
        ("Longitude", optional_cell(site.longitude)),
    ];
    for (key, value) in &site.extra {
        rows.push((key.as_str(), json_cell(value)));
    }
    let width = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0) + 2;
    for (key, value) in rows {
        println!("{key:<width$}{value}");
    }
}

pub(crate) fn json_cell(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Current location of one mission.
pub fn print_current_location(location: &CurrentLocation) {
    println!("Current location\n");
    let rows = vec![vec![
        location.latitude.to_string(),
        location.longitude.to_string(),
        optional_cell(location.altitude),
    ]];
    print!(
        "{}",
        format_table(&["Latitude", "Longitude", "Altitude"], &rows)
    );
}

/// A track as a Time/Latitude/Longitude/Altitude table.
pub fn print_track(title: &str, points: &[TrackPoint]) {
    println!("{title}\n");
    let rows: Vec<Vec<String>> = points
        .iter()
        .map(|p| {
            vec![
                p.time_str().to_string(),
                p.latitude.to_string(),
                p.longitude.to_string(),
                optional_cell(p.altitude),
            ]
        })
        .collect();
    print!(
        "{}",
        format_table(&["Time", "Latitude", "Longitude", "Altitude"], &rows)
    );
}

/// Per-coordinate point forecast tables.
pub fn print_point_forecasts(pairs: &[(f64, f64)], response: &PointForecastResponse) {
    for (i, series) in response.forecasts.iter().enumerate() {
        if let Some((lat, lon)) = pairs.get(i) {
            println!("Forecast for ({lat}, {lon})\n");
        }
        let rows: Vec<Vec<String>> = series
            .iter()
            .map(|f| {
                vec![
                    f.time.clone(),
                    optional_cell(f.temperature_2m),
                    optional_cell(f.dewpoint_2m),
                    optional_cell(f.wind_u_10m),
                    optional_cell(f.wind_v_10m),
                    optional_cell(f.pressure_msl),
                    optional_cell(f.precipitation),
                ]
            })
            .collect();
        print!(
            "{}",
            format_table(
                &[
                    "Time",
                    "Temperature (2m)",
                    "Dewpoint (2m)",
                    "Wind U (10m)",
                    "Wind V (10m)",
                    "MSL Pressure",
                    "Precipitation",
                ],
                &rows
            )
        );
        println!();
    }
}

/// Initialization times: the latest plus the full list.
pub fn print_initialization_times(times: &InitializationTimes) {
    if let Some(latest) = &times.latest {
        println!("Latest initialization time: {latest}");
    }
    println!("Available initialization times:");
    for time in &times.available {
        println!(" - {time}");
    }
}

/// Archived initialization times.
pub fn print_archived_initialization_times(times: &InitializationTimes) {
    println!("Available archived initialization times:");
    for time in &times.available {
        println!(" - {time}");
    }
}

/// Calculation times for a derived product.
pub fn print_calculation_times(times: &InitializationTimes) {
    if let Some(latest) = &times.latest {
        println!("Latest calculation time: {latest}");
    }
    println!("Available calculation times:");
    for time in &times.available {
        println!(" - {time}");
    }
}

/// Run information: initialization time and its forecast hours.
pub fn print_run_information(info: &RunInformation) {
    println!("Initialization time: {}", info.initialization_time);
    println!(
        "Available forecast hours: {}",
        info.forecast_hours
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );
}

/// Variables and levels a model publishes.
pub fn print_variables(variables: &Variables) {
    println!("Surface variables:");
    for name in &variables.surface_variables {
        println!(" - {name}");
    }
    println!("Upper variables:");
    for name in &variables.upper_variables {
        println!(" - {name}");
    }
    println!(
        "Levels: {}",
        variables
            .levels
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );
}

/// Forecast hours per initialization time.
pub fn print_forecast_hours(hours: &ForecastHours) {
    println!("Available forecast hours:");
    for (init_time, hours) in &hours.forecast_hours {
        println!(
            " - {init_time}: {}",
            hours
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
}

/// Generation times per initialization time and forecast hour.
pub fn print_generation_times(times: &GenerationTimes) {
    println!("Generation times:");
    for (init_time, by_hour) in &times.generation_times {
        println!(" - {init_time}:");
        for (hour, generated_at) in by_hour {
            println!("   - {hour}: {generated_at}");
        }
    }
}

/// Tropical cyclone tracks as per-cyclone tables.
pub fn print_cyclones(initialization_label: &str, cyclones: &CycloneMap) {
    println!("Tropical Cyclones for initialization time: {initialization_label}\n");
    for (cyclone_id, points) in cyclones {
        println!("Cyclone ID: {cyclone_id}");
        let rows: Vec<Vec<String>> = points
            .iter()
            .map(|p| {
                vec![
                    p.time_str().to_string(),
                    p.latitude.to_string(),
                    p.longitude.to_string(),
                ]
            })
            .collect();
        print!("{}", format_table(&["Time", "Latitude", "Longitude"], &rows));
        println!();
    }
}

/// Degree days as region blocks of date/value lines.
pub fn print_degree_days(degree_days: &DegreeDays) {
    for (region, by_date) in &degree_days.regions {
        println!("{region}:");
        for (date, value) in by_date {
            println!("  {date}: {value}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_alignment() {
        let table = format_table(
            &["Index", "Mission ID", "Mission Name"],
            &[
                vec!["1".into(), "abc-def".into(), "W-1958".into()],
                vec!["2".into(), "x".into(), "Unnamed Mission".into()],
            ],
        );
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "Index  Mission ID  Mission Name");
        assert!(lines[1].chars().all(|c| c == '-'));
        assert!(lines[2].starts_with("1      abc-def     W-1958"));
    }

    #[test]
    fn test_table_grows_with_wide_cells() {
        let table = format_table(
            &["Time", "Latitude"],
            &[vec!["2025-08-01T06:00:00Z".into(), "13.4".into()]],
        );
        let lines: Vec<&str> = table.lines().collect();
        // Header column widened to fit the cell
        assert_eq!(lines[0].find("Latitude").unwrap(), 22);
        assert_eq!(lines[2], "2025-08-01T06:00:00Z  13.4");
    }
}
