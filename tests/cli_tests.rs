//! CLI smoke tests: argument surface and exit-code contract, no network.

use std::process::{Command, Output};

fn run(args: &[&str], client_id: Option<&str>, api_key: Option<&str>) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_windborne"));
    command.args(args);
    command.env_remove("WB_CLIENT_ID").env_remove("WB_API_KEY");
    if let Some(client_id) = client_id {
        command.env("WB_CLIENT_ID", client_id);
    }
    if let Some(api_key) = api_key {
        command.env("WB_API_KEY", api_key);
    }
    command.output().expect("failed to run windborne binary")
}

const CLIENT_ID: &str = "windborne_client";
const API_KEY: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"; // 32 chars

#[test]
fn test_help_lists_every_command() {
    let output = run(&["--help"], None, None);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in [
        "observations",
        "super-observations",
        "poll-observations",
        "flying-missions",
        "launch-site",
        "predict-path",
        "current-location",
        "flight-path",
        "points",
        "init-times",
        "gridded",
        "hist-gridded",
        "tropical-cyclones",
        "hdd",
        "cdd",
        "calculation-times",
        "dd-metadata",
    ] {
        assert!(stdout.contains(command), "help is missing '{command}'");
    }
}

#[test]
fn test_missing_credentials_exit_80() {
    let output = run(&["observations-page", "2024-12-01_06:00"], None, None);
    assert_eq!(output.status.code(), Some(80));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr
        .contains("set your Client ID and API key by setting the environment variables"));
}

#[test]
fn test_missing_api_key_exit_91() {
    let output = run(
        &["observations-page", "2024-12-01_06:00"],
        Some(CLIENT_ID),
        None,
    );
    assert_eq!(output.status.code(), Some(91));
}

#[test]
fn test_swapped_credentials_exit_95() {
    let output = run(
        &["observations-page", "2024-12-01_06:00"],
        Some(API_KEY),
        Some(CLIENT_ID),
    );
    assert_eq!(output.status.code(), Some(95));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("swapped"));
}

#[test]
fn test_short_api_key_exit_94() {
    let output = run(
        &["observations-page", "2024-12-01_06:00"],
        Some(CLIENT_ID),
        Some("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"), // 31 chars
    );
    assert_eq!(output.status.code(), Some(94));
}

#[test]
fn test_invalid_time_exit_2() {
    let output = run(
        &["observations", "garbage-time", "out.json"],
        Some(CLIENT_ID),
        Some(API_KEY),
    );
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("YYYY-MM-DD_HH:MM"));
}

#[test]
fn test_unknown_output_format_exit_4() {
    let output = run(
        &[
            "observations",
            "2024-12-01_06:00",
            "2024-12-01_07:00",
            "parquet",
            "-d",
            "out_dir",
        ],
        Some(CLIENT_ID),
        Some(API_KEY),
    );
    assert_eq!(output.status.code(), Some(4));
}

#[test]
fn test_invalid_basin_rejected_without_network() {
    let output = run(
        &["tropical-cyclones", "--basin", "XX"],
        Some(CLIENT_ID),
        Some(API_KEY),
    );
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("NA, EP, WP, NI, SI, AU, SP"));
}

#[test]
fn test_init_time_hour_validated_without_network() {
    let output = run(
        &["hdd", "2025080107"],
        Some(CLIENT_ID),
        Some(API_KEY),
    );
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("00, 06, 12, or 18"));
}

#[test]
fn test_gridded_variable_validated_without_network() {
    let output = run(
        &["gridded", "Bad/Variable", "2024073112", "out.nc"],
        Some(CLIENT_ID),
        Some(API_KEY),
    );
    assert_eq!(output.status.code(), Some(2));
}
