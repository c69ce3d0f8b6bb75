//! Command line interface: one subcommand per API operation.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::client::ApiClient;
use crate::data_api::{DataApi, ObservationKind, ObservationOutput, ObservationsQuery};
use crate::display;
use crate::error::WindborneError;
use crate::forecasts_api::{
    parse_coordinates, DegreeDayKind, ForecastsApi, ModelSelection, PointForecastOptions,
};
use crate::formats::{self, OutputFormat, TrackMap};
use crate::times::{to_unix_timestamp, to_unix_timestamp_opt};
use crate::{data_api, Result};

#[derive(Parser)]
#[command(
    name = "windborne",
    version,
    about = "WindBorne Data and Forecasts API command line interface"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Get observations within a time range
    Observations(ObservationArgs),

    /// Print one page of observations as raw JSON
    #[command(name = "observations-page", alias = "observations_page")]
    ObservationsPage(PageArgs),

    /// Get super observations within a time range
    #[command(name = "super-observations", alias = "super_observations")]
    SuperObservations(SuperObservationArgs),

    /// Print one page of super observations as raw JSON
    #[command(name = "super-observations-page", alias = "super_observations_page")]
    SuperObservationsPage(PageArgs),

    /// Continuously poll observations and append them to the output
    #[command(name = "poll-observations", alias = "poll_observations")]
    PollObservations(PollArgs),

    /// Continuously poll super observations and append them to the output
    #[command(name = "poll-super-observations", alias = "poll_super_observations")]
    PollSuperObservations(PollArgs),

    /// Get currently flying missions
    #[command(name = "flying-missions", alias = "flying_missions")]
    FlyingMissions {
        /// Output file (.json or .csv)
        output: Option<PathBuf>,
    },

    /// Get a mission's launch site
    #[command(name = "launch-site", alias = "launch_site")]
    LaunchSite {
        mission_id: String,
        /// Output file (.json or .csv)
        output: Option<PathBuf>,
    },

    /// Get the predicted flight path for a flying mission
    #[command(name = "predict-path", alias = "predict_path")]
    PredictPath {
        mission_id: String,
        /// Output file (.json, .csv, .geojson, .gpx, .kml or .little_r)
        output: Option<PathBuf>,
    },

    /// Get the current location of a flying mission
    #[command(name = "current-location", alias = "current_location")]
    CurrentLocation {
        mission_id: String,
        /// Output file (.json or .csv)
        output: Option<PathBuf>,
    },

    /// Get the path a mission has flown so far
    #[command(name = "flight-path", alias = "flight_path")]
    FlightPath {
        mission_id: String,
        /// Output file (.json, .csv, .geojson, .gpx, .kml or .little_r)
        output: Option<PathBuf>,
    },

    /// Get the forecast at one or more points
    Points(PointsArgs),

    /// Get the time-interpolated forecast at one or more points
    #[command(name = "points-interpolated", alias = "points_interpolated")]
    PointsInterpolated(PointsArgs),

    /// List available initialization times
    #[command(name = "init-times", alias = "init_times")]
    InitTimes {
        #[command(flatten)]
        model: ModelArgs,
    },

    /// List archived initialization times
    #[command(name = "archived-init-times", alias = "archived_init_times")]
    ArchivedInitTimes {
        #[command(flatten)]
        model: ModelArgs,
        /// Only list initialization times at or before this time
        #[arg(long)]
        page_end: Option<String>,
    },

    /// Show the forecast hours available for one run
    #[command(name = "run-information", alias = "run_information")]
    RunInformation {
        /// Initialization time (YYYYMMDDHH or ISO-8601)
        initialization_time: String,
        #[command(flatten)]
        model: ModelArgs,
    },

    /// List the variables and levels a model publishes
    Variables {
        #[command(flatten)]
        model: ModelArgs,
    },

    /// List forecast hours per initialization time
    #[command(name = "forecast-hours", alias = "forecast_hours")]
    ForecastHours {
        #[command(flatten)]
        model: ModelArgs,
    },

    /// List generation times per initialization time and forecast hour
    #[command(name = "generation-times", alias = "generation_times")]
    GenerationTimes {
        #[command(flatten)]
        model: ModelArgs,
    },

    /// Download a gridded forecast variable as netCDF
    Gridded {
        /// Variable name, optionally level-scoped (e.g. 500/temperature)
        variable: String,
        /// Valid time (YYYYMMDDHH or ISO-8601)
        valid_time: String,
        /// Output file (.nc)
        output: PathBuf,
        #[command(flatten)]
        model: ModelArgs,
    },

    /// Download a historical gridded forecast as netCDF
    #[command(name = "hist-gridded", alias = "hist_gridded")]
    HistGridded {
        /// Variable name, optionally level-scoped (e.g. 500/temperature)
        variable: String,
        /// Initialization time (hour must be 00, 06, 12 or 18)
        initialization_time: String,
        /// Hours after the initialization time
        forecast_hour: u32,
        /// Output file (.nc)
        output: PathBuf,
        #[command(flatten)]
        model: ModelArgs,
    },

    /// Get tropical cyclone forecasts
    #[command(
        name = "tropical-cyclones",
        alias = "tropical_cyclones",
        alias = "cyclones"
    )]
    TropicalCyclones {
        /// Initialization time, or an output file when no time is given
        #[arg(value_name = "INIT_TIME_OR_OUTPUT")]
        first: Option<String>,
        /// Output file (.json, .csv, .geojson, .gpx, .kml or .little_r)
        second: Option<String>,
        /// Basin filter (NA, EP, WP, NI, SI, AU, SP)
        #[arg(long)]
        basin: Option<String>,
        #[command(flatten)]
        model: ModelArgs,
    },

    /// Population-weighted heating degree days
    Hdd(DegreeDayArgs),

    /// Population-weighted cooling degree days
    #[command(alias = "cdds")]
    Cdd(DegreeDayArgs),

    /// List calculation times for a derived product (e.g. degree_days)
    #[command(name = "calculation-times", alias = "calculation_times")]
    CalculationTimes {
        /// Product kind (e.g. degree_days)
        kind: String,
        #[command(flatten)]
        model: ModelArgs,
    },

    /// Show when a degree-day product was calculated
    #[command(name = "dd-metadata", alias = "dd_metadata")]
    DdMetadata {
        /// Initialization time (hour must be 00, 06, 12 or 18)
        initialization_time: String,
        #[command(flatten)]
        model: ModelArgs,
    },
}

#[derive(Args)]
pub struct ObservationArgs {
    /// Start of the time range (YYYY-MM-DD_HH:MM)
    pub start_time: String,
    /// End of the time range; open-ended when omitted
    pub end_time: Option<String>,
    /// Output file (name.ext), or a format token (json, csv, little_r,
    /// netcdf) for per-mission bucket files
    pub output: Option<String>,
    /// Write bucket files into this directory
    #[arg(short = 'd', long)]
    pub output_dir: Option<PathBuf>,
    /// Hours of observations per bucket file
    #[arg(short = 'b', long, default_value_t = crate::buckets::DEFAULT_BUCKET_HOURS)]
    pub bucket_hours: f64,
    /// Filter by mission ID
    #[arg(short = 'm', long)]
    pub mission_id: Option<String>,
    /// Minimum latitude filter
    #[arg(long, allow_negative_numbers = true)]
    pub min_latitude: Option<f64>,
    /// Maximum latitude filter
    #[arg(long, allow_negative_numbers = true)]
    pub max_latitude: Option<f64>,
    /// Minimum longitude filter
    #[arg(long, allow_negative_numbers = true)]
    pub min_longitude: Option<f64>,
    /// Maximum longitude filter
    #[arg(long, allow_negative_numbers = true)]
    pub max_longitude: Option<f64>,
    /// Include observation IDs
    #[arg(long)]
    pub include_ids: bool,
    /// Include mission names
    #[arg(long)]
    pub include_mission_name: bool,
    /// Include update timestamps
    #[arg(long)]
    pub include_updated_at: bool,
}

#[derive(Args)]
pub struct SuperObservationArgs {
    /// Start of the time range (YYYY-MM-DD_HH:MM)
    pub start_time: String,
    /// End of the time range; open-ended when omitted
    pub end_time: Option<String>,
    /// Output file (name.ext), or a format token (json, csv, little_r,
    /// netcdf) for per-mission bucket files
    pub output: Option<String>,
    /// Write bucket files into this directory
    #[arg(short = 'd', long)]
    pub output_dir: Option<PathBuf>,
    /// Hours of observations per bucket file
    #[arg(short = 'b', long, default_value_t = crate::buckets::DEFAULT_BUCKET_HOURS)]
    pub bucket_hours: f64,
    /// Filter by mission ID
    #[arg(short = 'm', long)]
    pub mission_id: Option<String>,
    /// Include observation IDs
    #[arg(long)]
    pub include_ids: bool,
    /// Include mission names
    #[arg(long)]
    pub include_mission_name: bool,
    /// Include update timestamps
    #[arg(long)]
    pub include_updated_at: bool,
}

#[derive(Args)]
pub struct PageArgs {
    /// Page cursor (YYYY-MM-DD_HH:MM or a Unix timestamp)
    pub since: String,
    /// Minimum time filter
    #[arg(long)]
    pub min_time: Option<String>,
    /// Maximum time filter
    #[arg(long)]
    pub max_time: Option<String>,
    /// Filter by mission ID
    #[arg(short = 'm', long)]
    pub mission_id: Option<String>,
    /// Include observation IDs
    #[arg(long)]
    pub include_ids: bool,
    /// Include mission names
    #[arg(long)]
    pub include_mission_name: bool,
    /// Include update timestamps
    #[arg(long)]
    pub include_updated_at: bool,
}

#[derive(Args)]
pub struct PollArgs {
    /// Start of the stream (YYYY-MM-DD_HH:MM)
    pub start_time: String,
    /// Output .csv file, or a format token for per-mission bucket files
    pub output: String,
    /// Write bucket files into this directory
    #[arg(short = 'd', long)]
    pub output_dir: Option<PathBuf>,
    /// Hours of observations per bucket file
    #[arg(short = 'b', long, default_value_t = crate::buckets::DEFAULT_BUCKET_HOURS)]
    pub bucket_hours: f64,
    /// Seconds to sleep when the stream is drained
    #[arg(short = 'i', long, default_value_t = 60)]
    pub interval: u64,
    /// Filter by mission ID
    #[arg(short = 'm', long)]
    pub mission_id: Option<String>,
}

#[derive(Args)]
pub struct PointsArgs {
    /// Coordinate pairs: "latA,lonA;latB,lonB"
    #[arg(allow_hyphen_values = true)]
    pub coordinates: String,
    /// Output file (.json or .csv)
    pub output: Option<PathBuf>,
    /// Minimum forecast valid time
    #[arg(long)]
    pub min_forecast_time: Option<String>,
    /// Maximum forecast valid time
    #[arg(long)]
    pub max_forecast_time: Option<String>,
    /// Minimum forecast hour
    #[arg(long)]
    pub min_forecast_hour: Option<u32>,
    /// Maximum forecast hour
    #[arg(long)]
    pub max_forecast_hour: Option<u32>,
    /// Initialization time (hour must be 00, 06, 12 or 18)
    #[arg(short = 'i', long)]
    pub init_time: Option<String>,
    #[command(flatten)]
    pub model: ModelArgs,
}

#[derive(Args, Default)]
pub struct ModelArgs {
    /// Forecast model (e.g. wm4)
    #[arg(short = 'm', long)]
    pub model: Option<String>,
    /// Ensemble member (e.g. 1, mean)
    #[arg(long)]
    pub ens_member: Option<String>,
    /// Use the intracycle run
    #[arg(long)]
    pub intracycle: bool,
}

impl ModelArgs {
    fn selection(&self) -> ModelSelection {
        ModelSelection {
            model: self.model.clone(),
            ens_member: self.ens_member.clone(),
            intracycle: self.intracycle,
        }
    }
}

#[derive(Args)]
pub struct DegreeDayArgs {
    /// Initialization time (hour must be 00, 06, 12 or 18)
    pub initialization_time: String,
    /// Output file (.csv or .json)
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,
    #[command(flatten)]
    pub model: ModelArgs,
}

/// Users habitually write `observations start out.json`; when the second
/// positional is clearly an output target, shift it over.
fn split_end_and_output(
    end_time: Option<String>,
    output: Option<String>,
) -> (Option<String>, Option<String>) {
    match (end_time, output) {
        (Some(maybe_output), None) if looks_like_output(&maybe_output) => {
            (None, Some(maybe_output))
        }
        pair => pair,
    }
}

fn looks_like_output(arg: &str) -> bool {
    arg.contains('.') && to_unix_timestamp(arg).is_err() || OutputFormat::from_token(arg).is_ok()
}

fn resolve_output(
    output: Option<String>,
    output_dir: Option<PathBuf>,
    bucket_hours: f64,
) -> Result<ObservationOutput> {
    match (output, output_dir) {
        (Some(token), Some(dir)) => Ok(ObservationOutput::Directory {
            dir,
            format: OutputFormat::from_token(&token)?,
            bucket_hours,
        }),
        (None, Some(dir)) => Ok(ObservationOutput::Directory {
            dir,
            format: OutputFormat::Json,
            bucket_hours,
        }),
        (Some(target), None) => {
            if target.contains('.') {
                Ok(ObservationOutput::File(PathBuf::from(target)))
            } else {
                Ok(ObservationOutput::Directory {
                    dir: PathBuf::from("."),
                    format: OutputFormat::from_token(&target)?,
                    bucket_hours,
                })
            }
        }
        (None, None) => Ok(ObservationOutput::Stdout),
    }
}

/// Run one parsed command to completion.
pub fn run(cli: Cli) -> Result<()> {
    let client = ApiClient::new()?;

    match cli.command {
        Commands::Observations(args) => {
            let api = DataApi::new(&client);
            let start = to_unix_timestamp(&args.start_time)?;
            let (end_time, output) = split_end_and_output(args.end_time, args.output);
            let end = to_unix_timestamp_opt(end_time.as_deref())?;
            let query = ObservationsQuery {
                mission_id: args.mission_id,
                min_latitude: args.min_latitude,
                max_latitude: args.max_latitude,
                min_longitude: args.min_longitude,
                max_longitude: args.max_longitude,
                include_ids: args.include_ids,
                include_mission_name: args.include_mission_name,
                include_updated_at: args.include_updated_at,
                ..Default::default()
            };
            let output = resolve_output(output, args.output_dir, args.bucket_hours)?;
            data_api::run_fetch(
                &api,
                ObservationKind::Observations,
                &query,
                start,
                end,
                &output,
            )
        }

        Commands::SuperObservations(args) => {
            let api = DataApi::new(&client);
            let start = to_unix_timestamp(&args.start_time)?;
            let (end_time, output) = split_end_and_output(args.end_time, args.output);
            let end = to_unix_timestamp_opt(end_time.as_deref())?;
            let query = ObservationsQuery {
                mission_id: args.mission_id,
                include_ids: args.include_ids,
                include_mission_name: args.include_mission_name,
                include_updated_at: args.include_updated_at,
                ..Default::default()
            };
            let output = resolve_output(output, args.output_dir, args.bucket_hours)?;
            data_api::run_fetch(&api, ObservationKind::Super, &query, start, end, &output)
        }

        Commands::ObservationsPage(args) => run_page(&client, ObservationKind::Observations, args),
        Commands::SuperObservationsPage(args) => run_page(&client, ObservationKind::Super, args),

        Commands::PollObservations(args) => run_poll(&client, ObservationKind::Observations, args),
        Commands::PollSuperObservations(args) => run_poll(&client, ObservationKind::Super, args),

        Commands::FlyingMissions { output } => {
            let api = DataApi::new(&client);
            let response = api.flying_missions()?;
            match output {
                Some(path) => {
                    formats::save_response(&path, &serde_json::to_value(&response)?, Some("missions"))?;
                    println!("Saved to {}", path.display());
                }
                None => display::print_flying_missions(&response),
            }
            Ok(())
        }

        Commands::LaunchSite { mission_id, output } => {
            let api = DataApi::new(&client);
            let response = api.launch_site(&mission_id)?;
            match output {
                Some(path) => {
                    formats::save_response(
                        &path,
                        &serde_json::to_value(&response)?,
                        Some("launch_site"),
                    )?;
                    println!("Saved to {}", path.display());
                }
                None => display::print_launch_site(&response.launch_site),
            }
            Ok(())
        }

        Commands::PredictPath { mission_id, output } => {
            let api = DataApi::new(&client);
            let flying = api.flying_missions()?;
            if !flying.missions.iter().any(|m| m.id == mission_id) {
                println!(
                    "Provided mission ID '{mission_id}' does not belong to a mission that is \
                     currently flying."
                );
                display::print_flying_missions(&flying);
                return Ok(());
            }

            let response = api.predicted_path(&mission_id)?;
            let mut tracks = TrackMap::new();
            tracks.insert(mission_id, response.prediction);
            match output {
                Some(path) => {
                    formats::save_track(&path, &tracks, false)?;
                    println!("Saved to {}", path.display());
                }
                None => {
                    let points = tracks.values().next().map(Vec::as_slice).unwrap_or(&[]);
                    display::print_track("Predicted flight path", points);
                }
            }
            Ok(())
        }

        Commands::CurrentLocation { mission_id, output } => {
            let api = DataApi::new(&client);
            let location = api.current_location(&mission_id)?;
            match output {
                Some(path) => {
                    formats::save_response(&path, &serde_json::to_value(&location)?, None)?;
                    println!("Saved to {}", path.display());
                }
                None => display::print_current_location(&location),
            }
            Ok(())
        }

        Commands::FlightPath { mission_id, output } => {
            let api = DataApi::new(&client);
            let response = api.flight_path(&mission_id)?;
            let mut tracks = TrackMap::new();
            tracks.insert(mission_id, response.flight_data);
            match output {
                Some(path) => {
                    formats::save_track(&path, &tracks, false)?;
                    println!("Saved to {}", path.display());
                }
                None => {
                    let points = tracks.values().next().map(Vec::as_slice).unwrap_or(&[]);
                    display::print_track("Flight path", points);
                }
            }
            Ok(())
        }

        Commands::Points(args) => run_points(&client, args, false),
        Commands::PointsInterpolated(args) => run_points(&client, args, true),

        Commands::InitTimes { model } => {
            let api = ForecastsApi::new(&client);
            let times = api.initialization_times(&model.selection())?;
            display::print_initialization_times(&times);
            Ok(())
        }

        Commands::ArchivedInitTimes { model, page_end } => {
            let api = ForecastsApi::new(&client);
            let times =
                api.archived_initialization_times(&model.selection(), page_end.as_deref())?;
            display::print_archived_initialization_times(&times);
            Ok(())
        }

        Commands::RunInformation {
            initialization_time,
            model,
        } => {
            let api = ForecastsApi::new(&client);
            let info = api.run_information(&model.selection(), &initialization_time)?;
            display::print_run_information(&info);
            Ok(())
        }

        Commands::Variables { model } => {
            let api = ForecastsApi::new(&client);
            let variables = api.variables(&model.selection())?;
            display::print_variables(&variables);
            Ok(())
        }

        Commands::ForecastHours { model } => {
            let api = ForecastsApi::new(&client);
            let hours = api.forecast_hours(&model.selection())?;
            display::print_forecast_hours(&hours);
            Ok(())
        }

        Commands::GenerationTimes { model } => {
            let api = ForecastsApi::new(&client);
            let times = api.generation_times(&model.selection())?;
            display::print_generation_times(&times);
            Ok(())
        }

        Commands::Gridded {
            variable,
            valid_time,
            output,
            model,
        } => {
            let api = ForecastsApi::new(&client);
            let payload = api.gridded_forecast(&model.selection(), &variable, &valid_time)?;
            let path = with_nc_extension(output);
            std::fs::write(&path, payload)?;
            println!("Saved to {}", path.display());
            Ok(())
        }

        Commands::HistGridded {
            variable,
            initialization_time,
            forecast_hour,
            output,
            model,
        } => {
            let api = ForecastsApi::new(&client);
            let payload = api.historical_gridded_forecast(
                &model.selection(),
                &variable,
                &initialization_time,
                forecast_hour,
            )?;
            let path = with_nc_extension(output);
            std::fs::write(&path, payload)?;
            println!("Saved to {}", path.display());
            Ok(())
        }

        Commands::TropicalCyclones {
            first,
            second,
            basin,
            model,
        } => run_cyclones(&client, first, second, basin, &model),

        Commands::Hdd(args) => run_degree_days(&client, DegreeDayKind::Heating, args),
        Commands::Cdd(args) => run_degree_days(&client, DegreeDayKind::Cooling, args),

        Commands::CalculationTimes { kind, model } => {
            let api = ForecastsApi::new(&client);
            let times = api.calculation_times(&model.selection(), &kind)?;
            display::print_calculation_times(&times);
            Ok(())
        }

        Commands::DdMetadata {
            initialization_time,
            model,
        } => {
            let api = ForecastsApi::new(&client);
            let response = api.degree_days(
                &model.selection(),
                DegreeDayKind::Heating,
                &initialization_time,
            )?;
            match response.created_at {
                Some(created_at) => println!("Created at {created_at}"),
                None => println!("No metadata available for this initialization time."),
            }
            Ok(())
        }
    }
}

fn run_page(client: &ApiClient, kind: ObservationKind, args: PageArgs) -> Result<()> {
    let api = DataApi::new(client);
    let query = ObservationsQuery {
        since: Some(to_unix_timestamp(&args.since)?),
        min_time: to_unix_timestamp_opt(args.min_time.as_deref())?,
        max_time: to_unix_timestamp_opt(args.max_time.as_deref())?,
        mission_id: args.mission_id,
        include_ids: args.include_ids,
        include_mission_name: args.include_mission_name,
        include_updated_at: args.include_updated_at,
        ..Default::default()
    };
    let page = api.page(kind, &query)?;
    println!("{}", serde_json::to_string_pretty(&page)?);
    Ok(())
}

fn run_poll(client: &ApiClient, kind: ObservationKind, args: PollArgs) -> Result<()> {
    let api = DataApi::new(client);
    let start = to_unix_timestamp(&args.start_time)?;
    let query = ObservationsQuery {
        mission_id: args.mission_id,
        include_mission_name: true,
        ..Default::default()
    };
    let output = resolve_output(Some(args.output), args.output_dir, args.bucket_hours)?;
    data_api::run_poll(
        &api,
        kind,
        &query,
        start,
        &output,
        Duration::from_secs(args.interval),
    )
}

fn run_points(client: &ApiClient, args: PointsArgs, interpolated: bool) -> Result<()> {
    let api = ForecastsApi::new(client);
    let (_, pairs) = parse_coordinates(&args.coordinates)?;
    let options = PointForecastOptions {
        coordinates: args.coordinates,
        min_forecast_time: args.min_forecast_time,
        max_forecast_time: args.max_forecast_time,
        min_forecast_hour: args.min_forecast_hour,
        max_forecast_hour: args.max_forecast_hour,
        initialization_time: args.init_time,
    };

    let selection = args.model.selection();
    let response = if interpolated {
        println!("Generating interpolated point forecast...");
        api.point_forecasts_interpolated(&selection, &options)?
    } else {
        api.point_forecasts(&selection, &options)?
    };

    match args.output {
        Some(path) => {
            formats::save_response(&path, &serde_json::to_value(&response)?, Some("forecasts"))?;
            println!("Saved to {}", path.display());
        }
        None => display::print_point_forecasts(&pairs, &response),
    }
    Ok(())
}

fn run_cyclones(
    client: &ApiClient,
    first: Option<String>,
    second: Option<String>,
    basin: Option<String>,
    model: &ModelArgs,
) -> Result<()> {
    // One bare argument may be either an initialization time or an output
    // file; a file name always has an extension dot.
    let (initialization_time, output) = match (first, second) {
        (Some(first), None) if first.contains('.') => (None, Some(first)),
        (first, second) => (first, second),
    };
    let label = initialization_time
        .clone()
        .unwrap_or_else(|| "latest".to_string());

    let api = ForecastsApi::new(client);
    let cyclones = match api.tropical_cyclones(
        &model.selection(),
        initialization_time.as_deref(),
        basin.as_deref(),
    ) {
        Ok(cyclones) => cyclones,
        Err(WindborneError::NotFound { .. }) => {
            println!("-------------------------------------------------------");
            println!("The tropical cyclone data for this initialization time are not uploaded yet.");
            println!("You may check again in a few hours.");
            return Ok(());
        }
        Err(err) => return Err(err),
    };

    if cyclones.is_empty() {
        println!("There are no active tropical cyclones for your request\n");
        if output.is_some() {
            println!("We didn't save any file on your machine.");
        }
        return Ok(());
    }

    match output {
        Some(path) => {
            let path = PathBuf::from(path);
            formats::save_track(&path, &cyclones, true)?;
            println!("Saved to {}", path.display());
        }
        None => display::print_cyclones(&label, &cyclones),
    }
    Ok(())
}

fn run_degree_days(client: &ApiClient, kind: DegreeDayKind, args: DegreeDayArgs) -> Result<()> {
    let api = ForecastsApi::new(client);
    let response = api.degree_days(&args.model.selection(), kind, &args.initialization_time)?;

    match args.output {
        Some(path) => {
            match OutputFormat::from_path(&path)? {
                OutputFormat::Json => formats::write_json_pretty(&path, &response)?,
                OutputFormat::Csv => formats::save_degree_days_csv(&path, &response)?,
                _ => {
                    return Err(WindborneError::unsupported_format(format!(
                        "{} output supports .csv or .json",
                        kind.label()
                    )))
                }
            }
            println!("Saved to {}", path.display());
        }
        None => display::print_degree_days(&response),
    }
    Ok(())
}

fn with_nc_extension(path: PathBuf) -> PathBuf {
    if path.extension().is_some() {
        path
    } else {
        path.with_extension("nc")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_split_end_and_output() {
        // Plain end time stays put
        let (end, output) = split_end_and_output(Some("2024-12-01_07:00".into()), None);
        assert_eq!(end.as_deref(), Some("2024-12-01_07:00"));
        assert!(output.is_none());

        // A file name in the end slot moves to output
        let (end, output) = split_end_and_output(Some("out.json".into()), None);
        assert!(end.is_none());
        assert_eq!(output.as_deref(), Some("out.json"));

        // A bare format token moves too
        let (end, output) = split_end_and_output(Some("little_r".into()), None);
        assert!(end.is_none());
        assert_eq!(output.as_deref(), Some("little_r"));

        // Both present: left alone
        let (end, output) =
            split_end_and_output(Some("2024-12-01_07:00".into()), Some("out.json".into()));
        assert!(end.is_some());
        assert!(output.is_some());
    }

    #[test]
    fn test_resolve_output_variants() {
        assert!(matches!(
            resolve_output(None, None, 6.0).unwrap(),
            ObservationOutput::Stdout
        ));
        assert!(matches!(
            resolve_output(Some("out.csv".into()), None, 6.0).unwrap(),
            ObservationOutput::File(_)
        ));
        match resolve_output(Some("json".into()), Some("buckets".into()), 2.0).unwrap() {
            ObservationOutput::Directory {
                format,
                bucket_hours,
                ..
            } => {
                assert_eq!(format, OutputFormat::Json);
                assert_eq!(bucket_hours, 2.0);
            }
            other => panic!("expected directory output, got {other:?}"),
        }
        assert!(resolve_output(Some("parquet".into()), None, 6.0).is_err());
    }

    #[test]
    fn test_observation_command_parses() {
        let cli = Cli::try_parse_from([
            "windborne",
            "observations",
            "2024-12-01_06:00",
            "2024-12-01_07:00",
            "json",
            "-d",
            "out_dir",
            "-b",
            "2",
            "-m",
            "e58f5b18",
        ])
        .unwrap();
        match cli.command {
            Commands::Observations(args) => {
                assert_eq!(args.start_time, "2024-12-01_06:00");
                assert_eq!(args.end_time.as_deref(), Some("2024-12-01_07:00"));
                assert_eq!(args.output.as_deref(), Some("json"));
                assert_eq!(args.output_dir.as_deref(), Some(std::path::Path::new("out_dir")));
                assert_eq!(args.bucket_hours, 2.0);
                assert_eq!(args.mission_id.as_deref(), Some("e58f5b18"));
            }
            _ => panic!("parsed into the wrong command"),
        }
    }

    #[test]
    fn test_snake_case_aliases_accepted() {
        for args in [
            vec!["windborne", "init_times"],
            vec!["windborne", "tropical_cyclones"],
            vec!["windborne", "cyclones"],
            vec!["windborne", "points_interpolated", "40.7,-74.0"],
            vec!["windborne", "cdds", "2025080100"],
        ] {
            assert!(Cli::try_parse_from(args).is_ok());
        }
    }

    #[test]
    fn test_nc_extension_appended() {
        assert_eq!(
            with_nc_extension(PathBuf::from("grid")),
            PathBuf::from("grid.nc")
        );
        assert_eq!(
            with_nc_extension(PathBuf::from("grid.nc")),
            PathBuf::from("grid.nc")
        );
    }
}
