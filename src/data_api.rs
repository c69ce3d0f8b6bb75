//! Data API: observation pages, the fetch-everything driver, poll mode,
//! and per-mission lookups.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use tracing::{debug, info};

use crate::buckets::Buckets;
use crate::client::{ApiClient, QueryParams};
use crate::config;
use crate::error::WindborneError;
use crate::formats::{self, OutputFormat};
use crate::models::{
    CurrentLocation, FlightDataResponse, LaunchSiteResponse, MissionsResponse, Observation,
    ObservationsPage, PredictionResponse,
};
use crate::Result;

/// The two observation streams share everything except their endpoint and
/// whether they accept a bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservationKind {
    Observations,
    Super,
}

impl ObservationKind {
    fn path(self) -> &'static str {
        match self {
            Self::Observations => "observations.json",
            Self::Super => "super_observations.json",
        }
    }

    fn accepts_bounding_box(self) -> bool {
        matches!(self, Self::Observations)
    }

    /// Noun used in progress messages.
    #[must_use]
    pub fn noun(self) -> &'static str {
        match self {
            Self::Observations => "observations",
            Self::Super => "super observations",
        }
    }
}

/// Filters for the observation page endpoints. Times are Unix timestamps;
/// use [`crate::times::to_unix_timestamp`] to convert CLI spellings.
#[derive(Debug, Default, Clone)]
pub struct ObservationsQuery {
    pub since: Option<i64>,
    pub min_time: Option<i64>,
    pub max_time: Option<i64>,
    pub mission_id: Option<String>,
    pub min_latitude: Option<f64>,
    pub max_latitude: Option<f64>,
    pub min_longitude: Option<f64>,
    pub max_longitude: Option<f64>,
    pub include_ids: bool,
    pub include_mission_name: bool,
    pub include_updated_at: bool,
}

impl ObservationsQuery {
    fn to_params(&self, bounding_box: bool) -> QueryParams {
        let mut params = QueryParams::new();
        params.push_opt("since", self.since);
        params.push_opt("min_time", self.min_time);
        params.push_opt("max_time", self.max_time);
        params.push_opt("mission_id", self.mission_id.as_deref());
        if bounding_box {
            params.push_opt("min_latitude", self.min_latitude);
            params.push_opt("max_latitude", self.max_latitude);
            params.push_opt("min_longitude", self.min_longitude);
            params.push_opt("max_longitude", self.max_longitude);
        }
        params.push_flag("include_ids", self.include_ids);
        params.push_flag("include_mission_name", self.include_mission_name);
        params.push_flag("include_updated_at", self.include_updated_at);
        params
    }
}

/// Follow the `since` cursor until the server reports no further page, the
/// cursor stops advancing, or it passes `end`.
pub fn paginate<F>(start: i64, end: Option<i64>, mut fetch_page: F) -> Result<Vec<Observation>>
where
    F: FnMut(i64) -> Result<ObservationsPage>,
{
    let mut since = start;
    let mut all = Vec::new();

    loop {
        let page = fetch_page(since)?;
        debug!(since, count = page.observations.len(), "fetched page");
        all.extend(page.observations);

        if !page.has_next_page {
            break;
        }
        since = match page.next_since {
            Some(next) if next > since => next,
            _ => break,
        };
        if end.is_some_and(|end| since >= end) {
            break;
        }
    }

    Ok(all)
}

/// Client for the Data API.
pub struct DataApi<'a> {
    client: &'a ApiClient,
    base_url: String,
}

impl<'a> DataApi<'a> {
    #[must_use]
    pub fn new(client: &'a ApiClient) -> Self {
        Self {
            client,
            base_url: config::data_api_base_url(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Fetch one page of observations or super observations.
    pub fn page(&self, kind: ObservationKind, query: &ObservationsQuery) -> Result<ObservationsPage> {
        self.client.get_json(
            &self.url(kind.path()),
            &query.to_params(kind.accepts_bounding_box()),
        )
    }

    /// Fetch every page between `start` and `end`.
    pub fn fetch_all(
        &self,
        kind: ObservationKind,
        query: &ObservationsQuery,
        start: i64,
        end: Option<i64>,
    ) -> Result<Vec<Observation>> {
        paginate(start, end, |since| {
            let mut page_query = query.clone();
            page_query.since = Some(since);
            page_query.max_time = end.or(query.max_time);
            self.page(kind, &page_query)
        })
    }

    /// Missions currently in the air.
    pub fn flying_missions(&self) -> Result<MissionsResponse> {
        self.client
            .get_json(&self.url("missions.json"), &QueryParams::new())
    }

    /// Launch site for one mission.
    pub fn launch_site(&self, mission_id: &str) -> Result<LaunchSiteResponse> {
        self.client.get_json(
            &self.url(&format!("missions/{mission_id}/launch_site.json")),
            &QueryParams::new(),
        )
    }

    /// Predicted flight path for a flying mission.
    pub fn predicted_path(&self, mission_id: &str) -> Result<PredictionResponse> {
        self.client.get_json(
            &self.url(&format!("missions/{mission_id}/prediction.json")),
            &QueryParams::new(),
        )
    }

    /// Latest reported location of a flying mission.
    pub fn current_location(&self, mission_id: &str) -> Result<CurrentLocation> {
        self.client.get_json(
            &self.url(&format!("missions/{mission_id}/current_location.json")),
            &QueryParams::new(),
        )
    }

    /// The path a mission has flown so far.
    pub fn flight_path(&self, mission_id: &str) -> Result<FlightDataResponse> {
        self.client.get_json(
            &self.url(&format!("missions/{mission_id}/flight_data.json")),
            &QueryParams::new(),
        )
    }
}

/// Where a batch download lands.
#[derive(Debug, Clone)]
pub enum ObservationOutput {
    /// Everything in one file; format from the extension
    File(PathBuf),
    /// One file per (mission, bucket) under `dir`
    Directory {
        dir: PathBuf,
        format: OutputFormat,
        bucket_hours: f64,
    },
    /// Pretty JSON on stdout
    Stdout,
}

/// Fetch a time range and write it to the requested output.
pub fn run_fetch(
    api: &DataApi,
    kind: ObservationKind,
    query: &ObservationsQuery,
    start: i64,
    end: Option<i64>,
    output: &ObservationOutput,
) -> Result<()> {
    let observations = api.fetch_all(kind, query, start, end)?;
    info!(count = observations.len(), "fetched {}", kind.noun());

    match output {
        ObservationOutput::Stdout => {
            println!("{}", serde_json::to_string_pretty(&observations)?);
        }
        ObservationOutput::File(path) => {
            formats::save_observations(path, &observations)?;
            println!("Saved to {}", path.display());
        }
        ObservationOutput::Directory {
            dir,
            format,
            bucket_hours,
        } => {
            let mut buckets = Buckets::new(start, *bucket_hours)?;
            buckets.extend(observations);
            if buckets.is_empty() {
                return Err(WindborneError::EmptyResponse);
            }
            std::fs::create_dir_all(dir)?;
            for (key, members) in buckets.iter() {
                let path = dir.join(key.filename(*bucket_hours, format.extension()));
                formats::save_observations(&path, members)?;
                println!("Saved to {}", path.display());
            }
        }
    }
    Ok(())
}

/// Endlessly poll for new observations, writing them as they arrive.
///
/// When the stream has no next page the loop sleeps for `interval` and asks
/// again; it only ends on error or process interrupt. Single-file output
/// appends CSV rows; directory output rewrites each bucket file as its
/// bucket grows.
pub fn run_poll(
    api: &DataApi,
    kind: ObservationKind,
    query: &ObservationsQuery,
    start: i64,
    output: &ObservationOutput,
    interval: Duration,
) -> Result<()> {
    let mut csv_target: Option<PathBuf> = None;
    let mut buckets_state: Option<(PathBuf, OutputFormat, Buckets)> = None;

    match output {
        ObservationOutput::File(path) => {
            if OutputFormat::from_path(path)? != OutputFormat::Csv {
                return Err(WindborneError::unsupported_format(
                    "poll mode appends continuously; use a .csv file or directory output",
                ));
            }
            if path.exists() {
                return Err(WindborneError::validation(format!(
                    "file '{}' already exists; delete it or choose a different filename",
                    path.display()
                )));
            }
            println!("Creating new file: {}", path.display());
            csv_target = Some(path.clone());
        }
        ObservationOutput::Directory {
            dir,
            format,
            bucket_hours,
        } => {
            if matches!(format, OutputFormat::Gpx | OutputFormat::Kml | OutputFormat::GeoJson) {
                return Err(WindborneError::unsupported_format(
                    "poll mode writes observation buckets; use json, csv, little_r or netcdf",
                ));
            }
            std::fs::create_dir_all(dir)?;
            buckets_state = Some((dir.clone(), *format, Buckets::new(start, *bucket_hours)?));
        }
        ObservationOutput::Stdout => {
            return Err(WindborneError::validation(
                "poll mode needs an output file or directory",
            ));
        }
    }

    let mut since = start;
    let mut header_written = false;

    loop {
        let mut page_query = query.clone();
        page_query.since = Some(since);
        let page = api.page(kind, &page_query)?;
        println!("Fetched {} {}", page.observations.len(), kind.noun());

        if !page.observations.is_empty() {
            if let Some(path) = &csv_target {
                append_csv(path, &page.observations, &mut header_written)?;
            }
            if let Some((dir, format, buckets)) = &mut buckets_state {
                let mut touched = std::collections::BTreeSet::new();
                for observation in page.observations.clone() {
                    if let Some(key) = buckets.insert(observation) {
                        touched.insert(key);
                    }
                }
                for key in touched {
                    let path = dir.join(key.filename(buckets.bucket_hours(), format.extension()));
                    if let Some(members) = buckets.get(&key) {
                        formats::save_observations(&path, members)?;
                    }
                }
            }
        }

        if page.has_next_page {
            if let Some(next) = page.next_since.filter(|&next| next > since) {
                since = next;
                continue;
            }
        }

        info!(interval_s = interval.as_secs(), "stream drained; sleeping");
        println!("---------------------------------------------------");
        println!("The latest {} have no next page.", kind.noun());
        println!("Sleeping for {} seconds", interval.as_secs());
        thread::sleep(interval);
    }
}

fn append_csv(path: &Path, observations: &[Observation], header_written: &mut bool) -> Result<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    formats::write_observations_csv(file, observations, !*header_written)?;
    *header_written = true;
    Ok(())
}
