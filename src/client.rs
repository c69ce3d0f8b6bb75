//! Authenticated HTTP plumbing shared by both APIs.
//!
//! Every call signs a fresh JWT, sends it as the basic-auth password, and
//! retries transient failures (502, connection errors, timeouts) with
//! exponential backoff before giving up.

use std::thread;
use std::time::{Duration, Instant};

use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::auth::Credentials;
use crate::error::WindborneError;
use crate::Result;

/// Attempt cap for transient failures
const MAX_ATTEMPTS: u32 = 5;

/// Query parameters for one request. Absent options are simply not pushed,
/// so they never appear in the query string.
#[derive(Debug, Default, Clone)]
pub struct QueryParams(Vec<(&'static str, String)>);

impl QueryParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: &'static str, value: impl ToString) {
        self.0.push((key, value.to_string()));
    }

    pub fn push_opt(&mut self, key: &'static str, value: Option<impl ToString>) {
        if let Some(value) = value {
            self.push(key, value);
        }
    }

    /// Boolean flags are only sent when set (matching the API's contract
    /// that absence means false).
    pub fn push_flag(&mut self, key: &'static str, flag: bool) {
        if flag {
            self.push(key, "true");
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[(&'static str, String)] {
        &self.0
    }

    /// Render the parameters as indented `key: value` lines for error
    /// messages that echo what was asked for.
    #[must_use]
    pub fn echo(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| format!("  {k}: {v}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Authenticated client for the WindBorne APIs.
pub struct ApiClient {
    client: Client,
    credentials: Credentials,
}

impl ApiClient {
    /// Build a client with credentials from the environment.
    pub fn new() -> Result<Self> {
        Self::with_credentials(Credentials::from_env()?)
    }

    /// Build a client with explicit credentials.
    pub fn with_credentials(credentials: Credentials) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .user_agent(concat!("windborne-rs/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            credentials,
        })
    }

    /// GET a JSON endpoint and decode into `T`.
    pub fn get_json<T: DeserializeOwned>(&self, url: &str, params: &QueryParams) -> Result<T> {
        let response = self.request(url, params)?;
        Ok(response.json()?)
    }

    /// GET a binary payload (gridded forecasts arrive as netCDF bytes).
    pub fn get_bytes(&self, url: &str, params: &QueryParams) -> Result<Vec<u8>> {
        let response = self.request(url, params)?;
        Ok(response.bytes()?.to_vec())
    }

    fn request(&self, url: &str, params: &QueryParams) -> Result<Response> {
        let started = Instant::now();
        let mut attempt: u32 = 0;

        loop {
            let token = self.credentials.sign_token()?;
            let mut builder = self
                .client
                .get(url)
                .basic_auth(self.credentials.client_id(), Some(&token));
            if !params.is_empty() {
                builder = builder.query(params.as_slice());
            }

            debug!(url, attempt, "sending API request");

            let transient = match builder.send() {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        info!(
                            url,
                            status = status.as_u16(),
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            "API request succeeded"
                        );
                        return Ok(response);
                    }
                    if status == StatusCode::BAD_GATEWAY {
                        "502 Bad Gateway".to_string()
                    } else {
                        return Err(self.status_error(status, url, params, response));
                    }
                }
                Err(err) if err.is_connect() || err.is_timeout() => err.to_string(),
                Err(err) => return Err(err.into()),
            };

            attempt += 1;
            if attempt >= MAX_ATTEMPTS {
                return Err(WindborneError::MaxRetries { message: transient });
            }

            let backoff = Duration::from_secs(2u64.pow(attempt));
            warn!(
                url,
                attempt,
                backoff_s = backoff.as_secs(),
                error = %transient,
                "temporary connection failure; sleeping before retrying"
            );
            thread::sleep(backoff);
        }
    }

    fn status_error(
        &self,
        status: StatusCode,
        url: &str,
        params: &QueryParams,
        response: Response,
    ) -> WindborneError {
        match status {
            StatusCode::FORBIDDEN => WindborneError::auth(
                "--------------------------------------\n\
                 We couldn't authenticate your request.\n\
                 --------------------------------------\n\
                 Please make sure you have properly set your WB_CLIENT_ID and WB_API_KEY.\n\
                 You can verify this by running\n\
                 echo $WB_CLIENT_ID and echo $WB_API_KEY in your terminal.\n\
                 To get an API key, email data@windbornesystems.com.",
            ),
            StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST => {
                let mut message = format!(
                    "-------------------------------------------------------\n\
                     Our server couldn't find the information you requested.\n\
                     -------------------------------------------------------\n\
                     URL: {url}\n\
                     Error: {status}\n\
                     -------------------------------------------------------"
                );
                if params.is_empty() {
                    if let Some(mission_id) = mission_id_from_url(url) {
                        message.push_str(&format!(
                            "\nMission ID provided: {mission_id}\n\
                             No mission found with id: {mission_id}"
                        ));
                    }
                } else {
                    message.push_str(&format!("\nParameters provided:\n{}", params.echo()));
                }
                if let Ok(body) = response.text() {
                    if !body.is_empty() {
                        message.push_str(&format!("\nResponse text:\n{body}"));
                    }
                }
                WindborneError::not_found(message)
            }
            _ => {
                let body = response.text().unwrap_or_default();
                let mut message = body.trim().to_string();
                if message.is_empty() {
                    message = status
                        .canonical_reason()
                        .unwrap_or("unrecoverable HTTP error")
                        .to_string();
                }
                if !params.is_empty() {
                    message.push_str(&format!("\nParameters provided:\n{}", params.echo()));
                }
                WindborneError::Http {
                    status: status.as_u16(),
                    message,
                }
            }
        }
    }
}

/// Pull the mission id out of a `/missions/{id}/...` URL for error messages.
fn mission_id_from_url(url: &str) -> Option<&str> {
    let (_, tail) = url.split_once("/missions/")?;
    let id = tail.split('/').next().unwrap_or(tail);
    let id = id.strip_suffix(".json").unwrap_or(id);
    (!id.is_empty()).then_some(id)
}
