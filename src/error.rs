//! Error types for the WindBorne API client.

use thiserror::Error;

/// Main error type for the WindBorne API client.
///
/// Each variant knows the process exit code the CLI should terminate with,
/// so library callers get typed errors while the binary keeps the historical
/// exit-code contract.
#[derive(Error, Debug)]
pub enum WindborneError {
    /// Missing or malformed credentials
    #[error("{message}")]
    Credentials { message: String, code: i32 },

    /// The API rejected our signed token (HTTP 403)
    #[error("{message}")]
    Auth { message: String },

    /// The API could not find the requested resource (HTTP 400/404)
    #[error("{message}")]
    NotFound { message: String },

    /// Any other unrecoverable HTTP status
    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    /// Transient failures exhausted the retry attempts
    #[error("max retries to API reached: {message}")]
    MaxRetries { message: String },

    /// Transport-level errors from the HTTP client
    #[error("request error: {source}")]
    Transport {
        #[from]
        source: reqwest::Error,
    },

    /// Input validation errors (times, coordinates, basins, ...)
    #[error("invalid input: {message}")]
    Validation { message: String },

    /// Output file extension we do not know how to write
    #[error("{message}")]
    UnsupportedFormat { message: String },

    /// The API returned nothing worth writing
    #[error("there are no available data to save to file")]
    EmptyResponse,

    /// I/O errors while writing output files
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// JSON (de)serialization errors
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    /// CSV writing errors
    #[error("CSV error: {source}")]
    Csv {
        #[from]
        source: csv::Error,
    },

    /// XML writing errors (GPX/KML output)
    #[error("XML error: {source}")]
    Xml {
        #[from]
        source: quick_xml::Error,
    },

    /// netCDF writing errors
    #[error("netCDF error: {source}")]
    NetCdf {
        #[from]
        source: netcdf::Error,
    },

    /// Token signing errors
    #[error("token signing error: {source}")]
    Jwt {
        #[from]
        source: jsonwebtoken::errors::Error,
    },
}

impl WindborneError {
    /// Create a credentials error with its dedicated exit code
    pub fn credentials<S: Into<String>>(message: S, code: i32) -> Self {
        Self::Credentials {
            message: message.into(),
            code,
        }
    }

    /// Create an authentication (HTTP 403) error
    pub fn auth<S: Into<String>>(message: S) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create a not-found (HTTP 400/404) error
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create an input validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create an unsupported-output-format error
    pub fn unsupported_format<S: Into<String>>(message: S) -> Self {
        Self::UnsupportedFormat {
            message: message.into(),
        }
    }

    /// The exit code the CLI terminates with for this error.
    ///
    /// Credential errors keep their historical codes (80, 90..95); HTTP
    /// errors exit with the status code; everything else exits 1 except
    /// bad output formats (4) and bad inputs (2).
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            WindborneError::Credentials { code, .. } => *code,
            WindborneError::Auth { .. } => 403,
            WindborneError::NotFound { .. } => 404,
            WindborneError::Http { status, .. } => i32::from(*status),
            WindborneError::Validation { .. } => 2,
            WindborneError::UnsupportedFormat { .. } => 4,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_exit_code() {
        let err = WindborneError::credentials("missing client id", 90);
        assert_eq!(err.exit_code(), 90);
        assert!(matches!(err, WindborneError::Credentials { .. }));
    }

    #[test]
    fn test_http_exit_code_follows_status() {
        let err = WindborneError::Http {
            status: 500,
            message: "Internal Server Error".to_string(),
        };
        assert_eq!(err.exit_code(), 500);
    }

    #[test]
    fn test_validation_and_format_codes() {
        assert_eq!(WindborneError::validation("bad time").exit_code(), 2);
        assert_eq!(
            WindborneError::unsupported_format("use .json or .csv").exit_code(),
            4
        );
        assert_eq!(WindborneError::EmptyResponse.exit_code(), 1);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: WindborneError = io_err.into();
        assert!(matches!(err, WindborneError::Io { .. }));
        assert_eq!(err.exit_code(), 1);
    }
}
