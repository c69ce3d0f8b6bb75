//! Credential handling and request token signing.
//!
//! Credentials come from the `WB_CLIENT_ID` and `WB_API_KEY` environment
//! variables. Each request is authenticated with a freshly signed HS256 JWT
//! rather than sending the key itself, which reduces the odds of an improper
//! configuration accidentally leaking it.

use std::env;

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;

use crate::config::CREDENTIALS_HELP;
use crate::error::WindborneError;
use crate::Result;

/// Validated WindBorne API credentials.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Client identifier: either a `[a-z0-9_]+` slug or a UUID v4 personal token
    pub client_id: String,
    /// Signing key: `wb_`-prefixed 35-character key, or a legacy 32-character key
    api_key: String,
}

/// JWT claims attached to every request.
#[derive(Debug, Serialize)]
struct Claims<'a> {
    client_id: &'a str,
    iat: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    token_id: Option<&'a str>,
}

/// Check whether a client id is a UUID v4 (lowercase hex, version and
/// variant nibbles included).
#[must_use]
pub fn is_valid_uuid_v4(client_id: &str) -> bool {
    let bytes = client_id.as_bytes();
    if bytes.len() != 36 {
        return false;
    }
    for (i, &b) in bytes.iter().enumerate() {
        match i {
            8 | 13 | 18 | 23 => {
                if b != b'-' {
                    return false;
                }
            }
            14 => {
                if b != b'4' {
                    return false;
                }
            }
            19 => {
                if !matches!(b, b'8' | b'9' | b'a' | b'b') {
                    return false;
                }
            }
            _ => {
                if !b.is_ascii_hexdigit() || b.is_ascii_uppercase() {
                    return false;
                }
            }
        }
    }
    true
}

/// Check whether a client id is a valid slug (`[a-z0-9_]+`).
#[must_use]
pub fn is_valid_client_id_format(client_id: &str) -> bool {
    !client_id.is_empty()
        && client_id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

impl Credentials {
    /// Read and validate credentials from `WB_CLIENT_ID` / `WB_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let client_id = env::var("WB_CLIENT_ID").unwrap_or_default();
        let api_key = env::var("WB_API_KEY").unwrap_or_default();
        Self::new(client_id, api_key)
    }

    /// Validate an explicit client id / API key pair.
    pub fn new(client_id: String, api_key: String) -> Result<Self> {
        verify_credentials(&client_id, &api_key)?;
        Ok(Self { client_id, api_key })
    }

    /// The basic-auth username sent with each request.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Sign a short-lived token for one request.
    ///
    /// Slug client ids sign `{client_id, iat}`. UUID v4 personal tokens sign
    /// `{client_id: "api_token", iat, token_id}` so the server can tell the
    /// two apart.
    pub fn sign_token(&self) -> Result<String> {
        let iat = Utc::now().timestamp();
        let claims = if is_valid_uuid_v4(&self.client_id) {
            Claims {
                client_id: "api_token",
                iat,
                token_id: Some(&self.client_id),
            }
        } else {
            Claims {
                client_id: &self.client_id,
                iat,
                token_id: None,
            }
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.api_key.as_bytes()),
        )?;
        Ok(token)
    }
}

fn verify_credentials(client_id: &str, api_key: &str) -> Result<()> {
    if client_id.is_empty() && api_key.is_empty() {
        return Err(WindborneError::credentials(
            format!(
                "To access the WindBorne API, set your Client ID and API key by setting the \
                 environment variables WB_CLIENT_ID and WB_API_KEY.\n\
                 --------------------------------------\n{CREDENTIALS_HELP}"
            ),
            80,
        ));
    }

    if client_id.is_empty() {
        return Err(WindborneError::credentials(
            format!(
                "To access the WindBorne API, you need to set your Client ID by setting the \
                 environment variable WB_CLIENT_ID.\n\
                 --------------------------------------\n{CREDENTIALS_HELP}"
            ),
            90,
        ));
    }

    if api_key.is_empty() {
        return Err(WindborneError::credentials(
            format!(
                "To access the WindBorne API, you need to set your API key by setting the \
                 environment variable WB_API_KEY.\n\
                 --------------------------------------\n{CREDENTIALS_HELP}"
            ),
            91,
        ));
    }

    // Key-shaped client id next to a key that is not key-shaped: almost
    // certainly the two variables are swapped.
    if matches!(client_id.len(), 32 | 35) && !matches!(api_key.len(), 32 | 35) {
        return Err(WindborneError::credentials(
            format!(
                "Your Client ID and API Key are likely swapped.\n\
                 --------------------------------------\n\
                 Swap them or modify them accordingly to get access to the WindBorne API.\n\
                 --------------------------------------\n\
                 Current Client ID: {client_id}\n\
                 Current API Key: {api_key}"
            ),
            95,
        ));
    }

    if !(is_valid_uuid_v4(client_id) || is_valid_client_id_format(client_id)) {
        return Err(WindborneError::credentials(
            format!(
                "Your Client ID is misformatted.\n\
                 --------------------------------------\n\
                 It should either be a valid UUID v4 or consist of only lowercase letters, \
                 digits, and underscores ([a-z0-9_]).\n\
                 --------------------------------------\n\
                 Current Client ID: {client_id}"
            ),
            92,
        ));
    }

    if api_key.starts_with("wb_") {
        if api_key.len() != 35 {
            return Err(WindborneError::credentials(
                format!(
                    "Your API key is misformatted.\n\
                     --------------------------------------\n\
                     API keys starting with 'wb_' must be 35 characters long (including the \
                     'wb_' prefix).\n\
                     --------------------------------------\n\
                     Current API key: {api_key}"
                ),
                93,
            ));
        }
    } else if api_key.len() != 32 {
        // Early tokens predate the wb_ prefix
        return Err(WindborneError::credentials(
            format!(
                "Your API key is misformatted.\n\
                 --------------------------------------\n\
                 API keys created in 2023 or earlier must be exactly 32 characters long.\n\
                 --------------------------------------\n\
                 Current API key: {api_key}"
            ),
            94,
        ));
    }

    Ok(())
}
