//! Long-lived Netatmo app credentials and the endpoints they are exchanged against.

use crate::error::ConfigError;
use serde::Deserialize;
use std::fmt;

pub const CLIENT_ID_VAR: &str = "NETATMO_CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "NETATMO_CLIENT_SECRET";
pub const REFRESH_TOKEN_VAR: &str = "NETATMO_REFRESH_TOKEN";

pub const DEFAULT_TOKEN_URL: &str = "https://api.netatmo.com/oauth2/token";
pub const DEFAULT_DATA_URL: &str = "https://api.netatmo.com/api/getstationsdata";

/// The three secrets needed to obtain an access token.
///
/// Loaded once at start-up and never mutated afterwards. The `Debug` output
/// only shows the client id, so credentials can be logged safely.
///
/// # Examples
///
/// ```
/// use netatmo_temps::Credentials;
///
/// let credentials = Credentials::new("my-app", "s3cret", "refresh");
/// assert_eq!(credentials.client_id(), "my-app");
/// assert!(!format!("{credentials:?}").contains("s3cret"));
/// ```
#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    client_id: String,
    client_secret: String,
    refresh_token: String,
}

impl Credentials {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            refresh_token: refresh_token.into(),
        }
    }

    /// Reads the credentials from `NETATMO_CLIENT_ID`, `NETATMO_CLIENT_SECRET`
    /// and `NETATMO_REFRESH_TOKEN`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingVar`] naming the first variable that is
    /// unset or not valid unicode, [`ConfigError::EmptyVar`] for a blank one.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            client_id: read_var(CLIENT_ID_VAR)?,
            client_secret: read_var(CLIENT_SECRET_VAR)?,
            refresh_token: read_var(REFRESH_TOKEN_VAR)?,
        })
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

fn read_var(name: &'static str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        Ok(_) => Err(ConfigError::EmptyVar(name)),
        Err(e) => Err(ConfigError::MissingVar(name, e)),
    }
}

/// URLs of the token exchange and station data endpoints.
///
/// Defaults point at the public Netatmo API; tests point them at a local mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub token_url: String,
    pub data_url: String,
}

impl Endpoints {
    pub fn new(token_url: impl Into<String>, data_url: impl Into<String>) -> Self {
        Self {
            token_url: token_url.into(),
            data_url: data_url.into(),
        }
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_URL, DEFAULT_DATA_URL)
    }
}
