//! Refresh-token exchange against the Netatmo OAuth2 endpoint.

use crate::auth::error::AuthenticationError;
use crate::types::credentials::Credentials;
use log::{debug, info, warn};
use reqwest::Client;
use serde::Deserialize;
use std::fmt;

/// Short-lived bearer token for the data endpoints. Never cached across runs.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Successful token response.
///
/// Netatmo may rotate the refresh token on every exchange. The new one is
/// surfaced here so the caller can store it; this crate never persists it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub access_token: AccessToken,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
}

#[derive(Deserialize)]
struct OAuthErrorResponse {
    error: Option<String>,
    error_description: Option<String>,
}

pub struct Authenticator {
    client: Client,
    token_url: String,
    credentials: Credentials,
}

impl Authenticator {
    pub fn new(client: Client, token_url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            client,
            token_url: token_url.into(),
            credentials,
        }
    }

    /// Exchanges the refresh token for a fresh access token.
    ///
    /// Performs exactly one form-encoded POST. Nothing is retried.
    pub async fn exchange(&self) -> Result<TokenGrant, AuthenticationError> {
        let url = self.token_url.clone();
        debug!(
            "Requesting access token from {} for client {}",
            url,
            self.credentials.client_id()
        );

        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", self.credentials.refresh_token()),
            ("client_id", self.credentials.client_id()),
            ("client_secret", self.credentials.client_secret()),
        ];
        let response = self
            .client
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| AuthenticationError::NetworkRequest(url.clone(), e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AuthenticationError::NetworkRequest(url.clone(), e))?;

        if !status.is_success() {
            let message = describe_rejection(&body);
            warn!("Token request rejected with {}: {}", status, message);
            return Err(AuthenticationError::HttpStatus {
                url,
                status,
                message,
            });
        }

        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| AuthenticationError::MalformedResponse(url.clone(), e))?;
        let access_token = parsed
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or(AuthenticationError::MissingToken(url))?;

        info!(
            "Obtained access token (expires in {})",
            parsed
                .expires_in
                .map_or_else(|| "unknown".to_string(), |s| format!("{}s", s))
        );
        if parsed
            .refresh_token
            .as_deref()
            .is_some_and(|rotated| rotated != self.credentials.refresh_token())
        {
            info!("Netatmo rotated the refresh token");
        }

        Ok(TokenGrant {
            access_token: AccessToken(access_token),
            refresh_token: parsed.refresh_token,
            expires_in: parsed.expires_in,
        })
    }
}

fn describe_rejection(body: &str) -> String {
    match serde_json::from_str::<OAuthErrorResponse>(body) {
        Ok(OAuthErrorResponse {
            error: Some(error),
            error_description: Some(description),
        }) => format!("{}: {}", error, description),
        Ok(OAuthErrorResponse {
            error: Some(error), ..
        }) => error,
        _ if body.trim().is_empty() => "empty response body".to_string(),
        _ => body.trim().to_string(),
    }
}
