// src/auth.rs

//! OAuth2 password-grant token lifecycle.
//!
//! The [`TokenManager`] owns the bearer credential and renews it lazily: a
//! token is considered valid for only half its server-reported lifetime, so
//! renewal always happens well before the server-side expiry.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::config::ConnectionConfig;
use crate::error::{AppError, Result};

/// A bearer credential obtained from the token endpoint.
///
/// Immutable once created; renewal replaces it wholesale.
#[derive(Debug, Clone)]
pub struct Credential {
    access: String,
    #[allow(dead_code)]
    refresh: String,
    expires_at: DateTime<Utc>,
}

impl Credential {
    /// Build a credential from a token response received at `now`.
    ///
    /// `expires_at` is set to half the reported lifetime, a renew-early
    /// policy that keeps the token fresh across clock skew and long fetches.
    fn from_response(response: TokenResponse, now: DateTime<Utc>) -> Self {
        Self {
            access: response.access_token,
            refresh: response.refresh_token,
            expires_at: now + Duration::seconds(response.expires_in / 2),
        }
    }

    fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Wire shape of the token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
}

/// Manages acquisition and renewal of the API bearer token.
pub struct TokenManager {
    client: reqwest::Client,
    connection: ConnectionConfig,
    credential: Mutex<Option<Credential>>,
}

impl TokenManager {
    /// Create a token manager using an already-configured HTTP client.
    pub fn new(client: reqwest::Client, connection: ConnectionConfig) -> Self {
        Self {
            client,
            connection,
            credential: Mutex::new(None),
        }
    }

    /// Return a valid access token, renewing first if necessary.
    ///
    /// Exactly one token request is issued per renewal; callers serialize on
    /// the internal mutex, so concurrent fetch cycles never race two
    /// password-grant requests. A failed renewal leaves any previously held
    /// credential in place and propagates the error.
    pub async fn access_token(&self) -> Result<String> {
        let mut held = self.credential.lock().await;
        if let Some(credential) = held.as_ref() {
            if credential.is_valid_at(Utc::now()) {
                return Ok(credential.access.clone());
            }
        }

        let renewed = self.request_token().await?;
        let access = renewed.access.clone();
        *held = Some(renewed);
        Ok(access)
    }

    /// Perform a single password-grant request against the token endpoint.
    async fn request_token(&self) -> Result<Credential> {
        if self.connection.username.is_empty() || self.connection.client_id.is_empty() {
            return Err(AppError::MissingCredential);
        }

        let url = format!("{}/oauth/v2/token", self.connection.instance_url);
        log::debug!("Fetching token from {url}");

        let response = self
            .client
            .post(&url)
            .form(&[
                ("grant_type", "password"),
                ("client_id", self.connection.client_id.as_str()),
                ("client_secret", self.connection.client_secret.as_str()),
                ("username", self.connection.username.as_str()),
                ("password", self.connection.password.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::warn!("Got response {} from token endpoint: {}", status.as_u16(), body);
            return Err(AppError::auth(status.as_u16(), body));
        }

        let token: TokenResponse = response.json().await?;
        Ok(Credential::from_response(token, Utc::now()))
    }
}
