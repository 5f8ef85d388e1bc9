// src/error.rs

//! Unified error handling for the wallabag sync layer.

use thiserror::Error;

/// Result type alias for sync and search operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Transport-level failure (DNS, connect, timeout)
    #[error("Connection error: {0}")]
    Connection(#[from] reqwest::Error),

    /// Non-2xx response from the OAuth token endpoint
    #[error("Auth error: token endpoint returned {status}: {body}")]
    Auth { status: u16, body: String },

    /// Non-2xx response from the entries listing endpoint
    #[error("API error: {status} querying {url}")]
    Api { status: u16, url: String },

    /// No valid token available when a fetch was attempted
    #[error("No valid credential available")]
    MissingCredential,

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization failed
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Create an auth error from a token endpoint response.
    pub fn auth(status: u16, body: impl Into<String>) -> Self {
        Self::Auth {
            status,
            body: body.into(),
        }
    }

    /// Create an API error from a listing endpoint response.
    pub fn api(status: u16, url: impl Into<String>) -> Self {
        Self::Api {
            status,
            url: url.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
