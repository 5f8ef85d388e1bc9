// src/config.rs

//! Application configuration structures.
//!
//! Configuration is loaded from a TOML file and mutated through explicit
//! [`Config::set`] calls keyed by [`ConfigKey`]; persistence goes through the
//! [`ConfigStore`] trait so the in-memory update and the write-back are
//! separate, visible steps.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote instance and credentials
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Refresh and HTTP behavior settings
    #[serde(default)]
    pub sync: SyncConfig,
}

/// Connection settings for the remote wallabag instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Base URL of the wallabag instance
    #[serde(default = "default_instance_url")]
    pub instance_url: String,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    /// OAuth2 API client id
    #[serde(default)]
    pub client_id: String,

    /// OAuth2 API client secret
    #[serde(default)]
    pub client_secret: String,
}

/// Refresh scheduling and HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Minutes between background index rebuilds
    #[serde(default = "default_cache_length")]
    pub cache_length_minutes: u64,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User-Agent header sent on every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_instance_url() -> String {
    "http://localhost:80".to_string()
}

fn default_cache_length() -> u64 {
    15
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_user_agent() -> String {
    "org.wallabag.search".to_string()
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            instance_url: default_instance_url(),
            username: String::new(),
            password: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            cache_length_minutes: default_cache_length(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.connection.instance_url)
            .map_err(|e| AppError::config(format!("connection.instance_url is invalid: {e}")))?;
        if self.sync.cache_length_minutes == 0 {
            return Err(AppError::config("sync.cache_length_minutes must be > 0"));
        }
        if self.sync.timeout_secs == 0 {
            return Err(AppError::config("sync.timeout_secs must be > 0"));
        }
        if self.sync.user_agent.trim().is_empty() {
            return Err(AppError::config("sync.user_agent is empty"));
        }
        Ok(())
    }

    /// Apply a single keyed update to the in-memory configuration.
    ///
    /// Values arrive as strings (the host hands them over untyped); numeric
    /// keys are parsed and range-checked here.
    pub fn set(&mut self, key: ConfigKey, value: &str) -> Result<()> {
        match key {
            ConfigKey::InstanceUrl => {
                url::Url::parse(value)
                    .map_err(|e| AppError::config(format!("instance_url is invalid: {e}")))?;
                self.connection.instance_url = value.trim_end_matches('/').to_string();
            }
            ConfigKey::Username => self.connection.username = value.to_string(),
            ConfigKey::Password => self.connection.password = value.to_string(),
            ConfigKey::ClientId => self.connection.client_id = value.to_string(),
            ConfigKey::ClientSecret => self.connection.client_secret = value.to_string(),
            ConfigKey::CacheLengthMinutes => {
                let minutes: u64 = value
                    .parse()
                    .map_err(|_| AppError::config(format!("cache_length_minutes: expected a positive integer, got {value:?}")))?;
                if minutes == 0 {
                    return Err(AppError::config("cache_length_minutes must be > 0"));
                }
                self.sync.cache_length_minutes = minutes;
            }
        }
        Ok(())
    }
}

/// Recognized configuration keys for keyed updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    InstanceUrl,
    Username,
    Password,
    ClientId,
    ClientSecret,
    CacheLengthMinutes,
}

impl ConfigKey {
    /// Parse a key name as used in the config file and by the host.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "instance_url" => Some(Self::InstanceUrl),
            "username" => Some(Self::Username),
            "password" => Some(Self::Password),
            "client_id" => Some(Self::ClientId),
            "client_secret" => Some(Self::ClientSecret),
            "cache_length_minutes" => Some(Self::CacheLengthMinutes),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InstanceUrl => "instance_url",
            Self::Username => "username",
            Self::Password => "password",
            Self::ClientId => "client_id",
            Self::ClientSecret => "client_secret",
            Self::CacheLengthMinutes => "cache_length_minutes",
        }
    }
}

/// Persistence seam for configuration writes.
pub trait ConfigStore: Send + Sync {
    /// Write the full configuration back to durable storage.
    fn persist(&self, config: &Config) -> Result<()>;
}

/// TOML-file backed config store.
pub struct TomlConfigStore {
    path: PathBuf,
}

impl TomlConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigStore for TomlConfigStore {
    fn persist(&self, config: &Config) -> Result<()> {
        let content = toml::to_string_pretty(config)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        // Write to a sibling temp file, then rename, so a crash mid-write
        // cannot leave a truncated config behind.
        let tmp = self.path.with_extension("toml.tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// No-op store for hosts that own persistence themselves.
pub struct NullConfigStore;

impl ConfigStore for NullConfigStore {
    fn persist(&self, _config: &Config) -> Result<()> {
        Ok(())
    }
}
