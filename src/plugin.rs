// src/plugin.rs

//! Host-facing core object.
//!
//! Mirrors the lifecycle contract a launcher host expects: load starts the
//! background refresh, unload stops it, configuration writes go through
//! [`WallabagPlugin::update_config`], and queries are answered synchronously
//! from the published snapshot without any network I/O.

use std::sync::Arc;
use std::time::Duration;

use crate::auth::TokenManager;
use crate::config::{Config, ConfigKey, ConfigStore};
use crate::error::{AppError, Result};
use crate::fetcher::ArticleFetcher;
use crate::index::{DisplayItem, IndexBuilder, IndexStore};
use crate::scheduler::RefreshScheduler;
use crate::search::search;

/// The instantiated sync-and-search core: one credential, one snapshot, one
/// scheduler per instance.
pub struct WallabagPlugin {
    config: Config,
    store: Arc<IndexStore>,
    builder: Arc<IndexBuilder>,
    scheduler: RefreshScheduler,
    config_store: Box<dyn ConfigStore>,
}

/// Create a configured HTTP client shared by the token and listing requests.
fn build_client(config: &Config) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.sync.user_agent)
        .timeout(Duration::from_secs(config.sync.timeout_secs))
        .build()?;
    Ok(client)
}

/// Wire up the fetch pipeline (client, token manager, fetcher, builder)
/// against the current connection settings.
fn build_pipeline(config: &Config, store: Arc<IndexStore>) -> Result<Arc<IndexBuilder>> {
    let client = build_client(config)?;
    let instance_url = config.connection.instance_url.clone();
    let tokens = Arc::new(TokenManager::new(client.clone(), config.connection.clone()));
    let fetcher = ArticleFetcher::new(client, instance_url.clone(), tokens);
    Ok(Arc::new(IndexBuilder::new(fetcher, store, instance_url)))
}

impl WallabagPlugin {
    pub fn new(config: Config, config_store: Box<dyn ConfigStore>) -> Result<Self> {
        config.validate()?;
        let store = Arc::new(IndexStore::new());
        let builder = build_pipeline(&config, Arc::clone(&store))?;
        Ok(Self {
            scheduler: RefreshScheduler::new(Arc::clone(&builder)),
            config,
            store,
            builder,
            config_store,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn interval(&self) -> Duration {
        Duration::from_secs(self.config.sync.cache_length_minutes * 60)
    }

    /// Host lifecycle hook: start the background refresh loop.
    ///
    /// The loop's cold-start build populates the index immediately rather
    /// than leaving it empty for a full interval.
    pub fn load(&mut self) {
        self.scheduler.start(self.interval());
    }

    /// Host lifecycle hook: stop the background refresh loop. Idempotent.
    pub async fn unload(&mut self) {
        self.scheduler.stop().await;
    }

    /// Apply a keyed configuration write.
    ///
    /// Updates the in-memory field, persists through the config store, and
    /// applies the side effect the field calls for: a new cache length
    /// reconfigures the scheduler, a connection change rebuilds the fetch
    /// pipeline so the next cycle uses the new instance and credentials.
    pub async fn update_config(&mut self, key: &str, value: &str) -> Result<()> {
        let key = ConfigKey::parse(key)
            .ok_or_else(|| AppError::config(format!("unrecognized config key: {key}")))?;
        self.config.set(key, value)?;
        self.config_store.persist(&self.config)?;

        match key {
            ConfigKey::CacheLengthMinutes => {
                if self.scheduler.is_running() {
                    self.scheduler.reconfigure(self.interval()).await;
                }
            }
            _ => self.rebuild_pipeline().await?,
        }
        Ok(())
    }

    /// Tear down and rebuild the fetch pipeline after a connection change.
    ///
    /// The published snapshot survives; only the fetch side is replaced.
    async fn rebuild_pipeline(&mut self) -> Result<()> {
        let was_running = self.scheduler.is_running();
        self.scheduler.stop().await;
        self.builder = build_pipeline(&self.config, Arc::clone(&self.store))?;
        self.scheduler = RefreshScheduler::new(Arc::clone(&self.builder));
        if was_running {
            self.scheduler.start(self.interval());
        }
        Ok(())
    }

    /// Query entry point: match raw user input against the current snapshot.
    pub fn handle_query(&self, text: &str) -> Vec<DisplayItem> {
        search(&self.store.snapshot(), text)
    }

    /// Kick off an immediate out-of-band rebuild on its own task.
    ///
    /// Leaves the scheduler's timer untouched; the token manager's
    /// single-flight lock keeps a concurrent timer-driven renewal safe.
    pub fn refresh_now(&self) {
        let builder = Arc::clone(&self.builder);
        tokio::spawn(async move {
            if let Err(error) = builder.rebuild().await {
                log::warn!("Manual index refresh failed: {}", error);
            }
        });
    }

    /// Run one synchronous fetch-and-index cycle.
    pub async fn rebuild_once(&self) -> Result<usize> {
        self.builder.rebuild().await
    }
}
