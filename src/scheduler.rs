// src/scheduler.rs

//! Background refresh scheduling.
//!
//! The scheduler is an explicit two-state machine: Stopped or Running one
//! loop task. Reconfiguration stops the old loop (signal, then join) before
//! spawning the replacement, so two loops never run concurrently for the
//! same instance.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::index::IndexBuilder;

/// Periodically rebuilds the index on a spawned background task.
pub struct RefreshScheduler {
    builder: Arc<IndexBuilder>,
    running: Option<RunningLoop>,
}

struct RunningLoop {
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl RefreshScheduler {
    pub fn new(builder: Arc<IndexBuilder>) -> Self {
        Self {
            builder,
            running: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Start the background loop; no-op when already running.
    ///
    /// The loop performs an immediate build before its first wait, so the
    /// index is populated right after load instead of one interval later.
    pub fn start(&mut self, interval: Duration) {
        if self.running.is_some() {
            return;
        }
        let (stop_tx, stop_rx) = watch::channel(false);
        let builder = Arc::clone(&self.builder);
        let handle = tokio::spawn(run_loop(builder, interval, stop_rx));
        self.running = Some(RunningLoop {
            stop: stop_tx,
            handle,
        });
        log::debug!("Refresh scheduler started (interval {:?})", interval);
    }

    /// Signal the loop to stop and wait for it to finish. Idempotent.
    ///
    /// An in-flight build is allowed to complete; only the next cycle is
    /// prevented.
    pub async fn stop(&mut self) {
        if let Some(running) = self.running.take() {
            let _ = running.stop.send(true);
            let _ = running.handle.await;
            log::debug!("Refresh scheduler stopped");
        }
    }

    /// Replace the loop with one running at a new interval.
    pub async fn reconfigure(&mut self, interval: Duration) {
        self.stop().await;
        self.start(interval);
    }
}

async fn run_loop(builder: Arc<IndexBuilder>, interval: Duration, mut stop: watch::Receiver<bool>) {
    loop {
        if *stop.borrow() {
            return;
        }
        if let Err(error) = builder.rebuild().await {
            // Never fatal; the next cycle is the retry.
            log::warn!("Index refresh failed: {}", error);
        }
        // A stop requested during the build takes effect before the wait.
        if *stop.borrow() {
            return;
        }
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = stop.changed() => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenManager;
    use crate::config::ConnectionConfig;
    use crate::fetcher::ArticleFetcher;
    use crate::index::IndexStore;

    // A builder over an unconfigured connection: every cycle fails fast with
    // MissingCredential and never touches the network.
    fn idle_builder() -> Arc<IndexBuilder> {
        let client = reqwest::Client::new();
        let connection = ConnectionConfig::default();
        let tokens = Arc::new(TokenManager::new(client.clone(), connection.clone()));
        let fetcher = ArticleFetcher::new(client, connection.instance_url.clone(), tokens);
        Arc::new(IndexBuilder::new(
            fetcher,
            Arc::new(IndexStore::new()),
            connection.instance_url,
        ))
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let mut scheduler = RefreshScheduler::new(idle_builder());
        scheduler.start(Duration::from_secs(900));
        assert!(scheduler.is_running());

        scheduler.stop().await;
        assert!(!scheduler.is_running());
        // A second stop on an already-stopped scheduler is a no-op.
        scheduler.stop().await;
        assert!(!scheduler.is_running());
    }

    #[tokio::test]
    async fn test_start_twice_keeps_single_loop() {
        let mut scheduler = RefreshScheduler::new(idle_builder());
        scheduler.start(Duration::from_secs(900));
        scheduler.start(Duration::from_secs(1));
        assert!(scheduler.is_running());
        scheduler.stop().await;
    }

    #[tokio::test]
    async fn test_reconfigure_replaces_loop() {
        let mut scheduler = RefreshScheduler::new(idle_builder());
        scheduler.start(Duration::from_secs(900));
        scheduler.reconfigure(Duration::from_secs(60)).await;
        assert!(scheduler.is_running());
        scheduler.stop().await;
        assert!(!scheduler.is_running());
    }

    #[tokio::test]
    async fn test_stop_terminates_mid_wait() {
        let mut scheduler = RefreshScheduler::new(idle_builder());
        scheduler.start(Duration::from_secs(3600));
        // Give the loop time to finish its first build and enter the wait.
        tokio::time::sleep(Duration::from_millis(50)).await;
        // Must return promptly rather than after the full interval.
        tokio::time::timeout(Duration::from_secs(5), scheduler.stop())
            .await
            .expect("stop() should not wait out the interval");
    }
}
