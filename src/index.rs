// src/index.rs

//! Search index construction and publication.
//!
//! Every refresh cycle builds a complete new entry collection and publishes
//! it with a single atomic swap. Readers holding the previous snapshot keep a
//! consistent view; nobody ever observes a half-built index.

use std::sync::{Arc, RwLock};
use std::time::Instant;

use futures::StreamExt;

use crate::error::Result;
use crate::fetcher::ArticleFetcher;
use crate::models::ArticleRecord;

/// A user-facing action bound to a display item.
///
/// Actions are plain data; opening URLs or touching the clipboard is the
/// host's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Open the article's reader view on the wallabag instance
    OpenInWallabag { url: String },
    /// Open the original article URL
    OpenUrl { url: String },
    /// Copy the original article URL to the clipboard
    CopyUrl { url: String },
    /// Trigger an immediate out-of-band index rebuild
    RefreshIndex,
}

impl Action {
    pub fn label(&self) -> &'static str {
        match self {
            Self::OpenInWallabag { .. } => "Open article in wallabag",
            Self::OpenUrl { .. } => "Open article URL",
            Self::CopyUrl { .. } => "Copy article URL to clipboard",
            Self::RefreshIndex => "Refresh wallabag index",
        }
    }
}

/// A presentable search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayItem {
    pub text: String,
    pub subtext: String,
    pub actions: Vec<Action>,
}

/// One searchable index entry: the lowercase filter key plus its display item.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub filter: String,
    pub item: DisplayItem,
}

/// The published, immutable index state.
pub type IndexSnapshot = Arc<Vec<IndexEntry>>;

/// Holds the current snapshot and swaps it atomically on publish.
///
/// Single-writer, many-reader: readers clone the `Arc` under a short read
/// lock and then work lock-free against an immutable collection.
#[derive(Default)]
pub struct IndexStore {
    snapshot: RwLock<IndexSnapshot>,
}

impl IndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot; possibly stale, always complete.
    pub fn snapshot(&self) -> IndexSnapshot {
        self.snapshot.read().expect("index lock poisoned").clone()
    }

    /// Replace the published snapshot in one swap.
    pub fn publish(&self, entries: Vec<IndexEntry>) {
        *self.snapshot.write().expect("index lock poisoned") = Arc::new(entries);
    }
}

/// Build one index entry from a raw article record.
pub fn build_entry(record: &ArticleRecord, instance_url: &str) -> IndexEntry {
    let tags = record.joined_tags();
    let title = record.title.as_deref().unwrap_or_default();

    // Lowercased uniformly so case-insensitive substring search holds across
    // url, title, and tag labels alike. Untagged articles get no trailing
    // separator.
    let mut filter = format!("{},{}", record.url.to_lowercase(), title.to_lowercase());
    let mut subtext = record.url.clone();
    if !tags.is_empty() {
        filter.push(',');
        filter.push_str(&tags.to_lowercase());
        subtext.push(',');
        subtext.push_str(&tags);
    }

    let item = DisplayItem {
        text: record.display_title().to_string(),
        subtext,
        actions: vec![
            Action::OpenInWallabag {
                url: format!("{}/view/{}", instance_url, record.id),
            },
            Action::OpenUrl {
                url: record.url.clone(),
            },
            Action::CopyUrl {
                url: record.url.clone(),
            },
        ],
    };

    IndexEntry { filter, item }
}

/// Drives a full fetch-transform-publish cycle.
pub struct IndexBuilder {
    fetcher: ArticleFetcher,
    store: Arc<IndexStore>,
    instance_url: String,
}

impl IndexBuilder {
    pub fn new(fetcher: ArticleFetcher, store: Arc<IndexStore>, instance_url: String) -> Self {
        Self {
            fetcher,
            store,
            instance_url,
        }
    }

    /// Fetch all articles, build a fresh entry collection, and publish it.
    ///
    /// Returns the number of entries indexed. On a token failure the previous
    /// snapshot stays published and the error propagates; a mid-listing page
    /// failure still publishes the partial collection.
    pub async fn rebuild(&self) -> Result<usize> {
        let start = Instant::now();
        let articles = self.fetcher.articles().await?;

        let entries: Vec<IndexEntry> = articles
            .map(|record| build_entry(&record, &self.instance_url))
            .collect()
            .await;

        let count = entries.len();
        self.store.publish(entries);
        log::info!(
            "Indexed {} articles [{} ms]",
            count,
            start.elapsed().as_millis()
        );
        Ok(count)
    }
}
