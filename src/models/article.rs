// src/models/article.rs

//! Wire types for the wallabag entries API.
//!
//! These mirror the JSON shapes returned by `GET /api/entries.json` and are
//! transient: they exist only for the duration of a fetch cycle.

use serde::Deserialize;

/// A single saved article as returned by the remote API.
#[derive(Debug, Clone, Deserialize)]
pub struct ArticleRecord {
    pub id: u64,
    /// The remote can return null or an empty title; display falls back to the URL.
    #[serde(default)]
    pub title: Option<String>,
    pub url: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// A tag attached to an article.
#[derive(Debug, Clone, Deserialize)]
pub struct Tag {
    pub label: String,
}

/// One page of the paginated entries listing.
#[derive(Debug, Deserialize)]
pub struct EntriesPage {
    /// Authoritative total page count, re-read on every page.
    pub pages: u32,
    #[serde(rename = "_embedded")]
    pub embedded: EmbeddedItems,
}

/// The `_embedded` envelope wrapping the page's items.
#[derive(Debug, Deserialize)]
pub struct EmbeddedItems {
    pub items: Vec<ArticleRecord>,
}

impl ArticleRecord {
    /// Title if present and non-empty, otherwise the URL.
    pub fn display_title(&self) -> &str {
        match &self.title {
            Some(t) if !t.is_empty() => t,
            _ => &self.url,
        }
    }

    /// Tag labels joined with commas, as used in filter keys and subtexts.
    pub fn joined_tags(&self) -> String {
        self.tags
            .iter()
            .map(|t| t.label.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}
