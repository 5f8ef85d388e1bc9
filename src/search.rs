// src/search.rs

//! Read-only query surface over the published index snapshot.

use crate::index::{Action, DisplayItem, IndexSnapshot};

/// Match a user query against the snapshot's filter keys.
///
/// Non-empty terms are lowercased and matched as substrings, preserving
/// snapshot order. An empty or whitespace-only term yields a single
/// placeholder item carrying the manual refresh action. Never touches the
/// network and never mutates the snapshot.
pub fn search(snapshot: &IndexSnapshot, term: &str) -> Vec<DisplayItem> {
    let term = term.trim();
    if term.is_empty() {
        return vec![placeholder_item()];
    }

    let needle = term.to_lowercase();
    snapshot
        .iter()
        .filter(|entry| entry.filter.contains(&needle))
        .map(|entry| entry.item.clone())
        .collect()
}

/// The item shown when no query has been typed yet.
pub fn placeholder_item() -> DisplayItem {
    DisplayItem {
        text: "Wallabag".to_string(),
        subtext: "Search for an article saved in Wallabag".to_string(),
        actions: vec![Action::RefreshIndex],
    }
}
