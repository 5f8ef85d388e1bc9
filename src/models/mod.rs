// src/models/mod.rs

//! Domain models for the sync and search layer.

mod article;

pub use article::{ArticleRecord, EmbeddedItems, EntriesPage, Tag};
