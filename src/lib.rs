// src/lib.rs

//! Wallabag Sync & Search Library

pub mod auth;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod index;
pub mod models;
pub mod plugin;
pub mod scheduler;
pub mod search;
