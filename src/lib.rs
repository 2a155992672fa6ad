//! leech: background file downloads with persisted, observable progress.
//!
//! This library crate exposes all modules for use by the binary and integration tests.
//! Start with [`app::Leech`].

pub mod app;
pub mod database;
pub mod logging;
pub mod managers;
pub mod services;
pub mod types;
