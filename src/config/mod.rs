/// Database configuration and connection management
pub mod database;

/// Baseline catalog loading from config.toml
pub mod catalog;

/// Application settings (sync interval, storage location)
pub mod settings;
