//! Application settings loaded from config.toml
//!
//! ```toml
//! [sync]
//! poll_interval_secs = 15
//! storage_dir = "data/slots"
//!
//! [[products]]
//! id = "seed-camiseta"
//! name = "Camiseta Básica"
//! price = 49.9
//! category = "Camisetas"
//! ```
//!
//! Every section is optional. A missing file yields the defaults and the
//! built-in catalog.

use super::catalog::{CatalogEntry, build_catalog};
use crate::core::catalog::Catalog;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Default poll period for subscriptions.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
const MIN_POLL_INTERVAL_SECS: u64 = 1;
const MAX_POLL_INTERVAL_SECS: u64 = 3600;

/// `[sync]` section.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SyncConfig {
    /// Seconds between last-update polls
    pub poll_interval_secs: u64,
    /// Directory holding the persisted slots
    pub storage_dir: PathBuf,
    /// Age in days under which a product shows the "new" badge
    pub new_badge_days: i64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            storage_dir: PathBuf::from("data/slots"),
            new_badge_days: 7,
        }
    }
}

impl SyncConfig {
    /// Poll period as a [`Duration`].
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    fn validate(&self) -> Result<()> {
        if !(MIN_POLL_INTERVAL_SECS..=MAX_POLL_INTERVAL_SECS).contains(&self.poll_interval_secs) {
            return Err(Error::Config {
                message: format!(
                    "poll_interval_secs must be between {MIN_POLL_INTERVAL_SECS} and {MAX_POLL_INTERVAL_SECS}, got {}",
                    self.poll_interval_secs
                ),
            });
        }
        if self.new_badge_days < 0 {
            return Err(Error::Config {
                message: "new_badge_days cannot be negative".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    sync: SyncConfig,
    products: Option<Vec<CatalogEntry>>,
}

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `[sync]` section
    pub sync: SyncConfig,
    /// Baseline catalog; the built-in one unless `[[products]]` is present
    pub catalog: Catalog,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sync: SyncConfig::default(),
            catalog: Catalog::builtin(),
        }
    }
}

/// Parses configuration from TOML text.
///
/// # Errors
/// Returns [`Error::Config`] for malformed TOML, an out-of-range interval or
/// an invalid catalog entry.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let raw: RawConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    raw.sync.validate()?;
    let catalog = match raw.products {
        Some(entries) => build_catalog(entries)?,
        None => Catalog::builtin(),
    };
    Ok(AppConfig {
        sync: raw.sync,
        catalog,
    })
}

/// Loads configuration from a TOML file.
///
/// # Errors
/// Returns [`Error::Config`] if the file cannot be read or is invalid.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {path_ref:?}: {e}"),
    })?;
    parse_config(&contents)
}

/// Loads `./config.toml` (or `STOREFRONT_CONFIG`), falling back to defaults when absent.
///
/// # Errors
/// Returns [`Error::Config`] if the file exists but is invalid.
pub fn load_default_config() -> Result<AppConfig> {
    let path = std::env::var("STOREFRONT_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    if Path::new(&path).exists() {
        load_config(&path)
    } else {
        info!("No config file at {}, using defaults", path);
        Ok(AppConfig::default())
    }
}
