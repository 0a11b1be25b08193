//! Service configuration: database location and plasticity settings.
//!
//! The database path resolves flag > `AXONS_DB_PATH` > the default
//! home-relative location. The plasticity configuration round-trips through
//! a flat JSON document; enum values are stored as strings and the
//! similarity hook is never serialized.

use std::path::{Path, PathBuf};

use directories::BaseDirs;

use crate::plasticity::PlasticityConfig;
use crate::{Error, Result};

/// Environment variable overriding the database path.
pub const DB_PATH_ENV: &str = "AXONS_DB_PATH";

/// File name of the default database in the user's home directory.
const DEFAULT_DB_NAME: &str = ".axons_memory_db";

/// Top-level configuration for a service instance.
#[derive(Debug, Clone)]
pub struct AxonsConfig {
    /// Where the graph database lives.
    pub db_path: PathBuf,
    /// Plasticity settings for the instance.
    pub plasticity: PlasticityConfig,
}

impl Default for AxonsConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            plasticity: PlasticityConfig::default(),
        }
    }
}

impl AxonsConfig {
    /// Resolves the configuration from an optional explicit path and an
    /// optional plasticity config file.
    pub fn resolve(db_path: Option<PathBuf>, plasticity_file: Option<&Path>) -> Result<Self> {
        let plasticity = match plasticity_file {
            Some(path) => load_plasticity_file(path)?,
            None => PlasticityConfig::default(),
        };
        Ok(Self {
            db_path: db_path.unwrap_or_else(default_db_path),
            plasticity,
        })
    }
}

/// The default database path: `$AXONS_DB_PATH` or `$HOME/.axons_memory_db`.
#[must_use]
pub fn default_db_path() -> PathBuf {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }
    BaseDirs::new().map_or_else(
        || PathBuf::from(DEFAULT_DB_NAME),
        |dirs| dirs.home_dir().join(DEFAULT_DB_NAME),
    )
}

/// Loads a plasticity configuration from a flat JSON document.
pub fn load_plasticity_file(path: &Path) -> Result<PlasticityConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| Error::Store {
        operation: "load_plasticity_config".to_string(),
        cause: format!("{}: {e}", path.display()),
    })?;
    let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&contents)
        .map_err(|e| Error::InvalidInput(format!("invalid plasticity config file: {e}")))?;
    PlasticityConfig::from_map(&map)
}

/// Saves a plasticity configuration as a flat JSON document.
pub fn save_plasticity_file(path: &Path, config: &PlasticityConfig) -> Result<()> {
    let map = config.to_map();
    let contents = serde_json::to_string_pretty(&map)
        .map_err(|e| Error::InvalidInput(format!("unserializable plasticity config: {e}")))?;
    std::fs::write(path, contents).map_err(|e| Error::Store {
        operation: "save_plasticity_config".to_string(),
        cause: format!("{}: {e}", path.display()),
    })
}
