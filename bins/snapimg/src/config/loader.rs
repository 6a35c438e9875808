//! Configuration file loading

use super::schema::ConfigSchema;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Candidate locations, checked in order
const CANDIDATES: [&str; 3] = [".snapimg.toml", "snapimg.toml", ".config/snapimg.toml"];

/// Configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Configuration wrapper
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub schema: ConfigSchema,
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load `path`, or the first candidate found in `base`, or defaults
    pub fn load(path: Option<&Path>, base: &Path) -> Result<Self, ConfigError> {
        let config_path = path.map(Path::to_path_buf).or_else(|| find_config_file(base));

        let schema = match config_path {
            Some(ref p) => load_config_file(p)?,
            None => ConfigSchema::default(),
        };

        Ok(Self {
            schema,
            path: config_path,
        })
    }
}

/// Find configuration file in standard locations
fn find_config_file(base: &Path) -> Option<PathBuf> {
    CANDIDATES.iter().map(|candidate| base.join(candidate)).find(|p| p.is_file())
}

/// Load and parse a TOML configuration file
fn load_config_file(path: &Path) -> Result<ConfigSchema, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
