use std::{fs, path::Path, path::PathBuf};

use serde::Deserialize;

use crate::{
    error::{Error, Result},
    sql::executor::DEFAULT_MAX_WIDTH,
};

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Runtime configuration, loaded from TOML. Missing keys take their defaults.
///
/// ```toml
/// data_dir = "./Databases"
/// log_level = "info"
/// max_column_width = 50
/// prompt = "flatsql > "
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base directory holding the registry and one directory per database
    pub data_dir: PathBuf,
    /// Default tracing filter, overridden by RUST_LOG
    pub log_level: String,
    /// Select output wraps values longer than this
    pub max_column_width: usize,
    pub prompt: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./Databases"),
            log_level: "info".to_string(),
            max_column_width: DEFAULT_MAX_WIDTH,
            prompt: "flatsql > ".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Config(format!(
                "failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_column_width == 0 {
            return Err(Error::Config("max_column_width cannot be 0".to_string()));
        }
        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(Error::Config(format!(
                "invalid log level '{}', must be one of: {}",
                self.log_level,
                LOG_LEVELS.join(", ")
            )));
        }
        if self.data_dir.as_os_str().is_empty() {
            return Err(Error::Config("data_dir cannot be empty".to_string()));
        }
        Ok(())
    }
}
