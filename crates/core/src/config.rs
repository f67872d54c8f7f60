use std::{
    fs::{self, File},
    io::Write,
    path::PathBuf,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use crate::assets::{get_config_dir, get_default_config};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Health server settings.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ServeConfig {
    /// Port to bind. When unset, the PORT environment variable is
    /// consulted, then 8080.
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Ledger file the session operates on. Relative paths resolve against
    /// the working directory.
    #[serde(default = "default_ledger")]
    pub ledger: PathBuf,
    #[serde(default)]
    pub serve: ServeConfig,
}

fn default_ledger() -> PathBuf {
    PathBuf::from("data.json")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ledger: default_ledger(),
            serve: ServeConfig::default(),
        }
    }
}

impl Config {
    fn validate(self) -> Result<Self, ConfigError> {
        if self.ledger.as_os_str().is_empty() {
            return Err(ConfigError::Config("Ledger path is empty".to_string()));
        }
        Ok(self)
    }
}

#[instrument(skip(config_path))]
pub fn create_or_get_config_file(
    config_path: Option<PathBuf>,
) -> Result<(bool, PathBuf), ConfigError> {
    let actual_path = config_path.unwrap_or_else(|| {
        let config_dir = get_config_dir();
        config_dir.join("roomtab.yml")
    });

    let parent_dir = actual_path.parent().ok_or_else(|| {
        ConfigError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "Config path has no parent directory",
        ))
    })?;

    if !parent_dir.exists() {
        fs::create_dir_all(parent_dir)?;
    }

    if actual_path.exists() {
        Ok((true, actual_path))
    } else {
        File::create(&actual_path)?.write_all(get_default_config().as_bytes())?;
        Ok((false, actual_path))
    }
}

#[instrument(skip(config_path))]
pub fn get_config(config_path: Option<PathBuf>) -> Result<Config, ConfigError> {
    let (_, config_file) = create_or_get_config_file(config_path)?;
    let content = fs::read_to_string(&config_file)?;
    let config: Config = serde_yaml::from_str(&content)?;
    config.validate()
}
