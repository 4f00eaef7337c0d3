//! Persistent preferences that shape projection behaviour.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ledger::{Calendar, MonthEndPolicy};
use crate::utils::{self, ensure_dir, write_atomic};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serde(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub month_end: MonthEndPolicy,
    #[serde(default = "Config::default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default = "Config::default_due_soon_days")]
    pub due_soon_days: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Optional custom bill file. Defaults to `bills.json` under the data directory.
    pub bills_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            month_end: MonthEndPolicy::default(),
            max_iterations: Self::default_max_iterations(),
            due_soon_days: Self::default_due_soon_days(),
            bills_path: None,
        }
    }
}

impl Config {
    pub fn default_max_iterations() -> usize {
        crate::core::services::DEFAULT_MAX_ITERATIONS
    }

    pub fn default_due_soon_days() -> u32 {
        7
    }

    pub fn calendar(&self) -> Calendar {
        Calendar::new(self.month_end)
    }

    pub fn resolve_bills_path(&self, base: &Path) -> PathBuf {
        match &self.bills_path {
            Some(path) => path.clone(),
            None => utils::bills_file_in(base),
        }
    }
}

/// Handles persistence for [`Config`].
#[derive(Debug, Clone)]
pub struct ConfigManager {
    base_dir: PathBuf,
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new_default() -> Result<Self, ConfigError> {
        Self::with_base_dir(utils::app_data_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self, ConfigError> {
        ensure_dir(&base)?;
        let config_path = utils::config_file_in(&base);
        Ok(Self {
            base_dir: base,
            config_path,
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn load(&self) -> Result<Config, ConfigError> {
        if self.config_path.exists() {
            let data = fs::read_to_string(&self.config_path)?;
            serde_json::from_str(&data).map_err(|err| ConfigError::Serde(err.to_string()))
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(config)
            .map_err(|err| ConfigError::Serde(err.to_string()))?;
        write_atomic(&self.config_path, &json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).unwrap();
        assert_eq!(manager.load().unwrap(), Config::default());
    }

    #[test]
    fn persists_and_reloads() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).unwrap();
        let config = Config {
            month_end: MonthEndPolicy::RollOver,
            due_soon_days: 3,
            ..Config::default()
        };
        manager.save(&config).unwrap();
        assert_eq!(manager.load().unwrap(), config);
        assert!(!utils::tmp_path(manager.config_path()).exists());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).unwrap();
        fs::write(manager.config_path(), r#"{ "month_end": "roll_over" }"#).unwrap();
        let loaded = manager.load().unwrap();
        assert_eq!(loaded.month_end, MonthEndPolicy::RollOver);
        assert_eq!(loaded.max_iterations, Config::default_max_iterations());
        assert_eq!(loaded.due_soon_days, 7);
    }

    #[test]
    fn bills_path_defaults_under_base() {
        let config = Config::default();
        let base = PathBuf::from("/data");
        assert_eq!(config.resolve_bills_path(&base), base.join("bills.json"));
    }
}
