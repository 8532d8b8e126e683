//! Configuration for taskrank.
//!
//! Loaded from --config, .taskrank.yml or ~/.config/taskrank/taskrank.yml.

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::priority::DEFAULT_PAGE_SIZE;
use crate::sweep::{DEFAULT_BATCH_SIZE, DEFAULT_MAX_RETRIES, DEFAULT_SWEEP_INTERVAL, SweepConfig};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Where task and event files live.
    pub storage: StorageConfig,

    /// Background recalculation.
    pub sweep: SweepSettings,

    /// List output.
    pub listing: ListingConfig,
}

impl Config {
    /// Load configuration with fallback chain.
    ///
    /// Search order:
    /// 1. Explicit path if provided
    /// 2. .taskrank.yml in current directory
    /// 3. ~/.config/taskrank/taskrank.yml
    /// 4. Defaults
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let project_config = PathBuf::from(".taskrank.yml");
        if project_config.exists() {
            match Self::load_from_file(&project_config) {
                Ok(config) => {
                    log::info!("Loaded config from .taskrank.yml");
                    return Ok(config);
                }
                Err(e) => {
                    log::warn!("Failed to load .taskrank.yml: {}", e);
                }
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("taskrank").join("taskrank.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => {
                        log::info!("Loaded config from {}", user_config.display());
                        return Ok(config);
                    }
                    Err(e) => {
                        log::warn!("Failed to load {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sweep.interval_secs == 0 {
            eyre::bail!("sweep.interval-secs must be > 0");
        }
        if self.sweep.batch_size == 0 {
            eyre::bail!("sweep.batch-size must be > 0");
        }
        if self.listing.page_size == 0 {
            eyre::bail!("listing.page-size must be > 0");
        }
        Ok(())
    }
}

/// Storage settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding tasks.jsonl and events.jsonl.
    pub dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("taskrank"),
        }
    }
}

/// Sweep settings as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SweepSettings {
    /// Run the periodic sweep in `taskrank daemon`.
    pub enabled: bool,

    #[serde(rename = "interval-secs")]
    pub interval_secs: u64,

    #[serde(rename = "batch-size")]
    pub batch_size: usize,

    #[serde(rename = "max-retries")]
    pub max_retries: u32,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: DEFAULT_SWEEP_INTERVAL.as_secs(),
            batch_size: DEFAULT_BATCH_SIZE,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl SweepSettings {
    pub fn to_sweep_config(&self) -> SweepConfig {
        SweepConfig::default()
            .with_interval(Duration::from_secs(self.interval_secs))
            .with_batch_size(self.batch_size)
            .with_max_retries(self.max_retries)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ListingConfig {
    #[serde(rename = "page-size")]
    pub page_size: usize,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}
