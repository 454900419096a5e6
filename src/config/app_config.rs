// src/config/app_config.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use tracing::info;

use crate::scheduler::alert_scheduler::AlertSchedulerConfig;
use crate::service::alert_generator::EngineOptions;

/// Environment variable naming an extra configuration file.
pub const CONFIG_FILE_ENV: &str = "BMS_ALERTS_CONFIG";
/// Prefix for per-key overrides, e.g. `BMS_ALERTS__SCHEDULER__REFRESH_INTERVAL_SECS`.
pub const ENV_PREFIX: &str = "BMS_ALERTS";

/// Application configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub environment: EnvironmentConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub alerts: AlertsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnvironmentConfig {
    /// "development", "staging" or "production"
    #[serde(default = "default_profile")]
    pub profile: String,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self { profile: default_profile() }
    }
}

fn default_profile() -> String {
    "development".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

fn default_level() -> String {
    "info".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_refresh_secs")]
    pub refresh_interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_secs(),
        }
    }
}

fn default_refresh_secs() -> u64 {
    60
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    File,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,
    #[serde(default = "default_storage_path")]
    pub path: Option<PathBuf>,
    /// How often the file backend re-reads the document to pick up edits
    /// made by other processes. 0 disables it.
    #[serde(default = "default_reload_secs")]
    pub reload_interval_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: default_storage_path(),
            reload_interval_secs: default_reload_secs(),
        }
    }
}

fn default_backend() -> StorageBackend {
    StorageBackend::File
}

fn default_storage_path() -> Option<PathBuf> {
    Some(PathBuf::from("data/bms-storage.json"))
}

fn default_reload_secs() -> u64 {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlertsConfig {
    #[serde(default = "default_true")]
    pub surface_expired: bool,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self { surface_expired: true }
    }
}

fn default_true() -> bool {
    true
}

impl AppConfig {
    /// Loads `config/default.toml`, `config/{profile}.toml`, the file named by
    /// `BMS_ALERTS_CONFIG`, then environment overrides. Every file is optional.
    pub fn load() -> Result<Self> {
        let profile = std::env::var(format!("{ENV_PREFIX}__ENVIRONMENT__PROFILE"))
            .unwrap_or_else(|_| default_profile());
        let mut paths = vec![
            PathBuf::from("config/default.toml"),
            PathBuf::from(format!("config/{profile}.toml")),
        ];
        if let Ok(extra) = std::env::var(CONFIG_FILE_ENV) {
            paths.push(PathBuf::from(extra));
        }
        Self::load_from_sources(&paths)
    }

    /// Later sources override earlier ones; missing files are skipped.
    pub fn load_from_sources(config_paths: &[PathBuf]) -> Result<Self> {
        let mut cfg = Config::builder();

        for path in config_paths {
            if path.exists() {
                cfg = cfg.add_source(File::from(path.as_path()));
                info!("Loaded config file: {:?}", path);
            } else {
                info!("Config file not found, skipping: {:?}", path);
            }
        }

        cfg = cfg.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let built = cfg.build().context("Failed to build configuration")?;
        let app_config: AppConfig = built
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        app_config.validate()?;
        Ok(app_config)
    }

    pub fn validate(&self) -> Result<()> {
        let valid_profiles = ["development", "staging", "production"];
        if !valid_profiles.contains(&self.environment.profile.as_str()) {
            anyhow::bail!(
                "Invalid environment profile '{}', must be one of {:?}",
                self.environment.profile,
                valid_profiles
            );
        }

        if self.scheduler.refresh_interval_secs == 0 {
            anyhow::bail!("scheduler.refresh_interval_secs must be greater than zero");
        }

        if self.storage.backend == StorageBackend::File && self.storage_path().is_none() {
            anyhow::bail!("storage.path is required for the file backend");
        }

        Ok(())
    }

    pub fn storage_path(&self) -> Option<&Path> {
        self.storage
            .path
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }

    pub fn scheduler_config(&self) -> AlertSchedulerConfig {
        AlertSchedulerConfig {
            refresh_interval: Duration::from_secs(self.scheduler.refresh_interval_secs),
            ..AlertSchedulerConfig::default()
        }
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            surface_expired: self.alerts.surface_expired,
        }
    }
}
