//! Altar configuration types and loading

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::awtrix::{ConfigOption, DefaultApp, Overlay, disable_all_default_apps, disable_default_app, with_overlay};
use crate::broker::DEFAULT_ADMIN_PORT;

const LOCAL_CONFIG: &str = ".altar.yml";

/// Main Altar configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The Awtrix device to drive
    pub device: DeviceConfig,

    /// Admin server settings
    pub admin: AdminConfig,

    /// Skip the initial settings push and reboot, and log at debug level
    pub debug: bool,

    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Overrides the default log file location
    #[serde(rename = "log-file")]
    pub log_file: Option<PathBuf>,

    /// Initial global display settings
    pub display: DisplaySettings,

    /// Static text apps registered as routines
    pub apps: Vec<StaticAppConfig>,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // An explicit path must load
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::implicit_paths() {
            if !candidate.exists() {
                continue;
            }
            match Self::load_from_file(&candidate) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", candidate.display(), e);
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Parse the config the load chain would pick, without logging
    ///
    /// Used before logging is set up. Failures are ignored; [`Config::load`]
    /// reports them later.
    pub fn peek(config_path: Option<&PathBuf>) -> Option<Self> {
        match config_path {
            Some(path) => Self::parse_file(path).ok(),
            None => Self::implicit_paths()
                .into_iter()
                .filter(|p| p.exists())
                .find_map(|p| Self::parse_file(&p).ok()),
        }
    }

    /// Log level from the config file, or `DEBUG` when debug mode is on
    ///
    /// `debug_mode` is the command-line debug flag; the config file's own
    /// `debug` key also counts.
    pub fn load_log_level(config_path: Option<&PathBuf>, debug_mode: bool) -> Option<String> {
        Self::peek(config_path)
            .unwrap_or_default()
            .effective_log_level(debug_mode)
    }

    /// Log file location from the config file
    pub fn load_log_file(config_path: Option<&PathBuf>) -> Option<PathBuf> {
        Self::peek(config_path)?.log_file
    }

    /// Configured log level, falling back to `DEBUG` in debug mode
    pub fn effective_log_level(&self, debug_mode: bool) -> Option<String> {
        match (&self.log_level, self.debug || debug_mode) {
            (Some(level), _) => Some(level.clone()),
            (None, true) => Some("DEBUG".to_string()),
            (None, false) => None,
        }
    }

    fn implicit_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG)];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("altar").join("altar.yml"));
        }
        paths
    }

    fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Self::parse_file(&path)?;
        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Device connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// IP address of the Awtrix device
    pub address: String,

    /// Port override, e.g. 8080 to target `altar-request-logger`
    pub port: Option<u16>,

    /// Timeout for every outbound request
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: None,
            timeout_ms: 10_000,
        }
    }
}

impl DeviceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Admin server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub host: String,
    pub port: u16,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_ADMIN_PORT,
        }
    }
}

/// Global display settings applied when the broker starts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    #[serde(rename = "disable-default-apps")]
    pub disable_default_apps: Vec<DefaultApp>,

    #[serde(rename = "disable-all-default-apps")]
    pub disable_all_default_apps: bool,

    pub overlay: Option<Overlay>,
}

impl DisplaySettings {
    /// Broker options equivalent to these settings
    pub fn options(&self) -> Vec<ConfigOption> {
        let mut options = Vec::new();
        if self.disable_all_default_apps {
            options.push(disable_all_default_apps());
        }
        for app in &self.disable_default_apps {
            options.push(disable_default_app(*app));
        }
        if let Some(overlay) = self.overlay {
            options.push(with_overlay(overlay));
        }
        options
    }
}

/// A custom app that always shows the same text
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticAppConfig {
    pub name: String,
    pub text: String,
    pub icon: Option<String>,

    #[serde(rename = "poll-rate-secs")]
    pub poll_rate_secs: u64,
}

impl Default for StaticAppConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            text: String::new(),
            icon: None,
            poll_rate_secs: 60,
        }
    }
}

impl StaticAppConfig {
    pub fn poll_rate(&self) -> Duration {
        Duration::from_secs(self.poll_rate_secs)
    }
}
