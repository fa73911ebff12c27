//! Configuration module for StreamLab
//!
//! This module handles application configuration including:
//! - The lab configuration file (`streamlab.toml`): service origin, engine limits
//! - Persisted string settings with an expiry window (see [`settings`])
//!
//! # App Data Location
//!
//! Application data is stored in the platform-appropriate location:
//! - **Linux**: `~/.local/share/dev.streamlab.lab/`
//! - **macOS**: `~/Library/Application Support/dev.streamlab.lab/`
//! - **Windows**: `%APPDATA%\dev.streamlab.lab\`
//!
//! # Files
//!
//! - `streamlab.toml` - Lab configuration, written with defaults on first save
//! - `settings.json` - Named UI settings (theme, font size)
//! - `logs/` - Rolling diagnostic logs
//!
//! # Example
//!
//! ```ignore
//! use streamlab_rs::config::AppConfig;
//!
//! let config = AppConfig::load_or_default();
//! let origin = config.service_origin()?;
//! ```

pub mod settings;

pub use settings::{
    use_setting, FileSettingStore, MemorySettingStore, Setting, SettingStore, SETTING_TTL_DAYS,
};

use crate::error::{LabError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Application identifier for data directories
pub const APP_ID: &str = "dev.streamlab.lab";

/// Lab configuration filename
pub const CONFIG_FILE: &str = "streamlab.toml";

/// Persisted settings filename
pub const SETTINGS_FILE: &str = "settings.json";

/// Default origin of the share/normalise service
pub const DEFAULT_SERVICE_ORIGIN: &str = "http://localhost:8080";

/// Default timeout for share/normalise requests in seconds
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Default per-batch execution timeout in seconds
pub const DEFAULT_EXECUTE_TIMEOUT_SECS: u64 = 30;

// ==================== App Data Directory ====================

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// Ensure the app data directory exists
pub fn ensure_app_data_dir() -> Result<PathBuf> {
    let dir = app_data_dir().ok_or_else(|| {
        LabError::Settings("Could not determine app data directory".to_string())
    })?;

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| {
            LabError::Settings(format!("Failed to create app data directory: {}", e))
        })?;
    }

    Ok(dir)
}

/// Get the path to the lab configuration file
pub fn config_path() -> Option<PathBuf> {
    app_data_dir().map(|p| p.join(CONFIG_FILE))
}

/// Get the path to the persisted settings file
pub fn settings_path() -> Option<PathBuf> {
    app_data_dir().map(|p| p.join(SETTINGS_FILE))
}

// ==================== Lab Configuration ====================

/// Which binding serves the normalise operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormaliseBinding {
    /// Normalise with the in-process engine
    #[default]
    Local,
    /// Normalise through `POST <origin>/normalise`
    Remote,
}

/// Remote service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Origin that `/share`, `/normalise` and `/l/<id>` hang off
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Request timeout in seconds
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,

    /// Where normalise requests go
    #[serde(default)]
    pub normalise: NormaliseBinding,
}

fn default_origin() -> String {
    DEFAULT_SERVICE_ORIGIN.to_string()
}

fn default_http_timeout() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            normalise: NormaliseBinding::Local,
        }
    }
}

impl ServiceConfig {
    /// Request timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Safety limits applied to every Rhai engine built for script processors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptLimits {
    pub max_operations: u64,
    pub max_expr_depth: usize,
    pub max_call_levels: usize,
    pub max_string_size: usize,
    pub max_array_size: usize,
}

impl Default for ScriptLimits {
    fn default() -> Self {
        Self {
            max_operations: 100_000,
            max_expr_depth: 64,
            max_call_levels: 32,
            max_string_size: 1_000_000,
            max_array_size: 10_000,
        }
    }
}

/// Compute engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Per-batch timeout for execute, in seconds
    #[serde(default = "default_execute_timeout")]
    pub execute_timeout_secs: u64,

    /// Rhai sandbox limits
    #[serde(default)]
    pub script: ScriptLimits,
}

fn default_execute_timeout() -> u64 {
    DEFAULT_EXECUTE_TIMEOUT_SECS
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            execute_timeout_secs: DEFAULT_EXECUTE_TIMEOUT_SECS,
            script: ScriptLimits::default(),
        }
    }
}

impl EngineConfig {
    /// Execute timeout as a Duration
    pub fn execute_timeout(&self) -> Duration {
        Duration::from_secs(self.execute_timeout_secs)
    }
}

/// UI preferences that are not user-editable settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Write the welcome text into the output log on start
    #[serde(default = "default_true")]
    pub show_welcome: bool,

    /// Initial window size in logical pixels
    #[serde(default = "default_window_size")]
    pub window_size: [f32; 2],
}

fn default_true() -> bool {
    true
}

fn default_window_size() -> [f32; 2] {
    [1280.0, 720.0]
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            show_welcome: true,
            window_size: default_window_size(),
        }
    }
}

/// Complete lab configuration, persisted as TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub service: ServiceConfig,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub ui: UiConfig,
}

impl AppConfig {
    /// Load the configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            LabError::Settings(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        toml::from_str(&content).map_err(|e| {
            LabError::Settings(format!("Failed to parse config file {:?}: {}", path, e))
        })
    }

    /// Load from the default location, returning defaults on any error
    pub fn load_or_default() -> Self {
        let Some(path) = config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        Self::load(&path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load lab config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save the configuration as TOML
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| LabError::Serialization(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path.as_ref(), content)
            .map_err(|e| LabError::Settings(format!("Failed to write config: {}", e)))
    }

    /// Parse the configured service origin
    pub fn service_origin(&self) -> Result<Url> {
        Url::parse(&self.service.origin).map_err(|e| {
            LabError::Settings(format!(
                "Invalid service origin '{}': {}",
                self.service.origin, e
            ))
        })
    }
}
