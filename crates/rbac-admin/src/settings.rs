//! Admin settings loaded from TOML.
//!
//! Every key is optional; anything missing takes its default, so an empty
//! file is a valid configuration.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use rbac_form::{DEFAULT_CREATE_VALUE, DEFAULT_DEBOUNCE, PaginatedSelectConfig};
use rbac_grid::GridConfig;
use serde::{Deserialize, Serialize};
use tracing::Level;

use crate::error::SettingsError;
use crate::logging::{LogConfig, LogFormat};
use crate::toast::{DEFAULT_ERROR_TOAST_DURATION, DEFAULT_TOAST_DURATION};

// =============================================================================
// ROOT SETTINGS
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Table defaults for every resource page.
    pub grid: GridConfig,

    pub form: FormSettings,

    pub toast: ToastSettings,

    pub logging: LoggingSettings,
}

impl Settings {
    /// Parse settings from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        toml::from_str(content).map_err(|e| SettingsError::Parse {
            message: e.to_string(),
        })
    }

    /// Load settings from a file.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Load settings, falling back to defaults when the file is missing.
    ///
    /// A file that exists but cannot be parsed is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self, SettingsError> {
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save settings to a file, creating its directory if needed.
    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| SettingsError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| SettingsError::Serialize {
            message: e.to_string(),
        })?;

        std::fs::write(path, content).map_err(|source| SettingsError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

// =============================================================================
// FORM SETTINGS
// =============================================================================

/// Defaults applied to every paginated select.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormSettings {
    /// Search settle period in milliseconds.
    pub debounce_ms: u64,

    /// Options requested per page.
    pub select_page_size: usize,

    /// Sentinel value of the "create new" entry.
    pub create_value: String,
}

impl Default for FormSettings {
    fn default() -> Self {
        Self {
            debounce_ms: u64::try_from(DEFAULT_DEBOUNCE.as_millis()).unwrap_or(300),
            select_page_size: 10,
            create_value: DEFAULT_CREATE_VALUE.to_string(),
        }
    }
}

impl FormSettings {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Apply these defaults to a select config. Values the field set
    /// through its own builder are kept.
    pub fn apply_to(&self, config: PaginatedSelectConfig) -> PaginatedSelectConfig {
        config.with_fallbacks(self.select_page_size, self.debounce(), &self.create_value)
    }
}

// =============================================================================
// TOAST SETTINGS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToastSettings {
    /// Display time in milliseconds; 0 keeps toasts until dismissed.
    pub duration_ms: u64,

    /// Display time of error toasts in milliseconds.
    pub error_duration_ms: u64,
}

impl Default for ToastSettings {
    fn default() -> Self {
        Self {
            duration_ms: u64::try_from(DEFAULT_TOAST_DURATION.as_millis()).unwrap_or(5000),
            error_duration_ms: u64::try_from(DEFAULT_ERROR_TOAST_DURATION.as_millis())
                .unwrap_or(7000),
        }
    }
}

impl ToastSettings {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    pub fn error_duration(&self) -> Duration {
        Duration::from_millis(self.error_duration_ms)
    }
}

// =============================================================================
// LOGGING SETTINGS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// One of error, warn, info, debug, trace.
    pub level: String,
    pub format: LogFormat,
    pub timestamps: bool,
    pub target: bool,
    pub ansi: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
            timestamps: false,
            target: false,
            ansi: true,
        }
    }
}

impl LoggingSettings {
    /// Convert into a [`LogConfig`].
    pub fn to_log_config(&self) -> Result<LogConfig, SettingsError> {
        let level = Level::from_str(self.level.trim()).map_err(|_| {
            SettingsError::InvalidLogLevel {
                level: self.level.clone(),
            }
        })?;
        Ok(LogConfig::default()
            .with_level(level)
            .with_format(self.format)
            .with_timestamps(self.timestamps)
            .with_target(self.target)
            .with_ansi(self.ansi))
    }
}
