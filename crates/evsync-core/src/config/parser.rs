// Evsync Config Parser - TOML with Serde
// Loads defaults, per-device rules and device selection from TOML

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use regex::Regex;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::input::ValuatorMode;
use crate::session::SessionOptions;
use crate::transform::{Calibration, PostProcessing};

use super::options::DeviceOptions;

/// Main configuration structure (root TOML table)
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigToml {
    /// General settings
    #[serde(default)]
    pub general: Option<GeneralConfig>,

    /// Device selection
    #[serde(default)]
    pub devices: Option<DevicesConfig>,

    /// Options applied to every device
    #[serde(default)]
    pub defaults: DeviceOptionsToml,

    /// Per-device overrides, applied in file order
    #[serde(default)]
    pub device: IndexMap<String, DeviceRuleToml>,
}

/// General settings
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneralConfig {
    /// Grab devices so nothing else sees their events
    pub grab: Option<bool>,
    /// Timeout passed to the poll loop (milliseconds)
    pub poll_timeout_ms: Option<u64>,
}

/// Device filtering configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DevicesConfig {
    /// Explicit device names/paths to use
    #[serde(default)]
    pub only: Vec<String>,
}

/// Option keys as written in TOML
#[derive(Debug, Clone, Deserialize, Default)]
pub struct DeviceOptionsToml {
    pub invert_x: Option<bool>,
    pub invert_y: Option<bool>,
    pub swap_axes: Option<bool>,
    /// `[min_x, max_x, min_y, max_y]`, or empty to clear
    pub calibration: Option<Vec<i32>>,
    pub ignore_relative_axes: Option<bool>,
    pub ignore_absolute_axes: Option<bool>,
    pub button_mapping: Option<String>,
    pub key_remap: Option<String>,
    pub mode: Option<String>,
    pub smooth_scroll: Option<bool>,
    pub post_processing: Option<String>,
}

/// One `[device.<label>]` table
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceRuleToml {
    /// Regex tested against the device name and path
    #[serde(rename = "match")]
    pub pattern: String,

    #[serde(flatten)]
    pub options: DeviceOptionsToml,
}

/// A compiled per-device rule
#[derive(Debug, Clone)]
pub struct DeviceRule {
    pub label: String,
    pub pattern: Regex,
    pub options: DeviceOptions,
}

impl DeviceRule {
    pub fn matches(&self, device_name: &str, device_path: &str) -> bool {
        self.pattern.is_match(device_name) || self.pattern.is_match(device_path)
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Options applied to every device
    pub defaults: DeviceOptions,
    /// Per-device rules in file order
    pub rules: Vec<DeviceRule>,
    /// Device name/path filter (empty = every input device)
    pub device_filter: Vec<String>,
    pub grab: bool,
    /// Event poll timeout in milliseconds
    pub poll_timeout_ms: Option<u64>,
    /// Path to the config file (for reload)
    source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(&path)?;
        let mut config = Self::from_toml(&content)?;
        config.source_path = Some(path.as_ref().to_path_buf());
        Ok(config)
    }

    /// Load configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let raw: ConfigToml = toml::from_str(content).map_err(|e| ConfigError::TomlParse(e.to_string()))?;

        let mut config = Self {
            defaults: convert_options(&raw.defaults)?,
            ..Self::default()
        };

        for (label, rule) in &raw.device {
            let pattern = Regex::new(&rule.pattern)
                .map_err(|e| ConfigError::InvalidPattern(format!("device.{}: {}", label, e)))?;
            config.rules.push(DeviceRule {
                label: label.clone(),
                pattern,
                options: convert_options(&rule.options)?,
            });
        }

        if let Some(devices) = raw.devices {
            config.device_filter = devices.only;
        }

        if let Some(general) = raw.general {
            config.grab = general.grab.unwrap_or(false);
            config.poll_timeout_ms = general.poll_timeout_ms;
        }

        log::debug!(
            "config: {} device rule(s), {} device filter(s)",
            config.rules.len(),
            config.device_filter.len()
        );
        Ok(config)
    }

    /// Get the default config path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("evsync").join("config.toml"))
    }

    /// Load from the default location, or defaults if there is no file
    pub fn load_default() -> Result<Self, ConfigError> {
        if let Some(path) = Self::default_path() {
            if path.exists() {
                return Self::from_file(path);
            }
        }
        Ok(Self::default())
    }

    /// Reload from the original file
    pub fn reload(&mut self) -> Result<(), ConfigError> {
        match self.source_path.clone() {
            Some(path) => {
                *self = Self::from_file(path)?;
                Ok(())
            }
            None => Err(ConfigError::InvalidValue("No source path set".to_string())),
        }
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// Effective options for a device: defaults overlaid with every matching rule in order
    pub fn options_for(&self, device_name: &str, device_path: &str) -> DeviceOptions {
        let mut options = self.defaults.clone();
        for rule in self.rules.iter().filter(|rule| rule.matches(device_name, device_path)) {
            log::debug!("{}: applying [device.{}]", device_name, rule.label);
            options.merge_from(&rule.options);
        }
        options
    }

    pub fn session_options_for(&self, device_name: &str, device_path: &str) -> SessionOptions {
        self.options_for(device_name, device_path).to_session_options()
    }
}

fn convert_options(raw: &DeviceOptionsToml) -> Result<DeviceOptions, ConfigError> {
    let calibration = match raw.calibration.as_deref() {
        None => None,
        Some([]) => Some(None),
        Some([min_x, max_x, min_y, max_y]) => Some(Some(Calibration::new(*min_x, *max_x, *min_y, *max_y))),
        Some(other) => {
            return Err(ConfigError::InvalidValue(format!(
                "calibration needs 0 or 4 values, got {}",
                other.len()
            )))
        }
    };

    let mode = raw
        .mode
        .as_deref()
        .map(|s| {
            s.parse::<ValuatorMode>()
                .map_err(|_| ConfigError::InvalidValue(format!("Unknown mode '{}'", s)))
        })
        .transpose()?;

    let post_processing = raw
        .post_processing
        .as_deref()
        .map(|s| {
            s.parse::<PostProcessing>()
                .map_err(|_| ConfigError::InvalidValue(format!("Unknown post_processing '{}'", s)))
        })
        .transpose()?;

    Ok(DeviceOptions {
        invert_x: raw.invert_x,
        invert_y: raw.invert_y,
        swap_axes: raw.swap_axes,
        calibration,
        ignore_relative_axes: raw.ignore_relative_axes,
        ignore_absolute_axes: raw.ignore_absolute_axes,
        button_mapping: raw.button_mapping.clone(),
        key_remap: raw.key_remap.clone(),
        mode,
        smooth_scroll: raw.smooth_scroll,
        post_processing,
    })
}

/// Default config content for a new installation
pub fn default_config_content() -> &'static str {
    r#"# Evsync Configuration
# Place this file at: ~/.config/evsync/config.toml

[general]
grab = false
poll_timeout_ms = 100

[devices]
# Explicit device names or paths; empty uses every input device
only = []

[defaults]
invert_x = false
invert_y = false
swap_axes = false
smooth_scroll = false

# Per-device overrides, applied in order when `match` hits the name or path
# [device.touchscreen]
# match = "(?i)touchscreen"
# calibration = [120, 3950, 200, 3900]
# mode = "absolute"
#
# [device.left-handed]
# match = "Logitech"
# button_mapping = "3 2 1"
#
# [device.bezel]
# match = "^tizen_rotary$"
# post_processing = "rotary"
"#
}
