//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::Deserialize;
use serde::de::Error;
use std::fs;
use std::path::Path;

use crate::error::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default)]
    pub control: ControlConfig,
    #[serde(default)]
    pub video: VideoConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Gamepad configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ControllerConfig {
    /// evdev device path; empty means scan for the first gamepad
    #[serde(default)]
    pub device_path: String,

    #[serde(default = "default_bindings_path")]
    pub bindings_path: String,

    #[serde(default = "default_calibration_step_timeout_s")]
    pub calibration_step_timeout_s: u64,
}

/// Control loop configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ControlConfig {
    #[serde(default = "default_tick_period_ms")]
    pub tick_period_ms: u64,

    #[serde(default = "default_translation_threshold")]
    pub translation_threshold: f64,

    #[serde(default = "default_yaw_threshold")]
    pub yaw_threshold: f64,
}

/// Video relay configuration
#[derive(Debug, Deserialize, Clone)]
pub struct VideoConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,

    #[serde(default = "default_output_url")]
    pub output_url: String,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    #[serde(default = "default_log_dir")]
    pub dir: String,

    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_bindings_path() -> String { "bindings.json".to_string() }
fn default_calibration_step_timeout_s() -> u64 { 30 }

fn default_tick_period_ms() -> u64 { 10 }
fn default_translation_threshold() -> f64 { 10_000.0 }
fn default_yaw_threshold() -> f64 { 20_000.0 }

fn default_ffmpeg_path() -> String { "ffmpeg".to_string() }
fn default_output_url() -> String { "http://localhost:8090/bebop.ffm".to_string() }

fn default_log_dir() -> String { "./logs".to_string() }
fn default_log_level() -> String { "info".to_string() }

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            device_path: String::new(),
            bindings_path: default_bindings_path(),
            calibration_step_timeout_s: default_calibration_step_timeout_s(),
        }
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: default_tick_period_ms(),
            translation_threshold: default_translation_threshold(),
            yaw_threshold: default_yaw_threshold(),
        }
    }
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            ffmpeg_path: default_ffmpeg_path(),
            output_url: default_output_url(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the given path, falling back to all-default values when the
    /// file does not exist.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        // Controller device_path can be empty (auto-detect)
        if self.controller.bindings_path.is_empty() {
            return Err(crate::error::PilotError::Config(
                toml::de::Error::custom("bindings_path cannot be empty")
            ));
        }

        if self.controller.calibration_step_timeout_s == 0
            || self.controller.calibration_step_timeout_s > 600 {
            return Err(crate::error::PilotError::Config(
                toml::de::Error::custom("calibration_step_timeout_s must be between 1 and 600")
            ));
        }

        if self.control.tick_period_ms == 0 || self.control.tick_period_ms > 1000 {
            return Err(crate::error::PilotError::Config(
                toml::de::Error::custom("tick_period_ms must be between 1 and 1000")
            ));
        }

        if self.control.translation_threshold < 0.0
            || self.control.translation_threshold > 32767.0 {
            return Err(crate::error::PilotError::Config(
                toml::de::Error::custom("translation_threshold must be between 0 and 32767")
            ));
        }

        if self.control.yaw_threshold < 0.0 || self.control.yaw_threshold > 32767.0 {
            return Err(crate::error::PilotError::Config(
                toml::de::Error::custom("yaw_threshold must be between 0 and 32767")
            ));
        }

        if self.video.enabled {
            if self.video.ffmpeg_path.is_empty() {
                return Err(crate::error::PilotError::Config(
                    toml::de::Error::custom("ffmpeg_path cannot be empty when video is enabled")
                ));
            }
            if self.video.output_url.is_empty() {
                return Err(crate::error::PilotError::Config(
                    toml::de::Error::custom("output_url cannot be empty when video is enabled")
                ));
            }
        }

        if self.log.dir.is_empty() {
            return Err(crate::error::PilotError::Config(
                toml::de::Error::custom("log dir cannot be empty")
            ));
        }

        if !["trace", "debug", "info", "warn", "error"].contains(&self.log.level.as_str()) {
            return Err(crate::error::PilotError::Config(
                toml::de::Error::custom("log level must be one of: trace, debug, info, warn, error")
            ));
        }

        Ok(())
    }
}
