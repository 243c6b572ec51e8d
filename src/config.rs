//! Configuration management for the gamepad tracker
//!
//! Handles loading, parsing, validating and saving YAML configuration files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::input::gamepad::{BackendKind, DeadZone, DEFAULT_DEADZONE};

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TrackerConfig {
    /// Dispatch connect/disconnect callbacks as detached tasks
    #[serde(default)]
    pub async_callbacks: bool,
    /// Platform backend selection
    #[serde(default)]
    pub backend: BackendKind,
    /// Initial thumbstick deadzone for every slot
    #[serde(default)]
    pub deadzone: DeadzoneConfig,
    /// Interval between ticks when driven by the polling loop
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

/// Thumbstick deadzone configuration (normalized units)
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct DeadzoneConfig {
    #[serde(default = "default_deadzone")]
    pub x: f32,
    #[serde(default = "default_deadzone")]
    pub y: f32,
}

impl DeadzoneConfig {
    pub fn to_dead_zone(self) -> DeadZone {
        DeadZone::new(self.x, self.y)
    }
}

impl Default for DeadzoneConfig {
    fn default() -> Self {
        Self {
            x: default_deadzone(),
            y: default_deadzone(),
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            async_callbacks: false,
            backend: BackendKind::default(),
            deadzone: DeadzoneConfig::default(),
            poll_interval_ms: default_poll_interval(),
        }
    }
}

impl TrackerConfig {
    /// Load configuration from file with validation
    pub async fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path))?;

        Self::from_yaml_str(&contents)
            .with_context(|| format!("Invalid config file: {}", path))
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let config: TrackerConfig = serde_yaml::from_str(contents)
            .context("Failed to parse YAML config")?;

        config.validate()?;

        Ok(config)
    }

    /// Save configuration to file
    pub async fn save(&self, path: &str) -> Result<()> {
        let yaml = serde_yaml::to_string(self)
            .context("Failed to serialize config to YAML")?;

        fs::write(path, yaml)
            .await
            .with_context(|| format!("Failed to write config file: {}", path))?;

        Ok(())
    }

    /// Validate configuration for correctness
    pub fn validate(&self) -> Result<()> {
        for (axis, value) in [("x", self.deadzone.x), ("y", self.deadzone.y)] {
            if !value.is_finite() {
                anyhow::bail!("deadzone.{} must be a finite number", axis);
            }
            if !(0.0..1.0).contains(&value.abs()) {
                anyhow::bail!("deadzone.{} = {} is out of range (must be below 1.0)", axis, value);
            }
        }

        if self.poll_interval_ms == 0 {
            anyhow::bail!("poll_interval_ms must be greater than 0");
        }

        Ok(())
    }
}

// Default value functions
fn default_deadzone() -> f32 { DEFAULT_DEADZONE }
fn default_poll_interval() -> u64 { 16 }
