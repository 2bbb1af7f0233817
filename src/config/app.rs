//! Main application configuration
//!
//! This module defines the top-level configuration for the rating service,
//! including TOML file loading, environment variable overrides and validation.

use crate::config::RatingConfig;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub rating: RatingConfig,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Upper bound on the rating computation of one match, 0 disables it
    pub processing_timeout_seconds: u64,
    /// Rate independent divisions of a match on the rayon pool
    pub parallel_divisions: bool,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "elommr-rater".to_string(),
            log_level: "info".to_string(),
            processing_timeout_seconds: 60,
            parallel_divisions: true,
        }
    }
}

impl ServiceSettings {
    /// Get the processing timeout as Duration, if one is configured
    pub fn processing_timeout(&self) -> Option<Duration> {
        match self.processing_timeout_seconds {
            0 => None,
            seconds => Some(Duration::from_secs(seconds)),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_overrides(|name| env::var(name).ok())?;

        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: AppConfig = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.apply_overrides(|name| env::var(name).ok())?;

        validate_config(&config)?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in production)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Service settings
        if let Some(name) = lookup("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Some(log_level) = lookup("LOG_LEVEL") {
            self.service.log_level = log_level;
        }
        override_parsed(&lookup, "PROCESSING_TIMEOUT_SECONDS", &mut self.service.processing_timeout_seconds)?;
        override_parsed(&lookup, "PARALLEL_DIVISIONS", &mut self.service.parallel_divisions)?;

        // Rating constants
        let rating = &mut self.rating;
        override_parsed(&lookup, "NOOB_SKILL", &mut rating.noob_skill)?;
        override_parsed(&lookup, "NOOB_UNCERTAINTY", &mut rating.noob_uncertainty)?;
        override_parsed(&lookup, "NOOB_PLACEMENT", &mut rating.noob_placement)?;
        override_parsed(&lookup, "NOOB_WEIGHT", &mut rating.noob_weight)?;
        override_parsed(&lookup, "RATING_MIN", &mut rating.rating_min)?;
        override_parsed(&lookup, "RATING_MAX", &mut rating.rating_max)?;
        override_parsed(&lookup, "PERCENT_FACTOR", &mut rating.percent_factor)?;
        override_parsed(&lookup, "STAGE_COUNT_FACTOR", &mut rating.stage_count_factor)?;
        override_parsed(&lookup, "COMPETITOR_COUNT_FACTOR", &mut rating.competitor_count_factor)?;
        override_parsed(&lookup, "MMR_METHOD", &mut rating.mmr_method)?;

        Ok(())
    }

    /// Get the processing timeout as Duration, if one is configured
    pub fn processing_timeout(&self) -> Option<Duration> {
        self.service.processing_timeout()
    }
}

fn override_parsed<F, T>(lookup: &F, name: &str, target: &mut T) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(value) = lookup(name) {
        *target = value
            .parse()
            .map_err(|_| anyhow!("Invalid {} value: {}", name, value))?;
    }
    Ok(())
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.service.name.is_empty() {
        return Err(anyhow!("Service name cannot be empty"));
    }

    config.rating.validate()
}
