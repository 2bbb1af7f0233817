//! Rating engine configuration

use crate::error::{RatingError, Result};
use crate::types::Kernel;
use serde::{Deserialize, Serialize};

/// Immutable engine constants threaded through every rating entry point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    /// Rating assigned to competitors without a persisted prior
    pub noob_skill: f64,
    /// Uncertainty assigned to competitors without a persisted prior
    pub noob_uncertainty: f64,
    /// Matches needed before an opponent counts at full weight
    pub noob_placement: u32,
    /// Weight of an opponent with no rated matches
    pub noob_weight: f64,
    pub rating_min: i32,
    pub rating_max: i32,
    /// Scale of the margin squash
    pub percent_factor: f64,
    pub stage_count_factor: f64,
    pub competitor_count_factor: f64,
    pub mmr_method: Kernel,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            noob_skill: 1000.0,
            noob_uncertainty: 350.0,
            noob_placement: 5,
            noob_weight: 0.1,
            rating_min: 100,
            rating_max: 3000,
            percent_factor: 0.05,
            stage_count_factor: 0.15,
            competitor_count_factor: 0.01,
            mmr_method: Kernel::Normal,
        }
    }
}

impl RatingConfig {
    /// Number of points on the rating grid
    pub fn grid_len(&self) -> usize {
        (self.rating_max - self.rating_min + 1).max(0) as usize
    }

    /// Clamp a rating into the grid bounds
    pub fn clamp_rating(&self, rating: f64) -> f64 {
        rating.clamp(self.rating_min as f64, self.rating_max as f64)
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: &str| -> anyhow::Error {
            RatingError::InvalidConfiguration {
                message: message.to_string(),
            }
            .into()
        };

        if self.rating_min >= self.rating_max {
            return Err(invalid("rating_min must be below rating_max"));
        }
        if !self.noob_skill.is_finite()
            || self.noob_skill < self.rating_min as f64
            || self.noob_skill > self.rating_max as f64
        {
            return Err(invalid("noob_skill must lie within [rating_min, rating_max]"));
        }
        if !(self.noob_uncertainty.is_finite() && self.noob_uncertainty > 0.0) {
            return Err(invalid("noob_uncertainty must be positive"));
        }
        if !(0.0..=1.0).contains(&self.noob_weight) {
            return Err(invalid("noob_weight must lie within [0, 1]"));
        }
        if self.percent_factor <= 0.0
            || self.stage_count_factor <= 0.0
            || self.competitor_count_factor <= 0.0
        {
            return Err(invalid("scale factors must be positive"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = RatingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.grid_len(), 2901);
        assert_eq!(config.mmr_method, Kernel::Normal);
    }

    #[test]
    fn test_config_validation() {
        let mut config = RatingConfig::default();
        config.rating_max = config.rating_min;
        assert!(config.validate().is_err());

        config = RatingConfig::default();
        config.noob_skill = 50.0;
        assert!(config.validate().is_err());

        config = RatingConfig::default();
        config.noob_uncertainty = 0.0;
        assert!(config.validate().is_err());

        config = RatingConfig::default();
        config.noob_weight = 1.5;
        assert!(config.validate().is_err());

        config = RatingConfig::default();
        config.percent_factor = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_clamp_rating() {
        let config = RatingConfig::default();
        assert_eq!(config.clamp_rating(42.0), 100.0);
        assert_eq!(config.clamp_rating(5000.0), 3000.0);
        assert_eq!(config.clamp_rating(1234.0), 1234.0);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: RatingConfig = toml::from_str("mmr_method = \"logistic\"\nnoob_skill = 900.0").unwrap();
        assert_eq!(config.mmr_method, Kernel::Logistic);
        assert_eq!(config.noob_skill, 900.0);
        assert_eq!(config.rating_max, 3000);
    }
}
