//! Rating calculator trait and the Elo-MMR implementation
//!
//! A calculator turns one division's field, with priors already attached, into
//! updated competitors. It never touches storage.

use crate::config::RatingConfig;
use crate::error::{RatingError, Result};
use crate::rating::grid::RatingGrid;
use crate::rating::performance::solve_field;
use crate::rating::ranking::win_loss_ranking;
use crate::rating::uncertainty::match_uncertainty;
use crate::rating::updater::update_field;
use crate::types::{Competitor, MatchStage, PriorRating};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Result of rating one division
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatedDivision {
    pub division: String,
    /// Competitors in input order with updated rating, performance and last change
    pub competitors: Vec<Competitor>,
    pub match_uncertainty: f64,
    /// Performance solver passes run (0 for a degenerate field)
    pub passes: u32,
}

/// Trait for calculating rating changes after a match
pub trait RatingCalculator: Send + Sync {
    /// Rate one division of a match
    ///
    /// # Arguments
    /// * `division` - Division name, carried through to the result
    /// * `field` - Competitors with priors attached and places assigned
    fn rate_division(&self, division: &str, field: Vec<Competitor>) -> Result<RatedDivision>;

    /// Prior used for competitors with no rating history
    fn initial_rating(&self) -> PriorRating;

    /// Engine constants in use
    fn rating_config(&self) -> &RatingConfig;

    /// Get current configuration as JSON
    fn config(&self) -> serde_json::Value;

    /// Update configuration from JSON
    fn update_config(&mut self, config: serde_json::Value) -> Result<()>;
}

/// Discretised maximum-likelihood rating calculator
#[derive(Debug, Clone)]
pub struct EloMmrCalculator {
    config: RatingConfig,
    grid: RatingGrid,
}

impl EloMmrCalculator {
    /// Create a new calculator, rejecting invalid constants
    pub fn new(config: RatingConfig) -> Result<Self> {
        config.validate()?;
        let grid = RatingGrid::from_config(&config);
        Ok(Self { config, grid })
    }

    pub fn grid(&self) -> &RatingGrid {
        &self.grid
    }
}

impl RatingCalculator for EloMmrCalculator {
    fn rate_division(&self, division: &str, field: Vec<Competitor>) -> Result<RatedDivision> {
        if let Some(bad) = field
            .iter()
            .find(|c| !(c.rating.is_finite() && c.uncertainty.is_finite() && c.percent.is_finite()))
        {
            return Err(RatingError::InvalidScore {
                reason: format!(
                    "non-finite rating state for {} in division {}",
                    bad.member.as_deref().unwrap_or("<untracked>"),
                    division
                ),
            }
            .into());
        }

        let uncertainty = match_uncertainty(&field);

        if field.len() < 2 {
            debug!("Division {} has {} competitor(s), ratings unchanged", division, field.len());
            let competitors = field
                .into_iter()
                .map(|mut c| {
                    c.performance = c.rating;
                    c.last_change = 0.0;
                    c
                })
                .collect();
            return Ok(RatedDivision {
                division: division.to_string(),
                competitors,
                match_uncertainty: uncertainty,
                passes: 0,
            });
        }

        let field = win_loss_ranking(field);
        debug!("Division {} -> {} ({} competitors)", division, MatchStage::Ranked, field.len());

        let (field, passes) = solve_field(field, &self.grid, &self.config);
        for pass in 1..=passes {
            debug!("Division {} -> {}", division, MatchStage::PerformanceSolved(pass));
        }

        debug!(
            "Division {} -> {} ({:.2})",
            division,
            MatchStage::MatchUncertaintyComputed,
            uncertainty
        );

        let competitors = update_field(field, uncertainty, &self.grid, &self.config);
        debug!("Division {} -> {}", division, MatchStage::RatingsUpdated);

        Ok(RatedDivision {
            division: division.to_string(),
            competitors,
            match_uncertainty: uncertainty,
            passes,
        })
    }

    fn initial_rating(&self) -> PriorRating {
        PriorRating {
            rating: self.config.noob_skill,
            uncertainty: self.config.noob_uncertainty,
            match_count: 0,
        }
    }

    fn rating_config(&self) -> &RatingConfig {
        &self.config
    }

    fn config(&self) -> serde_json::Value {
        serde_json::to_value(&self.config).unwrap_or(serde_json::Value::Null)
    }

    fn update_config(&mut self, config: serde_json::Value) -> Result<()> {
        let new_config: RatingConfig =
            serde_json::from_value(config).map_err(|e| RatingError::InvalidConfiguration {
                message: format!("Invalid rating configuration: {}", e),
            })?;

        new_config.validate()?;
        self.grid = RatingGrid::from_config(&new_config);
        self.config = new_config;
        Ok(())
    }
}
