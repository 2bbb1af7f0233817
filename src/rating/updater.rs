//! Fuses match performance with prior skill into an updated rating

use super::distribution::log_density;
use super::grid::RatingGrid;
use super::weighting::significance;
use crate::config::RatingConfig;
use crate::types::{Competitor, Kernel};

/// Grid point maximising `prior_density · performance_density`.
///
/// Evaluated as a sum of log densities so the product does not underflow far
/// from both centres. Ties resolve to the lowest grid point.
pub fn posterior_mode(
    rating: f64,
    uncertainty: f64,
    performance: f64,
    match_uncertainty: f64,
    grid: &RatingGrid,
    kernel: Kernel,
) -> f64 {
    let log_posterior = grid.evaluate(|x| {
        log_density(x, rating, uncertainty, kernel)
            + log_density(x, performance, match_uncertainty, kernel)
    });
    grid.argmax(&log_posterior).unwrap_or(rating)
}

/// Significance-scaled rating change for one competitor
pub fn rating_delta(
    competitor: &Competitor,
    match_uncertainty: f64,
    competitor_count: usize,
    grid: &RatingGrid,
    config: &RatingConfig,
) -> f64 {
    let mode = posterior_mode(
        competitor.rating,
        competitor.uncertainty,
        competitor.performance,
        match_uncertainty,
        grid,
        config.mmr_method,
    );
    (mode - competitor.rating) * significance(competitor.stage_count, competitor_count, config)
}

/// Apply a change: round, clamp into the grid bounds and record the realised change.
///
/// `last_change` is always a whole number, also when the stored prior is not.
pub fn commit_rating(mut competitor: Competitor, delta: f64, config: &RatingConfig) -> Competitor {
    let before = competitor.rating;
    let after = config.clamp_rating((before + delta).round());
    competitor.rating = after;
    competitor.last_change = (after - before).round();
    competitor
}

/// Updated competitor after one match
pub fn new_rating(
    competitor: Competitor,
    match_uncertainty: f64,
    competitor_count: usize,
    grid: &RatingGrid,
    config: &RatingConfig,
) -> Competitor {
    let delta = rating_delta(&competitor, match_uncertainty, competitor_count, grid, config);
    commit_rating(competitor, delta, config)
}

/// Update every competitor of a solved division
pub fn update_field(
    field: Vec<Competitor>,
    match_uncertainty: f64,
    grid: &RatingGrid,
    config: &RatingConfig,
) -> Vec<Competitor> {
    let competitor_count = field.len();
    field
        .into_iter()
        .map(|c| new_rating(c, match_uncertainty, competitor_count, grid, config))
        .collect()
}
