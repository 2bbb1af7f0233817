//! Match performance solver
//!
//! Each competitor's performance is the grid point where the weighted sum of
//! its win and loss likelihood curves crosses zero. Opponents are read from an
//! immutable [`OpponentView`] snapshot so every competitor of a pass is solved
//! against the same field.

use super::distribution::{loss_distribution, squash, win_distribution};
use super::grid::RatingGrid;
use super::weighting::newcomer_weight;
use crate::config::RatingConfig;
use crate::types::{Comparison, Competitor};
use tracing::debug;

/// Upper bound on solver passes over one division
pub const MAX_PASSES: u32 = 2;

/// What the solver sees of an opponent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpponentView {
    pub rating: f64,
    pub uncertainty: f64,
    pub number_of_matches: u32,
}

impl From<&Competitor> for OpponentView {
    fn from(competitor: &Competitor) -> Self {
        Self {
            rating: competitor.rating,
            uncertainty: competitor.uncertainty,
            number_of_matches: competitor.number_of_matches,
        }
    }
}

/// Snapshot of the field built from prior ratings
pub fn prior_snapshot(field: &[Competitor]) -> Vec<OpponentView> {
    field.iter().map(OpponentView::from).collect()
}

/// Snapshot where newcomers face the field at their solved performance
pub fn newcomer_snapshot(field: &[Competitor]) -> Vec<OpponentView> {
    field
        .iter()
        .map(|competitor| {
            let mut view = OpponentView::from(competitor);
            if competitor.is_newcomer {
                view.rating = competitor.performance;
            }
            view
        })
        .collect()
}

/// Win and loss curves of one opponent over the grid
struct OpponentCurves {
    win: Vec<f64>,
    loss: Vec<f64>,
    weight: f64,
}

fn opponent_curves(
    snapshot: &[OpponentView],
    grid: &RatingGrid,
    config: &RatingConfig,
) -> Vec<OpponentCurves> {
    let kernel = config.mmr_method;
    snapshot
        .iter()
        .map(|view| OpponentCurves {
            win: grid.evaluate(|x| win_distribution(x, view.rating, view.uncertainty, kernel)),
            loss: grid.evaluate(|x| loss_distribution(x, view.rating, view.uncertainty, kernel)),
            weight: newcomer_weight(
                view.number_of_matches,
                config.noob_placement,
                config.noob_weight,
            ),
        })
        .collect()
}

/// Solve one competitor's performance against a snapshot of its field.
///
/// A competitor with no comparisons keeps its prior rating.
pub fn solve_performance(
    competitor: &Competitor,
    snapshot: &[OpponentView],
    grid: &RatingGrid,
    config: &RatingConfig,
) -> f64 {
    if competitor.wins.is_empty() && competitor.losses.is_empty() {
        return competitor.rating;
    }
    let curves = opponent_curves(snapshot, grid, config);
    solve_with_curves(competitor, &curves, grid, config)
}

fn solve_with_curves(
    competitor: &Competitor,
    curves: &[OpponentCurves],
    grid: &RatingGrid,
    config: &RatingConfig,
) -> f64 {
    if competitor.wins.is_empty() && competitor.losses.is_empty() {
        return competitor.rating;
    }

    let mut total = vec![0.0; grid.len()];
    let mut accumulate = |comparison: &Comparison, won: bool| {
        let Some(opponent) = curves.get(comparison.opponent) else {
            return;
        };
        let q = squash(comparison.margin.abs(), 0.0, config.percent_factor);
        let (win_share, loss_share) = if won { (q, 1.0 - q) } else { (1.0 - q, q) };

        for ((sum, win), loss) in total.iter_mut().zip(&opponent.win).zip(&opponent.loss) {
            *sum += opponent.weight * (win_share * win - loss_share * loss);
        }
    };

    for comparison in &competitor.wins {
        accumulate(comparison, true);
    }
    for comparison in &competitor.losses {
        accumulate(comparison, false);
    }

    grid.argmin_abs(&total).unwrap_or(competitor.rating)
}

/// Solve every competitor of a ranked division against one snapshot
pub fn solve_pass(
    mut field: Vec<Competitor>,
    snapshot: &[OpponentView],
    grid: &RatingGrid,
    config: &RatingConfig,
) -> Vec<Competitor> {
    let curves = opponent_curves(snapshot, grid, config);
    for competitor in field.iter_mut() {
        competitor.performance = solve_with_curves(competitor, &curves, grid, config);
    }
    field
}

/// Solve performances for a ranked division, re-solving once when newcomers are present.
///
/// Returns the field and the number of passes run.
pub fn solve_field(
    field: Vec<Competitor>,
    grid: &RatingGrid,
    config: &RatingConfig,
) -> (Vec<Competitor>, u32) {
    let snapshot = prior_snapshot(&field);
    let mut field = solve_pass(field, &snapshot, grid, config);
    let mut passes = 1;

    while passes < MAX_PASSES && field.iter().any(|c| c.is_newcomer) {
        let snapshot = newcomer_snapshot(&field);
        field = solve_pass(field, &snapshot, grid, config);
        passes += 1;
        debug!("Re-solved performances with newcomers at pass {}", passes);
    }

    (field, passes)
}
