//! Elo-MMR rating engine
//!
//! This module holds the statistical core: distributions over a bounded
//! rating grid, opponent and match weighting, win/loss ranking, the
//! performance solver and the rating updater, plus the calculator facade,
//! a classic Elo reference model and the history storage interface.

pub mod calculator;
pub mod distribution;
pub mod elo;
pub mod grid;
pub mod performance;
pub mod ranking;
pub mod storage;
pub mod uncertainty;
pub mod updater;
pub mod weighting;

// Re-export commonly used types
pub use calculator::{EloMmrCalculator, RatedDivision, RatingCalculator};
pub use grid::RatingGrid;
pub use storage::{InMemoryRatingStore, MockRatingStore, RatingStore};
