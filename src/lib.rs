//! Elo-MMR rater - skill ratings for multi-competitor shooting-sports matches
//!
//! This crate turns relative match placements into updated skill ratings with
//! a discretised maximum-likelihood Elo-MMR estimator, including newcomer
//! weighting and match significance scaling by field size and stage count.

pub mod config;
pub mod error;
pub mod metrics;
pub mod processor;
pub mod rating;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{RatingError, Result};
pub use types::*;

// Re-export key components
pub use processor::{MatchProcessor, MatchReport};
pub use rating::{EloMmrCalculator, InMemoryRatingStore, RatingCalculator, RatingStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
