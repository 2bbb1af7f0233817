//! Match processing: score intake and the per-match pipeline

pub mod intake;
pub mod orchestrator;

pub use intake::{intake_scores, normalize_member_id, DivisionField, MatchIntake, RejectedScore};
pub use orchestrator::{MatchProcessor, MatchReport};
