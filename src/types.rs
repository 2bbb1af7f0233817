//! Common types used throughout the rating engine

use crate::config::RatingConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Normalised competitor membership number
pub type MemberId = String;

/// Default contest type when a match report does not name one
pub const DEFAULT_MATCH_TYPE: &str = "USPSA";

/// Probability kernel used by every distribution in one computation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kernel {
    #[default]
    Normal,
    Logistic,
}

impl std::fmt::Display for Kernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Kernel::Normal => write!(f, "normal"),
            Kernel::Logistic => write!(f, "logistic"),
        }
    }
}

impl std::str::FromStr for Kernel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "normal" => Ok(Kernel::Normal),
            "logistic" => Ok(Kernel::Logistic),
            other => Err(format!("unknown kernel '{}'", other)),
        }
    }
}

/// Processing stages of one match, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStage {
    ScoresLoaded,
    Ranked,
    /// Performance solver pass completed
    PerformanceSolved(u32),
    MatchUncertaintyComputed,
    RatingsUpdated,
    Persisted,
}

impl std::fmt::Display for MatchStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchStage::ScoresLoaded => write!(f, "scores_loaded"),
            MatchStage::Ranked => write!(f, "ranked"),
            MatchStage::PerformanceSolved(pass) => write!(f, "performance_solved({})", pass),
            MatchStage::MatchUncertaintyComputed => write!(f, "match_uncertainty_computed"),
            MatchStage::RatingsUpdated => write!(f, "ratings_updated"),
            MatchStage::Persisted => write!(f, "persisted"),
        }
    }
}

/// Most recent persisted rating for a competitor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorRating {
    pub rating: f64,
    pub uncertainty: f64,
    pub match_count: u32,
}

/// Lookup key for persisted ratings
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RatingKey {
    pub member: MemberId,
    pub division: String,
    pub match_type: String,
}

impl RatingKey {
    pub fn new(
        member: impl Into<MemberId>,
        division: impl Into<String>,
        match_type: impl Into<String>,
    ) -> Self {
        Self {
            member: member.into(),
            division: division.into(),
            match_type: match_type.into(),
        }
    }
}

/// One pairwise placement comparison against another competitor in the field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    /// Index of the opponent in the division field
    pub opponent: usize,
    pub opponent_place: u32,
    /// `own percent - opponent percent`
    pub margin: f64,
}

/// A competitor as seen by the engine during one match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Competitor {
    /// `None` for untracked entrants; their results are never persisted
    pub member: Option<MemberId>,
    pub division: String,
    pub rating: f64,
    pub uncertainty: f64,
    pub performance: f64,
    pub last_change: f64,
    pub number_of_matches: u32,
    /// True when no persisted prior existed for this competitor
    pub is_newcomer: bool,
    pub place: u32,
    pub percent: f64,
    pub stage_count: u32,
    /// Competitors this one finished ahead of
    pub wins: Vec<Comparison>,
    /// Competitors that finished ahead of this one
    pub losses: Vec<Comparison>,
}

impl Competitor {
    /// Create a competitor from placement data; ratings are filled in by [`Competitor::with_prior`]
    pub fn new(
        member: Option<MemberId>,
        division: impl Into<String>,
        place: u32,
        percent: f64,
        stage_count: u32,
    ) -> Self {
        Self {
            member,
            division: division.into(),
            rating: 0.0,
            uncertainty: 0.0,
            performance: 0.0,
            last_change: 0.0,
            number_of_matches: 0,
            is_newcomer: true,
            place,
            percent,
            stage_count,
            wins: Vec::new(),
            losses: Vec::new(),
        }
    }

    /// Attach the persisted prior, or the newcomer defaults when there is none
    pub fn with_prior(mut self, prior: Option<&PriorRating>, config: &RatingConfig) -> Self {
        match prior {
            Some(prior) => {
                self.rating = prior.rating;
                self.uncertainty = prior.uncertainty;
                self.number_of_matches = prior.match_count;
                self.is_newcomer = false;
            }
            None => {
                self.rating = config.noob_skill;
                self.uncertainty = config.noob_uncertainty;
                self.number_of_matches = 0;
                self.is_newcomer = true;
            }
        }
        self.performance = self.rating;
        self
    }

    /// The lookup key for this competitor, if it is tracked
    pub fn key(&self, match_type: &str) -> Option<RatingKey> {
        self.member
            .as_ref()
            .map(|member| RatingKey::new(member.clone(), self.division.clone(), match_type))
    }
}

/// Raw score line handed over by the match report parser
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub member: Option<String>,
    pub division: Option<String>,
    #[serde(default)]
    pub match_points: Option<f64>,
    #[serde(default)]
    pub place: Option<u32>,
    #[serde(default)]
    pub percent: Option<f64>,
    #[serde(default)]
    pub stage_count: Option<u32>,
}

/// Parsed results of one match across all divisions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResults {
    pub match_id: String,
    #[serde(default)]
    pub match_name: String,
    #[serde(default = "default_match_type")]
    pub match_type: String,
    #[serde(default)]
    pub match_date: Option<DateTime<Utc>>,
    /// Stage count applied to scores that do not carry their own
    #[serde(default)]
    pub stage_count: Option<u32>,
    pub scores: Vec<ScoreEntry>,
}

fn default_match_type() -> String {
    DEFAULT_MATCH_TYPE.to_string()
}

/// Immutable historical rating entry produced once per tracked competitor per match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingRecord {
    pub record_id: Uuid,
    pub member: MemberId,
    pub division: String,
    pub match_type: String,
    pub match_id: String,
    pub match_name: String,
    pub match_date: Option<DateTime<Utc>>,
    pub rating: f64,
    pub last_change: f64,
    pub uncertainty: f64,
    pub performance: f64,
    pub match_count: u32,
    pub place: u32,
    pub percent: f64,
    pub recorded_at: DateTime<Utc>,
}

impl RatingRecord {
    pub fn key(&self) -> RatingKey {
        RatingKey::new(
            self.member.clone(),
            self.division.clone(),
            self.match_type.clone(),
        )
    }

    /// The prior this record represents for the competitor's next match
    pub fn as_prior(&self) -> PriorRating {
        PriorRating {
            rating: self.rating,
            uncertainty: self.uncertainty,
            match_count: self.match_count,
        }
    }
}
