//! Test fixtures and mock implementations for integration testing

#![allow(dead_code)]

use async_trait::async_trait;
use elommr_rater::config::{RatingConfig, ServiceSettings};
use elommr_rater::error::{RatingError, Result};
use elommr_rater::processor::MatchProcessor;
use elommr_rater::rating::{EloMmrCalculator, RatingStore};
use elommr_rater::types::{MatchResults, RatingKey, RatingRecord, ScoreEntry};
use elommr_rater::utils::{current_timestamp, generate_record_id};
use std::sync::Arc;

/// Results of the reference five-competitor match, best first
pub const FIVE_PERCENTS: [f64; 5] = [100.0, 93.19, 86.59, 79.37, 50.48];

/// Score line with an explicit percent and no place
pub fn percent_score(member: &str, division: &str, percent: f64) -> ScoreEntry {
    ScoreEntry {
        member: Some(member.to_string()),
        division: Some(division.to_string()),
        percent: Some(percent),
        ..ScoreEntry::default()
    }
}

/// Score line carrying raw match points
pub fn points_score(member: &str, division: &str, points: f64) -> ScoreEntry {
    ScoreEntry {
        member: Some(member.to_string()),
        division: Some(division.to_string()),
        match_points: Some(points),
        ..ScoreEntry::default()
    }
}

pub fn match_results(match_id: &str, scores: Vec<ScoreEntry>) -> MatchResults {
    MatchResults {
        match_id: match_id.to_string(),
        match_name: format!("Match {}", match_id),
        match_type: "USPSA".to_string(),
        match_date: None,
        stage_count: Some(8),
        scores,
    }
}

/// The reference match: members A1..A5 in Carry Optics, 8 stages
pub fn five_competitor_match(match_id: &str) -> MatchResults {
    let scores = FIVE_PERCENTS
        .iter()
        .enumerate()
        .map(|(i, &percent)| percent_score(&format!("A{}", i + 1), "Carry Optics", percent))
        .collect();
    match_results(match_id, scores)
}

/// A persisted record that acts as a prior for `member`
pub fn prior_record(
    member: &str,
    division: &str,
    rating: f64,
    uncertainty: f64,
    match_count: u32,
) -> RatingRecord {
    RatingRecord {
        record_id: generate_record_id(),
        member: member.to_string(),
        division: division.to_string(),
        match_type: "USPSA".to_string(),
        match_id: "seed".to_string(),
        match_name: "Seed".to_string(),
        match_date: None,
        rating,
        last_change: 0.0,
        uncertainty,
        performance: rating,
        match_count,
        place: 1,
        percent: 100.0,
        recorded_at: current_timestamp(),
    }
}

/// Processor over the default engine constants
pub fn processor(store: Arc<dyn RatingStore>) -> MatchProcessor {
    processor_with(store, RatingConfig::default(), ServiceSettings::default())
}

pub fn processor_with(
    store: Arc<dyn RatingStore>,
    config: RatingConfig,
    settings: ServiceSettings,
) -> MatchProcessor {
    let calculator = EloMmrCalculator::new(config).expect("valid rating config");
    MatchProcessor::new(Arc::new(calculator), store, settings)
}

pub fn assert_near(actual: &[f64], expected: &[f64], tolerance: f64) {
    assert_eq!(actual.len(), expected.len(), "length mismatch");
    for (a, e) in actual.iter().zip(expected) {
        assert!(
            (a - e).abs() <= tolerance,
            "expected {:?}, got {:?}",
            expected,
            actual
        );
    }
}

/// Store whose lookups always fail, simulating an unreachable backend
#[derive(Debug, Default)]
pub struct UnavailableStore;

#[async_trait]
impl RatingStore for UnavailableStore {
    async fn latest(&self, _key: &RatingKey) -> Result<Option<RatingRecord>> {
        Err(RatingError::Persistence {
            message: "rating history unavailable".to_string(),
        }
        .into())
    }

    async fn append(&self, _records: Vec<RatingRecord>) -> Result<()> {
        Err(RatingError::Persistence {
            message: "rating history unavailable".to_string(),
        }
        .into())
    }

    async fn history(&self, _key: &RatingKey) -> Result<Vec<RatingRecord>> {
        Ok(Vec::new())
    }
}
