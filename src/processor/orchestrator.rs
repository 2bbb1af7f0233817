//! Match orchestration
//!
//! Drives one match through intake, prior lookup, per-division rating and
//! persistence. Divisions are rated from an immutable snapshot of priors taken
//! before any computation starts; nothing is written until every division has
//! been rated.

use crate::config::ServiceSettings;
use crate::error::{RatingError, Result};
use crate::metrics::MetricsCollector;
use crate::processor::intake::{intake_scores, DivisionField, RejectedScore};
use crate::rating::{RatedDivision, RatingCalculator, RatingStore};
use crate::types::{MatchResults, MatchStage, PriorRating, RatingKey, RatingRecord};
use crate::utils::{current_timestamp, generate_record_id};
use futures::future::try_join_all;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Everything produced for one match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchReport {
    pub match_id: String,
    pub match_type: String,
    /// Last stage reached
    pub stage: MatchStage,
    pub divisions: Vec<RatedDivision>,
    /// One record per tracked competitor
    pub records: Vec<RatingRecord>,
    pub rejected: Vec<RejectedScore>,
    pub non_finishers: usize,
    /// Stored priors that were unusable; these competitors were rated as newcomers
    pub discarded_priors: Vec<RatingKey>,
}

impl MatchReport {
    /// Total competitors rated across all divisions
    pub fn competitor_count(&self) -> usize {
        self.divisions.iter().map(|d| d.competitors.len()).sum()
    }
}

/// Rates matches against a rating store
pub struct MatchProcessor {
    calculator: Arc<dyn RatingCalculator>,
    store: Arc<dyn RatingStore>,
    metrics: Option<Arc<MetricsCollector>>,
    settings: ServiceSettings,
}

impl MatchProcessor {
    pub fn new(
        calculator: Arc<dyn RatingCalculator>,
        store: Arc<dyn RatingStore>,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            calculator,
            store,
            metrics: None,
            settings,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Rate a match and append the resulting records to the store
    pub async fn process_match(&self, results: &MatchResults) -> Result<MatchReport> {
        let start_time = Instant::now();

        let outcome = async {
            let mut report = self.rate_match(results).await?;
            self.persist(&mut report).await?;
            Ok::<MatchReport, anyhow::Error>(report)
        }
        .await;

        let processing_time = start_time.elapsed();
        if let Some(metrics) = &self.metrics {
            metrics.record_match(outcome.is_ok(), processing_time);
        }

        match &outcome {
            Ok(report) => info!(
                "Match {} rated - divisions: {}, competitors: {}, records: {}, rejected: {}, time: {:.2}ms",
                report.match_id,
                report.divisions.len(),
                report.competitor_count(),
                report.records.len(),
                report.rejected.len(),
                processing_time.as_secs_f64() * 1000.0
            ),
            Err(e) => error!(
                "Match {} failed after {:.2}ms: {}",
                results.match_id,
                processing_time.as_secs_f64() * 1000.0,
                e
            ),
        }

        outcome
    }

    /// Rate a match without persisting anything
    pub async fn rate_match(&self, results: &MatchResults) -> Result<MatchReport> {
        let intake = intake_scores(results);
        if let Some(metrics) = &self.metrics {
            metrics.record_rejected_scores(intake.rejected.len());
        }
        if !intake.rejected.is_empty() {
            warn!(
                "Match {}: {} score line(s) rejected",
                results.match_id,
                intake.rejected.len()
            );
        }

        let (fields, discarded_priors) = self
            .attach_priors(intake.divisions, &results.match_type)
            .await?;
        debug!("Match {} -> {}", results.match_id, MatchStage::ScoresLoaded);

        let divisions = self.rate_divisions(&results.match_id, fields).await?;
        debug!("Match {} -> {}", results.match_id, MatchStage::RatingsUpdated);

        let records = build_records(results, &divisions);

        if let Some(metrics) = &self.metrics {
            for division in &divisions {
                for competitor in &division.competitors {
                    metrics.record_competitor(
                        &division.division,
                        competitor.is_newcomer,
                        competitor.rating,
                        competitor.last_change,
                    );
                }
            }
        }

        Ok(MatchReport {
            match_id: results.match_id.clone(),
            match_type: results.match_type.clone(),
            stage: MatchStage::RatingsUpdated,
            divisions,
            records,
            rejected: intake.rejected,
            non_finishers: intake.non_finishers,
            discarded_priors,
        })
    }

    /// Append a rated match's records. Failures are returned as-is and the report is left intact.
    pub async fn persist(&self, report: &mut MatchReport) -> Result<()> {
        if !report.records.is_empty() {
            self.store
                .append(report.records.clone())
                .await
                .map_err(persistence_error)?;
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_persisted(report.records.len());
        }
        report.stage = MatchStage::Persisted;
        debug!("Match {} -> {}", report.match_id, MatchStage::Persisted);
        Ok(())
    }

    /// Look up every tracked competitor's prior concurrently and attach it.
    /// Priors with non-finite state are discarded and returned alongside the fields.
    async fn attach_priors(
        &self,
        divisions: Vec<DivisionField>,
        match_type: &str,
    ) -> Result<(Vec<DivisionField>, Vec<RatingKey>)> {
        let config = self.calculator.rating_config().clone();
        let mut attached = Vec::with_capacity(divisions.len());
        let mut discarded = Vec::new();

        for field in divisions {
            let lookups = field.competitors.iter().map(|competitor| {
                let key = competitor.key(match_type);
                let store = self.store.clone();
                async move {
                    match key {
                        Some(key) => store.prior(&key).await,
                        None => Ok::<Option<PriorRating>, anyhow::Error>(None),
                    }
                }
            });
            let priors = try_join_all(lookups).await?;

            let competitors = field
                .competitors
                .into_iter()
                .zip(priors)
                .map(|(competitor, prior)| {
                    let prior = prior.filter(|prior| {
                        let usable = prior.rating.is_finite() && prior.uncertainty.is_finite();
                        if !usable {
                            warn!(
                                "Discarding non-finite prior for {} in {}: rating {}, uncertainty {}",
                                competitor.member.as_deref().unwrap_or("<untracked>"),
                                field.division,
                                prior.rating,
                                prior.uncertainty
                            );
                            if let Some(key) = competitor.key(match_type) {
                                discarded.push(key);
                            }
                        }
                        usable
                    });
                    competitor.with_prior(prior.as_ref(), &config)
                })
                .collect();

            attached.push(DivisionField {
                division: field.division,
                competitors,
            });
        }

        Ok((attached, discarded))
    }

    /// Rate all divisions on a blocking thread, bounded by the processing timeout
    async fn rate_divisions(
        &self,
        match_id: &str,
        fields: Vec<DivisionField>,
    ) -> Result<Vec<RatedDivision>> {
        let calculator = self.calculator.clone();
        let metrics = self.metrics.clone();
        let parallel = self.settings.parallel_divisions;

        let task = tokio::task::spawn_blocking(move || {
            rate_all(calculator.as_ref(), fields, parallel, metrics.as_deref())
        });

        let joined = match self.settings.processing_timeout() {
            Some(limit) => tokio::time::timeout(limit, task).await.map_err(|_| {
                RatingError::ProcessingTimeout {
                    match_id: match_id.to_string(),
                    seconds: limit.as_secs(),
                }
            })?,
            None => task.await,
        };

        joined.map_err(|e| RatingError::Internal {
            message: format!("rating task for match {} failed: {}", match_id, e),
        })?
    }
}

fn rate_all(
    calculator: &dyn RatingCalculator,
    fields: Vec<DivisionField>,
    parallel: bool,
    metrics: Option<&MetricsCollector>,
) -> Result<Vec<RatedDivision>> {
    let rate_one = |field: DivisionField| -> Result<RatedDivision> {
        let start = Instant::now();
        let rated = calculator.rate_division(&field.division, field.competitors)?;
        if let Some(metrics) = metrics {
            metrics.record_division(rated.passes, start.elapsed());
        }
        Ok(rated)
    };

    if parallel {
        fields.into_par_iter().map(rate_one).collect()
    } else {
        fields.into_iter().map(rate_one).collect()
    }
}

/// Records for tracked competitors; untracked entrants are rated but never stored
fn build_records(results: &MatchResults, divisions: &[RatedDivision]) -> Vec<RatingRecord> {
    let recorded_at = current_timestamp();

    divisions
        .iter()
        .flat_map(|division| division.competitors.iter())
        .filter_map(|competitor| {
            let member = competitor.member.clone()?;
            Some(RatingRecord {
                record_id: generate_record_id(),
                member,
                division: competitor.division.clone(),
                match_type: results.match_type.clone(),
                match_id: results.match_id.clone(),
                match_name: results.match_name.clone(),
                match_date: results.match_date,
                rating: competitor.rating,
                last_change: competitor.last_change,
                uncertainty: competitor.uncertainty,
                performance: competitor.performance,
                match_count: competitor.number_of_matches + 1,
                place: competitor.place,
                percent: competitor.percent,
                recorded_at,
            })
        })
        .collect()
}

fn persistence_error(error: anyhow::Error) -> anyhow::Error {
    match error.downcast_ref::<RatingError>() {
        Some(RatingError::Persistence { .. }) => error,
        _ => RatingError::Persistence {
            message: format!("{:#}", error),
        }
        .into(),
    }
}
