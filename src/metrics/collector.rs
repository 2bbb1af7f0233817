//! Metrics collection using Prometheus
//!
//! This module provides metrics for the rating engine: match throughput,
//! intake rejections, rating movement and processing time.

use anyhow::Result;
use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;
use std::time::Duration;

/// Main metrics collector for the rating service
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Match-level throughput metrics
    match_metrics: MatchMetrics,

    /// Rating movement metrics
    rating_metrics: RatingMetrics,

    /// Performance metrics
    performance_metrics: PerformanceMetrics,
}

/// Match-level throughput metrics
#[derive(Clone)]
pub struct MatchMetrics {
    /// Matches processed by outcome
    pub matches_processed_total: IntCounterVec,

    /// Score lines rejected during intake
    pub scores_rejected_total: IntCounter,

    /// Competitors rated, by division
    pub competitors_rated_total: IntCounterVec,

    /// Competitors rated without a prior
    pub newcomers_total: IntCounter,

    /// Rating records appended to the store
    pub records_persisted_total: IntCounter,
}

/// Rating movement metrics
#[derive(Clone)]
pub struct RatingMetrics {
    /// Realised rating change per competitor
    pub rating_change: Histogram,

    /// Post-match rating distribution by division
    pub rating_distribution: HistogramVec,

    /// Performance solver passes per division
    pub solver_passes: Histogram,
}

/// Performance metrics
#[derive(Clone)]
pub struct PerformanceMetrics {
    /// Whole match processing time
    pub match_processing_duration: Histogram,

    /// Rating computation time per division
    pub division_rating_duration: Histogram,
}

impl MetricsCollector {
    /// Create a new metrics collector with its own registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let match_metrics = MatchMetrics::new(&registry)?;
        let rating_metrics = RatingMetrics::new(&registry)?;
        let performance_metrics = PerformanceMetrics::new(&registry)?;

        Ok(Self {
            registry,
            match_metrics,
            rating_metrics,
            performance_metrics,
        })
    }

    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub fn matches(&self) -> &MatchMetrics {
        &self.match_metrics
    }

    pub fn ratings(&self) -> &RatingMetrics {
        &self.rating_metrics
    }

    pub fn performance(&self) -> &PerformanceMetrics {
        &self.performance_metrics
    }

    /// Record the outcome of one match
    pub fn record_match(&self, success: bool, duration: Duration) {
        let status = if success { "success" } else { "error" };
        self.match_metrics
            .matches_processed_total
            .with_label_values(&[status])
            .inc();
        self.performance_metrics
            .match_processing_duration
            .observe(duration.as_secs_f64());
    }

    /// Record intake rejections
    pub fn record_rejected_scores(&self, count: usize) {
        self.match_metrics
            .scores_rejected_total
            .inc_by(count as u64);
    }

    /// Record one rated competitor
    pub fn record_competitor(&self, division: &str, newcomer: bool, rating: f64, change: f64) {
        self.match_metrics
            .competitors_rated_total
            .with_label_values(&[division])
            .inc();
        if newcomer {
            self.match_metrics.newcomers_total.inc();
        }
        self.rating_metrics.rating_change.observe(change);
        self.rating_metrics
            .rating_distribution
            .with_label_values(&[division])
            .observe(rating);
    }

    /// Record a rated division
    pub fn record_division(&self, passes: u32, duration: Duration) {
        self.rating_metrics.solver_passes.observe(f64::from(passes));
        self.performance_metrics
            .division_rating_duration
            .observe(duration.as_secs_f64());
    }

    pub fn record_persisted(&self, count: usize) {
        self.match_metrics
            .records_persisted_total
            .inc_by(count as u64);
    }

    /// Render every registered metric in the text exposition format
    pub fn gather_text(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

impl MatchMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let matches_processed_total = IntCounterVec::new(
            Opts::new("elommr_matches_processed_total", "Total matches processed"),
            &["status"],
        )?;
        registry.register(Box::new(matches_processed_total.clone()))?;

        let scores_rejected_total = IntCounter::new(
            "elommr_scores_rejected_total",
            "Score lines rejected during intake",
        )?;
        registry.register(Box::new(scores_rejected_total.clone()))?;

        let competitors_rated_total = IntCounterVec::new(
            Opts::new("elommr_competitors_rated_total", "Competitors rated"),
            &["division"],
        )?;
        registry.register(Box::new(competitors_rated_total.clone()))?;

        let newcomers_total = IntCounter::new(
            "elommr_newcomers_total",
            "Competitors rated without rating history",
        )?;
        registry.register(Box::new(newcomers_total.clone()))?;

        let records_persisted_total = IntCounter::new(
            "elommr_records_persisted_total",
            "Rating records appended to the store",
        )?;
        registry.register(Box::new(records_persisted_total.clone()))?;

        Ok(Self {
            matches_processed_total,
            scores_rejected_total,
            competitors_rated_total,
            newcomers_total,
            records_persisted_total,
        })
    }
}

impl RatingMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let rating_change = Histogram::with_opts(
            HistogramOpts::new("elommr_rating_change", "Realised rating change per competitor")
                .buckets(vec![-200.0, -100.0, -50.0, -20.0, -5.0, 0.0, 5.0, 20.0, 50.0, 100.0, 200.0]),
        )?;
        registry.register(Box::new(rating_change.clone()))?;

        let rating_distribution = HistogramVec::new(
            HistogramOpts::new("elommr_rating_distribution", "Post-match rating distribution")
                .buckets(vec![500.0, 800.0, 1000.0, 1200.0, 1400.0, 1600.0, 2000.0, 2500.0]),
            &["division"],
        )?;
        registry.register(Box::new(rating_distribution.clone()))?;

        let solver_passes = Histogram::with_opts(
            HistogramOpts::new("elommr_solver_passes", "Performance solver passes per division")
                .buckets(vec![0.0, 1.0, 2.0]),
        )?;
        registry.register(Box::new(solver_passes.clone()))?;

        Ok(Self {
            rating_change,
            rating_distribution,
            solver_passes,
        })
    }
}

impl PerformanceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let match_processing_duration = Histogram::with_opts(
            HistogramOpts::new(
                "elommr_match_processing_duration_seconds",
                "Whole match processing time",
            )
            .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0]),
        )?;
        registry.register(Box::new(match_processing_duration.clone()))?;

        let division_rating_duration = Histogram::with_opts(
            HistogramOpts::new(
                "elommr_division_rating_duration_seconds",
                "Rating computation time per division",
            )
            .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        )?;
        registry.register(Box::new(division_rating_duration.clone()))?;

        Ok(Self {
            match_processing_duration,
            division_rating_duration,
        })
    }
}
