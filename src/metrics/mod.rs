//! Metrics for the rating service
//!
//! This module provides Prometheus metrics collection for match processing
//! and rating movement.

pub mod collector;

pub use collector::{MatchMetrics, MetricsCollector, PerformanceMetrics, RatingMetrics};
