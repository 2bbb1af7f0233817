//! Rating history storage interface and implementations
//!
//! Ratings are append-only: every processed match adds one [`RatingRecord`]
//! per tracked competitor, and the most recent record for a key is that
//! competitor's prior for the next match.

use crate::error::{RatingError, Result};
use crate::types::{PriorRating, RatingKey, RatingRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

/// Trait for rating history storage operations
#[async_trait]
pub trait RatingStore: Send + Sync {
    /// Most recent record for a key
    async fn latest(&self, key: &RatingKey) -> Result<Option<RatingRecord>>;

    /// Append the records produced by one match
    async fn append(&self, records: Vec<RatingRecord>) -> Result<()>;

    /// Full history for a key, oldest first
    async fn history(&self, key: &RatingKey) -> Result<Vec<RatingRecord>>;

    /// Prior for the next match, if the key has any history
    async fn prior(&self, key: &RatingKey) -> Result<Option<PriorRating>> {
        Ok(self.latest(key).await?.map(|record| record.as_prior()))
    }
}

fn lock_error(what: &str) -> anyhow::Error {
    RatingError::Internal {
        message: format!("Failed to acquire rating history {} lock", what),
    }
    .into()
}

/// Insert keeping history in match order; undated records sort as oldest
fn insert_in_match_order(history: &mut Vec<RatingRecord>, record: RatingRecord) {
    let position = history.partition_point(|existing| match_order(existing) <= match_order(&record));
    history.insert(position, record);
}

fn match_order(record: &RatingRecord) -> (Option<DateTime<Utc>>, DateTime<Utc>) {
    (record.match_date, record.recorded_at)
}

/// In-memory rating history, kept in match order per key
#[derive(Debug, Default)]
pub struct InMemoryRatingStore {
    records: RwLock<HashMap<RatingKey, Vec<RatingRecord>>>,
}

impl InMemoryRatingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with existing history
    pub fn with_records(records: Vec<RatingRecord>) -> Self {
        let mut by_key: HashMap<RatingKey, Vec<RatingRecord>> = HashMap::new();
        for record in records {
            insert_in_match_order(by_key.entry(record.key()).or_default(), record);
        }
        Self {
            records: RwLock::new(by_key),
        }
    }

    /// Total number of stored records across all keys
    pub fn record_count(&self) -> Result<usize> {
        let records = self.records.read().map_err(|_| lock_error("read"))?;
        Ok(records.values().map(Vec::len).sum())
    }
}

#[async_trait]
impl RatingStore for InMemoryRatingStore {
    async fn latest(&self, key: &RatingKey) -> Result<Option<RatingRecord>> {
        let records = self.records.read().map_err(|_| lock_error("read"))?;
        Ok(records.get(key).and_then(|history| history.last()).cloned())
    }

    async fn append(&self, new_records: Vec<RatingRecord>) -> Result<()> {
        let mut records = self.records.write().map_err(|_| lock_error("write"))?;
        for record in new_records {
            insert_in_match_order(records.entry(record.key()).or_default(), record);
        }
        Ok(())
    }

    async fn history(&self, key: &RatingKey) -> Result<Vec<RatingRecord>> {
        let records = self.records.read().map_err(|_| lock_error("read"))?;
        Ok(records.get(key).cloned().unwrap_or_default())
    }
}

/// Mock rating store for testing
#[derive(Debug, Default)]
pub struct MockRatingStore {
    inner: InMemoryRatingStore,
    append_calls: RwLock<Vec<Vec<RatingRecord>>>,
    latest_calls: AtomicUsize,
    fail_appends: AtomicBool,
}

impl MockRatingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed history for lookups
    pub fn preset_records(records: Vec<RatingRecord>) -> Self {
        Self {
            inner: InMemoryRatingStore::with_records(records),
            ..Self::default()
        }
    }

    /// Make every subsequent append fail with a persistence error
    pub fn set_fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    /// Get all append batches received (for testing)
    pub fn get_append_calls(&self) -> Vec<Vec<RatingRecord>> {
        self.append_calls
            .read()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    pub fn latest_call_count(&self) -> usize {
        self.latest_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RatingStore for MockRatingStore {
    async fn latest(&self, key: &RatingKey) -> Result<Option<RatingRecord>> {
        self.latest_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.latest(key).await
    }

    async fn append(&self, records: Vec<RatingRecord>) -> Result<()> {
        if let Ok(mut calls) = self.append_calls.write() {
            calls.push(records.clone());
        }

        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(RatingError::Persistence {
                message: "mock store rejected append".to_string(),
            }
            .into());
        }

        self.inner.append(records).await
    }

    async fn history(&self, key: &RatingKey) -> Result<Vec<RatingRecord>> {
        self.inner.history(key).await
    }
}
