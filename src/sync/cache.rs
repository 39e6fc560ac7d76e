use crate::models::RoomSheetRecord;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

pub const ALL_ROOMS_KEY: &str = "all-rooms";

/// Aggregated records from one successful fetch cycle.
#[derive(Debug, Clone)]
pub struct SyncCacheEntry {
    pub records: Arc<Vec<RoomSheetRecord>>,
    pub fetched_at: DateTime<Utc>,
}

impl SyncCacheEntry {
    pub fn new(records: Vec<RoomSheetRecord>, fetched_at: DateTime<Utc>) -> Self {
        Self {
            records: Arc::new(records),
            fetched_at,
        }
    }
}

/// Storage for fetched room data. Entries are replaced wholesale, never
/// partially updated.
pub trait RoomCache: Send + Sync {
    fn get(&self, key: &str) -> Option<SyncCacheEntry>;

    fn set(&self, key: &str, entry: SyncCacheEntry);

    fn clear(&self);
}

/// Decides whether a cached entry may still be served.
#[derive(Debug, Clone, Copy)]
pub struct TtlPolicy {
    ttl: Duration,
}

impl TtlPolicy {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl }
    }

    pub fn from_secs(secs: u64) -> Self {
        let ttl = i64::try_from(secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX);
        Self::new(ttl)
    }

    pub fn is_fresh(&self, fetched_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now - fetched_at < self.ttl
    }
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self::new(Duration::minutes(5))
    }
}

#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, SyncCacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RoomCache for MemoryCache {
    fn get(&self, key: &str) -> Option<SyncCacheEntry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, entry: SyncCacheEntry) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), entry);
    }

    fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
