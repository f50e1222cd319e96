use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::OwnedMutexGuard;

use crate::settings::Settings;
use crate::tool::{tool_key, ToolRecord};

/// Last successful live record for a tool and when it was captured.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub record: ToolRecord,
    pub captured_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Age at `now`; a capture time in the future counts as zero.
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        (now - self.captured_at).to_std().unwrap_or(Duration::ZERO)
    }
}

/// Age band of a cache entry relative to the two TTL thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Younger than the fresh TTL.
    Fresh,
    /// Past the fresh TTL but younger than the stale TTL.
    StaleAcceptable,
    /// Still stored, no longer eligible for use.
    Expired,
}

impl Freshness {
    pub fn is_usable(self) -> bool {
        !matches!(self, Freshness::Expired)
    }
}

/// In-memory map of tool key → last live record. Empty at process start,
/// never persisted, never evicted.
///
/// Also hands out per-key async locks that serialize access to one tool's
/// entry. The locks are never held across a network call.
pub struct TieredCache {
    fresh_ttl: Duration,
    stale_ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
    key_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl TieredCache {
    pub fn new(fresh_ttl: Duration, stale_ttl: Duration) -> Self {
        Self {
            fresh_ttl,
            stale_ttl,
            entries: RwLock::new(HashMap::new()),
            key_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.fresh_ttl(), settings.stale_ttl())
    }

    pub fn stale_ttl(&self) -> Duration {
        self.stale_ttl
    }

    pub fn get(&self, tool_id: &str) -> Option<CacheEntry> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(&tool_key(tool_id)).cloned()
    }

    /// Store `record`, overwriting any previous entry, timestamped now.
    pub fn put(&self, tool_id: &str, record: ToolRecord) {
        self.put_at(tool_id, record, Utc::now());
    }

    /// Store `record` with an explicit capture time.
    pub fn put_at(&self, tool_id: &str, record: ToolRecord, captured_at: DateTime<Utc>) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            tool_key(tool_id),
            CacheEntry {
                record,
                captured_at,
            },
        );
    }

    /// Age band of `entry` at `now`. `stale_ttl` is the cache's own
    /// threshold for scraped tools, or a longer one for catalog-only tools.
    pub fn freshness(
        &self,
        entry: &CacheEntry,
        now: DateTime<Utc>,
        stale_ttl: Duration,
    ) -> Freshness {
        let age = entry.age_at(now);
        if age < self.fresh_ttl {
            Freshness::Fresh
        } else if age < stale_ttl {
            Freshness::StaleAcceptable
        } else {
            Freshness::Expired
        }
    }

    /// Wait for exclusive use of `tool_id`'s cache entry.
    ///
    /// A lock is created per distinct key and kept for the process lifetime,
    /// so callers must only pass keys from a fixed set.
    pub async fn lock_key(&self, tool_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.key_locks.lock().unwrap_or_else(|e| e.into_inner());
            locks
                .entry(tool_key(tool_id))
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    pub(crate) fn key_lock_count(&self) -> usize {
        self.key_locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    const HOUR: i64 = 3600;

    fn cache() -> TieredCache {
        TieredCache::new(Duration::from_secs(6 * 3600), Duration::from_secs(24 * 3600))
    }

    fn record() -> ToolRecord {
        Catalog::bundled().unwrap().find("Cursor").unwrap().clone()
    }

    #[test]
    fn starts_empty() {
        let c = cache();
        assert!(c.is_empty());
        assert!(c.get("Cursor").is_none());
    }

    #[test]
    fn put_then_get_is_case_insensitive() {
        let c = cache();
        c.put("Cursor", record());
        let entry = c.get("CURSOR").expect("entry");
        assert_eq!(entry.record, record());
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn put_overwrites() {
        let c = cache();
        let mut first = record();
        first.description = Some("old".into());
        c.put("cursor", first);
        c.put("Cursor", record());
        assert_eq!(c.len(), 1);
        assert_eq!(c.get("cursor").unwrap().record, record());
    }

    #[test]
    fn freshness_bands() {
        let c = cache();
        let now = Utc::now();
        let at = |hours: i64| CacheEntry {
            record: record(),
            captured_at: now - chrono::Duration::seconds(hours * HOUR),
        };
        let stale = c.stale_ttl();
        assert_eq!(c.freshness(&at(1), now, stale), Freshness::Fresh);
        assert_eq!(c.freshness(&at(6), now, stale), Freshness::StaleAcceptable);
        assert_eq!(c.freshness(&at(23), now, stale), Freshness::StaleAcceptable);
        assert_eq!(c.freshness(&at(24), now, stale), Freshness::Expired);
        assert!(!Freshness::Expired.is_usable());

        let longer = Duration::from_secs(72 * 3600);
        assert_eq!(c.freshness(&at(48), now, longer), Freshness::StaleAcceptable);
    }

    #[test]
    fn expired_entries_stay_in_the_map() {
        let c = cache();
        let long_ago = Utc::now() - chrono::Duration::days(3);
        c.put_at("Cursor", record(), long_ago);
        let entry = c.get("Cursor").expect("still stored");
        assert_eq!(
            c.freshness(&entry, Utc::now(), c.stale_ttl()),
            Freshness::Expired
        );
    }

    #[test]
    fn future_capture_counts_as_fresh() {
        let c = cache();
        let now = Utc::now();
        let entry = CacheEntry {
            record: record(),
            captured_at: now + chrono::Duration::minutes(5),
        };
        assert_eq!(entry.age_at(now), Duration::ZERO);
        assert_eq!(c.freshness(&entry, now, c.stale_ttl()), Freshness::Fresh);
    }

    #[tokio::test]
    async fn key_lock_is_shared_across_case() {
        let c = cache();
        let guard = c.lock_key("Cursor").await;
        let locks = c.key_locks.lock().unwrap();
        let lock = locks.get("cursor").unwrap().clone();
        drop(locks);
        assert!(lock.try_lock().is_err());
        drop(guard);
        assert!(lock.try_lock().is_ok());
    }
}
