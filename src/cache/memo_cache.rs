//! Size-bounded in-memory document cache
//!
//! Entries are weighed by their serialized JSON length plus key length.
//! When an insert would exceed `max_size`, least recently used entries are
//! evicted first. Crossing `alert_ratio * max_size` fires the alert callback
//! once; it re-arms when usage falls back below the threshold.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lru::LruCache;
use tracing::warn;

use crate::document::Document;
use crate::observability::Event;

use super::DocumentCache;

/// Callback invoked when the cache nears capacity
pub type AlertFn = Arc<dyn Fn(&CacheStats) + Send + Sync>;

/// Cache bounds
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Total size budget in bytes
    pub max_size: usize,
    /// Fraction of `max_size` that triggers the alert
    pub alert_ratio: f64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: 5_000_000,
            alert_ratio: 0.9,
        }
    }
}

impl CacheConfig {
    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            max_size,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_size == 0 {
            return Err("cache max_size must be > 0".into());
        }
        if !(self.alert_ratio > 0.0 && self.alert_ratio <= 1.0) {
            return Err(format!(
                "cache alert_ratio must be in (0, 1], got {}",
                self.alert_ratio
            ));
        }
        Ok(())
    }

    fn alert_threshold(&self) -> usize {
        (self.max_size as f64 * self.alert_ratio).ceil() as usize
    }
}

/// Point-in-time cache statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub size: usize,
    pub max_size: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub alerts: u64,
}

impl CacheStats {
    pub fn usage_ratio(&self) -> f64 {
        if self.max_size == 0 {
            return 0.0;
        }
        self.size as f64 / self.max_size as f64
    }
}

struct Entry {
    document: Document,
    size: usize,
}

/// Entries in recency order; `size` is the summed weight of `entries`
struct CacheState {
    entries: LruCache<String, Entry>,
    size: usize,
    alerted: bool,
    hits: u64,
    misses: u64,
    evictions: u64,
    alerts: u64,
}

impl Default for CacheState {
    fn default() -> Self {
        Self {
            entries: LruCache::unbounded(),
            size: 0,
            alerted: false,
            hits: 0,
            misses: 0,
            evictions: 0,
            alerts: 0,
        }
    }
}

impl CacheState {
    fn remove(&mut self, key: &str) -> bool {
        match self.entries.pop(key) {
            Some(entry) => {
                self.size -= entry.size;
                true
            }
            None => false,
        }
    }

    fn evict_oldest(&mut self) -> bool {
        match self.entries.pop_lru() {
            Some((_, entry)) => {
                self.size -= entry.size;
                self.evictions += 1;
                true
            }
            None => false,
        }
    }
}

/// Default `DocumentCache` implementation
pub struct MemoCache {
    config: CacheConfig,
    alert: AlertFn,
    state: Mutex<CacheState>,
}

impl MemoCache {
    /// Cache whose alert logs a warning
    pub fn new(config: CacheConfig) -> Self {
        Self::with_alert(config, Arc::new(log_alert))
    }

    pub fn with_alert(config: CacheConfig, alert: AlertFn) -> Self {
        Self {
            config,
            alert,
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn stats(&self) -> CacheStats {
        self.snapshot(&self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().entries.contains(key)
    }

    /// Drops every entry. Counters are kept.
    pub fn clear(&self) {
        let mut guard = self.lock();
        let state = &mut *guard;
        state.entries.clear();
        state.size = 0;
        state.alerted = false;
    }

    // A poisoned lock only means another thread panicked mid-call; the
    // state is still a valid cache, so keep serving it.
    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn snapshot(&self, state: &CacheState) -> CacheStats {
        CacheStats {
            entries: state.entries.len(),
            size: state.size,
            max_size: self.config.max_size,
            hits: state.hits,
            misses: state.misses,
            evictions: state.evictions,
            alerts: state.alerts,
        }
    }

    fn check_alert(&self, state: &mut CacheState) -> Option<CacheStats> {
        if state.size < self.config.alert_threshold() {
            state.alerted = false;
            return None;
        }
        if state.alerted {
            return None;
        }
        state.alerted = true;
        state.alerts += 1;
        Some(self.snapshot(state))
    }
}

impl DocumentCache for MemoCache {
    fn get(&self, key: &str) -> Option<Document> {
        let mut guard = self.lock();
        let state = &mut *guard;

        match state.entries.get(key) {
            Some(entry) => {
                let document = entry.document.clone();
                state.hits += 1;
                Some(document)
            }
            None => {
                state.misses += 1;
                None
            }
        }
    }

    fn set(&self, key: &str, document: &Document) -> bool {
        let size = entry_size(key, document);

        let (stored, alert) = {
            let mut guard = self.lock();
            let state = &mut *guard;

            // The previous value must never outlive a newer write.
            state.remove(key);

            if size > self.config.max_size {
                (false, self.check_alert(state))
            } else {
                while state.size + size > self.config.max_size && state.evict_oldest() {}

                state.entries.put(
                    key.to_string(),
                    Entry {
                        document: document.clone(),
                        size,
                    },
                );
                state.size += size;
                (true, self.check_alert(state))
            }
        };

        if let Some(stats) = alert {
            (self.alert)(&stats);
        }
        stored
    }

    fn delete(&self, key: &str) {
        let alert = {
            let mut guard = self.lock();
            if guard.remove(key) {
                self.check_alert(&mut guard)
            } else {
                None
            }
        };

        if let Some(stats) = alert {
            (self.alert)(&stats);
        }
    }
}

impl fmt::Debug for MemoCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoCache")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish()
    }
}

fn entry_size(key: &str, document: &Document) -> usize {
    key.len() + serde_json::to_vec(document).map_or(0, |bytes| bytes.len())
}

fn log_alert(stats: &CacheStats) {
    warn!(
        event = %Event::CacheAlert,
        entries = stats.entries,
        size = stats.size,
        max_size = stats.max_size,
        "cache usage above alert ratio"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn doc(id: &str) -> Document {
        Document::from_value(json!({"id": id, "content": "0123456789"})).unwrap()
    }

    fn weight(key: &str) -> usize {
        entry_size(key, &doc(key))
    }

    #[test]
    fn test_get_returns_independent_copy() {
        let cache = MemoCache::new(CacheConfig::default());
        cache.set("a.memo", &doc("a"));

        let mut copy = cache.get("a.memo").unwrap();
        copy.insert("content", "mutated");

        assert_eq!(cache.get("a.memo").unwrap().get_str("content"), Some("0123456789"));
    }

    #[test]
    fn test_set_replaces_and_delete_removes() {
        let cache = MemoCache::new(CacheConfig::default());
        assert!(cache.set("a.memo", &doc("a")));
        assert!(cache.set("a.memo", &doc("a").with("content", "x")));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("a.memo").unwrap().get_str("content"), Some("x"));

        cache.delete("a.memo");
        assert!(cache.get("a.memo").is_none());
        assert_eq!(cache.stats().size, 0);
    }

    #[test]
    fn test_least_recently_used_is_evicted() {
        let max = weight("a.memo") * 2;
        let cache = MemoCache::new(CacheConfig::with_max_size(max));

        cache.set("a.memo", &doc("a"));
        cache.set("b.memo", &doc("b"));
        // touch a so b becomes the oldest
        cache.get("a.memo");
        cache.set("c.memo", &doc("c"));

        assert!(cache.contains("a.memo"));
        assert!(!cache.contains("b.memo"));
        assert!(cache.contains("c.memo"));
        assert_eq!(cache.stats().evictions, 1);
        assert!(cache.stats().size <= max);
    }

    #[test]
    fn test_oversized_document_is_not_cached() {
        let cache = MemoCache::new(CacheConfig::with_max_size(8));
        assert!(!cache.set("a.memo", &doc("a")));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_oversized_update_drops_stale_entry() {
        let cache = MemoCache::new(CacheConfig::with_max_size(weight("a.memo") + 4));
        assert!(cache.set("a.memo", &doc("a")));

        let big = doc("a").with("content", "x".repeat(64));
        assert!(!cache.set("a.memo", &big));
        assert!(cache.get("a.memo").is_none());
    }

    #[test]
    fn test_alert_fires_once_per_crossing() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let config = CacheConfig {
            max_size: weight("a.memo") * 4,
            alert_ratio: 0.5,
        };
        let cache = MemoCache::with_alert(
            config,
            Arc::new(move |_stats: &CacheStats| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        cache.set("a.memo", &doc("a"));
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        cache.set("b.memo", &doc("b"));
        cache.set("c.memo", &doc("c"));
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        cache.delete("b.memo");
        cache.delete("c.memo");
        cache.set("d.memo", &doc("d"));
        assert_eq!(fired.load(Ordering::SeqCst), 2);
        assert_eq!(cache.stats().alerts, 2);
    }

    #[test]
    fn test_hit_and_miss_counters() {
        let cache = MemoCache::new(CacheConfig::default());
        cache.set("a.memo", &doc("a"));
        cache.get("a.memo");
        cache.get("z.memo");

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn test_config_validation() {
        assert!(CacheConfig::default().validate().is_ok());
        assert!(CacheConfig::with_max_size(0).validate().is_err());
        let config = CacheConfig {
            max_size: 10,
            alert_ratio: 1.5,
        };
        assert!(config.validate().is_err());
    }
}
