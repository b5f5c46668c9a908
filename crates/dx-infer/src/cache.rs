//! Generative result cache
//!
//! Keyed by a content hash of (source, target, normalized text). Entries
//! expire after a TTL measured on an injectable [`Clock`]; past the size
//! bound the oldest-created entry is evicted. One mutex guards the map so
//! insertion and eviction are atomic with respect to the size bound.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use dx_core::{conversion_key, CacheConfig, Dialect};

use crate::clock::{Clock, SystemClock};

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    created_at: Instant,
}

/// Shared, bounded, expiring store of generative conversions
#[derive(Debug)]
pub struct ConversionCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    enabled: bool,
    ttl: Duration,
    max_entries: usize,
    clock: Arc<dyn Clock>,
}

impl ConversionCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            enabled: config.enabled,
            ttl: Duration::from_secs(config.ttl_secs),
            max_entries: config.max_entries.max(1),
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn expired(&self, entry: &CacheEntry, now: Instant) -> bool {
        now.saturating_duration_since(entry.created_at) > self.ttl
    }

    /// Cached conversion of `text`, if present and fresh
    pub fn get(&self, source: Dialect, target: Dialect, text: &str) -> Option<String> {
        if !self.enabled {
            return None;
        }
        let key = conversion_key(source.name(), target.name(), text);
        let now = self.clock.now();
        let mut entries = self.lock();
        match entries.get(&key) {
            Some(entry) if self.expired(entry, now) => {
                entries.remove(&key);
                log::debug!("Cache entry for {}->{} expired", source, target);
                None
            }
            Some(entry) => {
                log::debug!("Cache hit for {}->{}", source, target);
                Some(entry.value.clone())
            }
            None => None,
        }
    }

    /// Store a conversion.
    ///
    /// Expired entries are dropped first; if the store is still over its
    /// bound, the oldest entry is evicted.
    pub fn put(&self, source: Dialect, target: Dialect, text: &str, result: &str) {
        if !self.enabled {
            return;
        }
        let key = conversion_key(source.name(), target.name(), text);
        let now = self.clock.now();
        let mut entries = self.lock();
        entries.insert(
            key,
            CacheEntry {
                value: result.to_string(),
                created_at: now,
            },
        );

        let before = entries.len();
        entries.retain(|_, entry| !self.expired(entry, now));
        let purged = before - entries.len();
        if purged > 0 {
            log::debug!("Cache dropped {} expired entries", purged);
        }

        while entries.len() > self.max_entries {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.created_at)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => {
                    entries.remove(&key);
                    log::debug!("Cache full, evicted oldest entry");
                }
                None => break,
            }
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

#[cfg(test)]
#[path = "cache_test.rs"]
mod tests;
