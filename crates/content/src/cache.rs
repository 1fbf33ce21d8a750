use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: String,
    pub content: String,
    pub fetched_at: Instant,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub fresh: usize,
}

/// Key → content store with a time-to-live. Stale rows are ignored by `get`
/// but stay until overwritten or invalidated.
#[derive(Debug)]
pub struct ContentCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ContentCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_fresh(&self, entry: &CacheEntry, now: Instant) -> bool {
        now.saturating_duration_since(entry.fetched_at) < self.ttl
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.get(key)?;
        if self.is_fresh(entry, Instant::now()) {
            Some(entry.content.clone())
        } else {
            None
        }
    }

    /// Store `content`; empty content is refused and reported as `false`.
    pub fn put(&self, key: &str, content: &str) -> bool {
        self.put_aged(key, content, Duration::ZERO)
    }

    /// Store `content` as if it had been fetched `age` ago. Ages beyond the
    /// clock's range are clamped to the oldest representable instant.
    pub fn put_aged(&self, key: &str, content: &str, age: Duration) -> bool {
        if content.is_empty() {
            log::debug!("refusing to cache empty content for '{key}'");
            return false;
        }
        let now = Instant::now();
        let fetched_at = now
            .checked_sub(age)
            .or_else(|| now.checked_sub(self.ttl))
            .unwrap_or(now);
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(
            key.to_string(),
            CacheEntry {
                key: key.to_string(),
                content: content.to_string(),
                fetched_at,
            },
        );
        true
    }

    /// Drop one entry, or everything when `key` is `None`.
    pub fn invalidate(&self, key: Option<&str>) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match key {
            Some(key) => {
                entries.remove(key);
            }
            None => entries.clear(),
        }
    }

    /// Raw row regardless of age.
    pub fn entry(&self, key: &str) -> Option<CacheEntry> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).cloned()
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        CacheStats {
            entries: entries.len(),
            fresh: entries.values().filter(|e| self.is_fresh(e, now)).count(),
        }
    }
}
