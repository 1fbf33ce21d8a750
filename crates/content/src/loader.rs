use crate::cache::ContentCache;
use crate::error::{ContentError, Result};
use crate::events::{ContentEvent, EventBus};
use crate::snapshot::SnapshotStore;
use crate::source::ContentSource;
use refdoc_protocol::ContentConfig;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::OnceCell;
use tokio::task::JoinSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentOrigin {
    Cache,
    Network,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadedContent {
    pub key: String,
    pub content: String,
    pub origin: ContentOrigin,
    /// Last failure, set only for fallback documents.
    pub error: Option<String>,
}

impl LoadedContent {
    pub fn is_fallback(&self) -> bool {
        self.origin == ContentOrigin::Fallback
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PreloadReport {
    /// Keys in completion order.
    pub completed: Vec<String>,
    pub fallbacks: Vec<String>,
    pub rejected: Vec<String>,
}

type InFlight = Arc<OnceCell<LoadedContent>>;

struct LoaderInner {
    config: ContentConfig,
    known_keys: Option<HashSet<String>>,
    source: Arc<dyn ContentSource>,
    cache: ContentCache,
    in_flight: Mutex<HashMap<String, InFlight>>,
    retries: Mutex<HashMap<String, u32>>,
    events: EventBus,
    snapshots: Option<SnapshotStore>,
    network_requests: AtomicU64,
}

/// Loads topic documents through the cache, coalescing concurrent requests
/// per key and retrying failures before falling back to an error document.
///
/// Cheap to clone; clones share cache, in-flight map and event bus.
#[derive(Clone)]
pub struct ContentLoader {
    inner: Arc<LoaderInner>,
}

impl std::fmt::Debug for ContentLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentLoader")
            .field("base_path", &self.inner.config.base_path)
            .field("source", &self.inner.source.describe())
            .finish_non_exhaustive()
    }
}

/// Keys become file names and URL segments: ASCII alphanumerics, `-` and `_`.
pub fn key_is_path_safe(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_'))
}

impl ContentLoader {
    pub fn new(config: ContentConfig, source: Arc<dyn ContentSource>) -> Self {
        Self::build(config, source, None)
    }

    /// Restrict loads to the configured topic keys.
    pub fn with_known_keys(
        config: ContentConfig,
        source: Arc<dyn ContentSource>,
        keys: &[String],
    ) -> Self {
        Self::build(config, source, Some(keys.iter().cloned().collect()))
    }

    fn build(
        config: ContentConfig,
        source: Arc<dyn ContentSource>,
        known_keys: Option<HashSet<String>>,
    ) -> Self {
        let snapshots = config.snapshot_dir.clone().map(SnapshotStore::new);
        let cache = ContentCache::new(config.cache_ttl());
        Self {
            inner: Arc::new(LoaderInner {
                config,
                known_keys,
                source,
                cache,
                in_flight: Mutex::new(HashMap::new()),
                retries: Mutex::new(HashMap::new()),
                events: EventBus::new(),
                snapshots,
                network_requests: AtomicU64::new(0),
            }),
        }
    }

    pub fn config(&self) -> &ContentConfig {
        &self.inner.config
    }

    pub fn cache(&self) -> &ContentCache {
        &self.inner.cache
    }

    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<ContentEvent> {
        self.inner.events.subscribe()
    }

    /// Network retrievals issued so far, retries included.
    pub fn network_requests(&self) -> u64 {
        self.inner.network_requests.load(Ordering::Relaxed)
    }

    pub fn invalidate(&self, key: Option<&str>) {
        self.inner.cache.invalidate(key);
    }

    pub fn validate_key(&self, key: &str) -> Result<()> {
        if !key_is_path_safe(key) {
            return Err(ContentError::UnknownKey(key.to_string()));
        }
        if let Some(known) = &self.inner.known_keys {
            if !known.contains(key) {
                return Err(ContentError::UnknownKey(key.to_string()));
            }
        }
        Ok(())
    }

    pub async fn load(&self, key: &str, use_cache: bool) -> Result<LoadedContent> {
        self.validate_key(key)?;

        if use_cache {
            if let Some(content) = self.inner.cache.get(key) {
                log::debug!("cache hit for '{key}'");
                return Ok(LoadedContent {
                    key: key.to_string(),
                    content,
                    origin: ContentOrigin::Cache,
                    error: None,
                });
            }
        }

        let cell = {
            let mut in_flight = self
                .inner
                .in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            Arc::clone(
                in_flight
                    .entry(key.to_string())
                    .or_insert_with(|| Arc::new(OnceCell::new())),
            )
        };

        let loaded = cell.get_or_init(|| self.fetch_with_retry(key)).await.clone();

        {
            let mut in_flight = self
                .inner
                .in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if in_flight
                .get(key)
                .is_some_and(|current| Arc::ptr_eq(current, &cell))
            {
                in_flight.remove(key);
            }
        }

        Ok(loaded)
    }

    /// Bypass the cache; the retry action of a fallback document.
    pub async fn reload(&self, key: &str) -> Result<LoadedContent> {
        self.load(key, false).await
    }

    async fn fetch_with_retry(&self, key: &str) -> LoadedContent {
        let resource = self.inner.config.resource_path(key);
        loop {
            let err = match self.fetch_once(&resource).await {
                Ok(content) => return self.finish_success(key, content).await,
                Err(err) => err,
            };

            let attempt = {
                let mut retries = self
                    .inner
                    .retries
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                let count = retries.entry(key.to_string()).or_insert(0);
                if *count < self.inner.config.retry_attempts {
                    *count += 1;
                    Some(*count)
                } else {
                    retries.remove(key);
                    None
                }
            };

            match attempt {
                Some(attempt) => {
                    let delay = backoff_delay(self.inner.config.retry_delay(), attempt);
                    log::warn!(
                        "load '{key}' failed ({err}); retry {attempt}/{} in {}ms",
                        self.inner.config.retry_attempts,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                None => return self.finish_failure(key, &err),
            }
        }
    }

    async fn fetch_once(&self, resource: &str) -> Result<String> {
        self.inner.network_requests.fetch_add(1, Ordering::Relaxed);
        let body = self.inner.source.fetch(resource).await?;
        if body.trim().is_empty() {
            return Err(ContentError::EmptyContent {
                resource: resource.to_string(),
            });
        }
        Ok(body)
    }

    async fn finish_success(&self, key: &str, content: String) -> LoadedContent {
        self.inner.cache.put(key, &content);
        self.inner
            .retries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        if let Some(snapshots) = &self.inner.snapshots {
            snapshots.save(key, &content).await;
        }
        log::info!("loaded '{key}' ({} bytes)", content.len());
        self.inner.events.emit(ContentEvent::ContentLoaded {
            key: key.to_string(),
            content: content.clone(),
        });
        LoadedContent {
            key: key.to_string(),
            content,
            origin: ContentOrigin::Network,
            error: None,
        }
    }

    fn finish_failure(&self, key: &str, err: &ContentError) -> LoadedContent {
        let attempts = self.inner.config.retry_attempts + 1;
        log::warn!("giving up on '{key}' after {attempts} attempts: {err}");
        self.inner.events.emit(ContentEvent::ContentError {
            key: key.to_string(),
            error: err.to_string(),
        });
        LoadedContent {
            key: key.to_string(),
            content: fallback_document(key, attempts, err),
            origin: ContentOrigin::Fallback,
            error: Some(err.to_string()),
        }
    }

    /// Load every key concurrently; emits `PreloadComplete` once all resolve.
    pub async fn preload(&self, keys: &[String]) -> PreloadReport {
        let mut tasks = JoinSet::new();
        for key in keys {
            let loader = self.clone();
            let key = key.clone();
            tasks.spawn(async move {
                let result = loader.load(&key, true).await;
                (key, result)
            });
        }

        let mut report = PreloadReport::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((key, Ok(loaded))) => {
                    if loaded.is_fallback() {
                        report.fallbacks.push(key.clone());
                    }
                    report.completed.push(key);
                }
                Ok((key, Err(err))) => {
                    log::warn!("preload skipped '{key}': {err}");
                    report.rejected.push(key);
                }
                Err(err) => log::error!("preload task failed: {err}"),
            }
        }

        self.inner.events.emit(ContentEvent::PreloadComplete {
            keys: report.completed.clone(),
        });
        report
    }

    /// Seed the cache from snapshots written by earlier runs. Entries keep
    /// the snapshot's age; snapshots older than the TTL are skipped. Returns
    /// the keys that were restored.
    pub async fn warm_from_snapshots(&self, keys: &[String]) -> Vec<String> {
        let Some(snapshots) = &self.inner.snapshots else {
            return Vec::new();
        };
        let ttl = self.inner.cache.ttl();
        let mut restored = Vec::new();
        for key in keys {
            if self.validate_key(key).is_err() {
                continue;
            }
            let Some(snapshot) = snapshots.load(key).await else {
                continue;
            };
            if snapshot.age >= ttl {
                log::debug!(
                    "snapshot for '{key}' expired ({}s old)",
                    snapshot.age.as_secs()
                );
                continue;
            }
            if self.inner.cache.put_aged(key, &snapshot.content, snapshot.age) {
                restored.push(key.clone());
            }
        }
        if !restored.is_empty() {
            log::debug!("restored {} topics from snapshots", restored.len());
        }
        restored
    }
}

/// Linear backoff, saturating instead of overflowing.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.checked_mul(attempt).unwrap_or(Duration::MAX)
}

/// Markdown shown in place of a topic that could not be loaded.
pub fn fallback_document(key: &str, attempts: u32, err: &ContentError) -> String {
    format!(
        "# Content unavailable\n\n\
         The topic `{key}` could not be loaded after {attempts} attempts.\n\n\
         > {err}\n\n\
         [Retry](#retry:{key})\n"
    )
}
