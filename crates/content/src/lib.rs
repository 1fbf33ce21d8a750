//! # refdoc content
//!
//! Loads topic documents on demand.
//!
//! ## Pipeline
//!
//! ```text
//! load(key, use_cache)
//!     │
//!     ├──> key validation ──────────────> UnknownKey (not retried)
//!     ├──> ContentCache (TTL) ──hit─────> Cache
//!     ├──> in-flight map ──pending──────> await the same result
//!     └──> ContentSource::fetch
//!            ├─ ok, non-empty ──> cache + snapshot + ContentLoaded ──> Network
//!            └─ error / empty ──> retry (delay × attempt) up to retry_attempts
//!                                   └─ exhausted ──> ContentError ──> Fallback
//! ```
//!
//! Retries bypass the cache and run inside the coalesced fetch, so a long
//! partial outage shows up as slow loads rather than fast failures.

mod cache;
mod error;
mod events;
mod loader;
mod snapshot;
mod source;

pub use cache::{CacheEntry, CacheStats, ContentCache};
pub use error::{ContentError, Result};
pub use events::{ContentEvent, EventBus};
pub use loader::{
    fallback_document, key_is_path_safe, ContentLoader, ContentOrigin, LoadedContent,
    PreloadReport,
};
pub use snapshot::{Snapshot, SnapshotStore};
pub use source::{source_for, ContentSource, FileSource, HttpSource};
