//! # refdoc protocol
//!
//! Configuration surface shared by every refdoc crate: where topic documents
//! live, how long they stay cached, how failed loads are retried, how the
//! term popover is laid out, and the ordered list of term definitions.
//!
//! ```rust
//! use refdoc_protocol::AppConfig;
//!
//! let config = AppConfig::default();
//! assert!(config.validate().is_ok());
//! assert_eq!(config.content.file_extension, ".md");
//! ```

use anyhow::Result;
use serde::Serialize;

mod config;
mod terms;

pub use config::{
    AppConfig, ContentConfig, PopoverConfig, ScrollConfig, TopicConfig, CONFIG_SCHEMA_VERSION,
    MAX_HIDE_DELAY_MS, MAX_RETRY_DELAY_MS,
};
pub use terms::{default_terms, TermDefinition};

pub fn serialize_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(Into::into)
}

pub fn serialize_json_pretty<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(Into::into)
}

/// JSON schema of [`AppConfig`], for editors and `refdoc config-schema`.
pub fn config_schema() -> Result<String> {
    let schema = schemars::schema_for!(AppConfig);
    serialize_json_pretty(&schema)
}
