use crate::terms::{default_terms, TermDefinition};
use anyhow::{Context, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Upper bound for `content.retry_delay_ms` (one hour).
pub const MAX_RETRY_DELAY_MS: u64 = 3_600_000;
/// Upper bound for `popover.hide_delay_ms` (one minute).
pub const MAX_HIDE_DELAY_MS: u64 = 60_000;

/// Top-level reader configuration, usually loaded from `refdoc.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AppConfig {
    pub schema_version: u32,
    pub content: ContentConfig,
    /// Ordered topic list; drives tabs and key validation.
    pub topics: Vec<TopicConfig>,
    pub popover: PopoverConfig,
    pub scroll: ScrollConfig,
    pub terms: Vec<TermDefinition>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            schema_version: CONFIG_SCHEMA_VERSION,
            content: ContentConfig::default(),
            topics: Vec::new(),
            popover: PopoverConfig::default(),
            scroll: ScrollConfig::default(),
            terms: default_terms(),
        }
    }
}

/// Where topic documents come from and how loads are cached and retried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ContentConfig {
    /// Directory or `http(s)://` prefix; documents live at `{base_path}{key}{file_extension}`.
    pub base_path: String,
    pub file_extension: String,
    pub cache_timeout_ms: u64,
    /// Retries after the first failed attempt.
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
    /// Best-effort snapshot directory; `None` disables snapshots.
    pub snapshot_dir: Option<PathBuf>,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            base_path: "content/".to_string(),
            file_extension: ".md".to_string(),
            cache_timeout_ms: 300_000,
            retry_attempts: 3,
            retry_delay_ms: 1_000,
            snapshot_dir: None,
        }
    }
}

impl ContentConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn resource_path(&self, key: &str) -> String {
        format!("{}{}{}", self.base_path, key, self.file_extension)
    }

    pub fn is_remote(&self) -> bool {
        let base = self.base_path.trim_start();
        base.starts_with("http://") || base.starts_with("https://")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TopicConfig {
    pub key: String,
    pub title: String,
}

/// Popover placement constants, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PopoverConfig {
    pub gap: f64,
    pub viewport_margin: f64,
    pub side_padding: f64,
    pub hide_delay_ms: u64,
}

impl Default for PopoverConfig {
    fn default() -> Self {
        Self {
            gap: 8.0,
            viewport_margin: 8.0,
            side_padding: 12.0,
            hide_delay_ms: 150,
        }
    }
}

impl PopoverConfig {
    pub fn hide_delay(&self) -> Duration {
        Duration::from_millis(self.hide_delay_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ScrollConfig {
    /// Height of the fixed header; a section counts as reached once its top passes it.
    pub header_offset: f64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            header_offset: 80.0,
        }
    }
}

fn env_value(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parsed<T: std::str::FromStr>(var: &str) -> Option<T> {
    let raw = env_value(var)?;
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Ignoring {var}={raw}: not a valid number");
            None
        }
    }
}

impl AppConfig {
    /// Load from a TOML file (or defaults when `path` is `None`), then apply
    /// `REFDOC_*` environment overrides and validate.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        config
            .validate()
            .map_err(|err| anyhow::anyhow!("Invalid configuration: {err}"))?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml_str(&raw).with_context(|| format!("Invalid {}", path.display()))
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        if config.schema_version != CONFIG_SCHEMA_VERSION {
            anyhow::bail!(
                "Unsupported config schema_version {} (expected {CONFIG_SCHEMA_VERSION})",
                config.schema_version
            );
        }
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Some(base) = env_value("REFDOC_BASE_PATH") {
            self.content.base_path = base;
        }
        if let Some(ms) = env_parsed("REFDOC_CACHE_TIMEOUT_MS") {
            self.content.cache_timeout_ms = ms;
        }
        if let Some(attempts) = env_parsed("REFDOC_RETRY_ATTEMPTS") {
            self.content.retry_attempts = attempts;
        }
        if let Some(ms) = env_parsed("REFDOC_RETRY_DELAY_MS") {
            self.content.retry_delay_ms = ms;
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.content.file_extension.trim().is_empty() {
            return Err("content.file_extension must not be empty".to_string());
        }
        if self.content.cache_timeout_ms == 0 {
            return Err("content.cache_timeout_ms must be > 0".to_string());
        }

        if self.content.retry_delay_ms > MAX_RETRY_DELAY_MS {
            return Err(format!("content.retry_delay_ms must be <= {MAX_RETRY_DELAY_MS}"));
        }
        if self.popover.hide_delay_ms > MAX_HIDE_DELAY_MS {
            return Err(format!("popover.hide_delay_ms must be <= {MAX_HIDE_DELAY_MS}"));
        }

        let mut seen = HashSet::new();
        for topic in &self.topics {
            if topic.key.trim().is_empty() {
                return Err("topic keys must not be empty".to_string());
            }
            if !seen.insert(topic.key.as_str()) {
                return Err(format!("duplicate topic key '{}'", topic.key));
            }
        }

        if self.popover.gap < 0.0
            || self.popover.viewport_margin < 0.0
            || self.popover.side_padding < 0.0
        {
            return Err("popover distances must be non-negative".to_string());
        }

        Ok(())
    }

    pub fn topic_keys(&self) -> Vec<String> {
        self.topics.iter().map(|t| t.key.clone()).collect()
    }

    pub fn topic(&self, key: &str) -> Option<&TopicConfig> {
        self.topics.iter().find(|t| t.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.content.cache_ttl(), Duration::from_secs(300));
        assert_eq!(config.content.retry_attempts, 3);
    }

    #[test]
    fn test_resource_path_concatenates_parts() {
        let content = ContentConfig {
            base_path: "https://docs.example.org/topics/".to_string(),
            ..Default::default()
        };
        assert_eq!(
            content.resource_path("vector"),
            "https://docs.example.org/topics/vector.md"
        );
        assert!(content.is_remote());
        assert!(!ContentConfig::default().is_remote());
    }

    #[test]
    fn test_parse_partial_toml_keeps_defaults() {
        let raw = r#"
            [content]
            base_path = "docs/"
            retry_attempts = 5

            [[topics]]
            key = "vector"
            title = "Vectors"

            [[topics]]
            key = "move"
            title = "Move semantics"
        "#;
        let config = AppConfig::from_toml_str(raw).expect("config");
        assert_eq!(config.content.base_path, "docs/");
        assert_eq!(config.content.retry_attempts, 5);
        assert_eq!(config.content.file_extension, ".md");
        assert_eq!(config.topic_keys(), vec!["vector", "move"]);
        assert_eq!(config.terms, default_terms());
    }

    #[test]
    fn test_parse_custom_terms_replaces_defaults() {
        let raw = r#"
            [[terms]]
            id = "raii"
            triggers = ['\bRAII\b']
            title = "RAII"
            body_html = "<p>scope-bound resources</p>"
        "#;
        let config = AppConfig::from_toml_str(raw).expect("config");
        assert_eq!(config.terms.len(), 1);
        assert_eq!(config.terms[0].triggers, vec![r"\bRAII\b".to_string()]);
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();

        config.topics = vec![
            TopicConfig {
                key: "a".to_string(),
                title: "A".to_string(),
            },
            TopicConfig {
                key: "a".to_string(),
                title: "Again".to_string(),
            },
        ];
        assert!(config.validate().is_err());

        config.topics.pop();
        assert!(config.validate().is_ok());

        config.content.file_extension = " ".to_string();
        assert!(config.validate().is_err());

        config.content.file_extension = ".md".to_string();
        config.content.cache_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_oversized_delays() {
        let mut config = AppConfig::default();
        config.content.retry_delay_ms = MAX_RETRY_DELAY_MS;
        config.popover.hide_delay_ms = MAX_HIDE_DELAY_MS;
        assert!(config.validate().is_ok());

        config.content.retry_delay_ms = u64::MAX;
        assert!(config.validate().unwrap_err().contains("retry_delay_ms"));

        config.content.retry_delay_ms = 1_000;
        config.popover.hide_delay_ms = u64::MAX;
        assert!(config.validate().unwrap_err().contains("hide_delay_ms"));
    }

    #[test]
    fn test_rejects_unknown_schema_version() {
        let err = AppConfig::from_toml_str("schema_version = 9").unwrap_err();
        assert!(err.to_string().contains("schema_version"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("refdoc.toml");
        std::fs::write(&path, "[content]\nretry_delay_ms = 10\n").unwrap();
        let config = AppConfig::from_file(&path).expect("config");
        assert_eq!(config.content.retry_delay(), Duration::from_millis(10));
    }
}
