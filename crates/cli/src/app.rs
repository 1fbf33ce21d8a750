use anyhow::{Context, Result};
use refdoc_content::{key_is_path_safe, source_for, ContentLoader};
use refdoc_navigator::Navigator;
use refdoc_protocol::{AppConfig, TopicConfig};
use refdoc_terms::TermRegistry;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub(crate) const DEFAULT_CONFIG_FILE: &str = "refdoc.toml";

/// Explicit path, then `REFDOC_CONFIG`, then `./refdoc.toml` when present.
pub(crate) fn resolve_config_path(explicit: Option<PathBuf>) -> Option<PathBuf> {
    explicit
        .or_else(|| std::env::var_os("REFDOC_CONFIG").map(PathBuf::from))
        .or_else(|| {
            let local = PathBuf::from(DEFAULT_CONFIG_FILE);
            local.is_file().then_some(local)
        })
}

pub(crate) fn load_config(path: Option<&Path>, base_path: Option<&str>) -> Result<AppConfig> {
    let mut config = AppConfig::load(path)?;
    if let Some(base) = base_path {
        config.content.base_path = base.to_string();
        config
            .validate()
            .map_err(|err| anyhow::anyhow!("Invalid configuration: {err}"))?;
    }
    if config.topics.is_empty() && !config.content.is_remote() {
        config.topics = discover_topics(&config)?;
    }
    log::debug!(
        "config: base_path={} topics={}",
        config.content.base_path,
        config.topics.len()
    );
    Ok(config)
}

/// Topics for a local base path without a configured list: every file with
/// the content extension whose stem is a loadable key, sorted by key.
fn discover_topics(config: &AppConfig) -> Result<Vec<TopicConfig>> {
    let dir = Path::new(&config.content.base_path);
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let ext = config.content.file_extension.as_str();
    let mut topics = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(key) = name.to_str().and_then(|n| n.strip_suffix(ext)) else {
            continue;
        };
        if key.is_empty() || !entry.file_type()?.is_file() {
            continue;
        }
        if !key_is_path_safe(key) {
            log::warn!("Skipping {}: '{key}' is not a valid topic key", entry.path().display());
            continue;
        }
        topics.push(TopicConfig {
            key: key.to_string(),
            title: key.to_string(),
        });
    }
    topics.sort_by(|a, b| a.key.cmp(&b.key));
    Ok(topics)
}

pub(crate) fn build_registry(config: &AppConfig) -> Result<Arc<TermRegistry>> {
    let registry =
        TermRegistry::new(config.terms.clone()).context("Invalid term definitions")?;
    Ok(Arc::new(registry))
}

pub(crate) fn build_loader(config: &AppConfig) -> Result<ContentLoader> {
    let source = source_for(&config.content).context("Failed to set up content source")?;
    let loader = if config.topics.is_empty() {
        ContentLoader::new(config.content.clone(), source)
    } else {
        ContentLoader::with_known_keys(config.content.clone(), source, &config.topic_keys())
    };
    Ok(loader)
}

pub(crate) async fn build_navigator(config: &AppConfig, warm: bool) -> Result<Navigator> {
    let registry = build_registry(config)?;
    let loader = build_loader(config)?;
    if warm {
        loader.warm_from_snapshots(&config.topic_keys()).await;
    }
    Ok(Navigator::new(config, loader, registry))
}
