use crate::error::{NavigatorError, Result};
use crate::scroll::{ScrollSpy, SectionOffset};
use crate::toc::{build_toc, TocEntry};
use refdoc_content::{ContentLoader, ContentOrigin, LoadedContent, PreloadReport};
use refdoc_document::{render_markdown, Document, NodeId};
use refdoc_protocol::{AppConfig, TopicConfig};
use refdoc_terms::{ensure_popover, DecorationReport, TermAnnotator, TermRegistry};
use serde::Serialize;
use std::sync::Arc;

const RETRY_LINK_PREFIX: &str = "#retry:";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tab {
    pub key: String,
    pub title: String,
    pub active: bool,
}

/// A loaded, rendered and decorated topic.
#[derive(Debug, Clone)]
pub struct TopicView {
    pub key: String,
    pub title: String,
    pub origin: ContentOrigin,
    pub error: Option<String>,
    pub document: Document,
    /// The `article` element holding the rendered topic.
    pub container: NodeId,
    pub popover: NodeId,
    pub toc: Vec<TocEntry>,
    pub decoration: DecorationReport,
}

/// Serializable projection of a [`TopicView`].
#[derive(Debug, Clone, Serialize)]
pub struct TopicSummary<'a> {
    pub key: &'a str,
    pub title: &'a str,
    pub origin: ContentOrigin,
    pub error: Option<&'a str>,
    pub toc: &'a [TocEntry],
    pub decoration: &'a DecorationReport,
    pub html: String,
}

impl TopicView {
    pub fn is_fallback(&self) -> bool {
        self.origin == ContentOrigin::Fallback
    }

    /// Topic markup without the surrounding `article` or the popover.
    pub fn html(&self) -> String {
        self.document.inner_html(self.container)
    }

    pub fn summary(&self) -> TopicSummary<'_> {
        TopicSummary {
            key: &self.key,
            title: &self.title,
            origin: self.origin,
            error: self.error.as_deref(),
            toc: &self.toc,
            decoration: &self.decoration,
            html: self.html(),
        }
    }
}

/// The `key` behind a fallback document's retry link, if `href` is one.
pub fn retry_target(href: &str) -> Option<&str> {
    href.strip_prefix(RETRY_LINK_PREFIX)
        .filter(|key| !key.is_empty())
}

/// Tab switching, TOC generation and scroll tracking on top of the loader
/// and the term annotator.
#[derive(Debug)]
pub struct Navigator {
    topics: Vec<TopicConfig>,
    loader: ContentLoader,
    registry: Arc<TermRegistry>,
    spy: ScrollSpy,
    active: Option<String>,
}

impl Navigator {
    pub fn new(config: &AppConfig, loader: ContentLoader, registry: Arc<TermRegistry>) -> Self {
        Self {
            topics: config.topics.clone(),
            loader,
            registry,
            spy: ScrollSpy::new(config.scroll.header_offset),
            active: None,
        }
    }

    pub fn loader(&self) -> &ContentLoader {
        &self.loader
    }

    pub fn registry(&self) -> &TermRegistry {
        &self.registry
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn tabs(&self) -> Vec<Tab> {
        self.topics
            .iter()
            .map(|topic| Tab {
                key: topic.key.clone(),
                title: topic.title.clone(),
                active: self.active.as_deref() == Some(topic.key.as_str()),
            })
            .collect()
    }

    fn title_for(&self, key: &str) -> Result<String> {
        if self.topics.is_empty() {
            return Ok(key.to_string());
        }
        self.topics
            .iter()
            .find(|topic| topic.key == key)
            .map(|topic| topic.title.clone())
            .ok_or_else(|| NavigatorError::UnknownTopic(key.to_string()))
    }

    /// Load `key` (cache first), render it and make it the active topic.
    pub async fn switch_to(&mut self, key: &str) -> Result<TopicView> {
        self.open(key, true).await
    }

    /// Reload `key` bypassing the cache; the action behind a fallback's retry link.
    pub async fn retry(&mut self, key: &str) -> Result<TopicView> {
        self.open(key, false).await
    }

    async fn open(&mut self, key: &str, use_cache: bool) -> Result<TopicView> {
        let title = self.title_for(key)?;
        let loaded = self.loader.load(key, use_cache).await?;
        let view = self.render(title, loaded)?;

        self.spy.reset(Vec::new());
        self.active = Some(key.to_string());
        log::info!(
            "switched to '{key}' ({:?}, {} sections, {} markers)",
            view.origin,
            view.toc.len(),
            view.decoration.markers
        );
        Ok(view)
    }

    fn render(&self, title: String, loaded: LoadedContent) -> Result<TopicView> {
        let mut document = Document::new();
        let root = document.root();
        let container = document.append_element(root, "article")?;
        document.set_attr(container, "class", "topic")?;
        document.set_attr(container, "data-topic", loaded.key.as_str())?;
        render_markdown(&mut document, container, &loaded.content)?;

        let popover = ensure_popover(&mut document)?;
        let decoration = TermAnnotator::new(&self.registry).decorate(&mut document, container)?;
        let toc = build_toc(&document, container);

        Ok(TopicView {
            key: loaded.key,
            title,
            origin: loaded.origin,
            error: loaded.error,
            document,
            container,
            popover,
            toc,
            decoration,
        })
    }

    pub async fn preload_all(&self) -> PreloadReport {
        let keys: Vec<String> = self.topics.iter().map(|t| t.key.clone()).collect();
        self.loader.preload(&keys).await
    }

    /// Feed measured heading offsets for the active topic.
    pub fn track_sections(&mut self, sections: Vec<SectionOffset>) {
        self.spy.reset(sections);
    }

    /// Feed a scroll position; returns the newly active section id on change.
    pub fn on_scroll(&mut self, scroll_y: f64) -> Option<String> {
        self.spy.update(scroll_y)
    }

    pub fn active_section(&self) -> Option<&str> {
        self.spy.active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_retry_links() {
        assert_eq!(retry_target("#retry:vector"), Some("vector"));
        assert_eq!(retry_target("#retry:"), None);
        assert_eq!(retry_target("#moving"), None);
        assert_eq!(retry_target("https://example.org"), None);
    }
}
