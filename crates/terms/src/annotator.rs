use crate::error::Result;
use crate::registry::TermRegistry;
use refdoc_document::{Document, NodeId, NodeKind};
use serde::Serialize;
use std::collections::BTreeMap;

pub const MARKER_CLASS: &str = "term-marker";
pub const CODE_MARKER_CLASS: &str = "term-marker--code";
pub const POPOVER_ID: &str = "term-popover";
pub const TERM_ATTR: &str = "data-term";
pub const CONTEXT_ATTR: &str = "data-context";

const OPAQUE_TAGS: &[&str] = &["script", "style"];
const CODE_TAGS: &[&str] = &["pre", "code"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerContext {
    Code,
    Prose,
}

impl MarkerContext {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Prose => "prose",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DecorationReport {
    pub scanned_nodes: usize,
    pub markers: usize,
    pub per_term: BTreeMap<String, usize>,
}

pub fn is_marker(doc: &Document, node: NodeId) -> bool {
    doc.is_element(node) && doc.has_class(node, MARKER_CLASS)
}

/// Term id carried by a marker element.
pub fn marker_term(doc: &Document, node: NodeId) -> Option<&str> {
    if is_marker(doc, node) {
        doc.attr(node, TERM_ATTR)
    } else {
        None
    }
}

/// Markers under `root`, in document order.
pub fn markers(doc: &Document, root: NodeId) -> Vec<NodeId> {
    doc.descendants(root)
        .into_iter()
        .filter(|node| is_marker(doc, *node))
        .collect()
}

/// Return the floating popover element, creating it under the root if absent.
pub fn ensure_popover(doc: &mut Document) -> Result<NodeId> {
    if let Some(existing) = doc.element_by_id(POPOVER_ID) {
        return Ok(existing);
    }
    let root = doc.root();
    let popover = doc.append_element(root, "div")?;
    doc.set_attr(popover, "id", POPOVER_ID)?;
    doc.set_attr(popover, "class", "term-popover")?;
    doc.set_attr(popover, "role", "tooltip")?;
    doc.set_attr(popover, "aria-hidden", "true")?;
    Ok(popover)
}

/// Rewrites term occurrences in text nodes into focusable marker elements.
#[derive(Debug, Clone, Copy)]
pub struct TermAnnotator<'r> {
    registry: &'r TermRegistry,
}

impl<'r> TermAnnotator<'r> {
    pub fn new(registry: &'r TermRegistry) -> Self {
        Self { registry }
    }

    pub fn decorate(&self, doc: &mut Document, root: NodeId) -> Result<DecorationReport> {
        let mut report = DecorationReport::default();
        if self.registry.is_empty() {
            return Ok(report);
        }

        let candidates: Vec<NodeId> = doc
            .descendants(root)
            .into_iter()
            .filter(|node| matches!(doc.kind(*node), Some(NodeKind::Text(_))))
            .filter(|node| qualifies(doc, *node))
            .collect();

        for node in candidates {
            report.scanned_nodes += 1;
            let Some(text) = doc.text(node).map(str::to_string) else {
                continue;
            };
            let matches = self.registry.find_matches(&text);
            if matches.is_empty() {
                continue;
            }
            let context = context_of(doc, node);

            let mut replacements = Vec::with_capacity(matches.len() * 2 + 1);
            let mut cursor = 0usize;
            for found in &matches {
                if found.start > cursor {
                    replacements.push(doc.create_text(&text[cursor..found.start]));
                }
                let marker = create_marker(doc, &found.definition_id, &found.matched_text, context)?;
                replacements.push(marker);
                *report
                    .per_term
                    .entry(found.definition_id.clone())
                    .or_default() += 1;
                report.markers += 1;
                cursor = found.end;
            }
            if cursor < text.len() {
                replacements.push(doc.create_text(&text[cursor..]));
            }

            doc.replace_with(node, &replacements)?;
        }

        log::debug!(
            "decorated {} markers across {} text nodes",
            report.markers,
            report.scanned_nodes
        );
        Ok(report)
    }
}

/// Text inside a marker, the popover, or script/style content is left alone.
/// Detached text nodes cannot be split and are skipped as well.
fn qualifies(doc: &Document, node: NodeId) -> bool {
    if doc.parent(node).is_none() {
        return false;
    }
    !doc.ancestors(node).any(|ancestor| {
        is_marker(doc, ancestor)
            || doc.attr(ancestor, "id") == Some(POPOVER_ID)
            || doc
                .tag(ancestor)
                .is_some_and(|tag| OPAQUE_TAGS.contains(&tag))
    })
}

fn context_of(doc: &Document, node: NodeId) -> MarkerContext {
    let in_code = doc
        .ancestors(node)
        .any(|ancestor| doc.tag(ancestor).is_some_and(|tag| CODE_TAGS.contains(&tag)));
    if in_code {
        MarkerContext::Code
    } else {
        MarkerContext::Prose
    }
}

fn create_marker(
    doc: &mut Document,
    term_id: &str,
    text: &str,
    context: MarkerContext,
) -> Result<NodeId> {
    let marker = doc.create_element("span");
    let class = match context {
        MarkerContext::Code => format!("{MARKER_CLASS} {CODE_MARKER_CLASS}"),
        MarkerContext::Prose => MARKER_CLASS.to_string(),
    };
    doc.set_attr(marker, "class", class)?;
    doc.set_attr(marker, TERM_ATTR, term_id)?;
    doc.set_attr(marker, CONTEXT_ATTR, context.as_str())?;
    doc.set_attr(marker, "tabindex", "0")?;
    doc.set_attr(marker, "role", "button")?;
    doc.set_attr(marker, "aria-describedby", POPOVER_ID)?;
    doc.append_text(marker, text)?;
    Ok(marker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use refdoc_document::markdown_document;
    use refdoc_protocol::TermDefinition;

    fn registry() -> TermRegistry {
        TermRegistry::new(vec![
            TermDefinition::new("std-move", &[r"\bstd::move\b"], "std::move", "<p>cast</p>"),
            TermDefinition::new("move", &[r"\bmove\b"], "move", "<p>move</p>"),
            TermDefinition::new("vector", &[r"\bvector\b"], "vector", "<p>seq</p>"),
        ])
        .unwrap()
    }

    fn marker_html(id: &str, text: &str, context: MarkerContext) -> String {
        let class = match context {
            MarkerContext::Code => "term-marker term-marker--code",
            MarkerContext::Prose => "term-marker",
        };
        format!(
            "<span class=\"{class}\" data-term=\"{id}\" data-context=\"{}\" tabindex=\"0\" \
             role=\"button\" aria-describedby=\"term-popover\">{text}</span>",
            context.as_str()
        )
    }

    #[test]
    fn wraps_matches_and_preserves_surrounding_text() {
        let reg = registry();
        let mut doc = markdown_document("Use std::move on a vector & friends.\n").unwrap();
        let root = doc.root();
        let report = TermAnnotator::new(&reg).decorate(&mut doc, root).unwrap();

        assert_eq!(report.markers, 2);
        assert_eq!(report.per_term.get("std-move"), Some(&1));
        assert_eq!(
            doc.to_html(),
            format!(
                "<p>Use {} on a {} &amp; friends.</p>",
                marker_html("std-move", "std::move", MarkerContext::Prose),
                marker_html("vector", "vector", MarkerContext::Prose)
            )
        );
        assert_eq!(doc.text_content(root), "Use std::move on a vector & friends.");
    }

    #[test]
    fn marks_code_context() {
        let reg = registry();
        let mut doc = markdown_document("```cpp\nauto v = std::move(x);\n```\n").unwrap();
        let root = doc.root();
        TermAnnotator::new(&reg).decorate(&mut doc, root).unwrap();

        let found = markers(&doc, root);
        assert_eq!(found.len(), 1);
        assert_eq!(doc.attr(found[0], CONTEXT_ATTR), Some("code"));
        assert!(doc.has_class(found[0], CODE_MARKER_CLASS));
        assert_eq!(marker_term(&doc, found[0]), Some("std-move"));
    }

    #[test]
    fn decorate_is_idempotent() {
        let reg = registry();
        let mut doc = markdown_document("move a vector, then move it again\n").unwrap();
        let root = doc.root();
        let annotator = TermAnnotator::new(&reg);
        annotator.decorate(&mut doc, root).unwrap();
        let first = doc.to_html();

        let second = annotator.decorate(&mut doc, root).unwrap();
        assert_eq!(second.markers, 0);
        assert_eq!(doc.to_html(), first);
        for marker in markers(&doc, root) {
            assert!(!doc.ancestors(marker).any(|a| is_marker(&doc, a)));
        }
    }

    #[test]
    fn skips_script_style_and_popover() {
        let reg = registry();
        let mut doc = Document::new();
        let root = doc.root();
        let script = doc.append_element(root, "script").unwrap();
        doc.append_text(script, "let vector = 1;").unwrap();
        let style = doc.append_element(root, "style").unwrap();
        doc.append_text(style, ".vector {}").unwrap();
        let popover = ensure_popover(&mut doc).unwrap();
        let body = doc.append_element(popover, "p").unwrap();
        doc.append_text(body, "a vector").unwrap();

        let report = TermAnnotator::new(&reg).decorate(&mut doc, root).unwrap();
        assert_eq!(report.markers, 0);
        assert_eq!(report.scanned_nodes, 0);
    }

    #[test]
    fn ensure_popover_is_singleton() {
        let mut doc = Document::new();
        let first = ensure_popover(&mut doc).unwrap();
        let second = ensure_popover(&mut doc).unwrap();
        assert_eq!(first, second);
        assert_eq!(doc.attr(first, "aria-hidden"), Some("true"));
        assert_eq!(doc.attr(first, "role"), Some("tooltip"));
    }

    #[test]
    fn decorates_only_the_given_subtree() {
        let reg = registry();
        let mut doc = Document::new();
        let root = doc.root();
        let old = doc.append_element(root, "p").unwrap();
        doc.append_text(old, "vector").unwrap();
        let fresh = doc.append_element(root, "section").unwrap();
        doc.append_text(fresh, "vector").unwrap();

        TermAnnotator::new(&reg).decorate(&mut doc, fresh).unwrap();
        assert_eq!(markers(&doc, old).len(), 0);
        assert_eq!(markers(&doc, fresh).len(), 1);
    }
}
