use refdoc_document::{collect_headings, Document, NodeId};
use serde::Serialize;

pub const TOC_MIN_LEVEL: u8 = 2;
pub const TOC_MAX_LEVEL: u8 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    pub id: String,
    pub text: String,
    pub level: u8,
}

/// `h2`/`h3` headings under `root`, in document order. Ids must already be
/// assigned (rendering does this).
pub fn build_toc(doc: &Document, root: NodeId) -> Vec<TocEntry> {
    collect_headings(doc, root, TOC_MIN_LEVEL, TOC_MAX_LEVEL)
        .into_iter()
        .map(|heading| TocEntry {
            id: heading.id,
            text: heading.text,
            level: heading.level,
        })
        .collect()
}

/// Indented plain-text rendering, one entry per line.
pub fn format_toc(entries: &[TocEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        let indent = usize::from(entry.level.saturating_sub(TOC_MIN_LEVEL)) * 2;
        out.push_str(&" ".repeat(indent));
        out.push_str(&entry.text);
        out.push_str("  #");
        out.push_str(&entry.id);
        out.push('\n');
    }
    out
}
