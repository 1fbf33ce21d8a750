use crate::error::Result;
use crate::tree::{Document, NodeId};
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heading {
    pub node: NodeId,
    pub id: String,
    pub text: String,
    pub level: u8,
}

#[must_use]
pub fn heading_level(tag: &str) -> Option<u8> {
    match tag {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

/// Lowercase alphanumerics; every other run of characters becomes one `-`.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_dash = false;
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.extend(ch.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if out.is_empty() {
        "section".to_string()
    } else {
        out
    }
}

/// Give every heading under `root` a unique id; existing ids are kept and
/// reserved, duplicates get `-1`, `-2`, ... suffixes.
pub fn assign_heading_ids(doc: &mut Document, root: NodeId) -> Result<()> {
    let nodes = doc.descendants(root);
    let mut taken: HashSet<String> = nodes
        .iter()
        .filter_map(|id| doc.attr(*id, "id"))
        .map(str::to_string)
        .collect();

    for node in nodes {
        let Some(tag) = doc.tag(node) else {
            continue;
        };
        if heading_level(tag).is_none() || doc.attr(node, "id").is_some() {
            continue;
        }
        let base = slugify(&doc.text_content(node));
        let mut candidate = base.clone();
        let mut suffix = 1usize;
        while taken.contains(&candidate) {
            candidate = format!("{base}-{suffix}");
            suffix += 1;
        }
        taken.insert(candidate.clone());
        doc.set_attr(node, "id", candidate)?;
    }
    Ok(())
}

/// Headings under `root` within `min_level..=max_level`, in document order.
pub fn collect_headings(doc: &Document, root: NodeId, min_level: u8, max_level: u8) -> Vec<Heading> {
    doc.descendants(root)
        .into_iter()
        .filter_map(|node| {
            let level = heading_level(doc.tag(node)?)?;
            if level < min_level || level > max_level {
                return None;
            }
            Some(Heading {
                node,
                id: doc.attr(node, "id").unwrap_or_default().to_string(),
                text: doc.text_content(node).trim().to_string(),
                level,
            })
        })
        .collect()
}
