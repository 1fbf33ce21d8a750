use crate::error::{DocumentError, Result};
use serde::Serialize;

/// Handle to a node inside one [`Document`]. Ids stay valid after detaching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element(ElementData),
    Text(String),
    /// Pre-rendered markup emitted verbatim; never scanned as text.
    Raw(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena-backed element/text tree with a `body` root.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId(0),
        };
        doc.root = doc.push(NodeKind::Element(ElementData {
            tag: "body".to_string(),
            attrs: Vec::new(),
        }));
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeKind::Element(ElementData {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
        }))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::Text(text.into()))
    }

    pub fn create_raw(&mut self, markup: impl Into<String>) -> NodeId {
        self.push(NodeKind::Raw(markup.into()))
    }

    fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(id.0).ok_or(DocumentError::UnknownNode(id.0))
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut ElementData> {
        let node = self
            .nodes
            .get_mut(id.0)
            .ok_or(DocumentError::UnknownNode(id.0))?;
        match &mut node.kind {
            NodeKind::Element(data) => Ok(data),
            _ => Err(DocumentError::NotAnElement(id.0)),
        }
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id.0).map(|n| &n.kind)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::Element(_)))
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Element(data) => Some(data.tag.as_str()),
            _ => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Element(data) => data
                .attrs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        let data = self.element_mut(id)?;
        if let Some(slot) = data.attrs.iter_mut().find(|(k, _)| k == name) {
            slot.1 = value;
        } else {
            data.attrs.push((name.to_string(), value));
        }
        Ok(())
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> Result<()> {
        let data = self.element_mut(id)?;
        data.attrs.retain(|(k, _)| k != name);
        Ok(())
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.attr(id, "class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    /// Replace the contents of a text node.
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> Result<()> {
        let node = self
            .nodes
            .get_mut(id.0)
            .ok_or(DocumentError::UnknownNode(id.0))?;
        match &mut node.kind {
            NodeKind::Text(current) => {
                *current = text.into();
                Ok(())
            }
            _ => Err(DocumentError::NotText(id.0)),
        }
    }

    pub fn raw(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Raw(markup) => Some(markup.as_str()),
            _ => None,
        }
    }

    /// Replace the markup of a raw node.
    pub fn set_raw(&mut self, id: NodeId, markup: impl Into<String>) -> Result<()> {
        let node = self
            .nodes
            .get_mut(id.0)
            .ok_or(DocumentError::UnknownNode(id.0))?;
        match &mut node.kind {
            NodeKind::Raw(current) => {
                *current = markup.into();
                Ok(())
            }
            _ => Err(DocumentError::NotRaw(id.0)),
        }
    }

    /// `true` if `node` is `ancestor` or lies somewhere beneath it.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.parent(id),
        }
    }

    /// Pre-order traversal of `id` and everything beneath it.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            for child in self.children(current).iter().rev() {
                stack.push(*child);
            }
        }
        out
    }

    pub fn element_by_id(&self, html_id: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|id| self.attr(*id, "id") == Some(html_id))
    }

    /// Concatenated text beneath `id`, in document order.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in self.descendants(id) {
            if let Some(text) = self.text(node) {
                out.push_str(text);
            }
        }
        out
    }

    fn check_insert(&self, parent: NodeId, child: NodeId) -> Result<()> {
        self.node(child)?;
        if !matches!(self.node(parent)?.kind, NodeKind::Element(_)) {
            return Err(DocumentError::NotAnElement(parent.0));
        }
        if self.contains(child, parent) {
            return Err(DocumentError::Hierarchy {
                node: child.0,
                parent: parent.0,
            });
        }
        Ok(())
    }

    /// Remove `id` from its parent; the node and its subtree stay in the arena.
    pub fn detach(&mut self, id: NodeId) -> Result<()> {
        self.node(id)?;
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != id);
        }
        Ok(())
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.check_insert(parent, child)?;
        self.detach(child)?;
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        Ok(())
    }

    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: NodeId) -> Result<()> {
        self.check_insert(parent, child)?;
        if self.parent(reference) != Some(parent) {
            return Err(DocumentError::NotAChild {
                parent: parent.0,
                child: reference.0,
            });
        }
        self.detach(child)?;
        let pos = self.nodes[parent.0]
            .children
            .iter()
            .position(|c| *c == reference)
            .ok_or(DocumentError::NotAChild {
                parent: parent.0,
                child: reference.0,
            })?;
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(pos, child);
        Ok(())
    }

    /// Put `replacements` where `target` was, in order, and detach `target`.
    pub fn replace_with(&mut self, target: NodeId, replacements: &[NodeId]) -> Result<()> {
        let parent = self
            .parent(target)
            .ok_or(DocumentError::Detached(target.0))?;
        for node in replacements {
            self.insert_before(parent, *node, target)?;
        }
        self.detach(target)
    }

    /// Append text under `parent`, merging into a trailing text child.
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> Result<NodeId> {
        if let Some(last) = self.children(parent).last().copied() {
            if let NodeKind::Text(existing) = &mut self.nodes[last.0].kind {
                existing.push_str(text);
                return Ok(last);
            }
        }
        let node = self.create_text(text);
        self.append_child(parent, node)?;
        Ok(node)
    }

    /// Convenience for building fixtures: create and append an element.
    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> Result<NodeId> {
        let node = self.create_element(tag);
        self.append_child(parent, node)?;
        Ok(node)
    }
}

pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.parent(current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_and_walks_tree() {
        let mut doc = Document::new();
        let p = doc.append_element(doc.root(), "P").unwrap();
        doc.append_text(p, "hello ").unwrap();
        doc.append_text(p, "world").unwrap();
        let em = doc.append_element(p, "em").unwrap();
        doc.append_text(em, "!").unwrap();

        assert_eq!(doc.tag(p), Some("p"));
        assert_eq!(doc.children(p).len(), 2, "adjacent text is merged");
        assert_eq!(doc.text_content(doc.root()), "hello world!");
        assert!(doc.contains(doc.root(), em));
        assert!(!doc.contains(em, p));
        assert_eq!(doc.ancestors(em).collect::<Vec<_>>(), vec![p, doc.root()]);
    }

    #[test]
    fn rejects_cycles_and_text_parents() {
        let mut doc = Document::new();
        let div = doc.append_element(doc.root(), "div").unwrap();
        let inner = doc.append_element(div, "span").unwrap();
        let text = doc.append_text(inner, "x").unwrap();

        assert_eq!(
            doc.append_child(inner, div),
            Err(DocumentError::Hierarchy {
                node: div.index(),
                parent: inner.index()
            })
        );
        let other = doc.create_element("b");
        assert_eq!(
            doc.append_child(text, other),
            Err(DocumentError::NotAnElement(text.index()))
        );
    }

    #[test]
    fn replace_with_keeps_sibling_order() {
        let mut doc = Document::new();
        let p = doc.append_element(doc.root(), "p").unwrap();
        let a = doc.append_text(p, "a").unwrap();
        let tail = doc.append_element(p, "br").unwrap();

        let x = doc.create_text("x");
        let y = doc.create_element("span");
        doc.replace_with(a, &[x, y]).unwrap();

        assert_eq!(doc.children(p), &[x, y, tail]);
        assert_eq!(doc.parent(a), None);
    }

    #[test]
    fn attributes_and_classes() {
        let mut doc = Document::new();
        let span = doc.append_element(doc.root(), "span").unwrap();
        doc.set_attr(span, "class", "term-marker code").unwrap();
        doc.set_attr(span, "id", "t1").unwrap();
        doc.set_attr(span, "id", "t2").unwrap();

        assert!(doc.has_class(span, "code"));
        assert!(!doc.has_class(span, "term"));
        assert_eq!(doc.element_by_id("t2"), Some(span));
        doc.remove_attr(span, "id").unwrap();
        assert_eq!(doc.attr(span, "id"), None);
    }

    #[test]
    fn raw_markup_is_replaced_in_place() {
        let mut doc = Document::new();
        let raw = doc.create_raw("<p>one</p>");
        doc.append_child(doc.root(), raw).unwrap();
        let text = doc.append_text(doc.root(), "plain").unwrap();

        doc.set_raw(raw, "<p>two</p>").unwrap();
        assert_eq!(doc.raw(raw), Some("<p>two</p>"));
        assert!(matches!(
            doc.set_raw(text, "<b>x</b>"),
            Err(DocumentError::NotRaw(_))
        ));
    }
}
