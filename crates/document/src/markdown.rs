use crate::error::Result;
use crate::outline::assign_heading_ids;
use crate::tree::{Document, NodeId};
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag};

fn markdown_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
    options
}

fn heading_tag(level: HeadingLevel) -> &'static str {
    match level {
        HeadingLevel::H1 => "h1",
        HeadingLevel::H2 => "h2",
        HeadingLevel::H3 => "h3",
        HeadingLevel::H4 => "h4",
        HeadingLevel::H5 => "h5",
        HeadingLevel::H6 => "h6",
    }
}

struct Builder<'d> {
    doc: &'d mut Document,
    stack: Vec<NodeId>,
    /// How many stack entries each open tag pushed.
    depths: Vec<usize>,
    in_table_head: bool,
    image: Option<(NodeId, String)>,
}

impl<'d> Builder<'d> {
    fn current(&self) -> NodeId {
        // The stack always holds the render parent at the bottom.
        self.stack[self.stack.len() - 1]
    }

    fn open(&mut self, tags: &[&str]) -> Result<NodeId> {
        let mut last = self.current();
        for tag in tags {
            let node = self.doc.create_element(tag);
            self.doc.append_child(last, node)?;
            self.stack.push(node);
            last = node;
        }
        self.depths.push(tags.len());
        Ok(last)
    }

    fn close(&mut self) {
        let depth = self.depths.pop().unwrap_or(0);
        for _ in 0..depth {
            if self.stack.len() > 1 {
                self.stack.pop();
            }
        }
    }

    fn leaf(&mut self, tag: &str) -> Result<NodeId> {
        let parent = self.current();
        self.doc.append_element(parent, tag)
    }

    fn text(&mut self, text: &str) -> Result<()> {
        if let Some((_, alt)) = self.image.as_mut() {
            alt.push_str(text);
            return Ok(());
        }
        let parent = self.current();
        self.doc.append_text(parent, text)?;
        Ok(())
    }

    fn start(&mut self, tag: Tag<'_>) -> Result<()> {
        match tag {
            Tag::Paragraph => {
                self.open(&["p"])?;
            }
            Tag::Heading(level, id, classes) => {
                let node = self.open(&[heading_tag(level)])?;
                if let Some(id) = id {
                    self.doc.set_attr(node, "id", id)?;
                }
                if !classes.is_empty() {
                    self.doc.set_attr(node, "class", classes.join(" "))?;
                }
            }
            Tag::BlockQuote => {
                self.open(&["blockquote"])?;
            }
            Tag::CodeBlock(kind) => {
                let code = self.open(&["pre", "code"])?;
                if let CodeBlockKind::Fenced(lang) = kind {
                    let lang = lang.split_whitespace().next().unwrap_or_default();
                    if !lang.is_empty() {
                        self.doc.set_attr(code, "class", format!("language-{lang}"))?;
                    }
                }
            }
            Tag::List(Some(start)) => {
                let list = self.open(&["ol"])?;
                if start != 1 {
                    self.doc.set_attr(list, "start", start.to_string())?;
                }
            }
            Tag::List(None) => {
                self.open(&["ul"])?;
            }
            Tag::Item => {
                self.open(&["li"])?;
            }
            Tag::FootnoteDefinition(label) => {
                let node = self.open(&["div"])?;
                self.doc.set_attr(node, "class", "footnote-definition")?;
                self.doc.set_attr(node, "id", format!("fn-{label}"))?;
            }
            Tag::Table(_) => {
                self.open(&["table"])?;
            }
            Tag::TableHead => {
                self.in_table_head = true;
                self.open(&["thead", "tr"])?;
            }
            Tag::TableRow => {
                self.open(&["tr"])?;
            }
            Tag::TableCell => {
                let tag = if self.in_table_head { "th" } else { "td" };
                self.open(&[tag])?;
            }
            Tag::Emphasis => {
                self.open(&["em"])?;
            }
            Tag::Strong => {
                self.open(&["strong"])?;
            }
            Tag::Strikethrough => {
                self.open(&["del"])?;
            }
            Tag::Link(_, url, title) => {
                let link = self.open(&["a"])?;
                self.doc.set_attr(link, "href", url.to_string())?;
                if !title.is_empty() {
                    self.doc.set_attr(link, "title", title.to_string())?;
                }
            }
            Tag::Image(_, url, title) => {
                let img = self.leaf("img")?;
                self.doc.set_attr(img, "src", url.to_string())?;
                if !title.is_empty() {
                    self.doc.set_attr(img, "title", title.to_string())?;
                }
                self.image = Some((img, String::new()));
                self.depths.push(0);
            }
        }
        Ok(())
    }

    fn end(&mut self, tag: Tag<'_>) -> Result<()> {
        match tag {
            Tag::TableHead => self.in_table_head = false,
            Tag::Image(..) => {
                if let Some((img, alt)) = self.image.take() {
                    self.doc.set_attr(img, "alt", alt)?;
                }
            }
            _ => {}
        }
        self.close();
        Ok(())
    }
}

/// Render markdown `source` under `parent` and give every heading an id.
pub fn render_markdown(doc: &mut Document, parent: NodeId, source: &str) -> Result<()> {
    let mut builder = Builder {
        doc: &mut *doc,
        stack: vec![parent],
        depths: Vec::new(),
        in_table_head: false,
        image: None,
    };

    for event in Parser::new_ext(source, markdown_options()) {
        match event {
            Event::Start(tag) => builder.start(tag)?,
            Event::End(tag) => builder.end(tag)?,
            Event::Text(text) => builder.text(&text)?,
            Event::Code(code) => {
                let node = builder.leaf("code")?;
                builder.doc.append_text(node, &code)?;
            }
            Event::Html(html) => {
                let parent = builder.current();
                let raw = builder.doc.create_raw(html.to_string());
                builder.doc.append_child(parent, raw)?;
            }
            Event::FootnoteReference(label) => {
                let sup = builder.leaf("sup")?;
                let link = builder.doc.append_element(sup, "a")?;
                builder.doc.set_attr(link, "href", format!("#fn-{label}"))?;
                builder.doc.append_text(link, &label)?;
            }
            Event::SoftBreak => builder.text("\n")?,
            Event::HardBreak => {
                builder.leaf("br")?;
            }
            Event::Rule => {
                builder.leaf("hr")?;
            }
            Event::TaskListMarker(checked) => {
                let input = builder.leaf("input")?;
                builder.doc.set_attr(input, "type", "checkbox")?;
                builder.doc.set_attr(input, "disabled", "")?;
                if checked {
                    builder.doc.set_attr(input, "checked", "")?;
                }
            }
        }
    }

    assign_heading_ids(doc, parent)?;
    Ok(())
}

/// Parse markdown into a fresh document.
pub fn markdown_document(source: &str) -> Result<Document> {
    let mut doc = Document::new();
    let root = doc.root();
    render_markdown(&mut doc, root, source)?;
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn renders_blocks_and_inlines() {
        let doc = markdown_document("# Title\n\nSome *em* and `code`.\n").unwrap();
        assert_eq!(
            doc.to_html(),
            "<h1 id=\"title\">Title</h1><p>Some <em>em</em> and <code>code</code>.</p>"
        );
    }

    #[test]
    fn renders_fenced_code_with_language() {
        let doc = markdown_document("```cpp\nauto v = std::move(x);\n```\n").unwrap();
        assert_eq!(
            doc.to_html(),
            "<pre><code class=\"language-cpp\">auto v = std::move(x);\n</code></pre>"
        );
    }

    #[test]
    fn renders_lists_links_and_images() {
        let src = "3. [docs](https://example.org \"Docs\")\n4. ![alt text](img.png)\n";
        let doc = markdown_document(src).unwrap();
        assert_eq!(
            doc.to_html(),
            "<ol start=\"3\"><li><a href=\"https://example.org\" title=\"Docs\">docs</a></li>\
             <li><img src=\"img.png\" alt=\"alt text\"></li></ol>"
        );
    }

    #[test]
    fn renders_tables_with_header_cells() {
        let src = "| a | b |\n|---|---|\n| 1 | 2 |\n";
        let doc = markdown_document(src).unwrap();
        assert_eq!(
            doc.to_html(),
            "<table><thead><tr><th>a</th><th>b</th></tr></thead>\
             <tr><td>1</td><td>2</td></tr></table>"
        );
    }

    #[test]
    fn keeps_explicit_heading_ids() {
        let doc = markdown_document("## Moves {#custom}\n").unwrap();
        assert_eq!(doc.to_html(), "<h2 id=\"custom\">Moves</h2>");
    }

    #[test]
    fn text_runs_are_merged_into_one_node() {
        let doc = markdown_document("a std::move b\n").unwrap();
        let p = doc.children(doc.root())[0];
        assert_eq!(doc.children(p).len(), 1);
        assert_eq!(doc.text(doc.children(p)[0]), Some("a std::move b"));
    }
}
