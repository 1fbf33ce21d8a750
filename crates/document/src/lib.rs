//! # refdoc document
//!
//! A small arena tree with an element/text distinction: the page model that
//! topic content is rendered into and that the term annotator rewrites.
//!
//! ```text
//! markdown ──> render_markdown ──> Document (body)
//!                                     ├─> assign_heading_ids / collect_headings
//!                                     └─> to_html
//! ```
//!
//! ```rust
//! use refdoc_document::{collect_headings, markdown_document};
//!
//! let doc = markdown_document("## Moving\n\nUse `std::move`.\n").unwrap();
//! let toc = collect_headings(&doc, doc.root(), 2, 3);
//! assert_eq!(toc[0].id, "moving");
//! assert!(doc.to_html().contains("<code>std::move</code>"));
//! ```

mod error;
mod html;
mod markdown;
mod outline;
mod tree;

pub use error::{DocumentError, Result};
pub use html::{escape_attr, escape_text};
pub use markdown::{markdown_document, render_markdown};
pub use outline::{assign_heading_ids, collect_headings, heading_level, slugify, Heading};
pub use tree::{Ancestors, Document, ElementData, NodeId, NodeKind};
