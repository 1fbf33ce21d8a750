//! # refdoc navigator
//!
//! The page controller: picks the active topic, asks the loader for it,
//! renders and decorates the result, and keeps the table of contents and
//! scroll position in sync.
//!
//! ```text
//! switch_to(key)
//!     ├─> ContentLoader::load ──> markdown
//!     ├─> render_markdown ──> <article class="topic">
//!     ├─> ensure_popover + TermAnnotator::decorate
//!     ├─> build_toc (h2/h3)
//!     └─> ScrollSpy::reset
//! ```

mod error;
mod navigator;
mod scroll;
mod toc;

pub use error::{NavigatorError, Result};
pub use navigator::{retry_target, Navigator, Tab, TopicSummary, TopicView};
pub use scroll::{ScrollSpy, SectionOffset};
pub use toc::{build_toc, format_toc, TocEntry, TOC_MAX_LEVEL, TOC_MIN_LEVEL};
