//! # refdoc terms
//!
//! Finds glossary terms in rendered topic text and turns them into
//! interactive markers.
//!
//! ```text
//! TermDefinition[] ──> TermRegistry (compiled triggers)
//!                          │
//! text ──> find_matches ───┤  sort by start, longer first, greedy sweep
//!                          │
//! Document ──> TermAnnotator::decorate ──> <span class="term-marker" ...>
//!                          │
//!              PopoverController (Hidden / Visible / PendingHide)
//!                          └─> place_popover (above, else below; clamped)
//! ```
//!
//! ```rust
//! use refdoc_protocol::TermDefinition;
//! use refdoc_terms::TermRegistry;
//!
//! let registry = TermRegistry::new(vec![
//!     TermDefinition::new("move", &[r"\bmove\b"], "move", ""),
//!     TermDefinition::new("std-move", &[r"\bstd::move\b"], "std::move", ""),
//! ])
//! .unwrap();
//! let matches = registry.find_matches("return std::move(value);");
//! assert_eq!(matches.len(), 1);
//! assert_eq!(matches[0].definition_id, "std-move");
//! ```

mod annotator;
mod error;
mod matcher;
mod placement;
mod popover;
mod registry;

pub use annotator::{
    ensure_popover, is_marker, marker_term, markers, DecorationReport, MarkerContext,
    TermAnnotator, CODE_MARKER_CLASS, CONTEXT_ATTR, MARKER_CLASS, POPOVER_ID, TERM_ATTR,
};
pub use error::{Result, TermsError};
pub use matcher::{find_matches, Match};
pub use placement::{place_popover, Placement, Rect, Side, Size, Viewport};
pub use popover::{PopoverContent, PopoverController, PopoverLayout, PopoverState, PopoverView};
pub use registry::{CompiledTerm, TermRegistry};
