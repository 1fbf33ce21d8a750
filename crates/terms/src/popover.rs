//! Popover display state machine.
//!
//! ```text
//! Hidden ──enter/focus(t)──> Visible(t) ──leave/blur(t)──> PendingHide(t)
//!   ^                          │   ^                          │    │
//!   │                          │   └────enter/focus(t)────────┘    │
//!   │                          └──enter/focus(t')──> Visible(t')   │
//!   └──────────────────────── delay elapsed (poll) ────────────────┘
//! ```
//!
//! Time is passed in explicitly; the host calls [`PopoverController::poll`]
//! from its timer to let a pending hide complete.

use crate::annotator::marker_term;
use crate::error::Result;
use crate::placement::{place_popover, Placement, Rect, Size, Viewport};
use crate::registry::TermRegistry;
use refdoc_document::{Document, NodeId};
use refdoc_protocol::PopoverConfig;
use serde::Serialize;
use std::time::Instant;

/// Geometry the host reports for markers and the popover.
pub trait PopoverLayout {
    fn marker_rect(&self, marker: NodeId) -> Option<Rect>;
    fn popover_size(&self) -> Size;
    fn viewport(&self) -> Viewport;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopoverState {
    Hidden,
    Visible { marker: NodeId },
    PendingHide { marker: NodeId, deadline: Instant },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopoverContent {
    pub term_id: String,
    pub title: String,
    pub body_html: String,
}

/// What the popover element should currently look like.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopoverView {
    pub visible: bool,
    pub content: Option<PopoverContent>,
    pub placement: Option<Placement>,
}

#[derive(Debug, Clone)]
pub struct PopoverController {
    config: PopoverConfig,
    state: PopoverState,
    content: Option<PopoverContent>,
    placement: Option<Placement>,
}

impl PopoverController {
    pub fn new(config: PopoverConfig) -> Self {
        Self {
            config,
            state: PopoverState::Hidden,
            content: None,
            placement: None,
        }
    }

    pub fn state(&self) -> PopoverState {
        self.state
    }

    pub fn active_marker(&self) -> Option<NodeId> {
        match self.state {
            PopoverState::Hidden => None,
            PopoverState::Visible { marker } | PopoverState::PendingHide { marker, .. } => {
                Some(marker)
            }
        }
    }

    pub fn view(&self) -> PopoverView {
        let visible = !matches!(self.state, PopoverState::Hidden);
        PopoverView {
            visible,
            content: if visible { self.content.clone() } else { None },
            placement: if visible { self.placement } else { None },
        }
    }

    pub fn pointer_enter(
        &mut self,
        doc: &Document,
        registry: &TermRegistry,
        layout: &dyn PopoverLayout,
        marker: NodeId,
    ) -> PopoverView {
        self.show(doc, registry, layout, marker)
    }

    pub fn focus(
        &mut self,
        doc: &Document,
        registry: &TermRegistry,
        layout: &dyn PopoverLayout,
        marker: NodeId,
    ) -> PopoverView {
        self.show(doc, registry, layout, marker)
    }

    fn show(
        &mut self,
        doc: &Document,
        registry: &TermRegistry,
        layout: &dyn PopoverLayout,
        marker: NodeId,
    ) -> PopoverView {
        let Some(term_id) = marker_term(doc, marker) else {
            log::debug!("ignoring hover on non-marker node {}", marker.index());
            return self.view();
        };
        let Some(definition) = registry.get(term_id) else {
            log::warn!("marker references unknown term '{term_id}'");
            return self.view();
        };

        self.content = Some(PopoverContent {
            term_id: definition.id.clone(),
            title: definition.title.clone(),
            body_html: definition.body_html.clone(),
        });
        self.state = PopoverState::Visible { marker };
        self.placement = compute_placement(layout, marker, &self.config);
        self.view()
    }

    /// `related` is the node the pointer moved to, if any.
    pub fn pointer_leave(
        &mut self,
        doc: &Document,
        marker: NodeId,
        related: Option<NodeId>,
        now: Instant,
    ) -> PopoverView {
        if related.is_some_and(|target| doc.contains(marker, target)) {
            return self.view();
        }
        self.begin_hide(marker, now)
    }

    pub fn blur(&mut self, marker: NodeId, now: Instant) -> PopoverView {
        self.begin_hide(marker, now)
    }

    fn begin_hide(&mut self, marker: NodeId, now: Instant) -> PopoverView {
        if let PopoverState::Visible { marker: active } = self.state {
            if active == marker {
                // An unrepresentable deadline hides at the next poll.
                let deadline = now.checked_add(self.config.hide_delay()).unwrap_or(now);
                self.state = PopoverState::PendingHide { marker, deadline };
            }
        }
        self.view()
    }

    /// Complete a pending hide whose delay has elapsed.
    pub fn poll(&mut self, now: Instant) -> PopoverView {
        if let PopoverState::PendingHide { deadline, .. } = self.state {
            if now >= deadline {
                self.hide();
            }
        }
        self.view()
    }

    /// Escape dismisses immediately.
    pub fn dismiss(&mut self) -> PopoverView {
        self.hide();
        self.view()
    }

    /// Scroll or resize: recompute the position, keep the state.
    pub fn reposition(&mut self, layout: &dyn PopoverLayout) -> PopoverView {
        if let Some(marker) = self.active_marker() {
            self.placement = compute_placement(layout, marker, &self.config);
        }
        self.view()
    }

    fn hide(&mut self) {
        self.state = PopoverState::Hidden;
        self.content = None;
        self.placement = None;
    }

    /// Mirror the current view onto the popover element. The title and body
    /// children are created on first use and updated in place afterwards.
    pub fn apply(&self, doc: &mut Document, popover: NodeId) -> Result<()> {
        let view = self.view();
        doc.set_attr(popover, "aria-hidden", if view.visible { "false" } else { "true" })?;

        let (title, body_html) = match &view.content {
            Some(content) => {
                doc.set_attr(popover, "data-term", content.term_id.clone())?;
                (content.title.as_str(), content.body_html.as_str())
            }
            None => {
                doc.remove_attr(popover, "data-term")?;
                ("", "")
            }
        };

        let title_node = popover_part(doc, popover, TITLE_CLASS)?;
        match doc.children(title_node).first().copied() {
            Some(text) if doc.text(text).is_some() => doc.set_text(text, title)?,
            _ => {
                doc.append_text(title_node, title)?;
            }
        }

        let body_node = popover_part(doc, popover, BODY_CLASS)?;
        match doc.children(body_node).first().copied() {
            Some(raw) if doc.raw(raw).is_some() => doc.set_raw(raw, body_html)?,
            _ => {
                let raw = doc.create_raw(body_html);
                doc.append_child(body_node, raw)?;
            }
        }

        if let Some(placement) = view.placement {
            doc.set_attr(
                popover,
                "style",
                format!("left: {}px; top: {}px;", placement.left, placement.top),
            )?;
        } else {
            doc.remove_attr(popover, "style")?;
        }
        Ok(())
    }
}

const TITLE_CLASS: &str = "term-popover__title";
const BODY_CLASS: &str = "term-popover__body";

fn popover_part(doc: &mut Document, popover: NodeId, class: &str) -> Result<NodeId> {
    if let Some(existing) = doc
        .children(popover)
        .iter()
        .copied()
        .find(|child| doc.has_class(*child, class))
    {
        return Ok(existing);
    }
    let node = doc.append_element(popover, "div")?;
    doc.set_attr(node, "class", class)?;
    Ok(node)
}

fn compute_placement(
    layout: &dyn PopoverLayout,
    marker: NodeId,
    config: &PopoverConfig,
) -> Option<Placement> {
    let anchor = layout.marker_rect(marker)?;
    Some(place_popover(
        anchor,
        layout.popover_size(),
        layout.viewport(),
        config,
    ))
}
