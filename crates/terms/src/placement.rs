use refdoc_protocol::PopoverConfig;
use serde::Serialize;

/// Viewport-relative box, as reported by the host's layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn center_x(&self) -> f64 {
        self.left + self.width / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Above,
    Below,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Placement {
    pub left: f64,
    pub top: f64,
    pub side: Side,
}

/// Above the anchor unless that crosses the top margin, then below.
/// Horizontally centered on the anchor and clamped to the side padding.
pub fn place_popover(
    anchor: Rect,
    popover: Size,
    viewport: Viewport,
    config: &PopoverConfig,
) -> Placement {
    let above = anchor.top - config.gap - popover.height;
    let (top, side) = if above < config.viewport_margin {
        (anchor.bottom() + config.gap, Side::Below)
    } else {
        (above, Side::Above)
    };

    let centered = anchor.center_x() - popover.width / 2.0;
    let min_left = config.side_padding;
    let max_left = viewport.width - config.side_padding - popover.width;
    let left = if max_left < min_left {
        min_left
    } else {
        centered.clamp(min_left, max_left)
    };

    Placement { left, top, side }
}
